use std::{path::PathBuf, sync::Arc};

use cablewatch_core::{
    Environment, FeatureId, ProcessorStorage, ProximityClassifier, StorageSettings,
};
use chrono::TimeDelta;
use memory::MemoryAdapter;
use postgres::PostgresAdapter;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{
    Settings,
    error::{Result, error::InvalidPositionWindowSnafu},
    infrastructure::InfrastructureImporter,
    proximity::ProximityProcessor,
};

pub struct App {
    adapter: Arc<dyn ProcessorStorage>,
    importer: InfrastructureImporter,
    processor: ProximityProcessor,
    environment: Environment,
    infrastructure_path: Option<PathBuf>,
    watched_features: Vec<FeatureId>,
}

impl App {
    pub async fn build(settings: &Settings) -> Result<App> {
        let adapter: Arc<dyn ProcessorStorage> = match &settings.storage {
            StorageSettings::Postgres(psql) => {
                let postgres = PostgresAdapter::new(psql).await?;
                if matches!(settings.environment, Environment::Local | Environment::Test) {
                    postgres.do_migrations().await?;
                }
                Arc::new(postgres)
            }
            StorageSettings::Memory => Arc::new(MemoryAdapter::new()),
        };

        App::with_adapter(settings, adapter)
    }

    pub fn with_adapter(settings: &Settings, adapter: Arc<dyn ProcessorStorage>) -> Result<App> {
        let position_window = TimeDelta::from_std(settings.position_window).map_err(|e| {
            InvalidPositionWindowSnafu {
                error_stringified: e.to_string(),
            }
            .build()
        })?;

        Ok(App {
            importer: InfrastructureImporter::new(adapter.clone()),
            processor: ProximityProcessor::new(
                adapter.clone(),
                ProximityClassifier::new(settings.thresholds),
                settings.tick_interval,
                position_window,
            ),
            adapter,
            environment: settings.environment,
            infrastructure_path: settings.infrastructure_path.clone(),
            watched_features: settings.watched_features.clone(),
        })
    }

    pub fn importer(&self) -> &InfrastructureImporter {
        &self.importer
    }

    pub fn processor(&self) -> &ProximityProcessor {
        &self.processor
    }

    /// Imports the configured infrastructure and ticks until `cancellation` fires, the
    /// test environment runs a single tick. Storage is closed after the last tick.
    pub async fn run(self, cancellation: CancellationToken) -> Result<()> {
        let result = self.run_inner(&cancellation).await;
        self.adapter.close().await;
        result
    }

    async fn run_inner(&self, cancellation: &CancellationToken) -> Result<()> {
        if let Some(path) = &self.infrastructure_path {
            self.importer.import_file(path).await?;
        }

        if !self.watched_features.is_empty() {
            self.importer.set_watched(&self.watched_features).await?;
        }

        match self.environment {
            Environment::Local | Environment::Development | Environment::Production => {
                self.processor.run_continuous(cancellation).await;
                info!("proximity processor stopped");
            }
            Environment::Test => {
                self.processor.run_single().await?;
            }
        }

        Ok(())
    }
}
