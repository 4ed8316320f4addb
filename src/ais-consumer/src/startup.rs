use std::{sync::Arc, time::Duration};

use async_channel::Sender;
use backon::BackoffBuilder;
use cablewatch_core::{AisIngestion, DataMessage, Environment, StorageSettings, constant_backoff};
use memory::MemoryAdapter;
use postgres::PostgresAdapter;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::{
    consumer::{ConsumeOutcome, Consumer},
    counters::IngestCounters,
    error::{
        Error, Result,
        error::{MissingFeedSnafu, ReconnectsExhaustedSnafu, StreamClosedSnafu},
    },
    feed::{AisSource, LiveFeedClient},
    ingest::IngestWorker,
    settings::Settings,
};

pub struct App {
    consumer: Consumer,
    source: Arc<dyn AisSource>,
    adapter: Arc<dyn AisIngestion>,
    counters: Arc<IngestCounters>,
    channel_buffer_size: usize,
    num_ingest_workers: u32,
    reconnect_delay: Duration,
    max_reconnect_attempts: usize,
}

enum SessionEnd {
    Cancelled,
    /// The stream delivered data before closing.
    Productive { lines: u64 },
    Failed(Error),
}

impl App {
    pub async fn build(settings: &Settings) -> Result<App> {
        let adapter: Arc<dyn AisIngestion> = match &settings.storage {
            StorageSettings::Postgres(psql) => {
                let postgres = PostgresAdapter::new(psql).await?;
                if matches!(settings.environment, Environment::Local | Environment::Test) {
                    postgres.do_migrations().await?;
                }
                Arc::new(postgres)
            }
            StorageSettings::Memory => Arc::new(MemoryAdapter::new()),
        };

        let feed = settings.feed.as_ref().ok_or_else(|| {
            MissingFeedSnafu {
                environment: settings.environment.as_ref().to_string(),
            }
            .build()
        })?;

        Ok(App::with_source(
            settings,
            adapter,
            Arc::new(LiveFeedClient::new(feed)?),
        ))
    }

    pub fn with_source(
        settings: &Settings,
        adapter: Arc<dyn AisIngestion>,
        source: Arc<dyn AisSource>,
    ) -> App {
        let counters = Arc::new(IngestCounters::default());

        App {
            consumer: Consumer::new(
                settings.commit_interval,
                settings.max_line_length,
                counters.clone(),
            ),
            source,
            adapter,
            counters,
            channel_buffer_size: settings.channel_buffer_size.max(1),
            num_ingest_workers: settings.num_ingest_workers.max(1),
            reconnect_delay: settings.reconnect_delay,
            max_reconnect_attempts: settings.max_reconnect_attempts,
        }
    }

    pub fn counters(&self) -> Arc<IngestCounters> {
        self.counters.clone()
    }

    /// Consumes the feed until `cancellation` fires or the reconnect budget is exhausted.
    /// Ingestion workers drain every batch already handed over before the storage handle
    /// is closed.
    pub async fn run(self, cancellation: CancellationToken) -> Result<()> {
        let (sender, receiver) = async_channel::bounded::<DataMessage>(self.channel_buffer_size);

        let mut workers = JoinSet::new();
        for _ in 0..self.num_ingest_workers {
            let worker = IngestWorker::new(self.adapter.clone(), receiver.clone());
            workers.spawn(worker.run());
        }
        drop(receiver);

        let result = self.consume_feed(&sender, &cancellation).await;

        sender.close();
        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("ingest worker panicked: {e:?}");
            }
        }

        self.adapter.close().await;

        let totals = self.counters.snapshot();
        info!(
            received = totals.received,
            positions = totals.positions,
            descriptors = totals.descriptors,
            dropped = totals.dropped(),
            "ais consumer stopped"
        );

        result
    }

    async fn consume_feed(
        &self,
        sender: &Sender<DataMessage>,
        cancellation: &CancellationToken,
    ) -> Result<()> {
        let budget = || constant_backoff(self.reconnect_delay, self.max_reconnect_attempts).build();

        let mut backoff = budget();
        let mut failed_sessions: usize = 0;

        loop {
            match self.session(sender, cancellation).await? {
                SessionEnd::Cancelled => return Ok(()),
                SessionEnd::Productive { lines } => {
                    info!("feed session closed after {lines} lines");
                    backoff = budget();
                    failed_sessions = 0;
                }
                SessionEnd::Failed(e) => {
                    failed_sessions += 1;
                    warn!("feed session {failed_sessions} failed: {e:?}");
                }
            }

            let Some(delay) = backoff.next() else {
                error!("exhausted reconnect budget after {failed_sessions} failed sessions");
                return ReconnectsExhaustedSnafu {
                    attempts: failed_sessions,
                }
                .fail();
            };

            warn!("reconnecting to feed in {delay:?}");
            tokio::select! {
                _ = cancellation.cancelled() => return Ok(()),
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Errors only when batches can no longer be handed to the workers, every other
    /// failure is reported as a failed session.
    #[instrument(skip_all)]
    async fn session(
        &self,
        sender: &Sender<DataMessage>,
        cancellation: &CancellationToken,
    ) -> Result<SessionEnd> {
        let stream = tokio::select! {
            _ = cancellation.cancelled() => return Ok(SessionEnd::Cancelled),
            stream = self.source.connect() => stream,
        };

        let stream = match stream {
            Ok(s) => s,
            Err(e) => return Ok(SessionEnd::Failed(e)),
        };

        Ok(match self.consumer.run(stream, sender, cancellation).await? {
            ConsumeOutcome::Cancelled => SessionEnd::Cancelled,
            ConsumeOutcome::Closed { lines: 0 } => SessionEnd::Failed(StreamClosedSnafu.build()),
            ConsumeOutcome::Closed { lines } => SessionEnd::Productive { lines },
        })
    }
}
