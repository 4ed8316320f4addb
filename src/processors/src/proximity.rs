use std::{collections::HashMap, sync::Arc, time::Duration};

use cablewatch_core::{
    AlertCategory, AlertStateMachine, AlertUpsert, Classification, ProcessorStorage,
    ProximityClassifier, TickUpdate, VesselId, VesselTrack, VesselZoneState, WatchedFeature,
    intersects,
};
use chrono::{DateTime, TimeDelta, Utc};
use tokio::{sync::Mutex, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed(TickSummary),
    /// Another tick was still running.
    Skipped,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub vessels: u32,
    pub evaluated: u32,
    pub escalations: u32,
    pub crossings: u32,
}

/// Periodically classifies the latest position of every recently seen vessel against
/// the watched infrastructure and records zone changes and alerts.
///
/// Clones share the tick guard, at most one tick runs at any time.
#[derive(Clone)]
pub struct ProximityProcessor {
    adapter: Arc<dyn ProcessorStorage>,
    classifier: ProximityClassifier,
    state_machine: AlertStateMachine,
    tick_interval: Duration,
    position_window: TimeDelta,
    tick_guard: Arc<Mutex<()>>,
}

impl ProximityProcessor {
    pub fn new(
        adapter: Arc<dyn ProcessorStorage>,
        classifier: ProximityClassifier,
        tick_interval: Duration,
        position_window: TimeDelta,
    ) -> Self {
        Self {
            adapter,
            classifier,
            state_machine: AlertStateMachine,
            tick_interval,
            position_window,
            tick_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Ticks until `cancellation` fires. A tick in progress always completes, ticks that
    /// fall due while one is running are skipped.
    pub async fn run_continuous(&self, cancellation: &CancellationToken) {
        let mut interval = tokio::time::interval(self.tick_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => return,
                _ = interval.tick() => {}
            }

            self.run_cycle().await;
        }
    }

    async fn run_cycle(&self) {
        match self.run_single().await {
            Ok(TickOutcome::Completed(summary)) => {
                if summary.escalations > 0 || summary.crossings > 0 {
                    info!(
                        escalations = summary.escalations,
                        crossings = summary.crossings,
                        "raised alerts"
                    );
                }
            }
            Ok(TickOutcome::Skipped) => warn!("previous tick still running, skipped"),
            Err(e) => error!("proximity tick failed: {e:?}"),
        }
    }

    #[instrument(skip_all, fields(app.num_vessels, app.num_evaluated, app.num_alerts))]
    pub async fn run_single(&self) -> Result<TickOutcome> {
        let Ok(_guard) = self.tick_guard.try_lock() else {
            return Ok(TickOutcome::Skipped);
        };

        let since = Utc::now() - self.position_window;

        let features = self.adapter.watched_features().await?;
        let tracks = self.adapter.vessel_tracks(since).await?;

        let vessel_ids: Vec<VesselId> = tracks.iter().map(|t| t.vessel_id).collect();
        let states: HashMap<VesselId, VesselZoneState> = self
            .adapter
            .zone_states(&vessel_ids)
            .await?
            .into_iter()
            .map(|s| (s.vessel_id, s))
            .collect();

        let (update, summary) = self.evaluate(&features, &tracks, &states);

        let span = tracing::Span::current();
        span.record("app.num_vessels", summary.vessels);
        span.record("app.num_evaluated", summary.evaluated);
        span.record("app.num_alerts", update.alerts.len());

        if !update.is_empty() {
            self.adapter.commit_tick(update).await?;
        }

        Ok(TickOutcome::Completed(summary))
    }

    /// Computes every state change and alert of a tick without touching storage. Only
    /// positions that have not been evaluated by an earlier tick are considered.
    pub fn evaluate(
        &self,
        features: &[WatchedFeature],
        tracks: &[VesselTrack],
        states: &HashMap<VesselId, VesselZoneState>,
    ) -> (TickUpdate, TickSummary) {
        let mut update = TickUpdate::default();
        let mut summary = TickSummary {
            vessels: tracks.len() as u32,
            ..Default::default()
        };

        for track in tracks {
            let previous = states.get(&track.vessel_id);
            let latest = &track.latest;

            if !VesselZoneState::is_unevaluated(previous, latest.observed_at) {
                continue;
            }
            summary.evaluated += 1;

            let classification = self
                .classifier
                .classify(latest.coord(), features, previous);
            let step =
                self.state_machine
                    .step(track.vessel_id, previous, &classification, latest.observed_at);

            if let Some(category) = step.transition.escalation() {
                summary.escalations += 1;
                update.alerts.push(AlertUpsert {
                    vessel_id: track.vessel_id,
                    category,
                    message: escalation_message(track, category, &classification, features),
                    observed_at: latest.observed_at,
                });
            }

            let evaluated_at = previous.and_then(|s| s.last_position_at);
            if let Some((feature, crossed_at)) = crossed_feature(track, evaluated_at, features) {
                summary.crossings += 1;
                update.alerts.push(AlertUpsert {
                    vessel_id: track.vessel_id,
                    category: AlertCategory::Crossing,
                    message: format!("{} crossed {}", vessel_label(track), feature.name),
                    observed_at: crossed_at,
                });
            }

            update.states.push(step.state);
        }

        (update, summary)
    }
}

/// The first watched feature crossed by a trajectory leg ending after `evaluated_at`,
/// with the time the crossing leg ends.
fn crossed_feature<'a>(
    track: &VesselTrack,
    evaluated_at: Option<DateTime<Utc>>,
    features: &'a [WatchedFeature],
) -> Option<(&'a WatchedFeature, DateTime<Utc>)> {
    track
        .legs()
        .filter(|(leg, end)| leg.start != leg.end && evaluated_at.is_none_or(|at| *end > at))
        .find_map(|(leg, end)| {
            features
                .iter()
                .find(|f| f.lines.iter().any(|l| intersects(&leg, l)))
                .map(|f| (f, end))
        })
}

fn escalation_message(
    track: &VesselTrack,
    category: AlertCategory,
    classification: &Classification,
    features: &[WatchedFeature],
) -> String {
    let feature = classification
        .feature_id
        .as_ref()
        .and_then(|id| features.iter().find(|f| &f.id == id))
        .map(|f| f.name.as_str())
        .unwrap_or("watched infrastructure");

    let action = match category {
        AlertCategory::Over => "is over",
        AlertCategory::Approach | AlertCategory::Crossing => "is approaching",
    };

    format!(
        "{} {action} {feature} ({:.3} degrees)",
        vessel_label(track),
        classification.distance
    )
}

fn vessel_label(track: &VesselTrack) -> String {
    match &track.name {
        Some(name) => format!("{name} ({})", track.mmsi),
        None => format!("MMSI {}", track.mmsi),
    }
}
