use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::normalizer::{DropReason, Normalized};

/// Running totals of the normalizer outcomes, shared between the consumer and observers.
#[derive(Debug, Default)]
pub struct IngestCounters {
    received: AtomicU64,
    positions: AtomicU64,
    descriptors: AtomicU64,
    malformed: AtomicU64,
    missing_coordinates: AtomicU64,
    unknown_category: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSnapshot {
    pub received: u64,
    pub positions: u64,
    pub descriptors: u64,
    pub malformed: u64,
    pub missing_coordinates: u64,
    pub unknown_category: u64,
}

impl IngestCounters {
    pub fn record(&self, outcome: &Normalized) {
        self.received.fetch_add(1, Ordering::Relaxed);

        let counter = match outcome {
            Normalized::Position(_) => &self.positions,
            Normalized::Descriptor(_) => &self.descriptors,
            Normalized::Ignored => &self.unknown_category,
            Normalized::Dropped(DropReason::Malformed) => &self.malformed,
            Normalized::Dropped(DropReason::MissingCoordinates) => &self.missing_coordinates,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Lines that could not be framed never reach the normalizer.
    pub fn record_oversized_line(&self) {
        self.received.fetch_add(1, Ordering::Relaxed);
        self.malformed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            received: self.received.load(Ordering::Relaxed),
            positions: self.positions.load(Ordering::Relaxed),
            descriptors: self.descriptors.load(Ordering::Relaxed),
            malformed: self.malformed.load(Ordering::Relaxed),
            missing_coordinates: self.missing_coordinates.load(Ordering::Relaxed),
            unknown_category: self.unknown_category.load(Ordering::Relaxed),
        }
    }
}

impl IngestSnapshot {
    pub fn dropped(&self) -> u64 {
        self.malformed + self.missing_coordinates
    }
}
