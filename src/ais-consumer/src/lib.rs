#![deny(rust_2018_idioms)]

//! Continuously consumes the live AIS feed, normalizes every report and stores positions
//! and vessel descriptors.

pub mod consumer;
pub mod counters;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod models;
pub mod normalizer;
pub mod settings;
pub mod startup;
