#![deny(rust_2018_idioms)]

//! In-process implementation of every cablewatch storage port.
//!
//! All state lives behind a single lock, which makes every port operation atomic with
//! respect to every other, including concurrent first sightings of the same mmsi.

mod adapter;
mod state;

pub use adapter::MemoryAdapter;
