#![deny(rust_2018_idioms)]

//! Domain model, geometry and storage ports shared by the cablewatch ingestion and
//! processing binaries.

mod domain;
mod error;
mod ports;
mod retry;
mod settings;
mod shutdown;
mod telemetry;

pub use domain::*;
pub use error::*;
pub use ports::*;
pub use retry::*;
pub use settings::*;
pub use shutdown::*;
pub use telemetry::*;
