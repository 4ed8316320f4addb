#![deny(rust_2018_idioms)]

mod adapter;
mod error;
mod models;
mod queries;

pub use adapter::PostgresAdapter;
pub use error::{Error, Result};
