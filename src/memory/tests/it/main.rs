#![deny(rust_2018_idioms)]

pub mod alerts;
pub mod registry;
