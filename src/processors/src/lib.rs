#![deny(rust_2018_idioms)]

mod error;
mod infrastructure;
mod proximity;
mod settings;
mod startup;

pub use error::*;
pub use infrastructure::*;
pub use proximity::*;
pub use settings::*;
pub use startup::*;
