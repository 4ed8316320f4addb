mod ais;
mod alerts;
mod geometry;
mod infrastructure;
mod proximity;

pub use ais::*;
pub use alerts::*;
pub use geometry::*;
pub use infrastructure::*;
pub use proximity::*;
