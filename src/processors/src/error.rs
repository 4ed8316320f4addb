use cablewatch_core::Error as CoreError;
use snafu::{GenerateImplicitData, Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Failed a storage operation"))]
    Storage {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: CoreError,
    },
    #[snafu(display("Failed to set up postgres"))]
    Postgres {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: postgres::Error,
    },
    #[snafu(display("Failed to read infrastructure file '{path}'"))]
    ReadInfrastructure {
        #[snafu(implicit)]
        location: Location,
        path: String,
        #[snafu(source)]
        error: std::io::Error,
    },
    #[snafu(display("Failed to parse infrastructure feature collection"))]
    ParseInfrastructure {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: serde_json::Error,
    },
    #[snafu(display("Invalid position window, error: '{error_stringified}'"))]
    InvalidPositionWindow {
        #[snafu(implicit)]
        location: Location,
        error_stringified: String,
    },
}

/// Why a feature of an imported collection was left out.
#[derive(Debug, Snafu)]
#[snafu(module(skipped), visibility(pub))]
pub enum SkippedFeature {
    #[snafu(display("Feature has no id"))]
    MissingId,
    #[snafu(display("Feature has no geometry"))]
    MissingGeometry,
    #[snafu(display("Failed to read feature geometry"))]
    InvalidGeometry {
        #[snafu(source)]
        error: geozero::error::GeozeroError,
    },
    #[snafu(display("Unsupported geometry type '{geometry_type}'"))]
    UnsupportedGeometry { geometry_type: String },
}

impl From<CoreError> for Error {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        Error::Storage {
            location: Location::generate(),
            error,
        }
    }
}

impl From<postgres::Error> for Error {
    #[track_caller]
    fn from(error: postgres::Error) -> Self {
        Error::Postgres {
            location: Location::generate(),
            error,
        }
    }
}

impl From<serde_json::Error> for Error {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        Error::ParseInfrastructure {
            location: Location::generate(),
            error,
        }
    }
}
