use snafu::{Location, Snafu};

use crate::{IsTransient, Zone};

pub type CoreResult<T> = std::result::Result<T, Error>;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Storage operation failed"))]
    Storage {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: BoxedError,
    },
    #[snafu(display("Invalid mmsi value '{value}'"))]
    InvalidMmsi {
        #[snafu(implicit)]
        location: Location,
        value: i64,
    },
    #[snafu(display("Unknown zone '{value}'"))]
    UnknownZone {
        #[snafu(implicit)]
        location: Location,
        value: String,
    },
    #[snafu(display("Zone '{zone}' has no alert category"))]
    NoAlertCategory {
        #[snafu(implicit)]
        location: Location,
        zone: Zone,
    },
    #[snafu(display("Unknown alert category '{value}'"))]
    UnknownAlertCategory {
        #[snafu(implicit)]
        location: Location,
        value: String,
    },
}

impl IsTransient for Error {
    fn is_transient(&self) -> bool {
        match self {
            Error::Storage { .. } => true,
            Error::InvalidMmsi { .. }
            | Error::UnknownZone { .. }
            | Error::NoAlertCategory { .. }
            | Error::UnknownAlertCategory { .. } => false,
        }
    }
}
