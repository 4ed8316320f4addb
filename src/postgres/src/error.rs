use cablewatch_core::Error as CoreError;
use snafu::{GenerateImplicitData, Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Failed to connect to the database"))]
    Connection {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: sqlx::Error,
    },
    #[snafu(display("Failed to run database migrations"))]
    Migrate {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: sqlx::migrate::MigrateError,
    },
    #[snafu(display("Sqlx error"))]
    Sqlx {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: sqlx::Error,
    },
    #[snafu(display("Stored value could not be converted to its domain type"))]
    Conversion {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: CoreError,
    },
}

impl From<sqlx::Error> for Error {
    #[track_caller]
    fn from(error: sqlx::Error) -> Self {
        Error::Sqlx {
            location: Location::generate(),
            error,
        }
    }
}

impl From<CoreError> for Error {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        Error::Conversion {
            location: Location::generate(),
            error,
        }
    }
}

impl From<Error> for CoreError {
    #[track_caller]
    fn from(value: Error) -> Self {
        match value {
            Error::Conversion { error, .. } => error,
            value => CoreError::Storage {
                location: Location::generate(),
                error: Box::new(value),
            },
        }
    }
}
