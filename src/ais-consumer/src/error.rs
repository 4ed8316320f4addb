use cablewatch_core::Error as CoreError;
use reqwest::StatusCode;
use snafu::{GenerateImplicitData, Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("Feed transport error"))]
    Transport {
        #[snafu(implicit)]
        location: Location,
        #[snafu(source)]
        error: reqwest::Error,
    },
    #[snafu(display("Feed request failed, status: '{status}', url: '{url}', body: '{body}'"))]
    FailedRequest {
        #[snafu(implicit)]
        location: Location,
        url: String,
        status: StatusCode,
        body: String,
    },
    #[snafu(display("Feed stream closed before delivering any data"))]
    StreamClosed {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Internal channel closed unexpectedly"))]
    InternalChannelClosed {
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("Gave up reconnecting to the feed after {attempts} consecutive failed sessions"))]
    ReconnectsExhausted {
        #[snafu(implicit)]
        location: Location,
        attempts: usize,
    },
    #[snafu(display("Missing feed settings for environment '{environment}'"))]
    MissingFeed {
        #[snafu(implicit)]
        location: Location,
        environment: String,
    },
    #[snafu(display("Invalid feed address '{address}', error: '{error_stringified}'"))]
    InvalidAddress {
        #[snafu(implicit)]
        location: Location,
        address: String,
        error_stringified: String,
    },
    #[snafu(display("Storage error"))]
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
}

impl From<reqwest::Error> for Error {
    #[track_caller]
    fn from(error: reqwest::Error) -> Self {
        Error::Transport {
            location: Location::generate(),
            error,
        }
    }
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
