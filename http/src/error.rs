use hyper::{http::Error as HttpError, Error as HyperError, StatusCode};
use serde_json::Error as SerdeError;
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    time::Duration,
};

#[derive(Debug)]
pub enum Error {
    BuildingRequest(HttpError),
    Request(HyperError),
    Parsing(SerdeError),
    /// The service answered 429
    RateLimited {
        retry_after: Option<Duration>,
        global: bool,
    },
    Forbidden,
    NotFound,
    APIError(StatusCode),
    Timeout,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Error::BuildingRequest(err) => write!(f, "Building Request Error - {}", err),
            Error::Request(err) => write!(f, "Request Error - {}", err),
            Error::Parsing(err) => write!(f, "Parsing Error - {}", err),
            Error::RateLimited { retry_after, global } => write!(
                f,
                "Rate Limited - retry after {:?} (global: {})",
                retry_after, global
            ),
            Error::Forbidden => f.write_str("Missing Permissions"),
            Error::NotFound => f.write_str("Unknown Resource"),
            Error::APIError(status) => write!(f, "API Error - {}", status),
            Error::Timeout => f.write_str("Request timed out"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::BuildingRequest(err) => Some(err),
            Error::Request(err) => Some(err),
            Error::Parsing(err) => Some(err),
            _ => None,
        }
    }
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        Error::BuildingRequest(err)
    }
}

impl From<HyperError> for Error {
    fn from(err: HyperError) -> Self {
        Error::Request(err)
    }
}

impl From<SerdeError> for Error {
    fn from(err: SerdeError) -> Self {
        Error::Parsing(err)
    }
}
