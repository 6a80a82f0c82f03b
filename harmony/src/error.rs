use harmony_http::{Error as HttpError, Ratelimited};
use harmony_models::permissions::Permissions;
use serde_json::Error as SerdeError;
use std::{
    error::Error as StdError,
    fmt::{Display, Formatter, Result as FmtResult},
    time::Duration,
};

#[derive(Debug)]
pub struct Error {
    pub(super) source: Option<Box<dyn StdError + Send + Sync>>,
    pub(super) kind: ErrorKind,
}

impl Error {
    pub const fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn into_source(self) -> Option<Box<dyn StdError + Send + Sync>> {
        self.source
    }

    pub fn into_parts(self) -> (ErrorKind, Option<Box<dyn StdError + Send + Sync>>) {
        (self.kind, self.source)
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        Self {
            source: None,
            kind: ErrorKind::InvalidArgument {
                reason: reason.into(),
            },
        }
    }

    pub(crate) fn missing_permissions(missing: Permissions) -> Self {
        Self {
            source: None,
            kind: ErrorKind::PermissionDenied {
                missing: Some(missing),
            },
        }
    }

    /// Refused locally because only the guild owner may do this
    pub(crate) fn owner_only() -> Self {
        Self {
            source: None,
            kind: ErrorKind::PermissionDenied { missing: None },
        }
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self {
            source: None,
            kind: ErrorKind::NotFound { what: what.into() },
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ErrorKind::InvalidArgument { reason } => write!(f, "Invalid argument - {}", reason),
            ErrorKind::PermissionDenied { missing: Some(missing) } => {
                write!(f, "Missing permissions - {:?}", missing)
            }
            ErrorKind::PermissionDenied { missing: None } => {
                f.write_str("Permission denied")
            }
            ErrorKind::RateLimited {
                retry_after: Some(retry_after),
            } => write!(f, "Rate limited - retry after {}ms", retry_after.as_millis()),
            ErrorKind::RateLimited { retry_after: None } => f.write_str("Rate limited"),
            ErrorKind::NotFound { what } => write!(f, "Not found - {}", what),
            ErrorKind::Network => match &self.source {
                Some(source) => write!(f, "Network error - {}", source),
                None => f.write_str("Network error"),
            },
            ErrorKind::Remote => match &self.source {
                Some(source) => write!(f, "Remote fault - {}", source),
                None => f.write_str("Remote fault"),
            },
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| &**source as &(dyn StdError + 'static))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Local validation failed, nothing was sent
    InvalidArgument { reason: String },
    /// `missing` is set when the local pre-check found absent permissions, `None` when
    /// the server refused or the call is reserved to the owner
    PermissionDenied { missing: Option<Permissions> },
    RateLimited { retry_after: Option<Duration> },
    NotFound { what: String },
    Network,
    Remote,
}

impl From<Ratelimited> for Error {
    fn from(err: Ratelimited) -> Self {
        Self {
            kind: ErrorKind::RateLimited {
                retry_after: err.retry_after,
            },
            source: Some(Box::new(err)),
        }
    }
}

impl From<HttpError> for Error {
    fn from(err: HttpError) -> Self {
        let kind = match &err {
            HttpError::RateLimited { retry_after, .. } => ErrorKind::RateLimited {
                retry_after: *retry_after,
            },
            HttpError::Forbidden => ErrorKind::PermissionDenied { missing: None },
            HttpError::NotFound => ErrorKind::NotFound {
                what: "remote resource".into(),
            },
            HttpError::BuildingRequest(_) | HttpError::Request(_) | HttpError::Timeout => {
                ErrorKind::Network
            }
            HttpError::Parsing(_) | HttpError::APIError(_) => ErrorKind::Remote,
        };
        Self {
            source: Some(Box::new(err)),
            kind,
        }
    }
}

impl From<SerdeError> for Error {
    fn from(err: SerdeError) -> Self {
        Self {
            source: Some(Box::new(err)),
            kind: ErrorKind::Remote,
        }
    }
}
