//! Error types for this crate.

use std::fmt::Display;
use std::sync::Arc;

use futures_channel::oneshot;

/// A convenience type alias for a `Result` with an `Error` type.
pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An error that can occur while waiting for an event.
#[derive(Debug, Clone)]
pub struct Error {
    data: ErrorData,
}

/// The kind of error that occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    /// The producer rejected the event.
    Rejected,
    /// The event did not arrive before the timeout elapsed.
    TimedOut,
    /// Another wait for the same event key is still outstanding.
    DuplicateRegistration,
    /// The wait was canceled, or its producer went away without completing it.
    Canceled,
}

#[derive(Debug, Clone)]
enum ErrorData {
    Rejected(Arc<Rejection>),
    Simple(ErrorKind),
}

#[derive(Debug)]
struct Rejection {
    code: i64,
    message: String,
    source: Option<BoxError>,
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.data {
            ErrorData::Rejected(rejection) if rejection.code == Error::GENERIC_CODE => {
                f.write_str(&rejection.message)
            }
            ErrorData::Rejected(rejection) => {
                write!(f, "{} (code {})", rejection.message, rejection.code)
            }
            ErrorData::Simple(kind) => kind.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.data {
            ErrorData::Rejected(rejection) => rejection
                .source
                .as_deref()
                .map(|source| source as &(dyn std::error::Error + 'static)),
            ErrorData::Simple(_) => None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error {
            data: ErrorData::Simple(kind),
        }
    }
}

impl From<oneshot::Canceled> for Error {
    fn from(_value: oneshot::Canceled) -> Self {
        ErrorKind::Canceled.into()
    }
}

impl Error {
    /// The code given to rejections that were built from a bare message.
    pub const GENERIC_CODE: i64 = -1;

    /// Creates a rejection with a producer-defined code and message.
    pub fn rejected(code: i64, message: impl Into<String>) -> Self {
        Self::from_rejection(Rejection {
            code,
            message: message.into(),
            source: None,
        })
    }

    /// Creates a rejection carrying only a message.
    pub fn from_message(message: impl Into<String>) -> Self {
        Self::rejected(Self::GENERIC_CODE, message)
    }

    /// Creates a rejection that wraps an underlying cause.
    ///
    /// The cause is available through [`std::error::Error::source`].
    pub fn with_source<E>(code: i64, message: impl Into<String>, source: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::from_rejection(Rejection {
            code,
            message: message.into(),
            source: Some(source.into()),
        })
    }

    fn from_rejection(rejection: Rejection) -> Self {
        Self {
            data: ErrorData::Rejected(Arc::new(rejection)),
        }
    }

    /// Returns the kind of error.
    pub fn kind(&self) -> ErrorKind {
        match &self.data {
            ErrorData::Rejected(_) => ErrorKind::Rejected,
            ErrorData::Simple(kind) => *kind,
        }
    }

    /// The producer's error code, if this is a rejection.
    pub fn code(&self) -> Option<i64> {
        match &self.data {
            ErrorData::Rejected(rejection) => Some(rejection.code),
            ErrorData::Simple(_) => None,
        }
    }

    /// The producer's error message, if this is a rejection.
    pub fn message(&self) -> Option<&str> {
        match &self.data {
            ErrorData::Rejected(rejection) => Some(&rejection.message),
            ErrorData::Simple(_) => None,
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Rejected => f.write_str("rejected"),
            ErrorKind::TimedOut => f.write_str("expected event did not arrive"),
            ErrorKind::DuplicateRegistration => {
                f.write_str("a wait for this event is already outstanding")
            }
            ErrorKind::Canceled => f.write_str("canceled"),
        }
    }
}
