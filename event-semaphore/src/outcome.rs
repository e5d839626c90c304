use futures_channel::oneshot;

use crate::error::{Error, ErrorKind, Result};

/// The result of waiting for an event.
#[derive(Debug, Clone)]
#[must_use]
pub enum Outcome<T> {
    /// The event was resolved with a value.
    Success(T),
    /// The event was rejected, or the wait could not be started.
    Failure(Error),
    /// Nothing arrived before the timeout elapsed.
    TimedOut,
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Outcome::Failure(_))
    }

    pub fn is_timed_out(&self) -> bool {
        matches!(self, Outcome::TimedOut)
    }

    /// Returns the resolved value, discarding any failure.
    pub fn success(self) -> Option<T> {
        match self {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the failure, if there was one.
    pub fn failure(self) -> Option<Error> {
        match self {
            Outcome::Failure(error) => Some(error),
            _ => None,
        }
    }

    /// Maps the resolved value, leaving failures and timeouts untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Success(value) => Outcome::Success(f(value)),
            Outcome::Failure(error) => Outcome::Failure(error),
            Outcome::TimedOut => Outcome::TimedOut,
        }
    }

    /// Converts into a `Result`, reporting a timeout as [`ErrorKind::TimedOut`].
    pub fn into_result(self) -> Result<T> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::Failure(error) => Err(error),
            Outcome::TimedOut => Err(ErrorKind::TimedOut.into()),
        }
    }

    pub(crate) fn received(
        received: std::result::Result<Result<T>, oneshot::Canceled>,
    ) -> Self {
        match received {
            Ok(Ok(value)) => Outcome::Success(value),
            Ok(Err(error)) => Outcome::Failure(error),
            Err(canceled) => Outcome::Failure(canceled.into()),
        }
    }
}

impl<T> From<Result<T>> for Outcome<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(error) => Outcome::Failure(error),
        }
    }
}

impl<T> From<Outcome<T>> for Result<T> {
    fn from(outcome: Outcome<T>) -> Self {
        outcome.into_result()
    }
}
