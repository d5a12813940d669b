//! The crate's error type.
//!
//! Errors are `anyhow` chains under the hood so that every layer can attach context, but each one
//! also carries an `ErrorType` so that callers (and the command-line host) can tell a failed rate
//! fetch from a bad expense or a missing record.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};

pub type Result<T> = std::result::Result<T, Error>;

/// The kind of failure, used to decide how an error is presented and whether it can be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Transport failure or non-success status from the exchange rate provider.
    Network,
    /// A rate response or a persisted expense collection could not be understood.
    Parse,
    /// An expense field, currency code or amount is not acceptable.
    Validation,
    /// An update or delete referenced an identifier that is not in the collection.
    NotFound,
    /// Missing or invalid configuration, including the rate provider credential.
    Config,
    /// Local filesystem failure.
    Io,
    /// Anything that was not classified.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);

/// An error with an `ErrorType` and a chain of context messages.
pub struct Error {
    error_type: ErrorType,
    inner: anyhow::Error,
}

impl Error {
    /// Create a new error of type `error_type` with `message`.
    pub fn new(error_type: ErrorType, message: impl Display) -> Self {
        Self {
            error_type,
            inner: anyhow::anyhow!("{message}"),
        }
    }

    fn with_type(error_type: ErrorType, inner: anyhow::Error) -> Self {
        Self { error_type, inner }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn is(&self, error_type: ErrorType) -> bool {
        self.error_type == error_type
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{:#}", self.inner)
        } else {
            Display::fmt(&self.inner, f)
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {:?}", self.error_type, self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Errors coming back through `anyhow` keep the type of the innermost `Error` in their chain, so
/// adding `.context(..)` to a typed error does not lose its classification.
impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        let error_type = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<Error>())
            .map(Error::error_type)
            .unwrap_or(ErrorType::Internal);
        Self::with_type(error_type, e)
    }
}

/// Converts any result whose error can become an `anyhow::Error` into a crate `Result` with the
/// given `ErrorType`.
pub trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::with_type(error_type, e.into()))
    }
}
