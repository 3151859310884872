//! Error types shared across the crate.
//!
//! Internally we use `anyhow` (`Res<T>`) and attach context as errors bubble up. At module
//! boundaries an error is converted into the public `Error`, which remembers what kind of failure
//! it was so that callers can decide whether to abort the interaction or degrade gracefully.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// The internal result type.
pub(crate) type Res<T> = anyhow::Result<T>;

/// The public result type.
pub type Result<T> = std::result::Result<T, Error>;

/// The category of a public `Error`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Credentials or configuration are missing or malformed. Fatal to the interaction.
    Configuration,
    /// The spreadsheet could not be opened or read.
    Access,
    /// A local file or directory operation failed.
    Filesystem,
    /// Anything else.
    Internal,
}

serde_plain::derive_display_from_serialize!(ErrorType);
serde_plain::derive_fromstr_from_deserialize!(ErrorType);

/// The public error type. It is cheap to clone because cached lookups need to hand the same
/// failure to every waiting caller.
#[derive(Clone)]
pub struct Error {
    error_type: ErrorType,
    inner: Arc<anyhow::Error>,
}

impl Error {
    pub fn new(error_type: ErrorType, inner: impl Into<anyhow::Error>) -> Self {
        Self {
            error_type,
            inner: Arc::new(inner.into()),
        }
    }

    pub fn error_type(&self) -> ErrorType {
        self.error_type
    }

    pub fn is_configuration(&self) -> bool {
        self.error_type == ErrorType::Configuration
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error: {:?}", self.error_type, self.inner)
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#}", self.inner)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Converts an internal result into the public `Result`, tagging the error with `error_type`.
pub(crate) trait IntoResult<T> {
    fn pub_result(self, error_type: ErrorType) -> Result<T>;
}

impl<T, E> IntoResult<T> for std::result::Result<T, E>
where
    E: Into<anyhow::Error>,
{
    fn pub_result(self, error_type: ErrorType) -> Result<T> {
        self.map_err(|e| Error::new(error_type, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_pub_result_keeps_type_and_chain() {
        let res: Res<()> = Err(anyhow::anyhow!("root cause")).context("outer");
        let err = res.pub_result(ErrorType::Access).unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Access);
        assert_eq!(err.to_string(), "outer: root cause");
    }

    #[test]
    fn test_error_type_display() {
        assert_eq!(ErrorType::Configuration.to_string(), "configuration");
        assert_eq!("access".parse::<ErrorType>().unwrap(), ErrorType::Access);
    }

    #[test]
    fn test_clone_shares_inner() {
        let err = Error::new(ErrorType::Configuration, anyhow::anyhow!("no key"));
        let cloned = err.clone();
        assert!(cloned.is_configuration());
        assert_eq!(err.to_string(), cloned.to_string());
    }
}
