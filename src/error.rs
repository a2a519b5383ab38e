//! Crate-wide error type.
//!
//! Three kinds, matching the failure taxonomy of the reader: a caller that
//! misuses the tier protocol, a cooperative cancellation, and a failure
//! surfaced by an external collaborator (metadata/chunk/page loading). None
//! of them are recoverable internally; the reader never retries.

use std::fmt;

/// Boxed source error from a `MetadataSource`/`PageDecoder` implementation.
pub type LoadSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The tier protocol was violated by the caller: a tier method was
    /// called while residual data from a lower tier was still buffered, or
    /// a consuming method was called with nothing ready to consume.
    #[error("protocol misuse: {0}")]
    ProtocolMisuse(&'static str),

    /// The cooperative cancellation signal was observed.
    #[error("cancelled")]
    Cancelled,

    /// An external collaborator failed to load metadata, a chunk list, a
    /// page list, or page data.
    #[error("load failed: {context}")]
    Load {
        context: &'static str,
        #[source]
        source: LoadSource,
    },
}

impl Error {
    pub fn load(context: &'static str, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Load {
            context,
            source: Box::new(source),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

/// A lightweight string-backed error for fakes and tests that don't want to
/// define their own `std::error::Error` type.
#[derive(Debug, Clone)]
pub struct Message(pub String);

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for Message {}

impl From<&str> for Message {
    fn from(value: &str) -> Self {
        Message(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
