//! Error types and result definitions for relay operations.
//!
//! Provides a classified error type with captured diagnostic metadata for routing and
//! admission operations. [`RelayError`] carries a kind, a static description, optional
//! dynamic detail, and the callsite that created it.

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Convenient result type for relay operations using [`RelayError`] as the error type.
pub type RelayResult<T> = Result<T, RelayError>;

/// Main error type for relay operations.
#[derive(Debug, Clone)]
pub struct RelayError {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
}

/// Specific categories of errors that can occur during routing and admission.
///
/// Error kinds are granular enough to let callers distinguish transient data-source
/// failures, which routing recovers from locally, from genuine faults.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // Readiness & configuration lookups
    ReadinessQueryFailed,
    ChannelLookupFailed,

    // Configuration errors
    ConfigError,

    // Admitted work
    WorkFailed,

    // State & workflow errors
    InvalidState,

    // Unknown / Uncategorized
    Unknown,
}

impl RelayError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    /// Returns the captured callsite location for this error.
    pub fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Attaches an originating [`error::Error`] to this error and returns the modified
    /// instance.
    ///
    /// The stored source is preserved across clones and exposed via
    /// [`error::Error::source`].
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Creates a [`RelayError`] from its components.
    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
    ) -> Self {
        RelayError {
            kind,
            description,
            detail,
            source: None,
            location: Location::caller(),
        }
    }
}

impl From<(ErrorKind, &'static str)> for RelayError {
    #[track_caller]
    fn from((kind, description): (ErrorKind, &'static str)) -> Self {
        RelayError::from_components(kind, Cow::Borrowed(description), None)
    }
}

impl From<(ErrorKind, String)> for RelayError {
    #[track_caller]
    fn from((kind, description): (ErrorKind, String)) -> Self {
        RelayError::from_components(kind, Cow::Owned(description), None)
    }
}

impl From<(ErrorKind, &'static str, String)> for RelayError {
    #[track_caller]
    fn from((kind, description, detail): (ErrorKind, &'static str, String)) -> Self {
        RelayError::from_components(kind, Cow::Borrowed(description), Some(Cow::Owned(detail)))
    }
}

impl PartialEq for RelayError {
    /// Compares errors by kind only, so tests and retry classification can match on the
    /// category without caring about dynamic detail or callsites.
    fn eq(&self, other: &RelayError) -> bool {
        self.kind == other.kind
    }
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            self.kind,
            self.description,
            self.location.file(),
            self.location.line(),
            self.location.column()
        )?;

        if let Some(detail) = self.detail.as_deref() {
            write!(f, "\n  Detail: {detail}")?;
        }

        Ok(())
    }
}

impl error::Error for RelayError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|source| source as &(dyn error::Error + 'static))
    }
}
