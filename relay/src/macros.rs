//! Macros for relay error handling.
//!
//! Provides convenience macros for creating and returning [`crate::error::RelayError`]
//! instances with reduced boilerplate for common error handling patterns.

/// Creates a [`crate::error::RelayError`] from error kind and description.
///
/// Accepts a static description, optional dynamic detail, and an optional source error.
#[macro_export]
macro_rules! relay_error {
    ($kind:expr, $desc:expr) => {
        $crate::error::RelayError::from(($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        $crate::error::RelayError::from(($kind, $desc)).with_source($source)
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        $crate::error::RelayError::from(($kind, $desc, $detail.to_string()))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        $crate::error::RelayError::from(($kind, $desc, $detail.to_string())).with_source($source)
    };
}

/// Creates and returns a [`crate::error::RelayError`] from the current function.
///
/// Combines error creation with early return, reducing boilerplate when an error
/// condition should immediately terminate execution. Supports the same optional detail
/// and source arguments as [`relay_error!`].
#[macro_export]
macro_rules! bail {
    ($kind:expr, $desc:expr) => {
        return ::core::result::Result::Err($crate::relay_error!($kind, $desc))
    };
    ($kind:expr, $desc:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::relay_error!($kind, $desc, source: $source))
    };
    ($kind:expr, $desc:expr, $detail:expr) => {
        return ::core::result::Result::Err($crate::relay_error!($kind, $desc, $detail))
    };
    ($kind:expr, $desc:expr, $detail:expr, source: $source:expr) => {
        return ::core::result::Result::Err($crate::relay_error!(
            $kind,
            $desc,
            $detail,
            source: $source
        ))
    };
}
