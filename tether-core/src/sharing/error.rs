//! Error types for the sharing system.
//!
//! All fallible operations are synchronous and deterministic: they either
//! succeed or fail immediately. There is no retry logic anywhere.

use thiserror::Error;

/// Errors produced by registry and binding operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SharingError {
    /// The named attribute was never established via
    /// [`Registry::set_default`](super::Registry::set_default).
    #[error("attribute '{0}' does not exist")]
    UnknownAttribute(String),

    /// `set_default` was called twice for the same attribute name.
    ///
    /// Establishing an attribute is rejecting, not idempotent: the first
    /// default wins and a second call is an error.
    #[error("attribute '{0}' already has a default value")]
    DuplicateDefault(String),

    /// A peer tried to create a second binding for an attribute it is
    /// already bound to.
    ///
    /// Each peer gets at most one listener entry per attribute, so a second
    /// binding could never fire and its cleanup would tear down the first
    /// binding's registration. Rejected instead.
    #[error("peer is already bound to attribute '{0}'")]
    AlreadyBound(String),
}

/// Convenience alias used throughout the sharing module.
pub type Result<T> = std::result::Result<T, SharingError>;
