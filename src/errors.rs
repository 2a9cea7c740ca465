//! Registry Provider Error Hierarchy
//!
//! Every error that touches a registry key carries the fully-qualified key
//! name (`HKCU\SOFTWARE\...`) followed by the underlying OS description, so a
//! single log line is enough to locate the failing key.

use std::io;

use config::ConfigError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Subtree absent or access denied
    #[error("{key}: {source}")]
    KeyOpenFailed {
        key: String,
        #[source]
        source: io::Error,
    },

    /// Value or subkey names could not be listed
    #[error("{key}: {source}")]
    EnumerationFailed {
        key: String,
        #[source]
        source: io::Error,
    },

    /// A single value could not be read or converted; aborts the whole read
    #[error("{key}: {value}, {source}")]
    ValueReadFailed {
        key: String,
        value: String,
        #[source]
        source: io::Error,
    },

    /// Environment expansion of an expandable string failed
    #[error("{key}: {value}, {source}")]
    ExpansionFailed {
        key: String,
        value: String,
        #[source]
        source: io::Error,
    },

    #[error("winreg provider does not support {0}")]
    Unsupported(&'static str),

    /// Initial or re-arm change registration failed
    #[error("{key}: unable to register for change notifications: {source}")]
    WatchRegistrationFailed {
        key: String,
        #[source]
        source: io::Error,
    },

    /// The blocking wait on the change event failed
    #[error("{key}: waiting for change notification failed: {source}")]
    WaitFailed {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn watch task for {key}: {source}")]
    TaskSpawnFailed {
        key: String,
        #[source]
        source: io::Error,
    },

    /// Provider configuration validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    /// Fully-qualified key name the error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::KeyOpenFailed { key, .. }
            | Error::EnumerationFailed { key, .. }
            | Error::ValueReadFailed { key, .. }
            | Error::ExpansionFailed { key, .. }
            | Error::WatchRegistrationFailed { key, .. }
            | Error::WaitFailed { key, .. }
            | Error::TaskSpawnFailed { key, .. } => Some(key),
            Error::Unsupported(_) | Error::Config(_) => None,
        }
    }
}
