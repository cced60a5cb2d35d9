//! Centralized error handling for the wrangler client.
//!
//! Every backend call funnels its failure into one of three user-facing kinds:
//!
//! - [`WranglerError::Transport`]: the network or HTTP layer failed
//! - [`WranglerError::Validation`]: a file or dataset name was rejected
//! - [`WranglerError::NotFound`]: the backend has no such dataset
//!
//! The remaining variants cover local concerns (configuration, file I/O,
//! malformed payloads).
//!
//! ```
//! use wrangler::error::WranglerError;
//!
//! fn describe(err: &WranglerError) -> &'static str {
//!     match err {
//!         WranglerError::NotFound(_) => "missing",
//!         WranglerError::Validation(_) => "rejected",
//!         _ if err.is_transport() => "unreachable",
//!         _ => "local",
//!     }
//! }
//! ```
//!
//! ## Context Extension Trait
//!
//! [`ResultExt`] adds `.context()` to any result whose error converts into
//! [`WranglerError`], prefixing the message while keeping the kind:
//!
//! ```no_run
//! use wrangler::error::ResultExt as _;
//!
//! fn read_upload(path: &str) -> wrangler::error::Result<Vec<u8>> {
//!     std::fs::read(path).context("Failed to read upload")
//! }
//! ```

use thiserror::Error;

/// Main error type for wrangler operations.
#[derive(Debug, Error)]
pub enum WranglerError {
    /// Network or HTTP-layer failure. `status` is set when the server answered.
    #[error("{}", transport_message(.status, .message))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    /// A file or dataset name failed validation, locally or on the server.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The backend reports that the dataset does not exist.
    #[error("Dataset not found: {0}")]
    NotFound(String),

    /// The backend answered with a body we could not decode.
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Local file I/O
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Request failed (HTTP {code}): {message}"),
        None => format!("Request failed: {message}"),
    }
}

impl WranglerError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            status: None,
            message: message.into(),
        }
    }

    /// True for failures the user can only fix by retrying or checking the
    /// connection. Undecodable responses count, since they come off the wire.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::Decode(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// HTTP status the server answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport { status, .. } => *status,
            _ => None,
        }
    }

    fn with_prefix(self, prefix: &str) -> Self {
        match self {
            Self::Transport { status, message } => Self::Transport {
                status,
                message: format!("{prefix}: {message}"),
            },
            Self::Validation(msg) => Self::Validation(format!("{prefix}: {msg}")),
            Self::NotFound(msg) => Self::NotFound(format!("{prefix}: {msg}")),
            Self::Decode(msg) => Self::Decode(format!("{prefix}: {msg}")),
            Self::Config(msg) => Self::Config(format!("{prefix}: {msg}")),
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), format!("{prefix}: {e}"))),
        }
    }
}

impl From<reqwest::Error> for WranglerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::Decode(err.to_string());
        }
        Self::Transport {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for WranglerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

// The GUI renders failures as plain status text
impl From<WranglerError> for String {
    fn from(err: WranglerError) -> Self {
        err.to_string()
    }
}

/// Result type alias for wrangler operations.
pub type Result<T> = std::result::Result<T, WranglerError>;

/// Extension trait to add context to results.
pub trait ResultExt<T> {
    /// Add context to an error.
    fn context(self, msg: impl Into<String>) -> Result<T>;

    /// Add context using a closure (lazy evaluation).
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<WranglerError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_prefix(&msg.into()))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_prefix(&f()))
    }
}
