//! Error types for the polyfill engine.
//!
//! Parsing never fails: malformed conditions degrade to "always matches".
//! Errors only come from the host side: listener callbacks and stylesheet
//! sources.

use thiserror::Error;

/// Error a listener callback may return to abort notification.
pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum RespondError {
    /// A listener failed. Listeners registered after it on the same query,
    /// and queries not yet visited in the pass, were not notified.
    #[error("listener for media query `{media}` failed")]
    Listener {
        media: String,
        #[source]
        source: ListenerError,
    },

    /// A stylesheet could not be read from its source.
    #[error("failed to read stylesheet `{href}`")]
    Sheet {
        href: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, RespondError>;
