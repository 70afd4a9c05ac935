//! Error taxonomy for the embedding and overlay core.
//!
//! Startup failures ([`LocateFailure`], [`EmbedFailure`]) travel up to the
//! binary as values. Handler faults and shutdown faults are logged where they
//! happen and never stop the event loop.

use thiserror::Error;

use crate::backend::NativeWindowHandle;

/// Boxed source error carried by the taxonomy variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// No visible window title contained the requested substring.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no visible window title contains {substring:?} after {attempts} attempt(s)")]
pub struct LocateFailure {
    pub substring: String,
    pub attempts: u32,
}

/// Reparenting a located window into the host failed.
#[derive(Debug, Error)]
pub enum EmbedFailure {
    #[error("window {0} is not a valid window")]
    InvalidHandle(NativeWindowHandle),
    #[error("window {handle} already belongs to parent {parent}")]
    IncompatibleParent {
        handle: NativeWindowHandle,
        parent: NativeWindowHandle,
    },
    #[error("reparenting window {handle} was rejected: {source}")]
    Rejected {
        handle: NativeWindowHandle,
        #[source]
        source: BoxError,
    },
}

#[derive(Debug, Error)]
pub enum OverlayError {
    #[error(transparent)]
    Locate(#[from] LocateFailure),
    #[error(transparent)]
    Embed(#[from] EmbedFailure),
    /// A paint, move or pointer handler failed or panicked.
    #[error("{context} handler failed: {source}")]
    InputHandler {
        context: &'static str,
        #[source]
        source: BoxError,
    },
    /// Terminating the browser session or releasing host windows failed.
    #[error("shutdown step failed: {0}")]
    Shutdown(#[source] BoxError),
}

impl OverlayError {
    pub fn handler(context: &'static str, err: anyhow::Error) -> Self {
        Self::InputHandler {
            context,
            source: err.into(),
        }
    }

    pub fn shutdown(err: anyhow::Error) -> Self {
        Self::Shutdown(err.into())
    }

    /// Whether the error must end the current session.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Locate(_) | Self::Embed(_))
    }
}
