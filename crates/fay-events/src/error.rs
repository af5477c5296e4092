//! Observer construction errors.

use thiserror::Error;

/// Errors that can occur while building an [`ObserverHandle`](crate::ObserverHandle).
///
/// The manager operations themselves never fail; only declaring a
/// capability table can.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObserverError {
    /// The same event type was declared twice for one observer.
    #[error("observer `{observer}` declares `{event_type}` more than once")]
    DuplicateCapability {
        /// Name of the observer being built.
        observer: String,
        /// Type name of the repeated event.
        event_type: &'static str,
    },
}

/// Result type for observer construction.
pub type ObserverResult<T> = Result<T, ObserverError>;
