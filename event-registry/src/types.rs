//! Core types for the event registry library
//!
//! This module defines the names, identifiers, errors and dispatch reports
//! shared by [`EventRegistry`](crate::EventRegistry) and
//! [`SharedRegistry`](crate::SharedRegistry).

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Result type for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Value returned by a handler. An `Err` is a handler failure.
pub type HandlerResult = anyhow::Result<()>;

/// Type-erased handler stored in the registry
pub type Handler<P> = Arc<dyn Fn(&P) -> HandlerResult + Send + Sync>;

/// Opaque event identifier used as the registry lookup key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventName(String);

impl EventName {
    /// Create a new event name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Borrow the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for EventName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Identifier handed out for every registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors that can occur during registry operations
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Handler {handler} for event '{event}' failed at position {position}")]
    HandlerFailed {
        event: EventName,
        handler: HandlerId,
        /// Zero-based position of the handler in the dispatch sequence
        position: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("Registry lock poisoned")]
    LockPoisoned,
}

/// A handler failure recorded while dispatching under the isolate policy
#[derive(Debug)]
pub struct HandlerFailure {
    /// Handler that failed
    pub handler: HandlerId,
    /// Zero-based position in the dispatch sequence
    pub position: usize,
    /// Error returned by the handler
    pub error: anyhow::Error,
}

/// Summary of one dispatch
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Number of handlers that were called
    pub invoked: usize,
    /// Failures that were isolated (always empty under fail-fast)
    pub failures: Vec<HandlerFailure>,
}

impl DispatchReport {
    /// True if at least one handler was called
    pub fn matched(&self) -> bool {
        self.invoked > 0
    }

    /// Number of handlers that returned `Ok`
    pub fn succeeded(&self) -> usize {
        self.invoked - self.failures.len()
    }

    /// True if no handler failed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}
