//! Invocation tracking for declarative handlers
//!
//! Each configured handler gets a [`HandlerStats`] whose counter is shared
//! with the closure registered in the event registry.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Per-handler invocation counters
#[derive(Debug, Clone)]
pub struct HandlerStats {
    pub label: String,
    pub event: String,
    invocations: Arc<AtomicUsize>,
    failures: Arc<AtomicUsize>,
}

impl HandlerStats {
    pub fn new(label: impl Into<String>, event: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            event: event.into(),
            invocations: Arc::new(AtomicUsize::new(0)),
            failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn record_invocation(&self) {
        self.invocations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn invocations(&self) -> usize {
        self.invocations.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }
}
