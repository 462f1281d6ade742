//! Thread-safe registry handle
//!
//! [`SharedRegistry`] serializes registration and dispatch from concurrent
//! callers. Dispatch copies the handler sequence under a read lock and
//! invokes it after the lock is released, so a handler may register or
//! unregister on the same registry without deadlocking. Handlers added that
//! way are not part of the dispatch already in progress.

use crate::config::RegistryConfig;
use crate::registry::{run_handlers, EventRegistry};
use crate::types::{DispatchReport, EventName, HandlerId, HandlerResult, RegistryError, Result};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Cloneable, `Send + Sync` handle to an [`EventRegistry`]
pub struct SharedRegistry<P> {
    inner: Arc<RwLock<EventRegistry<P>>>,
}

impl<P> Clone for SharedRegistry<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> SharedRegistry<P> {
    /// Create an empty shared registry with default configuration
    pub fn new() -> Self {
        Self::from_registry(EventRegistry::new())
    }

    /// Create an empty shared registry with the given configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self::from_registry(EventRegistry::with_config(config))
    }

    /// Wrap an existing registry
    pub fn from_registry(registry: EventRegistry<P>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(registry)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, EventRegistry<P>>> {
        self.inner.read().map_err(|_| RegistryError::LockPoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, EventRegistry<P>>> {
        self.inner.write().map_err(|_| RegistryError::LockPoisoned)
    }

    /// Register an infallible handler under `name`
    pub fn register<F>(&self, name: impl Into<EventName>, handler: F) -> Result<HandlerId>
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        Ok(self.write()?.register(name, handler))
    }

    /// Register a handler that may fail
    pub fn register_fallible<F>(&self, name: impl Into<EventName>, handler: F) -> Result<HandlerId>
    where
        F: Fn(&P) -> HandlerResult + Send + Sync + 'static,
    {
        Ok(self.write()?.register_fallible(name, handler))
    }

    /// Remove a single handler
    pub fn unregister(&self, id: HandlerId) -> Result<bool> {
        Ok(self.write()?.unregister(id))
    }

    /// Remove every handler registered under `name`
    pub fn clear(&self, name: &str) -> Result<usize> {
        Ok(self.write()?.clear(name))
    }

    /// Number of handlers registered under `name`
    pub fn listener_count(&self, name: &str) -> Result<usize> {
        Ok(self.read()?.listener_count(name))
    }

    /// Number of handlers across all names
    pub fn total_listener_count(&self) -> Result<usize> {
        Ok(self.read()?.total_listener_count())
    }

    /// Dispatch `payload` to the handlers registered under `name` when the
    /// call begins
    pub fn dispatch(&self, name: &str, payload: &P) -> Result<DispatchReport> {
        let (config, entries) = {
            let registry = self.read()?;
            (registry.config().clone(), registry.snapshot(name))
        };

        if entries.is_empty() {
            if config.log_dispatch {
                log::trace!("No handlers for '{}'", name);
            }
            return Ok(DispatchReport::default());
        }

        run_handlers(&config, name, &entries, payload)
    }
}

impl<P> Default for SharedRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}
