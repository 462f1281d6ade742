//! Main registry API
//!
//! [`EventRegistry`] maps event names to ordered handler sequences and
//! dispatches payloads to them synchronously, in registration order, on the
//! calling thread.

use crate::config::{FailurePolicy, RegistryConfig};
use crate::types::{
    DispatchReport, EventName, Handler, HandlerFailure, HandlerId, HandlerResult, RegistryError,
    Result,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// A registered handler together with its id
pub(crate) struct Entry<P> {
    pub(crate) id: HandlerId,
    pub(crate) handler: Handler<P>,
}

impl<P> Clone for Entry<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            handler: Arc::clone(&self.handler),
        }
    }
}

/// Listener registry keyed by event name
///
/// `P` is the payload type shared by every event of this registry.
pub struct EventRegistry<P> {
    listeners: HashMap<EventName, Vec<Entry<P>>>,
    next_id: u64,
    config: RegistryConfig,
}

impl<P> EventRegistry<P> {
    /// Create an empty registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with the given configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            listeners: HashMap::new(),
            next_id: 0,
            config,
        }
    }

    /// Current configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Register an infallible handler under `name`
    ///
    /// The handler is appended after any handler already registered under
    /// the same name. Registration always succeeds.
    ///
    /// # Example
    /// ```
    /// use event_registry::EventRegistry;
    ///
    /// let mut registry = EventRegistry::<String>::new();
    /// registry.register("userClick", |target: &String| println!("clicked {}", target));
    /// registry.dispatch("userClick", &"Button".to_string()).unwrap();
    /// ```
    pub fn register<F>(&mut self, name: impl Into<EventName>, handler: F) -> HandlerId
    where
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.register_fallible(name, move |payload: &P| {
            handler(payload);
            Ok(())
        })
    }

    /// Register a handler that may fail
    pub fn register_fallible<F>(&mut self, name: impl Into<EventName>, handler: F) -> HandlerId
    where
        F: Fn(&P) -> HandlerResult + Send + Sync + 'static,
    {
        self.insert(name.into(), Arc::new(handler))
    }

    pub(crate) fn insert(&mut self, name: EventName, handler: Handler<P>) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;

        log::trace!("Registering handler {} for '{}'", id, name);
        self.listeners
            .entry(name)
            .or_default()
            .push(Entry { id, handler });
        id
    }

    /// Remove a single handler. Returns false if the id is unknown.
    pub fn unregister(&mut self, id: HandlerId) -> bool {
        let mut emptied = None;
        let mut removed = false;

        for (name, entries) in self.listeners.iter_mut() {
            if let Some(pos) = entries.iter().position(|entry| entry.id == id) {
                entries.remove(pos);
                removed = true;
                if entries.is_empty() {
                    emptied = Some(name.clone());
                }
                break;
            }
        }

        if let Some(name) = emptied {
            self.listeners.remove(&name);
        }
        if removed {
            log::trace!("Unregistered handler {}", id);
        }
        removed
    }

    /// Remove every handler registered under `name`, returning how many
    pub fn clear(&mut self, name: &str) -> usize {
        self.listeners.remove(name).map_or(0, |entries| entries.len())
    }

    /// Number of handlers registered under `name`
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.get(name).map_or(0, |entries| entries.len())
    }

    /// Number of handlers across all names
    pub fn total_listener_count(&self) -> usize {
        self.listeners.values().map(|entries| entries.len()).sum()
    }

    /// Names with at least one handler, sorted
    pub fn event_names(&self) -> Vec<&EventName> {
        let mut names: Vec<_> = self.listeners.keys().collect();
        names.sort();
        names
    }

    /// True if no handler is registered
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Dispatch `payload` to every handler registered under `name`
    ///
    /// Handlers run synchronously in registration order. Dispatching a name
    /// with no handlers is a no-op and returns an empty report.
    ///
    /// A failing handler either aborts the dispatch with
    /// [`RegistryError::HandlerFailed`] or is recorded in the report,
    /// depending on [`RegistryConfig::failure_policy`].
    pub fn dispatch(&self, name: &str, payload: &P) -> Result<DispatchReport> {
        match self.listeners.get(name) {
            Some(entries) => run_handlers(&self.config, name, entries, payload),
            None => {
                if self.config.log_dispatch {
                    log::trace!("No handlers for '{}'", name);
                }
                Ok(DispatchReport::default())
            }
        }
    }

    /// Snapshot of the handlers for `name`, in order
    pub(crate) fn snapshot(&self, name: &str) -> Vec<Entry<P>> {
        self.listeners.get(name).cloned().unwrap_or_default()
    }
}

impl<P> Default for EventRegistry<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> fmt::Debug for EventRegistry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .listeners
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.len()))
            .collect();
        f.debug_struct("EventRegistry")
            .field("listeners", &counts)
            .field("config", &self.config)
            .finish()
    }
}

/// Invoke `entries` in order under the configured failure policy
pub(crate) fn run_handlers<P>(
    config: &RegistryConfig,
    name: &str,
    entries: &[Entry<P>],
    payload: &P,
) -> Result<DispatchReport> {
    if config.log_dispatch {
        log::debug!("Dispatching '{}' to {} handler(s)", name, entries.len());
    }

    let mut report = DispatchReport::default();

    for (position, entry) in entries.iter().enumerate() {
        report.invoked += 1;

        if let Err(error) = (entry.handler)(payload) {
            match config.failure_policy {
                FailurePolicy::FailFast => {
                    log::debug!(
                        "Handler {} for '{}' failed, aborting dispatch: {:#}",
                        entry.id,
                        name,
                        error
                    );
                    return Err(RegistryError::HandlerFailed {
                        event: EventName::from(name),
                        handler: entry.id,
                        position,
                        source: error,
                    });
                }
                FailurePolicy::Isolate => {
                    log::warn!("Handler {} for '{}' failed: {:#}", entry.id, name, error);
                    report.failures.push(HandlerFailure {
                        handler: entry.id,
                        position,
                        error,
                    });
                }
            }
        }
    }

    Ok(report)
}
