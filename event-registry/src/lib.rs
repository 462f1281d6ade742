//! Event Registry Library
//!
//! A small, synchronous event-emitter: handlers are registered under event
//! names and dispatched in registration order on the caller's thread.
//!
//! # Architecture
//!
//! - [`EventRegistry`] owns the name → handler sequence mapping. Registration
//!   needs `&mut self`, dispatch only `&self`, so the handler sequence cannot
//!   change while a dispatch is running.
//! - [`SharedRegistry`] wraps a registry for use from several threads.
//! - [`RegistryConfig`] selects the handler failure policy.
//!
//! The library does NOT:
//! - Queue or defer events
//! - Match wildcard or namespaced event names
//! - Persist registrations
//!
//! # Example Usage
//!
//! ```
//! use event_registry::{EventRegistry, FailurePolicy, RegistryConfig};
//!
//! let config = RegistryConfig::new().with_failure_policy(FailurePolicy::Isolate);
//! let mut registry = EventRegistry::<String>::with_config(config);
//!
//! registry.register("userClick", |target: &String| {
//!     println!("User clicked: {}", target);
//! });
//! registry.register_fallible("userClick", |target: &String| {
//!     anyhow::ensure!(!target.is_empty(), "empty click target");
//!     Ok(())
//! });
//!
//! let report = registry.dispatch("userClick", &"Button".to_string()).unwrap();
//! assert_eq!(report.invoked, 2);
//!
//! // Unknown names are a silent no-op
//! let report = registry.dispatch("event", &String::new()).unwrap();
//! assert_eq!(report.invoked, 0);
//! ```

// Public modules
pub mod config;
pub mod registry;
pub mod shared;
pub mod types;

// Re-export main types for convenience
pub use config::{FailurePolicy, RegistryConfig};
pub use registry::EventRegistry;
pub use shared::SharedRegistry;
pub use types::{
    DispatchReport, EventName, Handler, HandlerFailure, HandlerId, HandlerResult, RegistryError,
    Result,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
