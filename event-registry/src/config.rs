//! Registry configuration types
//!
//! The registry has very little to configure: what happens when a handler
//! fails, and whether dispatches are logged.

use serde::{Deserialize, Serialize};

/// What a dispatch does when one of its handlers returns an error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Stop at the first failing handler and return the error
    #[default]
    #[serde(alias = "fail-fast")]
    FailFast,
    /// Log the failure, record it in the report and keep going
    Isolate,
}

/// Configuration for an event registry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Handler failure policy (default: fail fast)
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Log every dispatch at debug level (default: true)
    #[serde(default = "default_true")]
    pub log_dispatch: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            failure_policy: FailurePolicy::default(),
            log_dispatch: true,
        }
    }
}

impl RegistryConfig {
    /// Create a new registry configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the handler failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Builder method: enable or disable dispatch logging
    pub fn with_dispatch_logging(mut self, enabled: bool) -> Self {
        self.log_dispatch = enabled;
        self
    }

    /// Check if failures should be isolated
    pub fn isolates_failures(&self) -> bool {
        self.failure_policy == FailurePolicy::Isolate
    }
}
