//! Configuration loading and parsing

use crate::events::normalize_event_name;
use anyhow::{bail, Context, Result};
use event_registry::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Optional script to run when no --script is given
    pub script: Option<PathBuf>,
    #[serde(default)]
    pub handlers: Vec<HandlerConfig>,
}

/// A declarative handler bound to one event name
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HandlerConfig {
    pub event: String,
    pub action: HandlerAction,
    /// Message template, `{event}` and `{payload}` are substituted
    pub message: Option<String>,
    /// Label used in the report (default: "<event>#<index>")
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HandlerAction {
    /// Write the message to stdout
    Print,
    /// Emit the message through the logger at info level
    Log,
    /// Only count invocations
    Count,
    /// Return an error carrying the message
    Fail,
}

impl HandlerConfig {
    /// Label for reports and log lines
    pub fn label(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{}#{}", self.event, index))
    }
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    // Relative script paths are resolved against the config file
    if let (Some(script), Some(dir)) = (config.script.as_mut(), path.parent()) {
        if script.is_relative() {
            *script = dir.join(&*script);
        }
    }

    Ok(config)
}

/// Parse and validate configuration text
pub fn parse_config(content: &str) -> Result<AppConfig> {
    let mut config: AppConfig = toml::from_str(content)?;
    normalize(&mut config)?;
    validate(&config)?;
    Ok(config)
}

fn normalize(config: &mut AppConfig) -> Result<()> {
    for (index, handler) in config.handlers.iter_mut().enumerate() {
        match normalize_event_name(&handler.event) {
            Some(name) => handler.event = name.to_string(),
            None => bail!("Handler {} has an empty event name", index),
        }
    }
    Ok(())
}

fn validate(config: &AppConfig) -> Result<()> {
    let mut labels = std::collections::HashSet::new();
    for (index, handler) in config.handlers.iter().enumerate() {
        let label = handler.label(index);
        if !labels.insert(label.clone()) {
            bail!("Duplicate handler name: {}", label);
        }
    }

    Ok(())
}
