//! Event scripts
//!
//! A script is a JSON-lines file with one `{"event": ..., "payload": ...}`
//! object per line. Blank lines and lines starting with `#` are skipped.
//! Events from `--emit NAME[=JSON]` arguments are appended after the script.

use crate::report::RunReport;
use event_registry::{EventRegistry, RegistryError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One event to dispatch
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ScriptEvent {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

/// Errors raised while reading scripts and `--emit` arguments
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Invalid script line {line}: {source}")]
    InvalidLine {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Empty event name in '{0}'")]
    EmptyEventName(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Trim surrounding whitespace from an event name, `None` if nothing is left
///
/// Config handlers, script lines and `--emit` arguments all go through this.
pub fn normalize_event_name(raw: &str) -> Option<&str> {
    let name = raw.trim();
    (!name.is_empty()).then_some(name)
}

/// Read a script file
pub fn load_script(path: &Path) -> Result<Vec<ScriptEvent>, ScriptError> {
    log::info!("Loading event script: {:?}", path);
    let file = File::open(path)?;
    parse_script(BufReader::new(file))
}

/// Parse JSON-lines script content
pub fn parse_script<R: BufRead>(reader: R) -> Result<Vec<ScriptEvent>, ScriptError> {
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut event: ScriptEvent =
            serde_json::from_str(trimmed).map_err(|source| ScriptError::InvalidLine {
                line: index + 1,
                source,
            })?;
        event.event = normalize_event_name(&event.event)
            .ok_or_else(|| ScriptError::EmptyEventName(trimmed.to_string()))?
            .to_string();
        events.push(event);
    }

    log::debug!("Parsed {} scripted event(s)", events.len());
    Ok(events)
}

/// Parse an `--emit` argument: `NAME` or `NAME=JSON`
///
/// A payload that is not valid JSON is taken as a plain string.
pub fn parse_emit_arg(arg: &str) -> Result<ScriptEvent, ScriptError> {
    let (name, payload) = match arg.split_once('=') {
        Some((name, raw)) => {
            let payload = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            (name, payload)
        }
        None => (arg, Value::Null),
    };

    let name =
        normalize_event_name(name).ok_or_else(|| ScriptError::EmptyEventName(arg.to_string()))?;

    Ok(ScriptEvent {
        event: name.to_string(),
        payload,
    })
}

/// Dispatch `events` in order, recording the outcome of each
///
/// Stops at the first dispatch aborted by a failing handler and returns
/// that error.
pub fn run_events(
    registry: &EventRegistry<Value>,
    events: &[ScriptEvent],
    report: &mut RunReport,
) -> Result<(), RegistryError> {
    for scripted in events {
        match registry.dispatch(&scripted.event, &scripted.payload) {
            Ok(outcome) => report.record_dispatch(&scripted.event, &outcome),
            Err(err) => {
                report.record_abort(&scripted.event, &err);
                return Err(err);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Cursor;

    #[test]
    fn test_parse_script() {
        let content = r#"
# clicks
{"event": "userClick", "payload": {"target": "Button"}}

{"event": "event"}
"#;

        let events = parse_script(Cursor::new(content)).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].payload, json!({"target": "Button"}));
        assert_eq!(events[1].event, "event");
        assert_eq!(events[1].payload, Value::Null);
    }

    #[test]
    fn test_parse_script_reports_line() {
        let content = "{\"event\": \"ok\"}\nnot json\n";

        match parse_script(Cursor::new(content)) {
            Err(ScriptError::InvalidLine { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_parse_script_rejects_empty_name() {
        let result = parse_script(Cursor::new("{\"event\": \"\"}\n"));
        assert!(matches!(result, Err(ScriptError::EmptyEventName(_))));

        let blank = parse_script(Cursor::new("{\"event\": \"  \"}\n"));
        assert!(matches!(blank, Err(ScriptError::EmptyEventName(_))));
    }

    #[test]
    fn test_event_names_are_trimmed_everywhere() {
        let scripted = parse_script(Cursor::new("{\"event\": \" userClick \"}\n")).unwrap();
        assert_eq!(scripted[0].event, "userClick");

        let emitted = parse_emit_arg(" userClick =1").unwrap();
        assert_eq!(emitted.event, "userClick");

        assert_eq!(normalize_event_name("\tevent\n"), Some("event"));
        assert_eq!(normalize_event_name(" \t "), None);
        assert!(parse_emit_arg("  =1").is_err());
    }

    #[test]
    fn test_parse_emit_arg() {
        let event = parse_emit_arg(r#"userClick={"target":"Button"}"#).unwrap();
        assert_eq!(event.event, "userClick");
        assert_eq!(event.payload, json!({"target": "Button"}));

        let bare = parse_emit_arg("event").unwrap();
        assert_eq!(bare.payload, Value::Null);

        let text = parse_emit_arg("greet=hello world").unwrap();
        assert_eq!(text.payload, json!("hello world"));

        assert!(parse_emit_arg("=1").is_err());
    }

    #[test]
    fn test_run_events_stops_on_abort() {
        let mut registry = EventRegistry::<Value>::new();
        registry.register_fallible("bad", |_: &Value| anyhow::bail!("nope"));
        registry.register("good", |_: &Value| {});

        let events = vec![
            parse_emit_arg("good").unwrap(),
            parse_emit_arg("bad").unwrap(),
            parse_emit_arg("good").unwrap(),
        ];

        let mut report = RunReport::start();
        assert!(run_events(&registry, &events, &mut report).is_err());
        assert_eq!(report.tally("good").map(|t| t.dispatched), Some(1));
        assert!(report.aborted.is_some());
    }
}
