//! Declarative callbacks
//!
//! Turns the `[[handlers]]` entries of the configuration into closures
//! registered on an [`EventRegistry`] over JSON payloads.

use crate::config::{AppConfig, HandlerAction, HandlerConfig};
use crate::state::HandlerStats;
use event_registry::{EventRegistry, RegistryConfig};
use serde_json::Value;

/// Default message when a handler has no template
const DEFAULT_TEMPLATE: &str = "{event}: {payload}";

/// Build a registry with one handler per configured entry, in file order
pub fn build_registry(
    config: &AppConfig,
    registry_config: RegistryConfig,
) -> (EventRegistry<Value>, Vec<HandlerStats>) {
    let mut registry = EventRegistry::with_config(registry_config);
    let mut stats = Vec::with_capacity(config.handlers.len());

    for (index, handler) in config.handlers.iter().enumerate() {
        let tracker = HandlerStats::new(handler.label(index), handler.event.clone());
        let id = bind(&mut registry, handler, tracker.clone());
        log::debug!(
            "Bound handler '{}' ({:?}) to '{}' as {}",
            tracker.label,
            handler.action,
            handler.event,
            id
        );
        stats.push(tracker);
    }

    (registry, stats)
}

fn bind(
    registry: &mut EventRegistry<Value>,
    handler: &HandlerConfig,
    tracker: HandlerStats,
) -> event_registry::HandlerId {
    let event = handler.event.clone();
    let template = handler
        .message
        .clone()
        .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string());

    match handler.action {
        HandlerAction::Print => registry.register(handler.event.clone(), move |payload: &Value| {
            tracker.record_invocation();
            println!("{}", render_message(&template, &event, payload));
        }),
        HandlerAction::Log => registry.register(handler.event.clone(), move |payload: &Value| {
            tracker.record_invocation();
            log::info!("[{}] {}", tracker.label, render_message(&template, &event, payload));
        }),
        HandlerAction::Count => registry.register(handler.event.clone(), move |_: &Value| {
            tracker.record_invocation();
        }),
        HandlerAction::Fail => {
            registry.register_fallible(handler.event.clone(), move |payload: &Value| {
                tracker.record_invocation();
                tracker.record_failure();
                anyhow::bail!("{}", render_message(&template, &event, payload))
            })
        }
    }
}

/// Substitute `{event}` and `{payload}` in a message template
pub fn render_message(template: &str, event: &str, payload: &Value) -> String {
    let payload_text = match payload {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    template
        .replace("{event}", event)
        .replace("{payload}", &payload_text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;
    use event_registry::FailurePolicy;
    use serde_json::json;

    #[test]
    fn test_render_message() {
        let payload = json!({"target": "Button"});
        assert_eq!(
            render_message("User clicked: {payload}", "userClick", &payload),
            r#"User clicked: {"target":"Button"}"#
        );
        assert_eq!(
            render_message(DEFAULT_TEMPLATE, "greet", &json!("hi")),
            "greet: hi"
        );
    }

    #[test]
    fn test_build_registry_binds_in_order() {
        let config = parse_config(
            r#"
            [[handlers]]
            event = "userClick"
            action = "count"

            [[handlers]]
            event = "userClick"
            action = "log"

            [[handlers]]
            event = "other"
            action = "count"
            "#,
        )
        .unwrap();

        let (registry, stats) = build_registry(&config, config.registry.clone());
        assert_eq!(registry.listener_count("userClick"), 2);
        assert_eq!(registry.listener_count("other"), 1);

        let report = registry
            .dispatch("userClick", &json!({"target": "Button"}))
            .unwrap();
        assert_eq!(report.invoked, 2);
        assert_eq!(stats[0].invocations(), 1);
        assert_eq!(stats[1].invocations(), 1);
        assert_eq!(stats[2].invocations(), 0);
    }

    #[test]
    fn test_fail_action_under_both_policies() {
        let config = parse_config(
            r#"
            [[handlers]]
            event = "job"
            action = "fail"
            message = "cannot run {event}"

            [[handlers]]
            event = "job"
            action = "count"
            "#,
        )
        .unwrap();

        let (strict, stats) = build_registry(&config, RegistryConfig::new());
        let err = strict.dispatch("job", &Value::Null).unwrap_err();
        assert!(crate::report::error_chain(&err).ends_with(": cannot run job"));
        assert_eq!(stats[0].failures(), 1);
        assert_eq!(stats[1].invocations(), 0);

        let isolate = RegistryConfig::new().with_failure_policy(FailurePolicy::Isolate);
        let (lenient, stats) = build_registry(&config, isolate);
        let report = lenient.dispatch("job", &Value::Null).unwrap();
        assert_eq!(report.failures.len(), 1);
        assert_eq!(stats[1].invocations(), 1);
    }
}
