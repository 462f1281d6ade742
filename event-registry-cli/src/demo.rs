//! Built-in demo
//!
//! Replays the two classic emitter scenarios: a UI component that owns its
//! own registry and exposes a narrow click API, and a bare emitter with a
//! single parameterless event.

use anyhow::Result;
use chrono::{DateTime, Utc};
use event_registry::{DispatchReport, EventRegistry, HandlerId};

const CLICK_EVENT: &str = "userClick";

/// Payload delivered to click handlers
#[derive(Debug, Clone, PartialEq)]
pub struct ClickEvent {
    pub target: String,
    pub at: DateTime<Utc>,
}

/// A button that notifies its listeners when clicked
///
/// The registry is an implementation detail: callers only see `on_click`
/// and `click`.
pub struct Button {
    label: String,
    events: EventRegistry<ClickEvent>,
}

impl Button {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            events: EventRegistry::new(),
        }
    }

    pub fn on_click<F>(&mut self, handler: F) -> HandlerId
    where
        F: Fn(&ClickEvent) + Send + Sync + 'static,
    {
        self.events.register(CLICK_EVENT, handler)
    }

    pub fn click(&self) -> Result<DispatchReport> {
        let event = ClickEvent {
            target: self.label.clone(),
            at: Utc::now(),
        };
        Ok(self.events.dispatch(CLICK_EVENT, &event)?)
    }
}

/// Run both scenarios, printing what the handlers do
pub fn run_demo() -> Result<()> {
    println!("═══════════════════════════════════════════════");
    println!("  Event Registry - Demo");
    println!("═══════════════════════════════════════════════\n");

    let mut button = Button::new("Button");
    button.on_click(|click: &ClickEvent| {
        println!(
            "User clicked: {{ target: {:?} }} at {}",
            click.target,
            click.at.format("%H:%M:%S")
        );
    });
    let report = button.click()?;
    log::debug!("userClick reached {} handler(s)", report.invoked);

    let mut emitter = EventRegistry::<()>::new();
    emitter.register("event", |_: &()| println!("an event occurred!"));
    emitter.dispatch("event", &())?;

    // Nobody listens for this one
    let report = emitter.dispatch("unheard", &())?;
    println!("\nDispatching 'unheard' reached {} handler(s)", report.invoked);

    Ok(())
}
