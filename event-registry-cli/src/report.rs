//! Run report
//!
//! Collects per-event dispatch tallies during a run and renders them, together
//! with per-handler counters, as a plain text summary.

use crate::state::HandlerStats;
use chrono::{DateTime, Utc};
use event_registry::{DispatchReport, RegistryError};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;

/// Dispatch totals for one event name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTally {
    pub dispatched: usize,
    pub invoked: usize,
    pub failures: usize,
    /// Dispatches that found no handler
    pub unmatched: usize,
}

/// Outcome of a whole run
#[derive(Debug)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    tallies: BTreeMap<String, EventTally>,
    sequence: Vec<String>,
    /// Event and message of the dispatch that aborted the run
    pub aborted: Option<(String, String)>,
}

impl RunReport {
    pub fn start() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            tallies: BTreeMap::new(),
            sequence: Vec::new(),
            aborted: None,
        }
    }

    pub fn record_dispatch(&mut self, event: &str, outcome: &DispatchReport) {
        self.sequence.push(event.to_string());
        let tally = self.tallies.entry(event.to_string()).or_default();
        tally.dispatched += 1;
        tally.invoked += outcome.invoked;
        tally.failures += outcome.failures.len();
        if !outcome.matched() {
            tally.unmatched += 1;
        }
    }

    pub fn record_abort(&mut self, event: &str, err: &RegistryError) {
        self.sequence.push(event.to_string());
        let tally = self.tallies.entry(event.to_string()).or_default();
        tally.dispatched += 1;
        tally.failures += 1;
        if let RegistryError::HandlerFailed { position, .. } = err {
            tally.invoked += position + 1;
        }
        self.aborted = Some((event.to_string(), error_chain(err)));
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    #[cfg(test)]
    pub fn tally(&self, event: &str) -> Option<&EventTally> {
        self.tallies.get(event)
    }

    pub fn total_dispatches(&self) -> usize {
        self.tallies.values().map(|t| t.dispatched).sum()
    }

    /// Event names in the order they were dispatched
    pub fn sequence(&self) -> &[String] {
        &self.sequence
    }

    /// Text view of the report together with the handler counters
    pub fn view<'a>(&'a self, handlers: &'a [HandlerStats]) -> ReportView<'a> {
        ReportView {
            report: self,
            handlers,
        }
    }
}

/// Message of `err` followed by each of its causes
pub fn error_chain(err: &dyn Error) -> String {
    let mut text = err.to_string();
    let mut cause = err.source();
    while let Some(inner) = cause {
        text.push_str(": ");
        text.push_str(&inner.to_string());
        cause = inner.source();
    }
    text
}

/// Plain text rendering of a [`RunReport`]
pub struct ReportView<'a> {
    report: &'a RunReport,
    handlers: &'a [HandlerStats],
}

impl fmt::Display for ReportView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        let finished = report.finished_at.unwrap_or_else(Utc::now);
        let elapsed = finished - report.started_at;

        writeln!(f, "═══════════════════════════════════════════════")?;
        writeln!(f, "  Event Registry - Run Summary")?;
        writeln!(f, "═══════════════════════════════════════════════")?;
        writeln!(f, "Started:  {}", report.started_at.to_rfc3339())?;
        writeln!(f, "Finished: {}", finished.to_rfc3339())?;
        writeln!(f, "Elapsed:  {} ms", elapsed.num_milliseconds())?;
        writeln!(f, "Dispatches: {}", report.total_dispatches())?;
        if !report.sequence.is_empty() {
            writeln!(f, "Sequence: {}", report.sequence.join(" → "))?;
        }

        writeln!(f, "\nEvents:")?;
        if report.tallies.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for (event, tally) in &report.tallies {
            writeln!(
                f,
                "  {:<20} dispatched={} invoked={} failed={} unmatched={}",
                event, tally.dispatched, tally.invoked, tally.failures, tally.unmatched
            )?;
        }

        writeln!(f, "\nHandlers:")?;
        if self.handlers.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for stats in self.handlers {
            writeln!(
                f,
                "  {:<20} event={} calls={} failed={}",
                stats.label,
                stats.event,
                stats.invocations(),
                stats.failures()
            )?;
        }

        if let Some((event, message)) = &report.aborted {
            writeln!(f, "\n✗ Aborted while dispatching '{}': {}", event, message)?;
        }

        Ok(())
    }
}
