//! Per-unit event collection with cargo-style output

use super::events::LogEvent;
use crate::config::compile_time::logging::MAX_LOG_EVENTS_PER_UNIT;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// The unit currently being processed on this thread
#[derive(Debug, Clone)]
pub struct UnitContext {
    pub unit: Arc<str>,
    pub unit_id: usize,
    pub start_time: Instant,
}

impl UnitContext {
    pub fn new(unit: Arc<str>, unit_id: usize) -> Self {
        Self {
            unit,
            unit_id,
            start_time: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProcessingSummary {
    pub total_units: usize,
    pub clean_units: usize,
    pub failed_units: usize,
    pub units_with_warnings: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
    pub total_processing_time: Duration,
}

impl ProcessingSummary {
    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }
}

/// Thread-safe event collector keyed by unit
pub struct ErrorCollector {
    unit_events: Mutex<BTreeMap<String, Vec<LogEvent>>>,
    processing_start: Instant,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self {
            unit_events: Mutex::new(BTreeMap::new()),
            processing_start: Instant::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, Vec<LogEvent>>> {
        self.unit_events.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make a unit known even if it never logs anything
    pub fn record_unit(&self, unit: &str) {
        self.lock().entry(unit.to_string()).or_default();
    }

    pub fn record_event(&self, unit: &str, event: LogEvent) {
        let mut events = self.lock();
        let unit_events = events.entry(unit.to_string()).or_default();

        if unit_events.len() < MAX_LOG_EVENTS_PER_UNIT {
            unit_events.push(event);
        } else if unit_events.len() == MAX_LOG_EVENTS_PER_UNIT {
            unit_events.push(LogEvent::warning(&format!(
                "Too many events for unit (limit: {})",
                MAX_LOG_EVENTS_PER_UNIT
            )));
        }
    }

    pub fn get_unit_events(&self, unit: &str) -> Vec<LogEvent> {
        self.lock().get(unit).cloned().unwrap_or_default()
    }

    pub fn get_unit_errors(&self, unit: &str) -> Vec<LogEvent> {
        self.lock()
            .get(unit)
            .map(|events| events.iter().filter(|e| e.is_error()).cloned().collect())
            .unwrap_or_default()
    }

    pub fn get_all_unit_events(&self) -> BTreeMap<String, Vec<LogEvent>> {
        self.lock().clone()
    }

    pub fn get_summary(&self) -> ProcessingSummary {
        let events = self.lock();

        let mut summary = ProcessingSummary {
            total_units: events.len(),
            total_processing_time: self.processing_start.elapsed(),
            ..ProcessingSummary::default()
        };

        for unit_events in events.values() {
            let errors = unit_events.iter().filter(|e| e.is_error()).count();
            let warnings = unit_events.iter().filter(|e| e.is_warning()).count();

            if errors > 0 {
                summary.failed_units += 1;
            } else if warnings > 0 {
                summary.units_with_warnings += 1;
            } else {
                summary.clean_units += 1;
            }

            summary.total_errors += errors;
            summary.total_warnings += warnings;
        }

        summary
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

impl Default for ErrorCollector {
    fn default() -> Self {
        Self::new()
    }
}

fn push_context(output: &mut String, event: &LogEvent) {
    for (key, value) in &event.context {
        if key != "unit" && key != "unit_id" {
            output.push_str(&format!("  = {}: {}\n", key, value));
        }
    }
}

/// Render collected errors and warnings grouped by unit
pub fn format_cargo_style_errors(collector: &ErrorCollector) -> String {
    let mut output = String::new();

    for (unit, events) in &collector.get_all_unit_events() {
        let reportable: Vec<_> = events
            .iter()
            .filter(|e| e.is_error() || e.is_warning())
            .collect();
        if reportable.is_empty() {
            continue;
        }

        output.push_str(&format!("Checking {}...\n", unit));

        for event in reportable {
            let label = if event.is_error() { "error" } else { "warning" };
            let span_info = event
                .span
                .as_ref()
                .map(|s| format!(" --> {}:{}:{}", unit, s.start.line(), s.start.column()))
                .unwrap_or_default();

            output.push_str(&format!(
                "{}[{}]: {}{}\n",
                label,
                event.code.as_str(),
                event.message,
                span_info
            ));
            push_context(&mut output, event);

            if event.is_error() {
                let action = event.recommended_action();
                if action != "No specific action available" {
                    output.push_str(&format!("  = help: {}\n", action));
                }
            }
        }

        output.push('\n');
    }

    let summary = collector.get_summary();
    output.push_str(&format!(
        "{} unit(s) checked: {} clean, {} failed, {} error(s), {} warning(s)\n",
        summary.total_units,
        summary.clean_units + summary.units_with_warnings,
        summary.failed_units,
        summary.total_errors,
        summary.total_warnings
    ));

    output
}
