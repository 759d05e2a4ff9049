//! Global logging for the front-end
//!
//! Thread-safe global logging with per-unit context, cargo-style error
//! reporting and a small macro interface. Nothing is logged until
//! [`init_global_logging`] has been called; the macros are cheap no-ops before
//! that, so the library can be embedded without configuring logging.
//!
//! Diagnostics about the parsed input do not go through this module. They
//! are delivered to the `DiagnosticSink` injected into each parser.

pub mod codes;
pub mod collector;
pub mod config;
pub mod events;
pub mod macros;
pub mod service;

use std::cell::RefCell;
use std::sync::{Arc, OnceLock};

pub use codes::Code;
pub use collector::{ErrorCollector, ProcessingSummary, UnitContext};
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleLogger, Logger, LoggingService, MemoryLogger, StructuredLogger};

// ============================================================================
// GLOBAL STATE
// ============================================================================

static GLOBAL_LOGGER: OnceLock<Arc<LoggingService>> = OnceLock::new();
static GLOBAL_ERROR_COLLECTOR: OnceLock<Arc<ErrorCollector>> = OnceLock::new();

thread_local! {
    static UNIT_CONTEXT: RefCell<Option<UnitContext>> = const { RefCell::new(None) };
}

// ============================================================================
// INITIALIZATION
// ============================================================================

/// Initialize global logging from the runtime preferences
pub fn init_global_logging() -> Result<(), String> {
    config::validate_config().map_err(|e| format!("Configuration validation failed: {}", e))?;

    let service = Arc::new(service::create_configured_service());
    init_global_logging_with_service(Arc::clone(&service))?;

    service.log_event(LogEvent::success(
        codes::success::SYSTEM_INITIALIZATION_COMPLETED,
        "Global logging system initialized",
    ));

    Ok(())
}

/// Initialize with a custom service (primarily for testing)
pub fn init_global_logging_with_service(service: Arc<LoggingService>) -> Result<(), String> {
    GLOBAL_LOGGER
        .set(service)
        .map_err(|_| "Global logger already initialized")?;

    GLOBAL_ERROR_COLLECTOR
        .set(Arc::new(ErrorCollector::new()))
        .map_err(|_| "Global error collector already initialized")?;

    Ok(())
}

pub fn is_initialized() -> bool {
    GLOBAL_LOGGER.get().is_some() && GLOBAL_ERROR_COLLECTOR.get().is_some()
}

pub fn try_get_global_logger() -> Option<&'static LoggingService> {
    GLOBAL_LOGGER.get().map(|service| service.as_ref())
}

pub fn try_get_global_error_collector() -> Option<&'static ErrorCollector> {
    GLOBAL_ERROR_COLLECTOR
        .get()
        .map(|collector| collector.as_ref())
}

/// Whether a debug event would reach the logger
pub fn debug_enabled() -> bool {
    try_get_global_logger()
        .map(|logger| logger.should_log(LogLevel::Debug))
        .unwrap_or(false)
}

/// Route global logging into one shared in-memory logger.
///
/// Tests run in parallel against the same logger, so assertions should filter
/// events by a unit name no other test uses.
#[cfg(test)]
pub(crate) fn capture_logs() -> Arc<MemoryLogger> {
    static CAPTURE: OnceLock<Arc<MemoryLogger>> = OnceLock::new();

    let memory = CAPTURE.get_or_init(|| {
        let memory = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(Arc::clone(&memory) as Arc<dyn Logger>, LogLevel::Info);
        let _ = init_global_logging_with_service(Arc::new(service));
        memory
    });
    Arc::clone(memory)
}

// ============================================================================
// UNIT CONTEXT MANAGEMENT
// ============================================================================

pub fn set_unit_context(unit: Arc<str>, unit_id: usize) {
    if let Some(collector) = try_get_global_error_collector() {
        collector.record_unit(&unit);
    }

    UNIT_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(UnitContext::new(unit, unit_id));
    });
}

pub fn clear_unit_context() {
    UNIT_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = None;
    });
}

/// Run `f` with `unit` as the current unit context
pub fn with_unit_context<F, R>(unit: Arc<str>, unit_id: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    set_unit_context(unit, unit_id);
    let result = f();
    clear_unit_context();
    result
}

pub fn get_current_unit_context() -> Option<UnitContext> {
    UNIT_CONTEXT.with(|ctx| ctx.borrow().clone())
}

// ============================================================================
// MACRO SUPPORT FUNCTIONS
// ============================================================================

fn attach_unit(event: LogEvent) -> (LogEvent, Option<UnitContext>) {
    match get_current_unit_context() {
        Some(unit_ctx) => (
            event
                .with_context("unit", &unit_ctx.unit)
                .with_context("unit_id", &unit_ctx.unit_id.to_string()),
            Some(unit_ctx),
        ),
        None => (event, None),
    }
}

/// Log an event with context pairs; errors and warnings are also collected
pub fn log_with_context(event: LogEvent, context: Vec<(&str, &str)>) {
    let Some(logger) = try_get_global_logger() else {
        return;
    };

    let mut event = event;
    for (key, value) in context {
        event = event.with_context(key, value);
    }
    let (event, unit_ctx) = attach_unit(event);

    if event.is_error() || event.is_warning() {
        if let (Some(unit_ctx), Some(collector)) = (unit_ctx, try_get_global_error_collector()) {
            collector.record_event(&unit_ctx.unit, event.clone());
        }
    }

    logger.log_event(event);
}

/// Used by `log_error!`
pub fn log_error_with_context(
    code: Code,
    message: &str,
    span: Option<crate::utils::SourceSpan>,
    context: Vec<(&str, &str)>,
) {
    let mut event = LogEvent::error(code, message);
    if let Some(s) = span {
        event = event.with_span(s);
    }
    log_with_context(event, context);
}

/// Used by `log_success!`
pub fn log_success_with_context(code: Code, message: &str, context: Vec<(&str, &str)>) {
    log_with_context(LogEvent::success(code, message), context);
}

// ============================================================================
// BATCH REPORTING
// ============================================================================

pub fn get_processing_summary() -> ProcessingSummary {
    try_get_global_error_collector()
        .map(|collector| collector.get_summary())
        .unwrap_or_default()
}

/// Cargo-style summary of everything collected so far, if logging is active
pub fn cargo_style_summary() -> Option<String> {
    try_get_global_error_collector().map(collector::format_cargo_style_errors)
}

pub fn get_system_diagnostics() -> String {
    let mut diagnostics = String::new();

    diagnostics.push_str("=== Logging System Diagnostics ===\n");
    diagnostics.push_str(&format!("Initialized: {}\n", is_initialized()));

    let summary = get_processing_summary();
    diagnostics.push_str(&format!("Units processed: {}\n", summary.total_units));
    diagnostics.push_str(&format!("Total errors: {}\n", summary.total_errors));
    diagnostics.push('\n');
    diagnostics.push_str(&config::get_config_summary());

    diagnostics
}

/// Error logging that falls back to stderr when logging is not initialized
pub fn safe_log_error(code: Code, message: &str) {
    match try_get_global_logger() {
        Some(logger) => logger.log_event(LogEvent::error(code, message)),
        None => eprintln!("[ERROR] FALLBACK: [{}] {}", code.as_str(), message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_context_management() {
        let unit: Arc<str> = Arc::from("CMakeLists.txt");

        assert!(get_current_unit_context().is_none());

        set_unit_context(Arc::clone(&unit), 1);
        let context = get_current_unit_context();
        assert_eq!(context.map(|c| c.unit), Some(Arc::clone(&unit)));

        clear_unit_context();
        assert!(get_current_unit_context().is_none());
    }

    #[test]
    fn test_with_unit_context() {
        let result = with_unit_context(Arc::from("main.cpp"), 2, || {
            let context = get_current_unit_context().unwrap();
            assert_eq!(&*context.unit, "main.cpp");
            assert_eq!(context.unit_id, 2);
            42
        });

        assert_eq!(result, 42);
        assert!(get_current_unit_context().is_none());
    }

    #[test]
    fn test_captured_events_carry_unit_context() {
        let memory = capture_logs();

        with_unit_context(Arc::from("captured.cmake"), 7, || {
            crate::log_error!(codes::system::INTERNAL_ERROR, "captured", "stage" => "test");
        });

        let events: Vec<_> = memory
            .get_events()
            .into_iter()
            .filter(|e| e.context.get("unit").map(String::as_str) == Some("captured.cmake"))
            .collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].code, codes::system::INTERNAL_ERROR);
        assert_eq!(events[0].context.get("unit_id").map(String::as_str), Some("7"));
        assert_eq!(events[0].context.get("stage").map(String::as_str), Some("test"));
    }

    #[test]
    fn test_safe_logging_without_init() {
        safe_log_error(codes::system::INTERNAL_ERROR, "Test error");
    }

    #[test]
    fn test_diagnostics_report() {
        let diagnostics = get_system_diagnostics();
        assert!(diagnostics.contains("Logging System Diagnostics"));
        assert!(diagnostics.contains("Logging Configuration"));
    }
}
