// RUNTIME PREFERENCES (User Experience)

use serde::{Deserialize, Serialize};
use std::env;

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LexicalPreferences {
    /// Split the whole unit into terms before the first one is consumed
    pub eager_terms: bool,

    /// Whether to count tokens per terminal and log the breakdown
    pub track_terminal_counts: bool,
}

impl Default for LexicalPreferences {
    fn default() -> Self {
        Self {
            eager_terms: env_flag(env_vars::LEXICAL_EAGER_TERMS, false),
            track_terminal_counts: env_flag(env_vars::LEXICAL_TRACK_TERMINAL_COUNTS, true),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyntaxPreferences {
    /// Whether the CLI echoes each diagnostic as it is reported
    pub echo_diagnostics: bool,

    /// Whether every expect() call is logged at debug level
    pub log_expectations: bool,
}

impl Default for SyntaxPreferences {
    fn default() -> Self {
        Self {
            echo_diagnostics: env_flag(env_vars::SYNTAX_ECHO_DIAGNOSTICS, true),
            log_expectations: env_flag(env_vars::SYNTAX_LOG_EXPECTATIONS, false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Minimum level that reaches the logger
    pub min_log_level: LogLevel,

    /// Whether to print a cargo-style summary at the end of a run
    pub enable_cargo_style_output: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        Self {
            use_structured_logging: env_flag(env_vars::LOGGING_USE_STRUCTURED, false),
            enable_console_logging: env_flag(env_vars::LOGGING_ENABLE_CONSOLE, false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| parse_log_level(&v))
                .unwrap_or(LogLevel::Info),
            enable_cargo_style_output: env_flag(env_vars::LOGGING_CARGO_STYLE, true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }

    pub fn to_events_log_level(&self) -> crate::logging::events::LogLevel {
        match self {
            LogLevel::Error => crate::logging::events::LogLevel::Error,
            LogLevel::Warning => crate::logging::events::LogLevel::Warning,
            LogLevel::Info => crate::logging::events::LogLevel::Info,
            LogLevel::Debug => crate::logging::events::LogLevel::Debug,
        }
    }
}

/// Parse log level from string (used for environment variables)
pub fn parse_log_level(level: &str) -> Option<LogLevel> {
    match level.to_lowercase().as_str() {
        "error" | "0" => Some(LogLevel::Error),
        "warning" | "warn" | "1" => Some(LogLevel::Warning),
        "info" | "2" => Some(LogLevel::Info),
        "debug" | "3" => Some(LogLevel::Debug),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub lexical: LexicalPreferences,
    pub syntax: SyntaxPreferences,
    pub logging: LoggingPreferences,
}

impl RuntimeConfig {
    /// Preferences as read from the environment
    pub fn from_env() -> Self {
        Self::default()
    }
}

/// Environment variable names for configuration
pub mod env_vars {
    // Lexical
    pub const LEXICAL_EAGER_TERMS: &str = "FRONTEND_LEXICAL_EAGER_TERMS";
    pub const LEXICAL_TRACK_TERMINAL_COUNTS: &str = "FRONTEND_LEXICAL_TRACK_TERMINAL_COUNTS";

    // Syntax
    pub const SYNTAX_ECHO_DIAGNOSTICS: &str = "FRONTEND_SYNTAX_ECHO_DIAGNOSTICS";
    pub const SYNTAX_LOG_EXPECTATIONS: &str = "FRONTEND_SYNTAX_LOG_EXPECTATIONS";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "FRONTEND_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "FRONTEND_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "FRONTEND_LOGGING_MIN_LEVEL";
    pub const LOGGING_CARGO_STYLE: &str = "FRONTEND_LOGGING_CARGO_STYLE";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_parsing() {
        assert_eq!(parse_log_level("error"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("ERROR"), Some(LogLevel::Error));
        assert_eq!(parse_log_level("warn"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("1"), Some(LogLevel::Warning));
        assert_eq!(parse_log_level("Info"), Some(LogLevel::Info));
        assert_eq!(parse_log_level("3"), Some(LogLevel::Debug));
        assert_eq!(parse_log_level("verbose"), None);
    }

    #[test]
    fn test_log_level_ordering_matches_events() {
        assert!(LogLevel::Error < LogLevel::Debug);
        assert_eq!(
            LogLevel::Warning.to_events_log_level(),
            crate::logging::events::LogLevel::Warning
        );
    }

    #[test]
    fn test_runtime_config_serializes() {
        let config = RuntimeConfig::from_env();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"eager_terms\""));
        assert!(json.contains("\"min_log_level\""));

        let back: RuntimeConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.lexical.eager_terms, config.lexical.eager_terms);
    }

    #[test]
    fn test_env_var_names_are_prefixed() {
        for name in [
            env_vars::LEXICAL_EAGER_TERMS,
            env_vars::SYNTAX_ECHO_DIAGNOSTICS,
            env_vars::LOGGING_MIN_LEVEL,
        ] {
            assert!(name.starts_with("FRONTEND_"));
        }
    }
}
