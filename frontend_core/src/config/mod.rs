//! Configuration for the front-end core
//!
//! Hard limits are generated at build time from `config/<profile>.toml`;
//! user preferences live in [`runtime`] and are read from the environment.

include!(concat!(env!("OUT_DIR"), "/constants.rs"));

pub mod runtime;

pub use runtime::{LexicalPreferences, LoggingPreferences, RuntimeConfig, SyntaxPreferences};

/// Build information and configuration metadata
pub mod build_info {
    /// Configuration profile used during build
    pub fn profile() -> &'static str {
        option_env!("FRONTEND_BUILD_PROFILE").unwrap_or("development")
    }

    /// Configuration directory used during build
    pub fn config_dir() -> &'static str {
        option_env!("FRONTEND_CONFIG_DIR").unwrap_or("config")
    }

    pub fn source_info() -> String {
        format!("Generated from {}/{}.toml", config_dir(), profile())
    }
}

/// One-line summary of the active limits, printed by `--version`.
pub fn limits_summary() -> String {
    use compile_time::*;

    format!(
        "unit <= {} bytes, term <= {} bytes, token <= {} bytes, <= {} tokens, <= {} diagnostics retained",
        source::MAX_UNIT_SIZE,
        lexical::MAX_TERM_LENGTH,
        lexical::MAX_TOKEN_LENGTH,
        lexical::MAX_TOKEN_COUNT,
        syntax::MAX_DIAGNOSTICS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_limits_are_consistent() {
        assert!(compile_time::lexical::MAX_TOKEN_LENGTH >= compile_time::lexical::MAX_TERM_LENGTH);
        assert!(compile_time::syntax::MAX_DIAGNOSTICS > 0);
        assert!(
            compile_time::logging::MAX_LOG_EVENTS_PER_UNIT <= compile_time::logging::LOG_BUFFER_SIZE
        );
    }

    #[test]
    fn test_build_info() {
        assert!(build_info::source_info().ends_with(".toml"));
        assert!(limits_summary().contains("tokens"));
    }
}
