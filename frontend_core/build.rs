// build.rs - TOML-driven compile-time limit generation
use std::env;
use std::fs;
use std::path::Path;

#[derive(serde::Deserialize)]
struct CompileTimeConfig {
    source: SourceLimits,
    lexical: LexicalLimits,
    syntax: SyntaxLimits,
    logging: LoggingLimits,
}

#[derive(serde::Deserialize)]
struct SourceLimits {
    max_unit_size: u64,
}

#[derive(serde::Deserialize)]
struct LexicalLimits {
    max_term_length: usize,
    max_token_length: usize,
    max_token_count: usize,
}

#[derive(serde::Deserialize)]
struct SyntaxLimits {
    max_diagnostics: usize,
    max_skipped_tokens: usize,
}

#[derive(serde::Deserialize)]
struct LoggingLimits {
    log_buffer_size: usize,
    max_log_events_per_unit: usize,
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=FRONTEND_BUILD_PROFILE");
    println!("cargo:rerun-if-env-changed=FRONTEND_CONFIG_DIR");

    let profile = env::var("FRONTEND_BUILD_PROFILE").unwrap_or_else(|_| "development".to_string());
    let config_dir = env::var("FRONTEND_CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

    // Workspace root is the parent of the crate directory
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let workspace_root = Path::new(&manifest_dir)
        .parent()
        .expect("Could not find workspace root (parent directory)");

    let config_path = workspace_root
        .join(&config_dir)
        .join(format!("{}.toml", profile));

    println!("cargo:rerun-if-changed={}", config_path.display());

    if !config_path.exists() {
        panic!(
            "Configuration file not found: {}\nLooking for: {}/{}/{}.toml",
            config_path.display(),
            workspace_root.display(),
            config_dir,
            profile
        );
    }

    let config_content = fs::read_to_string(&config_path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", config_path.display(), e));

    let config: CompileTimeConfig = toml::from_str(&config_content)
        .unwrap_or_else(|e| panic!("Invalid TOML in {}: {}", config_path.display(), e));

    validate_limits(&config, &profile);
    generate_constants(&config, &profile);
}

fn validate_limits(config: &CompileTimeConfig, profile: &str) {
    const ABSOLUTE_MAX_UNIT_SIZE: u64 = 1_000_000_000;

    if config.source.max_unit_size == 0 || config.source.max_unit_size > ABSOLUTE_MAX_UNIT_SIZE {
        panic!("max_unit_size must be in 1..={}", ABSOLUTE_MAX_UNIT_SIZE);
    }

    if config.lexical.max_term_length == 0 {
        panic!("max_term_length cannot be zero");
    }

    if config.lexical.max_token_length < config.lexical.max_term_length {
        panic!("max_token_length must be at least max_term_length");
    }

    if config.lexical.max_token_count == 0 {
        panic!("max_token_count cannot be zero");
    }

    if config.syntax.max_diagnostics == 0 || config.syntax.max_skipped_tokens == 0 {
        panic!("syntax limits cannot be zero");
    }

    if config.logging.max_log_events_per_unit > config.logging.log_buffer_size {
        panic!("max_log_events_per_unit exceeds log_buffer_size");
    }

    if profile == "production" && config.source.max_unit_size > 64 * 1024 * 1024 {
        panic!("PRODUCTION: max_unit_size too high for production");
    }
}

fn generate_constants(config: &CompileTimeConfig, profile: &str) {
    let out_dir = env::var("OUT_DIR").unwrap();
    let output_path = Path::new(&out_dir).join("constants.rs");

    let constants_code = format!(
        r#"
// Generated compile-time constants from TOML configuration
// Profile: {}
// DO NOT EDIT - Generated by build.rs

pub mod compile_time {{
    pub mod source {{
        pub const MAX_UNIT_SIZE: u64 = {};
    }}

    pub mod lexical {{
        pub const MAX_TERM_LENGTH: usize = {};
        pub const MAX_TOKEN_LENGTH: usize = {};
        pub const MAX_TOKEN_COUNT: usize = {};
    }}

    pub mod syntax {{
        pub const MAX_DIAGNOSTICS: usize = {};
        pub const MAX_SKIPPED_TOKENS: usize = {};
    }}

    pub mod logging {{
        pub const LOG_BUFFER_SIZE: usize = {};
        pub const MAX_LOG_EVENTS_PER_UNIT: usize = {};
    }}
}}
"#,
        profile,
        config.source.max_unit_size,
        config.lexical.max_term_length,
        config.lexical.max_token_length,
        config.lexical.max_token_count,
        config.syntax.max_diagnostics,
        config.syntax.max_skipped_tokens,
        config.logging.log_buffer_size,
        config.logging.max_log_events_per_unit,
    );

    fs::write(output_path, constants_code).unwrap();
}
