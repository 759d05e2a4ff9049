//! Error and success codes with their classification metadata
//!
//! Single source of truth for every code the front-end logs. Each error code
//! has an entry in the metadata registry describing its category, severity and
//! whether processing of the unit can continue.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for an error code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

/// System error codes
pub mod system {
    use super::Code;

    pub const INTERNAL_ERROR: Code = Code::new("ERR001");
    pub const INITIALIZATION_FAILURE: Code = Code::new("ERR002");
}

/// Character source error codes
pub mod source {
    use super::Code;

    pub const UNIT_NOT_FOUND: Code = Code::new("E005");
    pub const UNIT_TOO_LARGE: Code = Code::new("E007");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_PATH: Code = Code::new("E012");
}

/// Term splitting and token classification error codes
pub mod lexical {
    use super::Code;

    pub const UNRECOGNIZED_INPUT: Code = Code::new("E020");
    pub const UNTERMINATED_CONSTRUCT: Code = Code::new("E021");
    pub const TERM_TOO_LONG: Code = Code::new("E023");
    pub const TOKEN_TOO_LONG: Code = Code::new("E024");
    pub const TOO_MANY_TOKENS: Code = Code::new("E027");
    pub const SOURCE_FAULT: Code = Code::new("E028");
}

/// Parser core error codes
pub mod syntax {
    use super::Code;

    pub const NO_MORE_TOKEN: Code = Code::new("E041");
    pub const UNEXPECTED_TOKEN: Code = Code::new("E050");
    pub const PARSE_ABORTED: Code = Code::new("E051");
    pub const NO_PROGRESS: Code = Code::new("E052");
    pub const PARSE_REJECTED: Code = Code::new("E053");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");
    pub const UNIT_OPENED: Code = Code::new("I006");
    pub const TERM_SPLITTING_COMPLETE: Code = Code::new("I010");
    pub const TOKENIZATION_COMPLETE: Code = Code::new("I020");
    pub const PARSE_ACCEPTED: Code = Code::new("I040");
}

// ============================================================================
// ERROR METADATA REGISTRY
// ============================================================================

type Entry = (
    &'static str,
    &'static str,
    Severity,
    bool,
    &'static str,
    &'static str,
);

const REGISTRY_ENTRIES: &[Entry] = &[
    (
        "ERR001",
        "System",
        Severity::Critical,
        false,
        "Internal front-end error",
        "File a bug report with the input that triggered it",
    ),
    (
        "ERR002",
        "System",
        Severity::Critical,
        false,
        "Front-end initialization failure",
        "Check FRONTEND_* environment variables",
    ),
    (
        "E005",
        "Source",
        Severity::Medium,
        false,
        "Source unit not found at specified path",
        "Check the path and ensure the file exists",
    ),
    (
        "E007",
        "Source",
        Severity::Medium,
        false,
        "Source unit exceeds maximum size limit",
        "Split the unit or rebuild with a larger max_unit_size",
    ),
    (
        "E009",
        "Source",
        Severity::Medium,
        false,
        "Permission denied reading source unit",
        "Check file permissions",
    ),
    (
        "E010",
        "Source",
        Severity::High,
        false,
        "Source unit is not valid UTF-8",
        "Re-encode the file as UTF-8",
    ),
    (
        "E011",
        "Source",
        Severity::High,
        false,
        "I/O error while reading source unit",
        "Check the underlying device or stream",
    ),
    (
        "E012",
        "Source",
        Severity::Medium,
        false,
        "Path does not name a readable file",
        "Pass a regular file path",
    ),
    (
        "E020",
        "Lexical",
        Severity::High,
        false,
        "Input matches no token pattern of the lexicon",
        "Remove or quote the offending characters",
    ),
    (
        "E021",
        "Lexical",
        Severity::High,
        false,
        "Comment, string or bracket construct is not closed before end of input",
        "Add the missing closing delimiter",
    ),
    (
        "E023",
        "Lexical",
        Severity::High,
        false,
        "Physical line exceeds maximum term length",
        "Break the line or rebuild with a larger max_term_length",
    ),
    (
        "E024",
        "Lexical",
        Severity::High,
        false,
        "Token exceeds maximum token length",
        "Shorten the literal or comment",
    ),
    (
        "E027",
        "Lexical",
        Severity::High,
        false,
        "Unit produces more tokens than allowed",
        "Split the unit or rebuild with a larger max_token_count",
    ),
    (
        "E028",
        "Lexical",
        Severity::High,
        false,
        "Reading the source failed during classification",
        "See the underlying source error",
    ),
    (
        "E041",
        "Syntax",
        Severity::Low,
        true,
        "Grammar expected a token but input ended",
        "Complete the construct at end of input",
    ),
    (
        "E050",
        "Syntax",
        Severity::Medium,
        true,
        "Token does not match what the grammar expects",
        "Check the syntax near the reported location",
    ),
    (
        "E051",
        "Syntax",
        Severity::High,
        false,
        "Parse aborted on an invalid token",
        "Fix the lexical error first",
    ),
    (
        "E052",
        "Syntax",
        Severity::High,
        false,
        "Grammar driver stopped consuming tokens",
        "Fix the driver so every step consumes input",
    ),
    (
        "E053",
        "Syntax",
        Severity::Medium,
        true,
        "Unit rejected by the parser",
        "Inspect the reported diagnostics",
    ),
];

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        REGISTRY_ENTRIES
            .iter()
            .map(
                |&(code, category, severity, recoverable, description, recommended_action)| {
                    (
                        code,
                        ErrorMetadata {
                            code,
                            category,
                            severity,
                            recoverable,
                            description,
                            recommended_action,
                        },
                    )
                },
            )
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

pub fn get_severity(code: &str) -> Severity {
    get_error_metadata(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

pub fn is_recoverable(code: &str) -> bool {
    get_error_metadata(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

pub fn get_description(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.description)
        .unwrap_or("Unknown error")
}

pub fn get_action(code: &str) -> &'static str {
    get_error_metadata(code)
        .map(|metadata| metadata.recommended_action)
        .unwrap_or("No specific action available")
}

pub fn get_category(code: &str) -> &'static str {
    match get_error_metadata(code) {
        Some(metadata) => metadata.category,
        None if code.starts_with('I') => "Success",
        None => "Unknown",
    }
}
