//! Per-unit entry points: pick a lexicon, run the lexer and the parser core

mod error;
mod language;

pub use error::PipelineError;
pub use language::Language;

use crate::config::runtime::{LexicalPreferences, RuntimeConfig};
use crate::grammar::{CMakeLexicon, CppLexicon};
use crate::lexical::{create_lexer_with_preferences, Lexicon};
use crate::logging;
use crate::source::SourceUnit;
use crate::syntax::{CollectingSink, Diagnostic, DiagnosticSink, ParseOutcome, Parser};
use crate::tokens::{Lexeme, Terminal};
use crate::utils::SourceSpan;
use crate::{log_debug, log_info};
use serde::Serialize;
use std::fmt;
use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static NEXT_UNIT_ID: AtomicUsize = AtomicUsize::new(0);

/// One lexeme as printed by `--tokens`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRecord {
    /// Terminal name, or `invalid`
    pub terminal: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<&'static str>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub span: SourceSpan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl TokenRecord {
    pub fn from_lexeme<T: Terminal>(lexeme: &Lexeme<T>) -> Option<Self> {
        match lexeme {
            Lexeme::EndOfInput => None,
            Lexeme::Valid(token) => Some(Self {
                terminal: token.terminal.name(),
                category: Some(token.category().as_str()),
                text: token.text.clone(),
                value: (token.value != token.text).then(|| token.value.clone()),
                span: token.span.clone(),
                reason: None,
            }),
            Lexeme::Invalid(invalid) => Some(Self {
                terminal: "invalid",
                category: None,
                text: invalid.text.clone(),
                value: None,
                span: invalid.span.clone(),
                reason: Some(invalid.error.to_string()),
            }),
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.reason.is_some()
    }
}

impl fmt::Display for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<24} {:<18} {:?}", self.span.to_string(), self.terminal, self.text)?;
        if let Some(value) = &self.value {
            write!(f, " => {:?}", value)?;
        }
        if let Some(reason) = &self.reason {
            write!(f, " ({})", reason)?;
        }
        Ok(())
    }
}

/// Result of running one file through the parser core
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub language: Language,
    pub outcome: ParseOutcome,
    pub diagnostics: Vec<Diagnostic>,
    /// Diagnostics past the retention limit
    pub dropped: usize,
}

impl UnitReport {
    pub fn accepted(&self) -> bool {
        self.outcome.accepted
    }
}

fn parse_with_lexicon<R, L, D>(id: Arc<str>, reader: R, lexicon: L, sink: D, config: &RuntimeConfig) -> ParseOutcome
where
    R: BufRead,
    L: Lexicon,
    D: DiagnosticSink,
{
    let mut parser = Parser::with_lexical_preferences(id, reader, lexicon, config.lexical.clone(), sink)
        .with_preferences(config.syntax.clone());
    parser.parse();
    parser.finish()
}

fn records_with_lexicon<R, L>(id: Arc<str>, reader: R, lexicon: L, preferences: &LexicalPreferences) -> Vec<TokenRecord>
where
    R: BufRead,
    L: Lexicon,
{
    let mut lexer = create_lexer_with_preferences(id, reader, lexicon, preferences.clone());
    let records: Vec<_> = lexer
        .by_ref()
        .filter_map(|lexeme| TokenRecord::from_lexeme(&lexeme))
        .collect();

    let metrics = lexer.source().metrics();
    log_debug!("Unit tokenized",
        "unit" => lexer.unit(),
        "tokens" => metrics.total_tokens,
        "invalid" => metrics.invalid_tokens,
        "lines" => metrics.lines_read
    );
    records
}

fn with_unit<F, T>(id: &Arc<str>, f: F) -> T
where
    F: FnOnce() -> T,
{
    let unit_id = NEXT_UNIT_ID.fetch_add(1, Ordering::Relaxed);
    logging::with_unit_context(Arc::clone(id), unit_id, f)
}

/// Parse one unit with `language`'s lexicon, reporting to `sink`
pub fn parse_unit<R, D>(unit: SourceUnit<R>, language: Language, sink: D, config: &RuntimeConfig) -> ParseOutcome
where
    R: BufRead,
    D: DiagnosticSink,
{
    let (id, reader) = unit.into_parts();
    with_unit(&id, || {
        log_info!("Parsing unit", "unit" => id, "language" => language);
        match language {
            Language::CMake => parse_with_lexicon(Arc::clone(&id), reader, CMakeLexicon, sink, config),
            Language::Cpp => parse_with_lexicon(Arc::clone(&id), reader, CppLexicon, sink, config),
        }
    })
}

/// Every lexeme of one unit, trivia and invalid stretches included
pub fn tokenize_unit<R: BufRead>(unit: SourceUnit<R>, language: Language, preferences: &LexicalPreferences) -> Vec<TokenRecord> {
    let (id, reader) = unit.into_parts();
    with_unit(&id, || match language {
        Language::CMake => records_with_lexicon(Arc::clone(&id), reader, CMakeLexicon, preferences),
        Language::Cpp => records_with_lexicon(Arc::clone(&id), reader, CppLexicon, preferences),
    })
}

/// Language for `path`: the override if given, else inferred from the name
pub fn resolve_language(path: &Path, language: Option<Language>) -> Result<Language, PipelineError> {
    language
        .or_else(|| Language::from_path(path))
        .ok_or_else(|| PipelineError::LanguageNotInferred {
            path: path.display().to_string(),
        })
}

/// Open and parse a file. Diagnostics are collected and also passed to `echo`.
pub fn process_file<D: DiagnosticSink>(
    path: &Path,
    language: Option<Language>,
    echo: D,
    config: &RuntimeConfig,
) -> Result<UnitReport, PipelineError> {
    let language = resolve_language(path, language)?;
    let unit = SourceUnit::open(path)?;

    let mut collected = CollectingSink::new();
    let outcome = parse_unit(unit, language, (&mut collected, echo), config);

    log_debug!("Unit processed",
        "unit" => outcome.unit,
        "accepted" => outcome.accepted,
        "diagnostics" => collected.len()
    );

    let dropped = collected.dropped();
    Ok(UnitReport {
        language,
        outcome,
        diagnostics: collected.into_diagnostics(),
        dropped,
    })
}

/// Open a file and list its lexemes
pub fn tokenize_file(
    path: &Path,
    language: Option<Language>,
    config: &RuntimeConfig,
) -> Result<Vec<TokenRecord>, PipelineError> {
    let language = resolve_language(path, language)?;
    let unit = SourceUnit::open(path)?;
    Ok(tokenize_unit(unit, language, &config.lexical))
}

/// Check that every error code the pipeline can emit is registered
pub fn validate_pipeline() -> Result<(), String> {
    crate::lexical::validate_lexical_codes()?;
    crate::syntax::validate_syntax_codes()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::DiagnosticKind;
    use std::io::Write;

    fn config() -> RuntimeConfig {
        RuntimeConfig::default()
    }

    #[test]
    fn test_validate_pipeline() {
        assert!(validate_pipeline().is_ok());
    }

    #[test]
    fn test_parse_cmake_unit_accepts() {
        let unit = SourceUnit::from_text("CMakeLists.txt", "project(demo CXX)\nadd_executable(demo main.cpp)\n");
        let mut sink = CollectingSink::new();
        let outcome = parse_unit(unit, Language::CMake, &mut sink, &config());

        assert!(outcome.accepted);
        assert_eq!(outcome.unit, "CMakeLists.txt");
        assert_eq!(outcome.error_count, 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_parse_cpp_unit_aborts_on_invalid_token() {
        let unit = SourceUnit::from_text("main.cpp", "int main() {\n  return `0;\n}\n");
        let mut sink = CollectingSink::new();
        let outcome = parse_unit(unit, Language::Cpp, &mut sink, &config());

        assert!(!outcome.accepted);
        assert!(outcome.aborted);
        assert!(sink.has_kind(DiagnosticKind::InvalidToken));
        assert_eq!(sink.diagnostics()[0].span.start.line(), 2);
    }

    #[test]
    fn test_tokenize_unit_keeps_trivia_and_values() {
        let unit = SourceUnit::from_text("t.cmake", "set(X \"a\\tb\")\n");
        let records = tokenize_unit(unit, Language::CMake, &LexicalPreferences::default());

        let text: String = records.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(text, "set(X \"a\\tb\")\n");

        let quoted = records
            .iter()
            .find(|r| r.terminal == "quoted argument")
            .expect("quoted argument");
        assert_eq!(quoted.value.as_deref(), Some("a\tb"));
        assert!(records.iter().all(|r| !r.is_invalid()));
    }

    #[test]
    fn test_token_record_serializes_invalid() {
        let unit = SourceUnit::from_text("x.cpp", "@");
        let records = tokenize_unit(unit, Language::Cpp, &LexicalPreferences::default());
        assert_eq!(records.len(), 1);
        assert!(records[0].is_invalid());

        let json = serde_json::to_string(&records[0]).unwrap();
        assert!(json.contains("\"terminal\":\"invalid\""));
        assert!(json.contains("\"reason\""));
        assert!(!json.contains("\"category\""));
    }

    #[test]
    fn test_process_file_infers_language() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("CMakeLists.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "cmake_minimum_required(VERSION 3.20)").unwrap();
        drop(file);

        let report = process_file(&path, None, (), &config()).unwrap();
        assert_eq!(report.language, Language::CMake);
        assert!(report.accepted());
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn test_process_file_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();

        let err = process_file(&path, None, (), &config()).unwrap_err();
        assert!(matches!(err, PipelineError::LanguageNotInferred { .. }));

        let report = process_file(&path, Some(Language::Cpp), (), &config()).unwrap();
        assert!(report.accepted());
    }

    #[test]
    fn test_process_file_missing() {
        let err = tokenize_file(Path::new("/nonexistent/CMakeLists.txt"), None, &config()).unwrap_err();
        assert!(matches!(err, PipelineError::Source(_)));
    }
}
