use frontend_core::config::{self, runtime::RuntimeConfig};
use frontend_core::pipeline::{self, Language, PipelineError, UnitReport};
use frontend_core::syntax::WriterSink;
use frontend_core::logging;
use serde::Serialize;
use std::env;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Default)]
struct CliOptions {
    files: Vec<PathBuf>,
    language: Option<Language>,
    dump_tokens: bool,
    json: bool,
    eager: bool,
}

#[derive(Serialize)]
struct JsonUnit<'a> {
    file: String,
    #[serde(flatten)]
    report: &'a UnitReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    tokens: Option<Vec<pipeline::TokenRecord>>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize global logging system
    logging::init_global_logging()?;

    pipeline::validate_pipeline()?;

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("frontend_core");

    if args.len() < 2 {
        eprintln!("Usage: {} <file>... [options]", program);
        eprintln!("       {} --help", program);
        std::process::exit(1);
    }

    let options = match parse_options(&args[1..]) {
        Ok(Some(options)) => options,
        Ok(None) => return Ok(()),
        Err(message) => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
    };

    let mut runtime = RuntimeConfig::from_env();
    if options.eager {
        runtime.lexical.eager_terms = true;
    }

    let mut rejected = 0;
    let mut failed = 0;
    let mut json_units = Vec::new();

    for path in &options.files {
        let tokens = if options.dump_tokens {
            match pipeline::tokenize_file(path, options.language, &runtime) {
                Ok(records) => Some(records),
                Err(e) => {
                    report_failure(path, &e);
                    failed += 1;
                    continue;
                }
            }
        } else {
            None
        };

        if let (Some(records), false) = (&tokens, options.json) {
            println!("== tokens: {}", path.display());
            for record in records {
                println!("  {}", record);
            }
        }

        let result = if options.json || !runtime.syntax.echo_diagnostics {
            pipeline::process_file(path, options.language, (), &runtime)
        } else {
            pipeline::process_file(path, options.language, WriterSink::new(io::stdout()), &runtime)
        };

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                report_failure(path, &e);
                failed += 1;
                continue;
            }
        };

        if !report.accepted() {
            rejected += 1;
        }

        if options.json {
            json_units.push((path.display().to_string(), report, tokens));
        } else {
            print_report(path, &report, !runtime.syntax.echo_diagnostics);
        }
    }

    if options.json {
        let units: Vec<JsonUnit<'_>> = json_units
            .iter()
            .map(|(file, report, tokens)| JsonUnit {
                file: file.clone(),
                report,
                tokens: tokens.clone(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&units)?);
    } else {
        print_summary(options.files.len(), rejected, failed);
    }

    if rejected > 0 || failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn parse_options(args: &[String]) -> Result<Option<CliOptions>, String> {
    let mut options = CliOptions::default();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                return Ok(None);
            }
            "--version" | "-V" => {
                print_version();
                return Ok(None);
            }
            "--lang" => {
                i += 1;
                let name = args.get(i).ok_or("--lang requires a value (cmake or cpp)")?;
                let language = name.parse::<Language>().map_err(|e| e.to_string())?;
                options.language = Some(language);
            }
            "--tokens" => options.dump_tokens = true,
            "--json" => options.json = true,
            "--eager" => options.eager = true,
            flag if flag.starts_with("--") => {
                return Err(format!("Unknown option: {}", flag));
            }
            file => options.files.push(PathBuf::from(file)),
        }
        i += 1;
    }

    if options.files.is_empty() {
        return Err("No input files".to_string());
    }

    Ok(Some(options))
}

fn report_failure(path: &Path, error: &PipelineError) {
    eprintln!("error[{}]: {}", error.error_code(), error);
    eprintln!("  --> {}", path.display());
}

fn print_report(path: &Path, report: &UnitReport, print_diagnostics: bool) {
    if print_diagnostics {
        for diagnostic in &report.diagnostics {
            println!("{}", diagnostic);
        }
    }
    if report.dropped > 0 {
        println!("... {} more diagnostics not shown", report.dropped);
    }

    let outcome = &report.outcome;
    let status = if outcome.accepted { "accepted" } else { "rejected" };
    println!(
        "{} [{}]: {} ({} tokens, {} errors{})",
        path.display(),
        report.language,
        status,
        outcome.tokens_consumed,
        outcome.error_count,
        if outcome.aborted { ", aborted" } else { "" }
    );
}

fn print_summary(total: usize, rejected: usize, failed: usize) {
    if let Some(summary) = logging::cargo_style_summary() {
        if !summary.trim().is_empty() {
            eprintln!("{}", summary);
        }
    }

    println!();
    println!(
        "Processed {} unit(s): {} accepted, {} rejected, {} failed to open",
        total,
        total - rejected - failed,
        rejected,
        failed
    );
}

fn print_version() {
    println!("frontend_core v{}", env!("CARGO_PKG_VERSION"));
    println!("{}", config::build_info::source_info());
    println!("Limits: {}", config::limits_summary());
}

fn print_help() {
    println!("frontend_core v{}", env!("CARGO_PKG_VERSION"));
    println!("Lexes and parses CMake and C/C++ source files");
    println!();
    println!("USAGE:");
    println!("    frontend_core <file>... [options]");
    println!();
    println!("ARGUMENTS:");
    println!("    <file>    CMakeLists.txt, *.cmake, or a C/C++ source or header");
    println!();
    println!("OPTIONS:");
    println!("    --lang <cmake|cpp>  Override language detection for every file");
    println!("    --tokens            Print each file's token stream before parsing");
    println!("    --json              Emit reports as JSON");
    println!("    --eager             Split each unit into terms before classifying");
    println!("    --version           Show version and compile-time limits");
    println!("    --help              Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    FRONTEND_LOGGING_MIN_LEVEL        error, warning, info or debug");
    println!("    FRONTEND_LOGGING_USE_STRUCTURED   true for JSON log lines");
    println!("    FRONTEND_SYNTAX_ECHO_DIAGNOSTICS  false to print diagnostics after each parse");
    println!();
    println!("EXIT STATUS:");
    println!("    0 when every unit is accepted, 1 otherwise");
}
