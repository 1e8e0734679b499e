//! apispec CLI
//!
//! Command-line interface for validating instances against OpenAPI 3.1 schemas,
//! linting documents, and reading values by JSON Pointer.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use apispec::{
    lint, load_auto, load_json, validate_against_document, validate_against_schema_with,
    FileStatus, Pointer, Severity, UriFragment, ValidateError, ValidationOptions,
    DEFAULT_MAX_DEPTH,
};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apispec")]
#[command(about = "Validate and lint OpenAPI 3.1 documents and JSON Schemas")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a JSON instance against a schema
    Validate {
        /// Instance file to validate
        instance: PathBuf,

        /// Schema or OpenAPI document: file path or URL (http:// or https://)
        #[arg(long)]
        schema: String,

        /// Fragment selecting the schema inside the document (e.g. #/components/schemas/Pet)
        #[arg(long)]
        pointer: Option<String>,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,

        /// Maximum schema nesting entered while validating
        #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },

    /// Lint OpenAPI documents for errors (syntax, missing fields, broken refs)
    Lint {
        /// File or directory to lint
        path: PathBuf,

        /// Output format: text (default) or json
        #[arg(long, default_value = "text")]
        format: String,

        /// Treat warnings as errors
        #[arg(long)]
        strict: bool,

        /// Suppress progress output, only show errors
        #[arg(long, short)]
        quiet: bool,
    },

    /// Print the value a JSON Pointer selects
    Pointer {
        /// Document source: file path or URL
        source: String,

        /// JSON Pointer (/a/b) or URI fragment (#/a/b)
        pointer: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Validate {
            instance,
            schema,
            pointer,
            json,
            max_depth,
        } => run_validate(&instance, &schema, pointer.as_deref(), json, max_depth),

        Commands::Lint {
            path,
            format,
            strict,
            quiet,
        } => run_lint(&path, &format, strict, quiet),

        Commands::Pointer {
            source,
            pointer,
            pretty,
        } => run_pointer(&source, &pointer, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn run_validate(
    instance_path: &Path,
    schema_source: &str,
    pointer: Option<&str>,
    json_output: bool,
    max_depth: usize,
) -> Result<(), u8> {
    let instance = load_json(instance_path).map_err(|e| {
        report_error(json_output, &format!("loading instance: {}", e));
        e.exit_code() as u8
    })?;

    let schema = load_auto(schema_source).map_err(|e| {
        report_error(json_output, &format!("loading schema: {}", e));
        e.exit_code() as u8
    })?;

    let options = ValidationOptions::new().max_depth(max_depth);
    let result = match pointer {
        Some(fragment) => validate_against_document(&schema, fragment, &instance, options),
        None => validate_against_schema_with(&schema, &instance, options),
    };

    match result {
        Ok(()) => {
            if json_output {
                println!("{}", json!({"valid": true}));
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid(error)) if !error.is_usage() => {
            if json_output {
                let output = json!({
                    "valid": false,
                    "errors": [{
                        "context": error.context_path(),
                        "message": error.root_cause().to_string(),
                    }]
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                eprintln!("  {}", error);
            }
            Err(1)
        }
        Err(e) => {
            report_error(json_output, &e.to_string());
            Err(e.exit_code() as u8)
        }
    }
}

/// Output an error message in plain text or JSON format.
fn report_error(json_output: bool, msg: &str) {
    if json_output {
        println!("{}", json!({"valid": false, "error": msg}));
    } else {
        eprintln!("Error: {}", msg);
    }
}

fn run_pointer(source: &str, pointer: &str, pretty: bool) -> Result<(), u8> {
    let document = load_auto(source).map_err(|e| {
        eprintln!("Error: {}", e);
        e.exit_code() as u8
    })?;

    let parsed = if pointer.starts_with('#') {
        UriFragment::parse(pointer).map(|f| f.pointer().clone())
    } else {
        Pointer::parse(pointer)
    }
    .map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    let value: &Value = parsed.access(&document).map_err(|e| {
        eprintln!("Error: {}", e);
        1u8
    })?;

    let output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;
    println!("{}", output);
    Ok(())
}

fn run_lint(path: &Path, format: &str, strict: bool, quiet: bool) -> Result<(), u8> {
    if !path.exists() {
        eprintln!("Error: path not found: {}", path.display());
        return Err(2);
    }

    let result = lint(path, strict);

    if format == "json" {
        let output = serde_json::to_string_pretty(&result).map_err(|e| {
            eprintln!("Error serializing output: {}", e);
            2u8
        })?;
        println!("{}", output);
    } else {
        if !quiet {
            println!("Linting {} ...\n", path.display());
        }

        for file_result in &result.results {
            let status_icon = match file_result.status {
                FileStatus::Ok => "\x1b[32m✓\x1b[0m",
                FileStatus::Warning => "\x1b[33m⚠\x1b[0m",
                FileStatus::Error => "\x1b[31m✗\x1b[0m",
            };

            if !quiet || file_result.status != FileStatus::Ok {
                println!("  {} {}", status_icon, file_result.file.display());
            }

            for diag in &file_result.diagnostics {
                let (color, label) = match diag.severity {
                    Severity::Error => ("\x1b[31m", "error"),
                    Severity::Warning => ("\x1b[33m", "warning"),
                };
                if !quiet || diag.severity == Severity::Error {
                    println!(
                        "    {}{}[{}]\x1b[0m: {} - {}",
                        color, label, diag.code, diag.path, diag.message
                    );
                }
            }
        }

        println!();
        if result.failed == 0 {
            println!(
                "\x1b[32m✓ {} files checked, all passed\x1b[0m",
                result.files_checked
            );
        } else {
            println!(
                "\x1b[31m✗ {} files checked: {} passed, {} failed ({} errors, {} warnings)\x1b[0m",
                result.files_checked, result.passed, result.failed, result.errors, result.warnings
            );
        }
    }

    if result.failed == 0 {
        Ok(())
    } else {
        Err(1)
    }
}
