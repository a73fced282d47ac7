use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use vc_common::manifest::{self, ManifestError};
use vc_common::{Diagnostic, DiagnosticFormat};
use vc_compiler::lexer::Lexer;
use vc_compiler::parser;

/// VC language compiler front end.
///
/// Checks .vc source files and reports semantic errors.
#[derive(Parser)]
#[command(
    name = "vcc",
    version,
    about,
    long_about = "VC language compiler front end.\n\nLexes, parses and semantically checks a .vc source file, reporting every\nerror found. Without INPUT, compiles the entry named in ./VC.toml.\n\nExamples:\n  vcc prog.vc                 Check prog.vc and print a summary\n  vcc prog.vc --check         Check for errors only\n  vcc prog.vc --emit-ast      Print the decorated tree as JSON\n  vcc --format plain          Check the VC.toml entry, one line per error"
)]
struct Cli {
    /// Input .vc source file (default: the entry in VC.toml).
    input: Option<PathBuf>,

    /// Check for errors only.
    #[arg(long)]
    check: bool,

    /// Emit token stream to stdout (debug).
    #[arg(long = "emit-tokens")]
    emit_tokens: bool,

    /// Emit the decorated tree as JSON to stdout.
    #[arg(long = "emit-ast")]
    emit_ast: bool,

    /// Diagnostic rendering, overriding VC.toml.
    #[arg(long, value_parser = ["pretty", "plain"])]
    format: Option<String>,

    /// Log compiler phases to stderr.
    #[arg(short, long)]
    verbose: bool,
}

/// Rendering options resolved from the manifest and the command line.
struct Settings {
    format: DiagnosticFormat,
    /// 0 means unlimited.
    max_errors: usize,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // === Manifest ===
    // With an input file, VC.toml is optional and found by walking up from
    // the file's directory. Without one, ./VC.toml must name the entry.
    let (input, loaded) = match &cli.input {
        Some(path) => {
            let abs_input = fs::canonicalize(path).unwrap_or_else(|_| path.clone());
            let start = abs_input.parent().unwrap_or(Path::new("."));
            match manifest::find_and_load_manifest(start) {
                Ok(m) => (path.clone(), Some(m)),
                Err(ManifestError::NotFound(_)) => (path.clone(), None),
                Err(e) => {
                    eprintln!("error: {}", e);
                    process::exit(1);
                }
            }
        }
        None => match manifest::find_and_load_manifest(Path::new(".")) {
            Ok(m) => (m.entry_path(), Some(m)),
            Err(e) => {
                eprintln!("error: {}", e);
                eprintln!("   = help: pass a source file or create a VC.toml");
                process::exit(1);
            }
        },
    };

    let settings = resolve_settings(&cli, loaded.as_ref());
    if let Some(m) = &loaded {
        debug!(project = %m.project.name, root = %m.root_dir.display(), "loaded manifest");
    }

    // Read source file
    let source = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: could not read '{}': {}", input.display(), e);
            process::exit(1);
        }
    };

    let file_name = input
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    // === Lexer ===
    let (tokens, lex_diags) = Lexer::new(&source, &file_name).tokenize();

    if lex_diags.has_errors() {
        report_all(lex_diags.diagnostics(), &settings, &source, &file_name);
        process::exit(1);
    }

    if cli.emit_tokens {
        for token in &tokens {
            println!(
                "{:>4}:{:<3} {:?} {:?}",
                token.span.start.line, token.span.start.column, token.kind, token.lexeme,
            );
        }
        if cli.check {
            println!("\nNo lexer errors.");
        }
        return;
    }

    // === Parser ===
    let (mut program, parse_diags) = parser::Parser::new(tokens).parse();

    if parse_diags.has_errors() {
        report_all(parse_diags.diagnostics(), &settings, &source, &file_name);
        process::exit(1);
    }

    // === Semantic Analysis ===
    let sem_diags = vc_compiler::semantic::analyze(&mut program);

    report_all(sem_diags.diagnostics(), &settings, &source, &file_name);

    if cli.emit_ast {
        match serde_json::to_string_pretty(&program) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("error: failed to serialize tree: {}", e);
                process::exit(1);
            }
        }
    }

    if sem_diags.has_errors() {
        process::exit(1);
    }

    if cli.check {
        println!("No errors found.");
    } else if !cli.emit_ast {
        println!(
            "{}: {} declarations checked, no errors",
            file_name,
            program.declarations.len()
        );
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn resolve_settings(cli: &Cli, loaded: Option<&manifest::VcManifest>) -> Settings {
    let manifest_format = loaded
        .and_then(|m| m.diagnostics.format().ok())
        .unwrap_or(DiagnosticFormat::Pretty);
    let format = cli
        .format
        .as_deref()
        .and_then(DiagnosticFormat::from_name)
        .unwrap_or(manifest_format);
    Settings {
        format,
        max_errors: loaded.map_or(0, |m| m.diagnostics.max_errors),
    }
}

/// Print diagnostics in order, stopping after `max_errors` errors.
fn report_all<'a>(
    diagnostics: impl IntoIterator<Item = &'a Diagnostic>,
    settings: &Settings,
    source: &str,
    file_name: &str,
) {
    let mut errors = 0;
    let mut suppressed = 0;
    for diag in diagnostics {
        if diag.is_error() {
            if settings.max_errors != 0 && errors >= settings.max_errors {
                suppressed += 1;
                continue;
            }
            errors += 1;
        }
        match settings.format {
            DiagnosticFormat::Pretty => print_diagnostic(diag, source, file_name),
            DiagnosticFormat::Plain => eprintln!("{}", diag),
        }
    }
    if suppressed > 0 {
        eprintln!("note: {} more error(s) not shown", suppressed);
    }
}

fn print_diagnostic(diag: &Diagnostic, source: &str, file_name: &str) {
    let kind = if diag.is_error() {
        ReportKind::Error
    } else {
        ReportKind::Warning
    };

    if let Some(ref span) = diag.span {
        let start = span.start.offset as usize;
        let end = (span.end.offset as usize).max(start + 1);

        let color = if diag.is_error() {
            Color::Red
        } else {
            Color::Yellow
        };

        let mut report = Report::build(kind, file_name, start)
            .with_message(&diag.message)
            .with_label(
                Label::new((file_name, start..end))
                    .with_message(&diag.message)
                    .with_color(color),
            );

        if let Some(code) = diag.code {
            report = report.with_code(code);
        }
        if let Some(ref suggestion) = diag.suggestion {
            report = report.with_help(suggestion);
        }

        if report
            .finish()
            .eprint((file_name, Source::from(source)))
            .is_err()
        {
            eprintln!("{}", diag);
        }
    } else {
        let prefix = if diag.is_error() { "error" } else { "warning" };
        eprintln!("{}: {}", prefix, diag.message);
        if let Some(ref suggestion) = diag.suggestion {
            eprintln!("   = help: {}", suggestion);
        }
        eprintln!();
    }
}
