//! doc2md CLI - convert a document to Markdown
//!
//! Exit codes: 0 success, 1 missing input, 2 missing `-o` value, 3 invalid
//! usage, 4 conversion failure, 5 output write failure.

use clap::error::ErrorKind;
use clap::Parser;
use colored::*;
use doc2md::{ConversionOptions, ConversionResult};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_MISSING_INPUT: u8 = 1;
const EXIT_MISSING_OUTPUT_VALUE: u8 = 2;
const EXIT_USAGE: u8 = 3;
const EXIT_CONVERSION_FAILED: u8 = 4;
const EXIT_WRITE_FAILED: u8 = 5;

/// Convert Office, OpenDocument, WPS and PDF documents to Markdown
#[derive(Parser, Debug)]
#[command(
    name = "doc2md",
    version,
    about = "Convert a document to Markdown",
    long_about = "doc2md - document to Markdown conversion.\n\n\
                  Reads DOCX, PPTX, XLSX, ODT, ODP, ODS, DOC, WPS, ET, DPS and PDF files \
                  as well as plain text, source code, Markdown and HTML."
)]
struct Cli {
    /// Input file path
    input: Option<PathBuf>,

    /// Output file path (default: <input basename>.md in the current directory)
    #[arg(short, long, value_name = "output.md")]
    output: Option<PathBuf>,

    /// Print the conversion result as JSON to stdout instead of writing a file
    #[arg(long)]
    json: bool,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// `<basename without extension>.md`, or `output.md` when nothing is left.
fn default_output_path(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = match name.rfind('.') {
        Some(dot) if dot > 0 => &name[..dot],
        _ => name.as_str(),
    };
    let stem = if stem.is_empty() { "output" } else { stem };
    PathBuf::from(format!("{stem}.md"))
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn report_failure(input: &Path, result: &ConversionResult) {
    eprintln!(
        "{}: Failed to convert file: {}",
        "Error".red().bold(),
        input.display()
    );
    for warning in &result.warnings {
        eprintln!("  {}", warning.as_str().yellow());
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    let _ = e.print();
                    ExitCode::SUCCESS
                }
                ErrorKind::InvalidValue => {
                    let _ = e.print();
                    ExitCode::from(EXIT_MISSING_OUTPUT_VALUE)
                }
                _ => {
                    let _ = e.print();
                    ExitCode::from(EXIT_USAGE)
                }
            };
        }
    };
    init_logging(cli.verbose);
    run(cli)
}

fn run(cli: Cli) -> ExitCode {
    let Some(input) = cli.input.filter(|path| !path.as_os_str().is_empty()) else {
        eprintln!("{}: no input file given", "Error".red().bold());
        eprintln!("Usage: doc2md [-h] [-V] [-v] [--json] [-o <output.md>] <input>");
        return ExitCode::from(EXIT_MISSING_INPUT);
    };

    let result = doc2md::convert_file(&input, &ConversionOptions::default());

    if cli.json {
        return match serde_json::to_string_pretty(&result) {
            Ok(json) => {
                println!("{json}");
                if result.success {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(EXIT_CONVERSION_FAILED)
                }
            }
            Err(e) => {
                eprintln!("{}: {}", "Error".red().bold(), e);
                ExitCode::from(EXIT_WRITE_FAILED)
            }
        };
    }

    if !result.success {
        report_failure(&input, &result);
        return ExitCode::from(EXIT_CONVERSION_FAILED);
    }
    for warning in &result.warnings {
        eprintln!("{}: {}", "Warning".yellow().bold(), warning);
    }

    let output = cli.output.unwrap_or_else(|| default_output_path(&input));
    if let Err(e) = fs::write(&output, &result.markdown) {
        eprintln!(
            "{}: Unable to write output file {}: {}",
            "Error".red().bold(),
            output.display(),
            e
        );
        return ExitCode::from(EXIT_WRITE_FAILED);
    }
    println!(
        "{} Wrote Markdown to {}",
        "✓".green().bold(),
        output.display()
    );
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;

    #[test]
    fn test_default_output_path() {
        assert_eq!(default_output_path(Path::new("dir/report.docx")), PathBuf::from("report.md"));
        assert_eq!(default_output_path(Path::new("archive.tar.gz")), PathBuf::from("archive.tar.md"));
        assert_eq!(default_output_path(Path::new(".profile")), PathBuf::from(".profile.md"));
        assert_eq!(default_output_path(Path::new("README")), PathBuf::from("README.md"));
        assert_eq!(default_output_path(Path::new("")), PathBuf::from("output.md"));
    }

    #[test]
    fn test_parse_arguments() {
        let cli = Cli::try_parse_from(["doc2md", "-o", "out.md", "-v", "in.pdf"]).unwrap();
        assert_eq!(cli.input, Some(PathBuf::from("in.pdf")));
        assert_eq!(cli.output, Some(PathBuf::from("out.md")));
        assert!(cli.verbose);
        assert!(!cli.json);
    }

    #[test]
    fn test_usage_errors() {
        let unknown = Cli::try_parse_from(["doc2md", "--bogus", "in.pdf"]).unwrap_err();
        assert_eq!(unknown.kind(), ErrorKind::UnknownArgument);
        let missing = Cli::try_parse_from(["doc2md", "in.pdf", "-o"]).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_missing_input_exit_code() {
        let cli = Cli::try_parse_from(["doc2md"]).unwrap();
        assert_eq!(run(cli), ExitCode::from(EXIT_MISSING_INPUT));
    }

    #[test]
    fn test_writes_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        let output = dir.path().join("notes.md");
        fs::write(&input, "  hello  ").unwrap();
        let cli = Cli::try_parse_from([
            OsStr::new("doc2md"),
            OsStr::new("-o"),
            output.as_os_str(),
            input.as_os_str(),
        ])
        .unwrap();
        assert_eq!(run(cli), ExitCode::SUCCESS);
        assert_eq!(fs::read_to_string(&output).unwrap(), "hello");
    }

    #[test]
    fn test_conversion_failure_exit_code() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("empty.docx");
        fs::write(&input, b"").unwrap();
        let cli = Cli::try_parse_from([OsStr::new("doc2md"), input.as_os_str()]).unwrap();
        assert_eq!(run(cli), ExitCode::from(EXIT_CONVERSION_FAILED));
    }
}
