//! CLI Application logic
//!
//! One run: validate paths, take the run lock, load the block stream,
//! compose into a staged template copy, publish it, write the summary.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use stylecast_ast::{ExtractedDocument, ParseStats};
use stylecast_core::{ComposeOptions, Compositor, RunSummary};
use stylecast_ooxml::{DocxExtractor, DocxSurface};

use crate::config::Settings;
use crate::lock::{default_lock_path, LockMode, RunLock};
use crate::publish::{StagedOutput, StdFs};

/// Summary destination meaning "standard output"
pub const STDOUT_SUMMARY: &str = "-";

#[derive(Parser, Debug, Clone)]
#[command(name = "stylecast")]
#[command(author, version, about = "Compose documents into a template using only its own styles", long_about = None)]
pub struct Cli {
    /// Source document (.docx) or pre-extracted block stream (.json)
    pub input: PathBuf,

    /// Output DOCX file
    #[arg(short, long)]
    pub output: PathBuf,

    /// Template (.dotx or .docx) whose styles are used
    #[arg(short, long)]
    pub template: PathBuf,

    /// Fail on any style pollution, table/list fallback or styling error
    #[arg(long)]
    pub strict: bool,

    /// Replace an existing output file
    #[arg(long)]
    pub overwrite: bool,

    /// Keep page/section breaks as blank paragraphs
    #[arg(long)]
    pub preserve_breaks: bool,

    /// Prefix headings deeper than the template supports with `H<level>: `
    #[arg(long)]
    pub prefix_deep_headings: bool,

    /// Run without the single-writer lock
    #[arg(long, conflicts_with = "lock_nonblocking")]
    pub no_lock: bool,

    /// Fail immediately if another run holds the lock
    #[arg(long)]
    pub lock_nonblocking: bool,

    /// Lock file location
    #[arg(long, value_name = "PATH")]
    pub lock_path: Option<PathBuf>,

    /// Paragraphs per bulk insertion
    #[arg(long, value_name = "N")]
    pub batch_size: Option<usize>,

    /// Write the JSON run summary to PATH, or to stdout with `-`
    #[arg(long, value_name = "PATH|-")]
    pub summary: Option<PathBuf>,

    /// Configuration file (defaults to ./stylecast.toml if present)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    fn summary_to_stdout(&self) -> bool {
        self.summary.as_deref() == Some(Path::new(STDOUT_SUMMARY))
    }
}

/// Settings file merged with command-line flags
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub options: ComposeOptions,
    pub preserve_breaks: bool,
    pub lock_mode: LockMode,
    pub lock_path: PathBuf,
}

impl RunConfig {
    /// Flags win over the settings file; boolean flags can only switch on
    pub fn resolve(cli: &Cli, settings: &Settings) -> Self {
        let mut options = settings.compose_options();
        if cli.strict {
            options.strict = true;
        }
        if cli.prefix_deep_headings {
            options.prefix_deep_headings = true;
        }
        if let Some(batch_size) = cli.batch_size {
            options.batch_size = batch_size;
        }

        let lock_mode = if cli.no_lock {
            LockMode::Disabled
        } else if cli.lock_nonblocking {
            LockMode::Nonblocking
        } else {
            settings.lock.mode
        };
        let lock_path = cli
            .lock_path
            .clone()
            .or_else(|| settings.lock.path.clone())
            .unwrap_or_else(default_lock_path);

        Self {
            options,
            preserve_breaks: cli.preserve_breaks || settings.extract.preserve_breaks,
            lock_mode,
            lock_path,
        }
    }
}

/// Human-readable progress, kept off stdout when the summary goes there
#[derive(Debug, Clone, Copy)]
struct Progress {
    to_stderr: bool,
}

impl Progress {
    fn line(&self, message: impl std::fmt::Display) {
        if self.to_stderr {
            eprintln!("{}", message);
        } else {
            println!("{}", message);
        }
    }
}

/// Parse arguments, install logging and run
pub fn run_cli() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(&cli)
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // A second initialisation (tests, embedding) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Run one conversion and report it
///
/// Returns the process exit code. `Err` is reserved for failing to write
/// the summary itself; every other failure is recorded in the summary
/// and yields a non-zero code.
pub fn run(cli: &Cli) -> Result<ExitCode> {
    let started = Instant::now();
    let progress = Progress {
        to_stderr: cli.summary_to_stdout(),
    };
    let mut summary = RunSummary::new(
        stylecast_core::VERSION,
        cli.input.display().to_string(),
        cli.output.display().to_string(),
        cli.template.display().to_string(),
        cli.strict,
    );

    let result = convert(cli, &progress, &mut summary);
    summary.elapsed_seconds = started.elapsed().as_secs_f64();
    match result {
        Ok(()) => summary.success = true,
        Err(e) => {
            let message = format!("{:#}", e);
            eprintln!("Error: {}", message);
            summary.fail(message);
        }
    }

    if let Some(dest) = &cli.summary {
        emit_summary(dest, &summary)?;
    }

    Ok(if summary.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn convert(cli: &Cli, progress: &Progress, summary: &mut RunSummary) -> Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let config = RunConfig::resolve(cli, &settings);
    summary.strict = config.options.strict;
    debug!("Run configuration: {:?}", config);

    validate_paths(cli)?;

    let _lock = RunLock::for_mode(config.lock_mode, &config.lock_path, || {
        progress.line("Waiting for another stylecast run to finish...");
    })?;
    // A run that held the lock meanwhile may have created the output
    check_overwrite(cli)?;

    progress.line(format!("Parsing {}...", cli.input.display()));
    let document = load_blocks(&cli.input, config.preserve_breaks, cli.verbose)?;
    summary.parse_stats = document.stats.clone();
    report_parse(progress, &document.stats, document.len());

    let severe = document.stats.severe_warnings();
    if !severe.is_empty() {
        if config.options.strict {
            anyhow::bail!("Source extraction failed: {}", severe.join("; "));
        }
        warn!("Continuing despite extraction problems: {}", severe.join("; "));
    }

    let staged = StagedOutput::create(&cli.template, &cli.output)?;
    progress.line(format!(
        "Writing {} blocks into a copy of {}...",
        document.len(),
        cli.template.display()
    ));
    let mut surface = DocxSurface::open(staged.path())
        .with_context(|| format!("Failed to open template copy of {}", cli.template.display()))?;
    let outcome = Compositor::new(config.options.clone())
        .compose(&mut surface, document.blocks)
        .context("Composition failed")?;
    summary.write_result = outcome.write_result.clone();
    report_write(progress, summary);

    if let Some(reason) = outcome.failure {
        staged.discard();
        progress.line("Strict mode: output not written");
        anyhow::bail!(reason);
    }

    let published = staged.publish(&StdFs, cli.overwrite)?;
    progress.line(format!("Wrote {}", published.display()));
    Ok(())
}

/// Check every path before anything is created or locked
fn validate_paths(cli: &Cli) -> Result<()> {
    if !cli.input.is_file() {
        anyhow::bail!("Input file not found: {}", cli.input.display());
    }
    if !has_extension(&cli.input, &["docx", "json"]) {
        anyhow::bail!(
            "Input must be a .docx document or a .json block stream: {}",
            cli.input.display()
        );
    }
    if !cli.template.is_file() {
        anyhow::bail!("Template file not found: {}", cli.template.display());
    }
    if !has_extension(&cli.template, &["dotx", "docx"]) {
        anyhow::bail!("Template must be a .dotx or .docx file: {}", cli.template.display());
    }
    if !has_extension(&cli.output, &["docx"]) {
        anyhow::bail!("Output must be a .docx file: {}", cli.output.display());
    }
    if let Some(dir) = cli.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        if !dir.is_dir() {
            anyhow::bail!("Output directory does not exist: {}", dir.display());
        }
    }
    check_overwrite(cli)
}

fn check_overwrite(cli: &Cli) -> Result<()> {
    if cli.output.exists() && !cli.overwrite {
        anyhow::bail!(
            "Output file already exists: {} (use --overwrite to replace it)",
            cli.output.display()
        );
    }
    Ok(())
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| allowed.iter().any(|a| e.eq_ignore_ascii_case(a)))
}

fn load_blocks(input: &Path, preserve_breaks: bool, verbose: bool) -> Result<ExtractedDocument> {
    if has_extension(input, &["json"]) {
        return ExtractedDocument::read_json(input)
            .with_context(|| format!("Failed to read block stream: {}", input.display()));
    }
    Ok(DocxExtractor::new()
        .with_preserve_breaks(preserve_breaks)
        .with_verbose(verbose)
        .extract_file(input))
}

fn report_parse(progress: &Progress, stats: &ParseStats, blocks: usize) {
    progress.line(format!(
        "  {} blocks: {} headings, {} paragraphs, {} lists ({} bulleted, {} numbered), {} tables",
        blocks,
        stats.heading_total(),
        stats.paragraphs,
        stats.lists.bulleted + stats.lists.numbered,
        stats.lists.bulleted,
        stats.lists.numbered,
        stats.tables.count
    ));
    for warning in &stats.warnings {
        progress.line(format!("  Warning: {}", warning));
    }
}

fn report_write(progress: &Progress, summary: &RunSummary) {
    let result = &summary.write_result;
    progress.line(format!(
        "  Wrote {} headings, {} paragraphs, {} lists, {} tables",
        result.headings_written,
        result.paragraphs_written,
        result.lists_written,
        result.tables_written
    ));
    for warning in &result.warnings {
        progress.line(format!("  Warning: {}", warning));
    }
    if !result.polluting_styles.is_empty() {
        progress.line(format!(
            "  Styles added during writing: {}",
            result.polluting_styles.join(", ")
        ));
    }
}

fn emit_summary(dest: &Path, summary: &RunSummary) -> Result<()> {
    let json = summary.to_json().context("Failed to serialize run summary")?;
    if dest == Path::new(STDOUT_SUMMARY) {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", json).context("Failed to write summary to stdout")?;
        return Ok(());
    }
    fs::write(dest, json + "\n")
        .with_context(|| format!("Failed to write summary: {}", dest.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["stylecast"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_arguments() {
        let cli = parse(&[
            "in.docx",
            "-o",
            "out.docx",
            "-t",
            "corp.dotx",
            "--strict",
            "--batch-size",
            "10",
            "--summary",
            "-",
        ]);
        assert_eq!(cli.input, PathBuf::from("in.docx"));
        assert!(cli.strict);
        assert_eq!(cli.batch_size, Some(10));
        assert!(cli.summary_to_stdout());
    }

    #[test]
    fn test_lock_flags_conflict() {
        let result = Cli::try_parse_from([
            "stylecast",
            "in.docx",
            "-o",
            "o.docx",
            "-t",
            "t.dotx",
            "--no-lock",
            "--lock-nonblocking",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_flags_override_settings() {
        let settings = Settings::from_toml_str(
            r#"
[compose]
batch_size = 20
prefix_deep_headings = true

[lock]
mode = "nonblocking"
path = "/var/lock/stylecast.lock"

[extract]
preserve_breaks = true
"#,
        )
        .unwrap();

        let config = RunConfig::resolve(
            &parse(&["in.docx", "-o", "o.docx", "-t", "t.dotx"]),
            &settings,
        );
        assert_eq!(config.options.batch_size, 20);
        assert!(config.options.prefix_deep_headings);
        assert!(!config.options.strict);
        assert!(config.preserve_breaks);
        assert_eq!(config.lock_mode, LockMode::Nonblocking);
        assert_eq!(config.lock_path, PathBuf::from("/var/lock/stylecast.lock"));

        let config = RunConfig::resolve(
            &parse(&[
                "in.docx",
                "-o",
                "o.docx",
                "-t",
                "t.dotx",
                "--strict",
                "--no-lock",
                "--batch-size",
                "5",
                "--lock-path",
                "here.lock",
            ]),
            &settings,
        );
        assert_eq!(config.options.batch_size, 5);
        assert!(config.options.strict);
        assert_eq!(config.lock_mode, LockMode::Disabled);
        assert_eq!(config.lock_path, PathBuf::from("here.lock"));
    }

    #[test]
    fn test_default_lock_path() {
        let config = RunConfig::resolve(
            &parse(&["in.docx", "-o", "o.docx", "-t", "t.dotx"]),
            &Settings::default(),
        );
        assert_eq!(config.lock_mode, LockMode::Blocking);
        assert_eq!(config.lock_path, default_lock_path());
    }

    #[test]
    fn test_has_extension() {
        assert!(has_extension(Path::new("a/B.DOCX"), &["docx"]));
        assert!(has_extension(Path::new("t.dotx"), &["dotx", "docx"]));
        assert!(!has_extension(Path::new("notes.txt"), &["docx", "json"]));
        assert!(!has_extension(Path::new("noext"), &["docx"]));
    }
}
