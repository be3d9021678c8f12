//! # Retime CLI
//!
//! Records file modification times for a list of projects and puts them back
//! after a checkout or copy has rewritten them.
//!
//! ## Usage
//! ```bash
//! # Scan every project listed in settings/repos.yaml (default mode)
//! retime -r
//!
//! # Scan with another settings file, rebuilding snapshots from scratch
//! retime -r -s repos_test.yaml --reset
//!
//! # Restore recorded times below another anchor directory
//! retime -w -s repos_single.yaml -d /mnt/g
//! ```

use anyhow::Context;
use clap::Parser;
use colored::*;
use humantime::format_duration;
use indicatif::{ProgressBar, ProgressStyle};
use retime::config::{Settings, DEFAULT_SETTINGS_PATH};
use retime::{BatchReport, Mode, ProgressInfo, ProjectOutcome, RetimeBuilder};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Retime - keep file modification times across checkouts and copies
#[derive(Parser)]
#[command(name = "retime")]
#[command(version)]
#[command(about = "Record and restore file modification times for a list of projects")]
#[command(long_about = None)]
struct Cli {
    /// Scan projects and update their snapshots (default)
    #[arg(short = 'r', long = "read", conflicts_with = "write")]
    read: bool,

    /// Restore recorded modification times
    #[arg(short = 'w', long = "write")]
    write: bool,

    /// Settings file; a bare name is also looked up in ./settings
    #[arg(short, long, default_value = DEFAULT_SETTINGS_PATH)]
    settings: PathBuf,

    /// Anchor directory the project paths are relative to
    #[arg(short, long, default_value = ".")]
    drive: PathBuf,

    /// Ignore existing snapshots when scanning
    #[arg(long)]
    reset: bool,

    /// Show hashing progress
    #[arg(long)]
    progress: bool,

    /// Log every file that is skipped or left unchanged
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn mode(&self) -> Mode {
        if self.write {
            Mode::Restore
        } else {
            Mode::Scan
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Run the selected mode; `Ok(false)` means at least one project failed
fn run(cli: Cli) -> anyhow::Result<bool> {
    let mode = cli.mode();
    let settings_path = resolve_settings_path(&cli.settings);
    let settings = Settings::load(&settings_path)
        .with_context(|| format!("cannot load settings {}", settings_path.display()))?;

    let progress_bar = if cli.progress && mode == Mode::Scan {
        Some(make_progress_bar())
    } else {
        None
    };

    let mut builder = RetimeBuilder::new()
        .exclude_rules(settings.ignore_list.clone())
        .reset(cli.reset);
    if let Some(pb) = progress_bar.clone() {
        builder = builder.progress_callback(Arc::new(move |info: ProgressInfo| {
            if let Some(total) = info.total {
                pb.set_length(total as u64);
            }
            pb.set_position(info.processed as u64);
            if let Some(item) = info.current_item {
                pb.set_message(item);
            }
        }));
    }
    let retime = builder.build()?;

    println!(
        "{} {} project(s) from {}",
        match mode {
            Mode::Scan => "Scanning".blue().bold(),
            Mode::Restore => "Restoring".blue().bold(),
        },
        settings.repos.len(),
        settings_path.display().to_string().cyan()
    );

    let start = Instant::now();
    let report = retime.run_batch(mode, &cli.drive, &settings.repos);

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    print_report(&report);
    println!(
        "\n{} in {}",
        if report.is_success() {
            "Done".green().bold()
        } else {
            format!("{} failed", report.failed_count()).red().bold()
        },
        format_duration(Duration::from_millis(start.elapsed().as_millis() as u64))
            .to_string()
            .cyan()
    );

    Ok(report.is_success())
}

/// Accept `repos.yaml` as shorthand for `settings/repos.yaml`
fn resolve_settings_path(path: &Path) -> PathBuf {
    if path.exists() || path.components().count() != 1 {
        return path.to_path_buf();
    }
    let in_settings_dir = Path::new("settings").join(path);
    if in_settings_dir.exists() {
        in_settings_dir
    } else {
        path.to_path_buf()
    }
}

fn make_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb
}

fn print_report(report: &BatchReport) {
    for entry in &report.projects {
        let name = format!("'{}'", entry.root.display());
        match &entry.outcome {
            ProjectOutcome::Scanned(result) => {
                println!(
                    "{} {} {} files",
                    "✓".green().bold(),
                    name.cyan(),
                    result.files_scanned
                );
                if result.stats.has_changes() {
                    println!(
                        "    {} added, {} modified, {} removed",
                        result.stats.files_added.to_string().green(),
                        result.stats.files_modified.to_string().yellow(),
                        result.stats.files_deleted.to_string().red()
                    );
                }
                print_warnings(&result.warnings);
            }
            ProjectOutcome::Restored(result) => {
                println!(
                    "{} {} {} timestamp(s) updated",
                    "✓".green().bold(),
                    name.cyan(),
                    result.files_restored.to_string().yellow()
                );
                if result.files_changed > 0 || result.files_missing > 0 {
                    println!(
                        "    {} changed, {} missing",
                        result.files_changed, result.files_missing
                    );
                }
                print_warnings(&result.warnings);
            }
            ProjectOutcome::Failed(e) => {
                println!("{} {} {}", "✗".red().bold(), name.cyan(), e.user_message().red());
            }
        }
    }
}

fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        println!("    - {}", warning.yellow());
    }
}
