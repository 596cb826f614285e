use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod error;
mod fileops;
mod indexer;
mod media;
mod state;

#[cfg(test)]
mod testutil;

use config::Settings;
use error::IndexError;
use fileops::FileOpReport;
use indexer::{Indexer, IndexerState, ScanReport, Startup};
use state::store::IndexStore;

/// Index photos by the year they were taken
#[derive(Debug, Parser)]
#[command(name = "photo-index", version, about)]
struct Cli {
    /// Snapshot file location
    #[arg(long, env = "PHOTO_INDEX_CACHE", global = true)]
    cache: Option<PathBuf>,

    /// Comma-separated directories to scan when there is no usable snapshot
    #[arg(long, env = "PHOTO_INDEX_DIRS", global = true)]
    dirs: Option<String>,

    /// Log per-file details
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print photos grouped by year, newest first (default)
    Show,
    /// List the indexed root directories
    Dirs,
    /// Scan one more directory into the index
    Add { directory: PathBuf },
    /// Rebuild the index from every known directory
    Refresh,
    /// Copy photos into a directory
    Copy {
        #[arg(long)]
        to: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Move photos into a directory, then reindex
    Move {
        #[arg(long)]
        to: PathBuf,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let settings = Settings::resolve(cli.cache, cli.dirs.as_deref());
    let mut indexer = Indexer::new(IndexStore::new(&settings.cache_path));

    open_index(&mut indexer, &settings).await?;

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => print_groups(&indexer),
        Command::Dirs => print_directories(&indexer, &settings.cache_path),
        Command::Add { directory } => {
            let report = indexer
                .add_directory(directory.clone())
                .await
                .with_context(|| format!("cannot index {}", directory.display()))?;
            print_scan(&report);
            print_groups(&indexer);
        }
        Command::Refresh => {
            let report = indexer.refresh().await?;
            print_scan(&report);
            print_groups(&indexer);
        }
        Command::Copy { to, files } => {
            let report = fileops::copy_files(&files, &to)?;
            print_file_ops("Copied", &report);
        }
        Command::Move { to, files } => {
            let report = fileops::move_files(&files, &to)?;
            print_file_ops("Moved", &report);
            if let Some(scan) = indexer.files_moved(&report).await? {
                print_scan(&scan);
            }
            print_groups(&indexer);
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

/// Run the startup flow: trust the cache if it validates, otherwise do a
/// full scan of the configured directories.
async fn open_index(indexer: &mut Indexer, settings: &Settings) -> anyhow::Result<()> {
    match indexer.start() {
        Startup::Ready {
            changed,
            removed_photos,
            removed_directories,
            save_error,
        } => {
            if changed {
                println!(
                    "Removed {} missing photos and {} missing directories from the index.",
                    removed_photos, removed_directories
                );
            }
            report_save_error(save_error.as_ref());
        }
        Startup::NeedsFullScan { cause } => {
            if let Some(IndexError::CorruptSnapshot { reason, .. }) = &cause {
                println!("Cached index was discarded ({reason}), rebuilding it.");
            }
            if settings.directories.is_empty() {
                return Err(IndexError::NoDirectoriesProvided)
                    .context("pass existing directories with --dirs to build the index");
            }
            let report = indexer.full_scan(settings.directories.clone()).await?;
            print_scan(&report);
        }
    }
    debug_assert_eq!(indexer.state(), IndexerState::Ready);
    Ok(())
}

fn print_scan(report: &ScanReport) {
    println!(
        "Indexed {} directories: {} new photos, {} total.",
        report.roots.len(),
        report.added,
        report.total
    );
    report_save_error(report.save_error.as_ref());
}

fn report_save_error(error: Option<&IndexError>) {
    if let Some(error) = error {
        eprintln!("Warning: {error}. The index is still usable for this session.");
    }
}

fn print_groups(indexer: &Indexer) {
    let index = indexer.index();
    if index.is_empty() {
        println!("No photos indexed.");
        return;
    }

    for (year, photos) in index.groups() {
        println!("{} ({} photos)", year, photos.len());
        for photo in photos {
            println!("  {}", photo.display());
        }
    }
}

fn print_directories(indexer: &Indexer, store_path: &std::path::Path) {
    println!("Snapshot: {}", store_path.display());
    for root in indexer.indexed_directories().iter() {
        println!("{}", root.display());
    }
    if let Some(when) = indexer.last_index_time() {
        println!("Last indexed: {}", when.to_rfc3339());
    }
}

fn print_file_ops(verb: &str, report: &FileOpReport) {
    println!("{} {} files.", verb, report.completed.len());
    if report.is_complete() {
        return;
    }
    for failure in &report.failed {
        eprintln!("Error: {failure}");
    }
}
