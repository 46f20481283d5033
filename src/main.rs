mod api;
mod app;
mod application;
mod domain;
mod ui;
mod utils;

use std::io::{self, StdinLock, Stdout};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueHint};
use indicatif::ProgressDrawTarget;
use log::{error, info, warn, LevelFilter};

use api::ApiConfig;
use app::{App, Download, Settings};
use application::DEFAULT_JOBS;
use domain::{AppError, AudioFormat};
use ui::ConsoleView;

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Exit status when some tracks could not be downloaded.
const EXIT_PARTIAL: u8 = 2;

/// Exit status when the run stopped before downloading anything.
const EXIT_FATAL: u8 = 1;

/// Download a whole soundtrack album from the catalog.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Title to search for
    ///
    /// Prompted for when omitted.
    title: Option<String>,

    /// Pick the N-th search result instead of prompting (1-based)
    #[arg(short, long, value_name = "N")]
    select: Option<usize>,

    /// Directory the album folder is created in
    #[arg(short, long, value_name = "DIR", value_hint = ValueHint::DirPath, default_value = "downloads")]
    output_dir: PathBuf,

    /// Maximum number of tracks downloading at the same time
    #[arg(short, long, value_name = "COUNT", default_value_t = DEFAULT_JOBS)]
    jobs: usize,

    /// Prefer FLAC when a track offers it
    #[arg(long, default_value_t = false)]
    flac: bool,

    /// Catalog root URL
    #[arg(long, env = "VGM_BASE_URL", value_hint = ValueHint::Url, default_value_t = ApiConfig::default().base_url)]
    base_url: String,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,
}

/// Initializes the logger facade.
///
/// Command line flags take precedence over `RUST_LOG`, which takes
/// precedence over the `info` default.
fn init_logger(args: &Args) {
    let mut logger = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if args.quiet || args.verbose > 0 {
        let level = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module(module_path!(), level);
    }

    logger.init();
}

fn console() -> ConsoleView<StdinLock<'static>, Stdout> {
    ConsoleView::new(io::stdin().lock(), io::stdout())
}

async fn run(args: Args) -> Result<Download, AppError> {
    let api = ApiConfig::with_base_url(args.base_url);
    let settings = Settings {
        output_dir: args.output_dir,
        jobs: args.jobs,
        format: if args.flac {
            AudioFormat::Flac
        } else {
            AudioFormat::Mp3
        },
    };
    let app = App::new(api, settings)?;

    let title = match args.title {
        Some(title) => title,
        None => console().ask_title()?,
    };

    let albums = app.search(&title).await?;
    let index = match args.select {
        Some(position) => ui::select_by_position(&albums, position)?,
        None => console().select_album(&albums)?,
    };

    app.download(&albums[index], ProgressDrawTarget::stdout())
        .await
}

fn report(download: &Download) {
    let summary = &download.summary;
    println!("\nDownload Complete!");

    for link in &summary.skipped {
        warn!("no download link on {}", link);
    }
    for failure in &summary.failed {
        warn!("{}", failure);
    }

    println!(
        "{} saved, {} without a download link, {} failed",
        summary.saved.len(),
        summary.skipped.len(),
        summary.failure_count()
    );

    let dir = std::fs::canonicalize(&download.album_dir)
        .unwrap_or_else(|_| download.album_dir.clone());
    println!("Saved to {}", dir.display());
}

/// `0` when every track is done, [`EXIT_PARTIAL`] when some failed and
/// `1` when the run itself failed.
fn exit_status(result: &Result<Download, AppError>) -> u8 {
    match result {
        Ok(download) if download.summary.is_complete() => 0,
        Ok(_) => EXIT_PARTIAL,
        Err(_) => EXIT_FATAL,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(&args);

    let result = run(args).await;
    match &result {
        Ok(download) => {
            report(download);
            if !download.summary.is_complete() {
                info!(
                    "{} of {} tracks failed",
                    download.summary.failure_count(),
                    download.summary.total()
                );
            }
        }
        Err(e) => error!("{}", e),
    }

    ExitCode::from(exit_status(&result))
}
