//! # Abstract Stream CLI (`astream`)
//!
//! The `astream` binary runs interactive triage sessions over the configured
//! sources and reports on the snapshot.
//!
//! ## Usage
//!
//! ```bash
//! astream --config ./config/astream.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `astream stats` | Summarize the snapshot |
//! | `astream sources` | List configured sources |
//! | `astream session` | Rate papers one at a time |
//! | `astream download <id>` | Download a paper's PDF |
//!
//! Inside a session, each line of input is one command:
//!
//! | Key | Action |
//! |-----|--------|
//! | `i` | mark interested |
//! | `r` | mark read |
//! | `l` | mark liked |
//! | `d` | mark disliked |
//! | `s` | skip |
//! | `x` | explore (random order) |
//! | `v` | discover (best signal first) |
//! | `w` | write the snapshot |
//! | `p` | download the active paper's PDF |
//! | `q` | write the snapshot and quit |

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use abstract_stream::config::{self, Config};
use abstract_stream::download::PdfDownloader;
use abstract_stream::error::TriageError;
use abstract_stream::models::DocumentView;
use abstract_stream::session::Session;
use abstract_stream::{sources, stats};

/// Abstract Stream CLI: stream paper abstracts, rate them, and let the
/// engine surface the best next one.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. Missing sections fall back to defaults.
#[derive(Parser)]
#[command(
    name = "astream",
    about = "Abstract Stream: a personal literature-triage engine",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/astream.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize the snapshot: rating counts, queue length, last rating.
    Stats,

    /// List configured sources with their effective query.
    Sources,

    /// Start an interactive triage session.
    ///
    /// Shows one paper at a time and reads single-letter commands from
    /// stdin. Ratings are written to the snapshot immediately.
    Session {
        /// Start in explore mode (random order) instead of best signal.
        #[arg(long)]
        explore: bool,

        /// Do not write the snapshot after a refill.
        #[arg(long)]
        no_store: bool,
    },

    /// Download a paper's PDF by id.
    Download {
        /// Paper id, e.g. `2101.00001v2` or `cs/0412050v1`.
        id: String,
    },
}

const HELP: &str = "[i]nterested [r]ead [l]iked [d]isliked [s]kip e[x]plore disco[v]er [w]rite [p]df [q]uit";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("abstract_stream=info,astream=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Stats => {
            stats::run_stats(&cfg)?;
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Session { explore, no_store } => {
            run_session(&cfg, explore, !no_store).await?;
        }
        Commands::Download { id } => {
            let path = PdfDownloader::new(&cfg.download)?.fetch(&id).await?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

async fn run_session(cfg: &Config, explore: bool, store: bool) -> Result<()> {
    let mut session = Session::from_config(cfg)?;
    let downloader = PdfDownloader::new(&cfg.download)?;
    session.load()?;
    println!("{}", session.repository().stats());

    let first = if explore {
        session.explore(store).await.map(show)
    } else {
        session.discover(store).await.map(show)
    };
    recover(first)?;
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let outcome = match line.trim() {
            "i" => session.mark_interested().await.map(show),
            "r" => session.mark_read().await.map(show),
            "l" => session.mark_liked().await.map(show),
            "d" => session.mark_disliked().await.map(show),
            "s" => session.skip().await.map(show),
            "x" => session.explore(store).await.map(show),
            "v" => session.discover(store).await.map(show),
            "w" => session.store(),
            "p" => match session.repository().active().map(|d| d.id.clone()) {
                Some(id) => downloader.fetch(&id).await.map(|path| {
                    println!("Saved {}", path.display());
                }),
                None => Err(TriageError::NoActiveItem.into()),
            },
            "q" => break,
            "" => continue,
            _ => {
                println!("{}", HELP);
                continue;
            }
        };

        recover(outcome)?;
    }

    session.store()?;
    println!("{}", session.stats());
    Ok(())
}

/// Report a failed command and keep the session going.
///
/// Source, scoring, download and store failures leave the in-memory state
/// intact, so the user can retry. A duplicate id across collections means
/// the state itself is broken and ends the session.
fn recover(outcome: Result<()>) -> Result<()> {
    match outcome {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<TriageError>() {
            Some(TriageError::DuplicateId(_)) => Err(e),
            _ => {
                eprintln!("error: {:#}", e);
                Ok(())
            }
        },
    }
}

fn show(view: Option<DocumentView<'_>>) {
    match view {
        Some(view) => println!("\n{}", view),
        None => println!("\nNo more documents. Add sources or try again later."),
    }
}
