//! resonote-annotate - terminal annotation client

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use resonote_client::app::SAVE_DISPLAY_DELAY;
use resonote_client::backend::DEFAULT_SERVER_URL;
use resonote_client::commands::{self, Command, HELP};
use resonote_client::local_store::LocalStore;
use resonote_client::queue::DEFAULT_QUEUE_SIZE;
use resonote_client::view::render_notice;
use resonote_client::{Annotator, AnnotatorConfig, HttpBackend, Notice, Phase};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(30);

/// Used when `RUST_LOG` is unset; logs go to stderr
const DEFAULT_LOG_FILTER: &str = "resonote_client=info";

/// Command-line arguments for resonote-annotate
#[derive(Parser, Debug)]
#[command(name = "resonote-annotate")]
#[command(about = "Tag song lyrics along four facets")]
#[command(version)]
struct Args {
    /// Annotation server base URL
    #[arg(short, long, default_value = DEFAULT_SERVER_URL, env = "RESONOTE_SERVER")]
    server: String,

    /// Tracks assigned to a new session
    #[arg(short, long, default_value_t = DEFAULT_QUEUE_SIZE)]
    queue_size: usize,

    /// Seed for a reproducible track order
    #[arg(long)]
    seed: Option<u64>,

    /// Directory for the session snapshot and text scale
    #[arg(long, env = "RESONOTE_STATE_DIR")]
    state_dir: Option<PathBuf>,

    /// Where exports are written
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,

    /// Start a new session even if a recent one was saved
    #[arg(long)]
    fresh: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with the screen
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let backend = HttpBackend::new(&args.server)?;
    let store = LocalStore::new(args.state_dir.unwrap_or_else(LocalStore::default_dir));
    let config = AnnotatorConfig {
        queue_size: args.queue_size,
        seed: args.seed,
        fresh: args.fresh,
        export_dir: args.export_dir,
        save_delay: SAVE_DISPLAY_DELAY,
    };

    info!(server = %backend.base_url(), state_dir = %store.dir().display(), "Starting resonote-annotate");

    let mut app = Annotator::new(backend, store, config);
    let notices = app.start().await;
    print_notices(&notices);
    if app.phase() == Phase::Loading {
        bail!("could not load data from {}", args.server);
    }

    println!("{}", app.render());
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut snapshots = tokio::time::interval(SNAPSHOT_INTERVAL);
    snapshots.tick().await;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = match commands::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        print_notices(&[Notice::warning(e.to_string())]);
                        continue;
                    }
                };

                let reply = app.handle(command).await;
                print_notices(&reply.notices);
                if reply.quit {
                    break;
                }
                if let Some(delay) = reply.delay_render {
                    tokio::time::sleep(delay).await;
                }
                println!("{}", app.render());
            }
            _ = snapshots.tick() => {
                app.save_snapshot();
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C");
                let reply = app.handle(Command::Quit).await;
                print_notices(&reply.notices);
                if reply.quit {
                    break;
                }
            }
        }
    }

    app.save_snapshot();
    Ok(())
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        println!("{}", render_notice(notice));
    }
}
