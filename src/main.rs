use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use session_feed::{
    server::{self, AppState},
    transcript,
    watcher::{self, TranscriptEvent},
};
use std::{
    net::{IpAddr, SocketAddr},
    path::PathBuf,
};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "session-feed")]
#[command(about = "Normalized message feed for coding-agent session logs", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a transcript once and print the result as JSON
    Parse {
        path: PathBuf,
        /// Resume from this byte offset (a previous `bytesRead`)
        #[arg(long, default_value_t = 0)]
        from_byte: u64,
    },
    /// Print new messages as JSON lines while the transcript grows
    Follow {
        #[arg(required_unless_present = "project")]
        path: Option<PathBuf>,
        /// Follow the newest session log of this project directory instead
        #[arg(long, conflicts_with = "path")]
        project: Option<PathBuf>,
        /// Directory holding per-project session logs
        #[arg(long, env = "SESSION_FEED_LOG_ROOT")]
        log_root: Option<PathBuf>,
        #[arg(long, default_value_t = 0)]
        from_byte: u64,
    },
    /// Serve the feed over HTTP and WebSocket
    Serve {
        #[arg(long, env = "SESSION_FEED_HOST", default_value = "0.0.0.0")]
        host: IpAddr,
        #[arg(long, env = "SESSION_FEED_PORT", default_value_t = 4000)]
        port: u16,
        /// Directory holding per-project session logs
        #[arg(long, env = "SESSION_FEED_LOG_ROOT")]
        log_root: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    // Initialize tracing. Logs go to stderr so stdout stays pure JSON.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_feed=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match args.command {
        Command::Parse { path, from_byte } => {
            let result = transcript::parse(&path, from_byte).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Follow {
            path,
            project,
            log_root,
            from_byte,
        } => {
            let path = match (path, project) {
                (Some(path), _) => path,
                (None, Some(project)) => {
                    let root = log_root_or_default(log_root)?;
                    let cwd = std::path::absolute(&project)
                        .with_context(|| format!("invalid project dir: {}", project.display()))?;
                    watcher::find_session_log(&root, &cwd)?
                }
                (None, None) => anyhow::bail!("either a path or --project is required"),
            };
            follow(path, from_byte).await?;
        }
        Command::Serve {
            host,
            port,
            log_root,
        } => {
            let state = AppState {
                log_root: log_root_or_default(log_root)?,
            };
            let addr = SocketAddr::new(host, port);
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("failed to bind {addr}"))?;
            server::serve(listener, state, server::shutdown_signal()).await?;
        }
    }

    Ok(())
}

fn log_root_or_default(log_root: Option<PathBuf>) -> Result<PathBuf> {
    match log_root {
        Some(root) => Ok(root),
        None => watcher::default_log_root(),
    }
}

async fn follow(path: PathBuf, from_byte: u64) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let _watcher = watcher::watch_transcript(&path, from_byte, tx).await?;
    info!("following {}", path.display());

    let shutdown = server::shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(TranscriptEvent::Batch(batch)) => {
                    for message in &batch.messages {
                        println!("{}", serde_json::to_string(message)?);
                    }
                }
                Some(TranscriptEvent::Error { error }) => warn!("watch error: {error}"),
                None => break,
            },
            _ = &mut shutdown => break,
        }
    }

    Ok(())
}
