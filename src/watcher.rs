use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{bail, Context, Result};
use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::transcript::{self, ParseResult};

/// Events emitted while following a transcript.
#[derive(Debug, Clone)]
pub enum TranscriptEvent {
    /// Result of one incremental parse. `bytes_read` is where the next one
    /// starts.
    Batch(ParseResult),
    Error { error: String },
}

// ---------------------------------------------------------------------------
// Transcript watcher
// ---------------------------------------------------------------------------

/// Follow a transcript and emit parsed batches as it grows.
///
/// 1. Registers a `notify` (inotify on Linux) watch on the file.
/// 2. Parses from `from_byte` and sends the first `TranscriptEvent::Batch`.
/// 3. On every write burst re-parses from just before the last `bytes_read`
///    (see [`resume_offset`]), sending a batch whenever the offset moves.
///
/// The returned `notify::RecommendedWatcher` **must be kept alive** by the
/// caller -- dropping it stops file-system notifications.
pub async fn watch_transcript(
    path: &Path,
    from_byte: u64,
    event_tx: mpsc::UnboundedSender<TranscriptEvent>,
) -> Result<notify::RecommendedWatcher> {
    if !path.is_file() {
        bail!("transcript does not exist: {}", path.display());
    }

    // --- set up file-system watcher ---
    // `notify` callbacks are sync; bridge to async with an unbounded channel.
    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel::<Result<(), String>>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        match res {
            Ok(event) if event.kind.is_modify() => {
                let _ = notify_tx.send(Ok(()));
            }
            Ok(_) => {}
            Err(e) => {
                error!("notify error: {e}");
                let _ = notify_tx.send(Err(e.to_string()));
            }
        }
    })?;

    // Watch before the first read so writes landing in between still fire.
    watcher
        .watch(path, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", path.display()))?;
    info!("watching transcript {}", path.display());

    // --- initial read ---
    let initial = transcript::parse(path, from_byte).await;
    let start_pos = initial.bytes_read;
    event_tx.send(TranscriptEvent::Batch(initial)).ok();

    let file_path = path.to_path_buf();
    tokio::spawn(async move {
        let mut pos = start_pos;
        while let Some(signal) = notify_rx.recv().await {
            if let Err(error) = signal {
                if event_tx.send(TranscriptEvent::Error { error }).is_err() {
                    return;
                }
                continue;
            }

            // Drain any extra notifications that arrived while we were
            // processing so we do a single read per burst.
            while notify_rx.try_recv().is_ok() {}

            pos = rewind_if_truncated(&file_path, pos).await;
            let result = transcript::parse(&file_path, resume_offset(pos)).await;
            if result.bytes_read == pos && result.messages.is_empty() {
                continue;
            }

            pos = result.bytes_read;
            if event_tx.send(TranscriptEvent::Batch(result)).is_err() {
                debug!("event_tx closed, stopping transcript watcher task");
                return;
            }
        }
    });

    Ok(watcher)
}

/// Offset to hand to [`transcript::parse`] when polling again after `pos`.
///
/// `parse` discards everything up to the first line break after a nonzero
/// offset. Stepping back one byte lands on the `\n` that ended the previous
/// read, so only that empty fragment is discarded and the first appended
/// line survives. A line that was still being written at `pos` has no `\n`
/// there, and its tail is discarded as torn.
pub fn resume_offset(pos: u64) -> u64 {
    pos.saturating_sub(1)
}

/// A log that shrank below our offset was replaced or truncated; start over.
async fn rewind_if_truncated(path: &Path, pos: u64) -> u64 {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() < pos => {
            warn!(
                path = %path.display(),
                old_offset = pos,
                new_len = meta.len(),
                "transcript shrank, re-reading from start"
            );
            0
        }
        _ => pos,
    }
}

// ---------------------------------------------------------------------------
// Log file location helpers
// ---------------------------------------------------------------------------

/// Default directory the agent writes its session logs under.
pub fn default_log_root() -> Result<PathBuf> {
    let home = dirs::home_dir().context("cannot determine home directory")?;
    Ok(home.join(".claude").join("projects"))
}

/// Directory name the agent uses for a project: the absolute working
/// directory with every `/` replaced by `-`, so `/home/user/proj` becomes
/// `-home-user-proj`.
pub fn encode_project_dir(cwd: &Path) -> Result<String> {
    Ok(cwd
        .to_str()
        .context("working directory is not valid UTF-8")?
        .replace('/', "-"))
}

/// Find the newest `.jsonl` session log for the project rooted at `cwd`.
pub fn find_session_log(log_root: &Path, cwd: &Path) -> Result<PathBuf> {
    let project_dir = log_root.join(encode_project_dir(cwd)?);

    if !project_dir.is_dir() {
        bail!(
            "project log directory does not exist: {}",
            project_dir.display()
        );
    }

    newest_jsonl_in(&project_dir)
        .with_context(|| format!("no .jsonl files in {}", project_dir.display()))
}

/// Return the path of the newest `.jsonl` file inside `dir`.
pub fn newest_jsonl_in(dir: &Path) -> Option<PathBuf> {
    let mut best: Option<(SystemTime, PathBuf)> = None;

    for entry in std::fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("jsonl") {
            continue;
        }
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let Ok(modified) = meta.modified() else {
            continue;
        };
        if best.as_ref().map_or(true, |(t, _)| modified > *t) {
            best = Some((modified, path));
        }
    }

    best.map(|(_, p)| p)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
