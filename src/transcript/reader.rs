use std::io::{self, SeekFrom};
use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::debug;

/// Bytes read from a transcript, decoded, plus the file size observed before
/// the read.
#[derive(Debug, PartialEq)]
pub(crate) struct Chunk {
    pub content: String,
    pub bytes_read: u64,
}

/// Read everything from `from_byte` to end-of-file.
///
/// Returns `None` when the file is missing or unreadable. When the file has
/// not grown past `from_byte`, returns an empty chunk that keeps the offset.
pub(crate) async fn read_from_offset(path: &Path, from_byte: u64) -> Option<Chunk> {
    match try_read(path, from_byte).await {
        Ok(chunk) => Some(chunk),
        Err(e) => {
            debug!("transcript {} unavailable: {e}", path.display());
            None
        }
    }
}

async fn try_read(path: &Path, from_byte: u64) -> io::Result<Chunk> {
    // The size is taken before the read; growth in between is not chased.
    let size = tokio::fs::metadata(path).await?.len();
    if size <= from_byte {
        return Ok(Chunk {
            content: String::new(),
            bytes_read: from_byte,
        });
    }

    let mut file = File::open(path).await?;
    if from_byte > 0 {
        file.seek(SeekFrom::Start(from_byte)).await?;
    }

    let mut buf = Vec::with_capacity((size - from_byte) as usize);
    file.read_to_end(&mut buf).await?;

    Ok(Chunk {
        content: decode_utf8(buf),
        bytes_read: size,
    })
}

/// Decode with SIMD validation, replacing invalid sequences instead of
/// failing. A resumed read may start inside a multi-byte character; that
/// fragment is discarded by the segmenter anyway.
fn decode_utf8(buf: Vec<u8>) -> String {
    match simdutf8::basic::from_utf8(&buf) {
        Ok(text) => text.to_owned(),
        Err(_) => String::from_utf8_lossy(&buf).into_owned(),
    }
}

/// Split freshly read content into lines that are safe to parse.
///
/// After a nonzero offset the first line may be the tail of a line that was
/// still being written, so everything up to and including the first line
/// break is dropped. Blank lines are skipped.
pub(crate) fn segment_lines(content: &str, from_byte: u64) -> impl Iterator<Item = &str> {
    let safe = if from_byte > 0 {
        match content.find('\n') {
            Some(idx) => &content[idx + 1..],
            None => "",
        }
    } else {
        content
    };

    safe.lines().filter(|line| !line.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
