//! Scratch-file management for the conversion pipeline.
//!
//! Each request owns a pair of files named by a fresh UUID:
//! `<id>_input.<ext>` in the upload directory and `<id>_output.mp4` in the
//! output directory. Files are removed as soon as the pipeline is done with
//! them; anything left behind (crash, abandoned upload) is reclaimed by the
//! opportunistic sweep.

use std::fs;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, SystemTime};

use axum::body::Bytes;
use futures::Stream;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};
use uuid::Uuid;

/// Create both scratch directories if they don't exist.
pub fn ensure_dirs(upload_dir: &Path, output_dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(upload_dir)?;
    fs::create_dir_all(output_dir)
}

/// Filesystem identity of one in-flight conversion.
#[derive(Debug, Clone)]
pub struct RequestFiles {
    pub id: Uuid,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl RequestFiles {
    /// Derive the input/output paths for a fresh request id. No existence
    /// check or retry; v4 ids do not collide in practice.
    pub fn new(upload_dir: &Path, output_dir: &Path, ext: &str) -> Self {
        let id = Uuid::new_v4();
        Self {
            input: upload_dir.join(format!("{}_input.{}", id, ext)),
            output: output_dir.join(format!("{}_output.mp4", id)),
            id,
        }
    }
}

/// Remove a scratch file, swallowing errors.
pub fn remove_quiet(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove scratch file {}: {}", path.display(), e);
        }
    }
}

/// Delete regular files in `dir` whose mtime is older than `retention`.
///
/// Best-effort: unreadable entries, missing metadata, and failed deletions
/// are all skipped without surfacing an error.
pub fn sweep_stale(dir: &Path, retention: Duration) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return,
    };

    let now = SystemTime::now();
    for entry in entries.flatten() {
        let meta = match entry.metadata() {
            Ok(meta) if meta.is_file() => meta,
            _ => continue,
        };
        let modified = match meta.modified() {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        if let Ok(age) = now.duration_since(modified) {
            if age > retention {
                debug!("Sweeping stale scratch file {}", entry.path().display());
                remove_quiet(&entry.path());
            }
        }
    }
}

/// Deletes the wrapped scratch file when dropped, swallowing errors.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        remove_quiet(&self.path);
    }
}

/// Byte stream over an open file that deletes the backing scratch file once
/// the stream is dropped.
///
/// Used as the response body for a converted video: whether the client reads
/// it to the end or hangs up halfway, the output file is gone as soon as the
/// body goes away.
pub struct GuardedStream {
    stream: ReaderStream<File>,
    _guard: ScratchFile,
}

impl GuardedStream {
    pub fn new(file: File, guard: ScratchFile) -> Self {
        Self {
            stream: ReaderStream::new(file),
            _guard: guard,
        }
    }
}

impl Stream for GuardedStream {
    type Item = std::io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.stream).poll_next(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_request_files_naming() {
        let files = RequestFiles::new(Path::new("/in"), Path::new("/out"), "mov");
        let input = files.input.file_name().unwrap().to_str().unwrap();
        let output = files.output.file_name().unwrap().to_str().unwrap();
        assert_eq!(input, format!("{}_input.mov", files.id));
        assert_eq!(output, format!("{}_output.mp4", files.id));
    }

    #[test]
    fn test_request_files_are_unique_per_request() {
        let a = RequestFiles::new(Path::new("/in"), Path::new("/out"), "mp4");
        let b = RequestFiles::new(Path::new("/in"), Path::new("/out"), "mp4");
        assert_ne!(a.id, b.id);
        assert_ne!(a.input, b.input);
        assert_ne!(a.output, b.output);
    }

    #[test]
    fn test_sweep_removes_only_stale_files() {
        let dir = tempdir().unwrap();
        let stale = dir.path().join("old_output.mp4");
        let fresh = dir.path().join("new_output.mp4");
        fs::write(&stale, b"stale").unwrap();
        fs::write(&fresh, b"fresh").unwrap();

        // A zero retention window makes any existing file stale.
        std::thread::sleep(Duration::from_millis(20));
        sweep_stale(dir.path(), Duration::ZERO);
        assert!(!stale.exists());

        fs::write(&fresh, b"fresh").unwrap();
        sweep_stale(dir.path(), Duration::from_secs(3600));
        assert!(fresh.exists());
    }

    #[test]
    fn test_sweep_ignores_missing_directory() {
        sweep_stale(Path::new("/nonexistent/statushd-sweep"), Duration::ZERO);
    }

    #[test]
    fn test_scratch_file_deletes_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("guarded.mp4");
        fs::write(&path, b"bytes").unwrap();

        let guard = ScratchFile::new(path.clone());
        assert!(path.exists());
        drop(guard);
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_file_drop_tolerates_missing_file() {
        let guard = ScratchFile::new(PathBuf::from("/nonexistent/guarded.mp4"));
        drop(guard);
    }

    #[tokio::test]
    async fn test_guarded_stream_deletes_after_consumption() {
        use futures::StreamExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("streamed.mp4");
        fs::write(&path, b"converted bytes").unwrap();

        let guard = ScratchFile::new(path.clone());
        let file = File::open(&path).await.unwrap();
        let mut stream = GuardedStream::new(file, guard);

        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(collected, b"converted bytes");

        assert!(path.exists());
        drop(stream);
        assert!(!path.exists());
    }
}
