//! Service configuration.
//!
//! The conversion preset, upload cap, and allowed formats are fixed by
//! design; the only runtime knobs are the bind port, the scratch directory
//! roots, and an optional explicit transcoder path.

use std::path::PathBuf;
use std::time::Duration;

/// Multipart form field that must carry the upload.
pub const UPLOAD_FIELD: &str = "video";

/// Upload extensions accepted for conversion, compared case-insensitively.
pub const ALLOWED_EXTENSIONS: [&str; 6] = ["mp4", "mov", "avi", "mkv", "webm", "m4v"];

/// Maximum accepted upload size in bytes (100MB).
pub const MAX_FILE_SIZE: u64 = 100 * 1024 * 1024;

/// Scratch files older than this are removed by the sweep.
pub const RETENTION: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct Settings {
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Directory uploaded inputs are persisted to.
    pub upload_dir: PathBuf,
    /// Directory converted outputs are written to.
    pub output_dir: PathBuf,
    /// Upload size cap in bytes.
    pub max_file_size: u64,
    /// Age past which scratch files are swept.
    pub retention: Duration,
    /// Explicit path to the ffmpeg binary. Resolved from PATH when unset.
    pub transcoder_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        let scratch = std::env::temp_dir().join("statushd");
        Self {
            port: 5000,
            upload_dir: scratch.join("uploads"),
            output_dir: scratch.join("outputs"),
            max_file_size: MAX_FILE_SIZE,
            retention: RETENTION,
            transcoder_path: None,
        }
    }
}

/// Return the lowercased extension when the filename carries an allow-listed
/// one.
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Some(ext)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extension_accepts_listed_formats() {
        for ext in ALLOWED_EXTENSIONS {
            let name = format!("clip.{}", ext);
            assert_eq!(allowed_extension(&name).as_deref(), Some(ext));
        }
    }

    #[test]
    fn test_allowed_extension_is_case_insensitive() {
        assert_eq!(allowed_extension("CLIP.MP4").as_deref(), Some("mp4"));
        assert_eq!(allowed_extension("holiday.MoV").as_deref(), Some("mov"));
    }

    #[test]
    fn test_allowed_extension_rejects_unlisted_or_missing() {
        assert_eq!(allowed_extension("notes.txt"), None);
        assert_eq!(allowed_extension("archive.tar.gz"), None);
        assert_eq!(allowed_extension("no_extension"), None);
        assert_eq!(allowed_extension("trailing."), None);
        assert_eq!(allowed_extension(""), None);
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.port, 5000);
        assert_eq!(settings.max_file_size, 100 * 1024 * 1024);
        assert_eq!(settings.retention, Duration::from_secs(3600));
        assert!(settings.transcoder_path.is_none());
        assert_ne!(settings.upload_dir, settings.output_dir);
    }
}
