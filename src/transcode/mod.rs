//! External ffmpeg invocation.
//!
//! ffmpeg is treated as a black box: the binary is resolved and probed once
//! at startup, and every conversion after that is a single invocation of a
//! fixed argument set tuned for messaging-app status video.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// How long the `-version` probe may take before the transcoder is declared
/// unavailable.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Fixed conversion preset:
/// - limit to 30 seconds (status clip length)
/// - H.264, slow preset, CRF 18 (near-lossless)
/// - scale to 1080 wide with lanczos, height rounded to even
/// - 5000k video bitrate capped at 6000k, yuv420p for device compatibility
/// - AAC audio at 192k / 48kHz
/// - faststart so the MP4 plays while still downloading
const STATUS_PRESET: [&str; 26] = [
    "-t", "30",
    "-c:v", "libx264",
    "-preset", "slow",
    "-crf", "18",
    "-vf", "scale=1080:-2:flags=lanczos",
    "-b:v", "5000k",
    "-maxrate", "6000k",
    "-bufsize", "12000k",
    "-pix_fmt", "yuv420p",
    "-c:a", "aac",
    "-b:a", "192k",
    "-ar", "48000",
    "-movflags", "+faststart",
];

#[derive(Debug, Error)]
pub enum TranscodeError {
    /// ffmpeg exited non-zero; carries its stderr text.
    #[error("FFmpeg error: {0}")]
    Failed(String),
    #[error("Failed to run FFmpeg: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Resolve the ffmpeg binary, preferring an explicit override over PATH.
pub fn resolve_transcoder(override_path: Option<&Path>) -> Option<PathBuf> {
    match override_path {
        Some(path) => Some(path.to_path_buf()),
        None => which::which("ffmpeg").ok(),
    }
}

/// Check that the transcoder responds to a version probe within the timeout.
pub async fn probe_transcoder(bin: &Path) -> bool {
    // The child is killed if the timeout wins the race.
    let probe = tokio::time::timeout(
        PROBE_TIMEOUT,
        Command::new(bin)
            .arg("-version")
            .kill_on_drop(true)
            .output(),
    )
    .await;

    match probe {
        Ok(Ok(output)) => output.status.success(),
        Ok(Err(e)) => {
            warn!("Transcoder probe failed to run {}: {}", bin.display(), e);
            false
        }
        Err(_) => {
            warn!("Transcoder probe timed out for {}", bin.display());
            false
        }
    }
}

/// Resolve and probe in one step, as done once at service startup.
///
/// Returns the usable binary path, or `None` when conversions must be
/// rejected as unavailable.
pub async fn detect(override_path: Option<&Path>) -> Option<PathBuf> {
    let bin = resolve_transcoder(override_path)?;
    if probe_transcoder(&bin).await {
        Some(bin)
    } else {
        None
    }
}

/// Convert `input` into a status-ready MP4 at `output`.
///
/// Blocks for the full duration of the encode; no timeout is applied to the
/// conversion itself. A non-zero exit is reported with ffmpeg's stderr text.
pub async fn optimize_for_status(
    bin: &Path,
    input: &Path,
    output: &Path,
) -> Result<(), TranscodeError> {
    debug!(
        "Converting {} -> {}",
        input.display(),
        output.display()
    );

    let result = Command::new(bin)
        .arg("-i")
        .arg(input)
        .args(STATUS_PRESET)
        .arg("-y")
        .arg(output)
        .output()
        .await?;

    if !result.status.success() {
        let stderr = String::from_utf8_lossy(&result.stderr);
        return Err(TranscodeError::Failed(stderr.trim().to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preset_value(flag: &str) -> Option<&'static str> {
        STATUS_PRESET
            .iter()
            .position(|arg| *arg == flag)
            .map(|i| STATUS_PRESET[i + 1])
    }

    #[test]
    fn test_preset_trims_to_thirty_seconds() {
        assert_eq!(preset_value("-t"), Some("30"));
    }

    #[test]
    fn test_preset_encodes_h264_aac_faststart() {
        assert_eq!(preset_value("-c:v"), Some("libx264"));
        assert_eq!(preset_value("-c:a"), Some("aac"));
        assert_eq!(preset_value("-movflags"), Some("+faststart"));
        assert_eq!(preset_value("-pix_fmt"), Some("yuv420p"));
    }

    #[test]
    fn test_preset_scales_to_even_1080_width() {
        assert_eq!(preset_value("-vf"), Some("scale=1080:-2:flags=lanczos"));
    }

    #[test]
    fn test_preset_bitrates() {
        assert_eq!(preset_value("-b:v"), Some("5000k"));
        assert_eq!(preset_value("-maxrate"), Some("6000k"));
        assert_eq!(preset_value("-bufsize"), Some("12000k"));
        assert_eq!(preset_value("-b:a"), Some("192k"));
        assert_eq!(preset_value("-ar"), Some("48000"));
    }

    #[test]
    fn test_resolve_prefers_override() {
        let override_path = Path::new("/opt/ffmpeg/bin/ffmpeg");
        assert_eq!(
            resolve_transcoder(Some(override_path)),
            Some(override_path.to_path_buf())
        );
    }

    #[tokio::test]
    async fn test_probe_fails_for_missing_binary() {
        assert!(!probe_transcoder(Path::new("/nonexistent/ffmpeg")).await);
    }

    #[tokio::test]
    async fn test_detect_rejects_unusable_override() {
        let detected = detect(Some(Path::new("/nonexistent/ffmpeg"))).await;
        assert!(detected.is_none());
    }
}
