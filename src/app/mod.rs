//! Service startup and wiring.

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::api::{ApiServer, ServiceState};
use crate::config::Settings;
use crate::scratch;
use crate::transcode;

/// Initialize scratch storage, probe the transcoder once, and serve.
pub async fn run_service(settings: Settings) -> Result<()> {
    info!("Starting StatusHD service");

    scratch::ensure_dirs(&settings.upload_dir, &settings.output_dir)
        .context("Failed to create scratch directories")?;
    info!(
        "Scratch storage at {} and {}",
        settings.upload_dir.display(),
        settings.output_dir.display()
    );

    let transcoder = transcode::detect(settings.transcoder_path.as_deref()).await;
    match &transcoder {
        Some(bin) => info!("Transcoder ready: {}", bin.display()),
        None => warn!("FFmpeg not found or not responding; conversion requests will be rejected"),
    }

    let state = ServiceState::new(settings, transcoder);
    ApiServer::new(state).start().await
}
