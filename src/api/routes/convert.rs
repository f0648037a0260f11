//! Video conversion endpoint.
//!
//! POST /convert runs the whole upload-convert-deliver-cleanup pipeline:
//! sweep stale scratch files, validate the multipart upload, persist it,
//! invoke ffmpeg with the fixed status preset, and stream the MP4 back.
//! The input file is deleted as soon as the conversion finishes; the output
//! file is deleted once the response body is done sending.

use std::path::Path;

use axum::body::Body;
use axum::extract::multipart::{Field, Multipart};
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::api::error::{ConvertError, ConvertResult};
use crate::api::ServiceState;
use crate::config::{self, Settings};
use crate::scratch::{self, GuardedStream, RequestFiles, ScratchFile};
use crate::transcode;

/// POST /convert - Convert an uploaded video with the fixed status preset.
///
/// Every request is independent: it gets its own UUID-derived scratch files
/// and never touches another request's files.
pub async fn convert_video(
    State(state): State<ServiceState>,
    mut multipart: Multipart,
) -> ConvertResult<Response> {
    let settings = state.settings();
    let transcoder = state
        .transcoder()
        .ok_or(ConvertError::ServiceUnavailable)?;

    // Opportunistic reclaim of anything a previous request left behind.
    scratch::sweep_stale(&settings.upload_dir, settings.retention);
    scratch::sweep_stale(&settings.output_dir, settings.retention);

    // Fields must be consumed in order, so the upload is handled as soon as
    // it is found.
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(config::UPLOAD_FIELD) {
            return convert_field(settings, transcoder, field).await;
        }
    }

    Err(ConvertError::MissingFile)
}

/// The pipeline for one located upload field: validate, persist, convert,
/// deliver.
async fn convert_field(
    settings: &Settings,
    transcoder: &Path,
    mut field: Field<'_>,
) -> ConvertResult<Response> {
    let filename = field.file_name().unwrap_or_default().to_string();
    if filename.is_empty() {
        return Err(ConvertError::EmptyFilename);
    }
    let ext = config::allowed_extension(&filename).ok_or(ConvertError::UnsupportedFormat)?;

    let files = RequestFiles::new(&settings.upload_dir, &settings.output_dir, &ext);
    info!("Converting upload {} as {}", filename, files.id);

    let size = persist_upload(&mut field, &files.input).await?;
    if size > settings.max_file_size {
        scratch::remove_quiet(&files.input);
        return Err(ConvertError::PayloadTooLarge);
    }
    verify_stored_input(&files.input)?;

    if let Err(err) = transcode::optimize_for_status(transcoder, &files.input, &files.output).await
    {
        scratch::remove_quiet(&files.input);
        scratch::remove_quiet(&files.output);
        return Err(ConvertError::ConversionFailed(err.to_string()));
    }

    scratch::remove_quiet(&files.input);
    info!("Conversion {} complete", files.id);

    deliver_output(files).await
}

/// Stream the multipart field to the input path, returning bytes written.
async fn persist_upload(field: &mut Field<'_>, path: &Path) -> ConvertResult<u64> {
    let mut file = File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = field.chunk().await? {
        written += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(written)
}

/// Shallow media check: the stored file must exist and be non-empty.
/// Container and codec validity are left to ffmpeg.
fn verify_stored_input(path: &Path) -> ConvertResult<()> {
    let problem = match std::fs::metadata(path) {
        Ok(meta) if meta.len() == 0 => Some("Video file is empty"),
        Ok(_) => None,
        Err(_) => Some("Video file not found"),
    };

    if let Some(problem) = problem {
        scratch::remove_quiet(path);
        return Err(ConvertError::InvalidMedia(problem.to_string()));
    }
    Ok(())
}

/// Stream the converted file back as an attachment. The output file is
/// owned by a drop guard riding on the body stream, so it is deleted when
/// the response finishes sending or the client disconnects.
async fn deliver_output(files: RequestFiles) -> ConvertResult<Response> {
    let guard = ScratchFile::new(files.output.clone());
    let file = File::open(guard.path()).await?;
    let len = file.metadata().await?.len();
    let body = Body::from_stream(GuardedStream::new(file, guard));

    let headers = [
        (header::CONTENT_TYPE, "video/mp4".to_string()),
        (header::CONTENT_LENGTH, len.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"whatsapp_optimized_{}.mp4\"",
                files.id
            ),
        ),
    ];

    Ok((headers, body).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_verify_stored_input_accepts_non_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stored.mp4");
        std::fs::write(&path, b"frames").unwrap();
        assert!(verify_stored_input(&path).is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_verify_stored_input_rejects_and_removes_empty_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("stored.mp4");
        std::fs::write(&path, b"").unwrap();

        let err = verify_stored_input(&path).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidMedia(_)));
        assert_eq!(err.to_string(), "Invalid video file: Video file is empty");
        assert!(!path.exists());
    }

    #[test]
    fn test_verify_stored_input_rejects_missing_file() {
        let err = verify_stored_input(Path::new("/nonexistent/stored.mp4")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid video file: Video file not found");
    }
}
