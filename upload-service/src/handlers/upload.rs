use crate::error::UploadError;
use crate::models::{FilePart, UploadedFile};
use crate::startup::AppState;
use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    Json,
};

/// `POST /api/upload`: store every file part of the form and describe them.
///
/// The whole form is read before anything is written, so a body that trips
/// the size limit is rejected without touching the upload directory.
pub async fn upload_files(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Vec<UploadedFile>>, UploadError> {
    let parts = read_file_parts(&mut multipart, &state.config.upload.field_name)
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "Failed to read multipart body");
            e
        })?;

    if parts.is_empty() {
        tracing::warn!("Upload request carried no files");
        return Err(UploadError::NoFiles);
    }

    tracing::info!(file_count = parts.len(), "Upload started");

    let files = state.persister.persist_all(parts).await?;

    tracing::info!(file_count = files.len(), "Upload completed");

    Ok(Json(files))
}

/// Buffer the parts of `field_name` that carry a filename. Other parts are skipped.
async fn read_file_parts(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Vec<FilePart>, MultipartError> {
    let mut parts = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }

        // A part without a filename is a plain form value
        let file_name = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => continue,
        };
        let content_type = field.content_type().unwrap_or_default().to_string();
        let data = field.bytes().await?;

        parts.push(FilePart {
            file_name,
            content_type,
            data,
        });
    }

    Ok(parts)
}
