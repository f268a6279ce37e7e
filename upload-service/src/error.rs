use crate::services::StorageError;
use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure of `POST /api/upload`.
///
/// Bodies are plain: a missing-files request gets an empty `400`, storage
/// failures get the error text with a `500`, and multipart failures keep the
/// parser's own status (`400` malformed, `413` over the body limit).
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no files supplied")]
    NoFiles,

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        match self {
            UploadError::NoFiles => StatusCode::BAD_REQUEST.into_response(),
            UploadError::Multipart(err) => (err.status(), err.body_text()).into_response(),
            UploadError::Storage(err) => {
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
            }
        }
    }
}
