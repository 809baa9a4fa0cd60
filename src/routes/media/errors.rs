use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::general_utils::error_chain_fmt;
use crate::schemas::GenericResponse;

#[derive(thiserror::Error)]
pub enum MediaError {
    #[error("{0}")]
    ValidationError(String),
    #[error("File is too large. The limit is {0} bytes.")]
    TooLarge(usize),
    #[error("Upload not found.")]
    UploadNotFound,
    #[error("{0}")]
    StorageError(String, #[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for MediaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for MediaError {
    fn status_code(&self) -> StatusCode {
        match self {
            MediaError::ValidationError(_) => StatusCode::BAD_REQUEST,
            MediaError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            MediaError::UploadNotFound => StatusCode::NOT_FOUND,
            MediaError::StorageError(_, _) => StatusCode::BAD_GATEWAY,
            MediaError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let inner_error_msg = match self {
            MediaError::UnexpectedError(_) => "Something went wrong.".to_string(),
            _ => self.to_string(),
        };
        HttpResponse::build(status_code).json(GenericResponse::error(
            &inner_error_msg,
            status_code.as_str(),
            Some(()),
        ))
    }
}
