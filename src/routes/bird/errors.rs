use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::general_utils::error_chain_fmt;
use crate::schemas::GenericResponse;

#[derive(thiserror::Error)]
pub enum BirdError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Bird not found.")]
    NotFound,
    #[error("{0}")]
    DatabaseError(String, #[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for BirdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for BirdError {
    fn status_code(&self) -> StatusCode {
        match self {
            BirdError::ValidationError(_) => StatusCode::BAD_REQUEST,
            BirdError::NotFound => StatusCode::NOT_FOUND,
            BirdError::DatabaseError(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
            BirdError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let inner_error_msg = match self {
            BirdError::UnexpectedError(_) => "Something went wrong.".to_string(),
            _ => self.to_string(),
        };
        HttpResponse::build(status_code).json(GenericResponse::error(
            &inner_error_msg,
            status_code.as_str(),
            Some(()),
        ))
    }
}
