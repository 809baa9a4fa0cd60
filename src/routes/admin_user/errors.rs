use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::general_utils::error_chain_fmt;
use crate::schemas::GenericResponse;

#[derive(thiserror::Error)]
pub enum AdminUserError {
    #[error("{0}")]
    ValidationError(String),
    #[error("No user has signed in with {0} yet. Ask them to sign in once, then try again.")]
    UserNotFound(String),
    #[error("{0}")]
    DatabaseError(String, #[source] anyhow::Error),
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for AdminUserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for AdminUserError {
    fn status_code(&self) -> StatusCode {
        match self {
            AdminUserError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AdminUserError::UserNotFound(_) => StatusCode::NOT_FOUND,
            AdminUserError::DatabaseError(_, _) => StatusCode::INTERNAL_SERVER_ERROR,
            AdminUserError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let inner_error_msg = match self {
            AdminUserError::UnexpectedError(_) => "Something went wrong.".to_string(),
            _ => self.to_string(),
        };
        HttpResponse::build(status_code).json(GenericResponse::error(
            &inner_error_msg,
            status_code.as_str(),
            Some(()),
        ))
    }
}
