use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use crate::general_utils::error_chain_fmt;
use crate::schemas::{GenericResponse, RedirectData};

#[derive(thiserror::Error)]
pub enum OtpError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Please send a code first.")]
    NoPendingVerification,
    #[error("{0}")]
    ChallengeNotReady(String),
    #[error("Too many attempts. Please wait a while before requesting another code.")]
    RateLimited,
    #[error("Configuration Error: this site is not authorized for phone sign-in. Please contact the site administrator. ({0})")]
    Configuration(String),
    #[error("Failed to send OTP. Please try again.")]
    SendFailed,
    #[error("The OTP is incorrect. Please try again.")]
    IncorrectCode,
    #[error("The verification service did not respond in time. Please try again.")]
    Timeout,
    #[error("Could not reach the verification service. Please try again.")]
    ProviderUnavailable,
    #[error("Another request for this login form is still in progress.")]
    OperationInProgress,
    #[error("This login form is no longer active.")]
    FormClosed,
    #[error("Login form not found.")]
    FormNotFound,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for OtpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for OtpError {
    fn status_code(&self) -> StatusCode {
        match self {
            OtpError::ValidationError(_) => StatusCode::BAD_REQUEST,
            OtpError::NoPendingVerification => StatusCode::BAD_REQUEST,
            OtpError::ChallengeNotReady(_) => StatusCode::CONFLICT,
            OtpError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            OtpError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            OtpError::SendFailed => StatusCode::BAD_GATEWAY,
            OtpError::IncorrectCode => StatusCode::BAD_REQUEST,
            OtpError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            OtpError::ProviderUnavailable => StatusCode::BAD_GATEWAY,
            OtpError::OperationInProgress => StatusCode::CONFLICT,
            OtpError::FormClosed => StatusCode::GONE,
            OtpError::FormNotFound => StatusCode::NOT_FOUND,
            OtpError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let inner_error_msg = match self {
            OtpError::UnexpectedError(_) => "Something went wrong. Please try again.".to_string(),
            _ => self.to_string(),
        };
        HttpResponse::build(status_code).json(GenericResponse::error(
            &inner_error_msg,
            status_code.as_str(),
            Some(()),
        ))
    }
}

#[derive(thiserror::Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidJWT(String),
    #[error("Session expired. Please start a new session.")]
    SessionNotFound,
    #[error("Please sign in to continue.")]
    Unauthenticated { redirect_to: String },
    #[error("You do not have access to this page.")]
    Forbidden { redirect_to: String },
    #[error("Still checking your access. Please retry shortly.")]
    AuthorizationPending,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl std::fmt::Debug for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for AuthError {
    fn status_code(&self) -> StatusCode {
        match self {
            AuthError::InvalidJWT(_) => StatusCode::UNAUTHORIZED,
            AuthError::SessionNotFound => StatusCode::UNAUTHORIZED,
            AuthError::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden { .. } => StatusCode::FORBIDDEN,
            AuthError::AuthorizationPending => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::UnexpectedError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let status_code_str = status_code.as_str();
        match self {
            AuthError::Unauthenticated { redirect_to } | AuthError::Forbidden { redirect_to } => {
                HttpResponse::build(status_code).json(GenericResponse::error(
                    &self.to_string(),
                    status_code_str,
                    Some(RedirectData {
                        redirect_to: redirect_to.clone(),
                    }),
                ))
            }
            AuthError::UnexpectedError(_) => HttpResponse::build(status_code).json(
                GenericResponse::error("Something went wrong.", status_code_str, Some(())),
            ),
            _ => HttpResponse::build(status_code).json(GenericResponse::error(
                &self.to_string(),
                status_code_str,
                Some(()),
            )),
        }
    }
}
