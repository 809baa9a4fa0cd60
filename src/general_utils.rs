use actix_web::{http, HttpRequest};
use anyhow::anyhow;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, Algorithm as JWTAlgorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::SESSION_COOKIE_NAME;
use crate::errors::CustomJWTTokenError;

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JWTClaims {
    pub sub: Uuid,
    pub exp: usize,
}

#[tracing::instrument(name = "Generate JWT token for session", skip(secret))]
pub fn generate_jwt_token_for_session(
    session_id: Uuid,
    expires_at: DateTime<Utc>,
    secret: &SecretString,
) -> Result<SecretString, anyhow::Error> {
    let claims: JWTClaims = JWTClaims {
        sub: session_id,
        exp: expires_at.timestamp() as usize,
    };
    let header = Header::new(JWTAlgorithm::HS256);
    let encoding_key = EncodingKey::from_secret(secret.expose_secret().as_bytes());
    let token: String = encode(&header, &claims, &encoding_key)
        .map_err(|e| anyhow!(e).context("Failed to generate token"))?;
    Ok(SecretString::from(token))
}

#[tracing::instrument(name = "Decode JWT token", skip(token, secret))]
pub fn decode_token<T: Into<String>>(
    token: T,
    secret: &SecretString,
) -> Result<Uuid, CustomJWTTokenError> {
    let decoding_key = DecodingKey::from_secret(secret.expose_secret().as_bytes());
    let decoded = decode::<JWTClaims>(
        &token.into(),
        &decoding_key,
        &Validation::new(JWTAlgorithm::HS256),
    );
    match decoded {
        Ok(token) => Ok(token.claims.sub),
        Err(e) => match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Err(CustomJWTTokenError::Expired),
            _ => Err(CustomJWTTokenError::Invalid("Invalid Token".to_string())),
        },
    }
}

pub fn session_expiry(expiry_hours: i64) -> DateTime<Utc> {
    Utc::now() + Duration::hours(expiry_hours)
}

/// Reads the session token from the `token` cookie, falling back to a bearer header.
pub fn get_session_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .or_else(|| {
            req.headers()
                .get(http::header::AUTHORIZATION)
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(|t| t.trim().to_string())
        })
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use actix_web::test::TestRequest;
    use secrecy::SecretString;
    use uuid::Uuid;

    use super::{decode_token, generate_jwt_token_for_session, get_session_token, session_expiry};
    use crate::errors::CustomJWTTokenError;
    use secrecy::ExposeSecret;

    #[test]
    fn test_session_token_round_trip() {
        let secret = SecretString::from("unit-test-secret");
        let session_id = Uuid::new_v4();
        let token = generate_jwt_token_for_session(session_id, session_expiry(1), &secret).unwrap();
        let decoded = decode_token(token.expose_secret(), &secret).unwrap();
        assert_eq!(decoded, session_id);
    }

    #[test]
    fn test_expired_session_token_is_rejected() {
        let secret = SecretString::from("unit-test-secret");
        let token =
            generate_jwt_token_for_session(Uuid::new_v4(), session_expiry(-2), &secret).unwrap();
        let decoded = decode_token(token.expose_secret(), &secret);
        assert!(matches!(decoded, Err(CustomJWTTokenError::Expired)));
    }

    #[test]
    fn test_token_signed_with_other_secret_is_invalid() {
        let token = generate_jwt_token_for_session(
            Uuid::new_v4(),
            session_expiry(1),
            &SecretString::from("first"),
        )
        .unwrap();
        let decoded = decode_token(token.expose_secret(), &SecretString::from("second"));
        assert!(matches!(decoded, Err(CustomJWTTokenError::Invalid(_))));
    }

    #[test]
    fn test_session_token_prefers_cookie_then_bearer() {
        let req = TestRequest::default()
            .insert_header(("Authorization", "Bearer header-token"))
            .to_http_request();
        assert_eq!(get_session_token(&req).as_deref(), Some("header-token"));

        let req = TestRequest::default()
            .cookie(actix_web::cookie::Cookie::new("token", "cookie-token"))
            .insert_header(("Authorization", "Bearer header-token"))
            .to_http_request();
        assert_eq!(get_session_token(&req).as_deref(), Some("cookie-token"));

        let req = TestRequest::default()
            .insert_header(("Authorization", "Basic abc"))
            .to_http_request();
        assert!(get_session_token(&req).is_none());
    }
}
