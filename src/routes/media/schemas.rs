use actix_web::dev::Payload;
use actix_web::web::Json;
use actix_web::{FromRequest, HttpRequest};
use futures::future::LocalBoxFuture;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::errors::MediaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn accepts(&self, content_type: &str) -> bool {
        let prefix = match self {
            MediaKind::Image => "image/",
            MediaKind::Video => "video/",
        };
        content_type.to_ascii_lowercase().starts_with(prefix)
    }

    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "an image",
            MediaKind::Video => "a video",
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct UploadQuery {
    /// Slash separated storage folder, e.g. `birds/parents`.
    pub folder: String,
    pub kind: MediaKind,
    pub file_name: String,
    /// Client chosen id used to poll progress while the upload runs.
    pub upload_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum UploadState {
    InProgress,
    Completed { url: String },
    Failed { message: String },
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadStatus {
    pub upload_id: Uuid,
    pub bytes_sent: u64,
    pub total_bytes: u64,
    pub percent: f64,
    #[serde(flatten)]
    pub state: UploadState,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadedMedia {
    pub upload_id: Uuid,
    pub url: String,
    pub path: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DeleteMediaRequest {
    pub url: String,
}

impl FromRequest for DeleteMediaRequest {
    type Error = MediaError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Json::<Self>::from_request(req, payload);

        Box::pin(async move {
            match fut.await {
                Ok(json) => Ok(json.into_inner()),
                Err(e) => Err(MediaError::ValidationError(e.to_string())),
            }
        })
    }
}
