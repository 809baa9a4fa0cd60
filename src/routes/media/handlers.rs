use std::sync::Arc;

use actix_web::{web, HttpMessage, HttpRequest};
use utoipa::TupleUnit;
use uuid::Uuid;

use super::errors::MediaError;
use super::schemas::{DeleteMediaRequest, UploadQuery, UploadStatus, UploadedMedia};
use super::utils::{object_path, sanitize_file_name, sanitize_folder, validate_upload, UploadTracker};
use crate::configuration::StorageSettings;
use crate::routes::auth::AdminContext;
use crate::schemas::GenericResponse;
use crate::storage_client::{MediaFile, MediaStore, ProgressCallback};

#[utoipa::path(
    post,
    path = "/admin/media/upload",
    tag = "Admin Media",
    summary = "Upload Media",
    description = "Streams the raw request body to storage. The Content-Type header must match `kind`.",
    params(UploadQuery),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status=200, description= "Uploaded", body= GenericResponse<UploadedMedia>),
        (status=400, description= "Invalid file", body= GenericResponse<TupleUnit>),
        (status=413, description= "File too large", body= GenericResponse<TupleUnit>),
        (status=502, description= "Storage failure", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(
    name = "Upload media",
    skip(req, body, media_store, tracker, storage),
    fields(admin_id = %admin.identity.id, size = body.len())
)]
pub async fn upload_media(
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
    admin: AdminContext,
    media_store: web::Data<dyn MediaStore>,
    tracker: web::Data<UploadTracker>,
    storage: web::Data<StorageSettings>,
) -> Result<web::Json<GenericResponse<UploadedMedia>>, MediaError> {
    let query = query.into_inner();
    let content_type = req.content_type().to_string();
    validate_upload(body.len(), &content_type, query.kind, storage.max_upload_size)?;
    let folder = sanitize_folder(&query.folder)?;
    let file_name = sanitize_file_name(&query.file_name)?;

    let upload_id = query.upload_id.unwrap_or_else(Uuid::new_v4);
    if tracker.is_tracking(&upload_id) {
        return Err(MediaError::ValidationError(
            "An upload with this id is already running.".to_string(),
        ));
    }
    let path = object_path(&folder, &file_name);
    tracker.start(upload_id, body.len() as u64);

    let progress_tracker = tracker.clone().into_inner();
    let on_progress: ProgressCallback = Arc::new(move |progress| {
        progress_tracker.progress(&upload_id, progress);
    });
    let file = MediaFile {
        content: body,
        content_type,
    };
    match media_store.upload(file, &path, on_progress).await {
        Ok(url) => {
            tracker.complete(&upload_id, url.clone());
            Ok(web::Json(GenericResponse::success(
                "Uploaded successfully.",
                Some(UploadedMedia {
                    upload_id,
                    url,
                    path,
                }),
            )))
        }
        Err(e) => {
            tracker.fail(&upload_id, "Upload failed. Please try again.".to_string());
            Err(MediaError::StorageError(
                "Upload failed. Please try again.".to_string(),
                e,
            ))
        }
    }
}

#[utoipa::path(
    get,
    path = "/admin/media/upload/{upload_id}",
    tag = "Admin Media",
    summary = "Upload Progress",
    params(("upload_id" = Uuid, Path, description = "Upload id")),
    responses(
        (status=200, description= "Upload progress", body= GenericResponse<UploadStatus>),
        (status=404, description= "Unknown upload", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "Upload progress", skip(tracker, _admin))]
pub async fn upload_progress(
    upload_id: web::Path<Uuid>,
    _admin: AdminContext,
    tracker: web::Data<UploadTracker>,
) -> Result<web::Json<GenericResponse<UploadStatus>>, MediaError> {
    let status = tracker
        .status(&upload_id)
        .ok_or(MediaError::UploadNotFound)?;
    Ok(web::Json(GenericResponse::success(
        "Successfully fetched upload progress",
        Some(status),
    )))
}

#[utoipa::path(
    post,
    path = "/admin/media/delete",
    tag = "Admin Media",
    summary = "Delete Media",
    request_body(content = DeleteMediaRequest, description = "Request Body"),
    responses(
        (status=200, description= "Deleted", body= GenericResponse<TupleUnit>),
        (status=400, description= "Url outside the storage bucket", body= GenericResponse<TupleUnit>),
        (status=502, description= "Storage failure", body= GenericResponse<TupleUnit>),
    )
)]
#[tracing::instrument(name = "Delete media", skip(media_store), fields(admin_id = %admin.identity.id))]
pub async fn delete_media(
    body: DeleteMediaRequest,
    admin: AdminContext,
    media_store: web::Data<dyn MediaStore>,
) -> Result<web::Json<GenericResponse<()>>, MediaError> {
    if !media_store.owns_url(&body.url) {
        return Err(MediaError::ValidationError(
            "Url does not belong to the farm's storage bucket.".to_string(),
        ));
    }
    media_store
        .delete(&body.url)
        .await
        .map_err(|e| MediaError::StorageError("Failed to delete file.".to_string(), e))?;
    Ok(web::Json(GenericResponse::success(
        "Deleted successfully.",
        Some(()),
    )))
}
