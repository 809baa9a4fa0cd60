use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use super::errors::MediaError;
use super::schemas::{MediaKind, UploadState, UploadStatus};
use crate::storage_client::UploadProgress;

lazy_static! {
    static ref FOLDER_SEGMENT: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
    static ref FILE_NAME_UNSAFE: Regex = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
}

const FINISHED_UPLOAD_RETENTION: Duration = Duration::from_secs(600);
// An upload whose request was dropped never finishes; forget it after this long.
const MAX_UPLOAD_AGE: Duration = Duration::from_secs(3600);

pub fn sanitize_folder(raw: &str) -> Result<String, MediaError> {
    let segments: Vec<&str> = raw.trim().trim_matches('/').split('/').collect();
    if segments.iter().any(|s| !FOLDER_SEGMENT.is_match(s)) {
        return Err(MediaError::ValidationError(
            "Folder may only contain letters, digits, '-' and '_' separated by '/'.".to_string(),
        ));
    }
    Ok(segments.join("/"))
}

/// Keeps the last path component and replaces characters storage paths should not carry.
pub fn sanitize_file_name(raw: &str) -> Result<String, MediaError> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned = FILE_NAME_UNSAFE.replace_all(base, "_");
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        return Err(MediaError::ValidationError("A file name is required.".to_string()));
    }
    Ok(cleaned.to_string())
}

pub fn object_path(folder: &str, file_name: &str) -> String {
    format!("{}/{}-{}", folder, Uuid::new_v4(), file_name)
}

pub fn validate_upload(
    content_len: usize,
    content_type: &str,
    kind: MediaKind,
    max_upload_size: usize,
) -> Result<(), MediaError> {
    if content_len == 0 {
        return Err(MediaError::ValidationError(
            "A file is required for upload.".to_string(),
        ));
    }
    if content_len > max_upload_size {
        return Err(MediaError::TooLarge(max_upload_size));
    }
    if !kind.accepts(content_type) {
        return Err(MediaError::ValidationError(format!(
            "Provided file is not {}.",
            kind.label()
        )));
    }
    Ok(())
}

struct TrackedUpload {
    status: UploadStatus,
    started_at: Instant,
    finished_at: Option<Instant>,
}

impl TrackedUpload {
    fn is_stale(&self, max_age: Duration) -> bool {
        match self.finished_at {
            Some(at) => at.elapsed() >= FINISHED_UPLOAD_RETENTION,
            None => self.started_at.elapsed() >= max_age,
        }
    }
}

/// Progress of uploads currently or recently handled by this process.
pub struct UploadTracker {
    uploads: Mutex<HashMap<Uuid, TrackedUpload>>,
    max_age: Duration,
}

impl Default for UploadTracker {
    fn default() -> Self {
        Self::with_max_age(MAX_UPLOAD_AGE)
    }
}

impl UploadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            uploads: Mutex::new(HashMap::new()),
            max_age,
        }
    }

    pub fn len(&self) -> usize {
        self.uploads.lock().map(|uploads| uploads.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn start(&self, upload_id: Uuid, total_bytes: u64) {
        if let Ok(mut uploads) = self.uploads.lock() {
            let max_age = self.max_age;
            uploads.retain(|_, upload| !upload.is_stale(max_age));
            uploads.insert(
                upload_id,
                TrackedUpload {
                    status: UploadStatus {
                        upload_id,
                        bytes_sent: 0,
                        total_bytes,
                        percent: 0.0,
                        state: UploadState::InProgress,
                    },
                    started_at: Instant::now(),
                    finished_at: None,
                },
            );
        }
    }

    pub fn is_tracking(&self, upload_id: &Uuid) -> bool {
        self.uploads
            .lock()
            .map(|uploads| {
                uploads
                    .get(upload_id)
                    .is_some_and(|u| u.finished_at.is_none())
            })
            .unwrap_or(false)
    }

    pub fn progress(&self, upload_id: &Uuid, progress: UploadProgress) {
        if let Ok(mut uploads) = self.uploads.lock() {
            if let Some(upload) = uploads.get_mut(upload_id) {
                upload.status.bytes_sent = progress.bytes_sent;
                upload.status.total_bytes = progress.total_bytes;
                upload.status.percent = progress.percent();
            }
        }
    }

    fn finish(&self, upload_id: &Uuid, state: UploadState) {
        if let Ok(mut uploads) = self.uploads.lock() {
            if let Some(upload) = uploads.get_mut(upload_id) {
                if matches!(state, UploadState::Completed { .. }) {
                    upload.status.bytes_sent = upload.status.total_bytes;
                    upload.status.percent = 100.0;
                }
                upload.status.state = state;
                upload.finished_at = Some(Instant::now());
            }
        }
    }

    pub fn complete(&self, upload_id: &Uuid, url: String) {
        self.finish(upload_id, UploadState::Completed { url });
    }

    pub fn fail(&self, upload_id: &Uuid, message: String) {
        self.finish(upload_id, UploadState::Failed { message });
    }

    pub fn status(&self, upload_id: &Uuid) -> Option<UploadStatus> {
        self.uploads
            .lock()
            .ok()
            .and_then(|uploads| uploads.get(upload_id).map(|u| u.status.clone()))
    }
}
