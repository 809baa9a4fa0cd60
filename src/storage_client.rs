use std::sync::Arc;
use std::time::Duration;

use actix_web::web::Bytes;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use futures::stream;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::configuration::StorageSettings;
use crate::constants::UPLOAD_CHUNK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        (self.bytes_sent as f64 / self.total_bytes as f64) * 100.0
    }
}

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[derive(Debug, Clone)]
pub struct MediaFile {
    pub content: Bytes,
    pub content_type: String,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Stores `file` under `path` and returns its public download URL.
    async fn upload(
        &self,
        file: MediaFile,
        path: &str,
        on_progress: ProgressCallback,
    ) -> Result<String, anyhow::Error>;

    async fn delete(&self, url: &str) -> Result<(), anyhow::Error>;

    /// Whether `url` was handed out by this store.
    fn owns_url(&self, url: &str) -> bool;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredObject {
    name: String,
    download_tokens: Option<String>,
}

#[derive(Debug)]
pub struct FirebaseStorageClient {
    http_client: Client,
    base_url: String,
    bucket: String,
    access_token: SecretString,
}

impl FirebaseStorageClient {
    pub fn new(
        base_url: String,
        bucket: String,
        access_token: SecretString,
        timeout: Duration,
    ) -> Result<Self, anyhow::Error> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            bucket,
            access_token,
        })
    }

    pub fn from_settings(settings: &StorageSettings) -> Result<Self, anyhow::Error> {
        Self::new(
            settings.base_url.clone(),
            settings.bucket.clone(),
            settings.access_token.clone(),
            settings.timeout(),
        )
    }

    fn objects_url(&self) -> Result<Url, anyhow::Error> {
        let mut url = Url::parse(&self.base_url).context("Invalid storage base url")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Storage base url cannot be a base"))?
            .extend(["v0", "b", self.bucket.as_str(), "o"]);
        Ok(url)
    }

    fn object_url(&self, object_name: &str) -> Result<Url, anyhow::Error> {
        let mut url = self.objects_url()?;
        // A single pushed segment keeps `/` percent-encoded as the API expects.
        url.path_segments_mut()
            .map_err(|_| anyhow!("Storage base url cannot be a base"))?
            .push(object_name);
        Ok(url)
    }

    fn public_prefix(&self) -> String {
        format!("{}/v0/b/{}/o/", self.base_url, self.bucket)
    }

    fn object_segment<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(self.public_prefix().as_str())
            .map(|rest| rest.split(['?', '#']).next().unwrap_or_default())
            .filter(|segment| is_single_object_segment(segment))
    }
}

/// An encoded object name must stay one path segment, or the request could
/// normalize to a path outside the bucket.
fn is_single_object_segment(segment: &str) -> bool {
    if segment.is_empty() || segment.contains(['/', '\\']) {
        return false;
    }
    let decoded = segment
        .to_ascii_lowercase()
        .replace("%2e", ".")
        .replace("%2f", "/")
        .replace("%5c", "/");
    !decoded.split('/').any(|part| part == "." || part == "..")
}

fn progress_stream(
    content: Bytes,
    on_progress: ProgressCallback,
) -> impl futures::Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let total_bytes = content.len() as u64;
    let chunks: Vec<Bytes> = (0..content.len())
        .step_by(UPLOAD_CHUNK_SIZE)
        .map(|start| content.slice(start..(start + UPLOAD_CHUNK_SIZE).min(content.len())))
        .collect();
    let mut bytes_sent = 0u64;
    stream::iter(chunks.into_iter().map(move |chunk| {
        bytes_sent += chunk.len() as u64;
        on_progress(UploadProgress {
            bytes_sent,
            total_bytes,
        });
        Ok(chunk)
    }))
}

#[async_trait]
impl MediaStore for FirebaseStorageClient {
    #[tracing::instrument(name = "Upload media object", skip(self, file, on_progress), fields(size = file.content.len()))]
    async fn upload(
        &self,
        file: MediaFile,
        path: &str,
        on_progress: ProgressCallback,
    ) -> Result<String, anyhow::Error> {
        let mut url = self.objects_url()?;
        url.query_pairs_mut()
            .append_pair("uploadType", "media")
            .append_pair("name", path);
        let content_length = file.content.len();
        let body = reqwest::Body::wrap_stream(progress_stream(file.content, on_progress));

        let response = self
            .http_client
            .post(url)
            .bearer_auth(self.access_token.expose_secret())
            .header(reqwest::header::CONTENT_TYPE, file.content_type)
            .header(reqwest::header::CONTENT_LENGTH, content_length)
            .body(body)
            .send()
            .await
            .context("Failed to reach the storage service")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Storage upload failed with {}: {}", status, text));
        }

        let stored: StoredObject = response
            .json()
            .await
            .context("Invalid storage upload response")?;
        let mut download_url = self.object_url(&stored.name)?;
        {
            let mut query = download_url.query_pairs_mut();
            query.append_pair("alt", "media");
            if let Some(token) = stored
                .download_tokens
                .as_deref()
                .and_then(|tokens| tokens.split(',').next())
            {
                query.append_pair("token", token);
            }
        }
        Ok(download_url.to_string())
    }

    #[tracing::instrument(name = "Delete media object", skip(self))]
    async fn delete(&self, url: &str) -> Result<(), anyhow::Error> {
        let segment = self
            .object_segment(url)
            .ok_or_else(|| anyhow!("Url does not belong to the configured storage bucket"))?;
        let target = format!("{}{}", self.public_prefix(), segment);

        let response = self
            .http_client
            .delete(target)
            .bearer_auth(self.access_token.expose_secret())
            .send()
            .await
            .context("Failed to reach the storage service")?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(anyhow!("Storage delete failed with {}: {}", status, text))
        }
    }

    fn owns_url(&self, url: &str) -> bool {
        self.object_segment(url).is_some()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use actix_web::web::Bytes;
    use futures::StreamExt;
    use secrecy::SecretString;

    use super::{progress_stream, FirebaseStorageClient, MediaStore, UploadProgress};
    use crate::constants::UPLOAD_CHUNK_SIZE;

    fn client() -> FirebaseStorageClient {
        FirebaseStorageClient::new(
            "https://storage.example.com/".to_string(),
            "farm-bucket".to_string(),
            SecretString::from("token"),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_progress_is_reported_per_chunk() {
        let seen: Arc<Mutex<Vec<UploadProgress>>> = Arc::new(Mutex::new(vec![]));
        let sink = seen.clone();
        let content = Bytes::from(vec![7u8; UPLOAD_CHUNK_SIZE * 2 + 10]);
        let chunks: Vec<_> = progress_stream(
            content,
            Arc::new(move |p| sink.lock().unwrap().push(p)),
        )
        .collect()
        .await;

        assert_eq!(chunks.len(), 3);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].bytes_sent, UPLOAD_CHUNK_SIZE as u64);
        assert_eq!(seen[2].bytes_sent, seen[2].total_bytes);
        assert_eq!(seen[2].percent(), 100.0);
    }

    #[test]
    fn test_object_url_encodes_path_as_single_segment() {
        let url = client().object_url("birds/abc-rooster.jpg").unwrap();
        assert_eq!(
            url.as_str(),
            "https://storage.example.com/v0/b/farm-bucket/o/birds%2Fabc-rooster.jpg"
        );
    }

    #[test]
    fn test_owned_urls_are_recognised() {
        let client = client();
        assert!(client.owns_url(
            "https://storage.example.com/v0/b/farm-bucket/o/birds%2Fa.jpg?alt=media&token=t"
        ));
        assert!(!client.owns_url("https://storage.example.com/v0/b/other/o/birds%2Fa.jpg"));
        assert!(!client.owns_url("https://evil.example.com/v0/b/farm-bucket/o/a.jpg"));
        assert!(!client.owns_url("https://storage.example.com/v0/b/farm-bucket/o/"));
    }

    #[test]
    fn test_urls_escaping_the_bucket_are_not_owned() {
        let client = client();
        let prefix = "https://storage.example.com/v0/b/farm-bucket/o/";
        for rest in [
            "../../other/o/x",
            "birds/a.jpg",
            "..",
            "%2E%2E",
            "birds%2F..%2F..%2Fx",
            "birds%5C..%5Cx",
        ] {
            assert!(!client.owns_url(&format!("{}{}", prefix, rest)), "{}", rest);
        }
        assert!(client.owns_url(&format!("{}{}", prefix, "birds%2Fmy..rooster.jpg")));
    }

    #[tokio::test]
    async fn test_delete_refuses_urls_outside_the_bucket() {
        let result = client()
            .delete("https://storage.example.com/v0/b/farm-bucket/o/../../other/o/x")
            .await;
        assert!(result.is_err());
    }
}
