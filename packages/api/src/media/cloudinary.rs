//! # Cloudinary media host
//!
//! Uploads go to `POST {api_base}/{cloud_name}/{resource_type}/upload` as a
//! multipart form. The upload is authenticated with a signature: the signed
//! parameters are sorted by name, joined as `k=v&k=v`, the API secret is
//! appended and the whole string is SHA-1 hashed (hex). `file`, `api_key`,
//! `resource_type` and `cloud_name` are never part of the signature.
//!
//! The file body is streamed straight from the upload descriptor into the
//! request; nothing is buffered in memory. A successful response carries
//! `secure_url` and `public_id`; a failed one carries `error.message`, which
//! becomes [`UploadError::Failed`].

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use tokio_util::io::ReaderStream;

use super::classify::UploadPlan;
use super::upload::{MediaHost, StoredMedia, UploadDescriptor, UploadError};

pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_base: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Hex SHA-1 signature over the sorted parameters followed by the secret.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct CloudinaryClient {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self::with_http(config, reqwest::Client::new())
    }

    pub fn with_http(config: CloudinaryConfig, http: reqwest::Client) -> Self {
        Self { http, config }
    }

    fn endpoint(&self, plan: &UploadPlan) -> String {
        format!(
            "{}/{}/{}/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            plan.resource_type()
        )
    }

    /// Parameters covered by the signature.
    fn signed_params(plan: &UploadPlan, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("folder", plan.folder.clone()),
            ("overwrite", plan.overwrite.to_string()),
            ("timestamp", timestamp.to_string()),
        ];
        if !plan.tags.is_empty() {
            params.push(("tags", plan.tags.join(",")));
        }
        if let Some(transform) = &plan.transform {
            params.push(("transformation", transform.to_param()));
            params.push(("format", transform.format.to_string()));
        }
        params
    }

    fn file_part(file: UploadDescriptor) -> Result<Part, UploadError> {
        let filename = file.filename.clone();
        let mime_type = file.mime_type.clone();
        let len = file.len;
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file.into_content()));
        let part = match len {
            Some(len) => Part::stream_with_length(body, len),
            None => Part::stream(body),
        };
        let part = part.file_name(filename);
        if mime_type.is_empty() {
            Ok(part)
        } else {
            Ok(part.mime_str(&mime_type)?)
        }
    }
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    async fn upload(&self, plan: &UploadPlan, file: UploadDescriptor) -> Result<StoredMedia, UploadError> {
        let params = Self::signed_params(plan, chrono::Utc::now().timestamp());
        let signature = sign(&params, &self.config.api_secret);

        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);
        for (name, value) in params {
            form = form.text(name, value);
        }
        let form = form.part("file", Self::file_part(file)?);

        let response = self
            .http
            .post(self.endpoint(plan))
            .multipart(form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            let uploaded: UploadResponse = serde_json::from_str(&body)
                .map_err(|e| UploadError::Failed(format!("unexpected provider response: {e}")))?;
            return Ok(StoredMedia {
                secure_url: uploaded.secure_url,
                public_id: uploaded.public_id,
            });
        }

        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("provider responded with {status}"));
        tracing::warn!(%status, "media provider rejected upload: {message}");
        Err(UploadError::Failed(message))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use axum::extract::{Multipart, State};
    use axum::http::{StatusCode, Uri};
    use axum::routing::post;
    use axum::Router;

    use super::*;

    fn client() -> CloudinaryClient {
        CloudinaryClient::new(CloudinaryConfig {
            cloud_name: "heritage".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            api_base: format!("{DEFAULT_API_BASE}/"),
        })
    }

    #[test]
    fn test_sign_matches_documented_example() {
        let params = [
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string()),
        ];
        assert_eq!(
            sign(&params, "abcd"),
            "bfd09f95f331f558cbd1320e67aa8d488770583e"
        );
    }

    #[test]
    fn test_endpoint_per_resource_type() {
        let image = UploadPlan::for_mime("image/jpeg", vec![]);
        let video = UploadPlan::for_mime("video/quicktime", vec![]);
        assert_eq!(
            client().endpoint(&image),
            "https://api.cloudinary.com/v1_1/heritage/image/upload"
        );
        assert_eq!(
            client().endpoint(&video),
            "https://api.cloudinary.com/v1_1/heritage/video/upload"
        );
    }

    #[test]
    fn test_image_params_carry_transform() {
        let plan = UploadPlan::for_mime("image/png", vec!["heritage".into(), "fact".into()]);
        let params = CloudinaryClient::signed_params(&plan, 1_700_000_000);
        let get = |name: &str| {
            params
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("folder"), Some("uploads/media/images"));
        assert_eq!(get("tags"), Some("heritage,fact"));
        assert_eq!(get("overwrite"), Some("true"));
        assert_eq!(get("transformation"), Some("c_limit,w_1080"));
        assert_eq!(get("format"), Some("jpg"));
        assert_eq!(get("timestamp"), Some("1700000000"));
    }

    #[test]
    fn test_video_params_skip_transform() {
        let plan = UploadPlan::for_mime("video/mp4", vec![]);
        let params = CloudinaryClient::signed_params(&plan, 1);
        assert!(params.iter().all(|(k, _)| *k != "transformation" && *k != "format" && *k != "tags"));
    }

    #[test]
    fn test_error_body_parses() {
        let body = r#"{"error":{"message":"Invalid Signature"}}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "Invalid Signature");
    }

    #[derive(Debug, Default)]
    struct Received {
        path: String,
        fields: BTreeMap<String, String>,
        file_name: Option<String>,
        file_type: Option<String>,
        file_bytes: Vec<u8>,
    }

    type ProviderState = (Arc<Mutex<Received>>, StatusCode, &'static str);

    async fn receive(
        State((received, status, reply)): State<ProviderState>,
        uri: Uri,
        mut multipart: Multipart,
    ) -> (StatusCode, String) {
        let mut seen = Received {
            path: uri.path().to_string(),
            ..Received::default()
        };
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                seen.file_name = field.file_name().map(str::to_string);
                seen.file_type = field.content_type().map(str::to_string);
                seen.file_bytes = field.bytes().await.unwrap().to_vec();
            } else {
                seen.fields.insert(name, field.text().await.unwrap());
            }
        }
        *received.lock().unwrap() = seen;
        (status, reply.to_string())
    }

    /// Serves one canned reply on a local port and records what it was sent.
    async fn provider(status: StatusCode, reply: &'static str) -> (CloudinaryClient, Arc<Mutex<Received>>) {
        let received = Arc::new(Mutex::new(Received::default()));
        let app = Router::new()
            .route("/:cloud/:resource/upload", post(receive))
            .with_state((received.clone(), status, reply));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let config = CloudinaryConfig {
            cloud_name: "heritage".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            api_base: format!("http://{addr}"),
        };
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let client = CloudinaryClient::with_http(config, http);
        (client, received)
    }

    #[tokio::test]
    async fn test_upload_sends_signed_form() {
        let (client, received) = provider(
            StatusCode::OK,
            r#"{"secure_url":"https://res.example.com/bridge.jpg","public_id":"uploads/media/images/bridge"}"#,
        )
        .await;
        let plan = UploadPlan::for_mime("image/png", vec!["heritage".into(), "fact".into()]);
        let file = UploadDescriptor::from_bytes("bridge.png", "image/png", b"\x89PNG".to_vec());

        let stored = client.upload(&plan, file).await.unwrap();

        assert_eq!(stored.secure_url, "https://res.example.com/bridge.jpg");
        assert_eq!(stored.public_id, "uploads/media/images/bridge");

        let seen = received.lock().unwrap();
        assert_eq!(seen.path, "/heritage/image/upload");
        assert_eq!(seen.fields["api_key"], "key");
        assert_eq!(seen.fields["folder"], "uploads/media/images");
        assert_eq!(seen.fields["overwrite"], "true");
        assert_eq!(seen.fields["tags"], "heritage,fact");
        assert_eq!(seen.fields["transformation"], "c_limit,w_1080");
        assert_eq!(seen.fields["format"], "jpg");
        assert!(seen.fields["timestamp"].parse::<i64>().is_ok());

        let signed: Vec<(&str, String)> = seen
            .fields
            .iter()
            .filter(|(k, _)| *k != "api_key" && *k != "signature")
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        assert_eq!(seen.fields["signature"], sign(&signed, "secret"));

        assert_eq!(seen.file_name.as_deref(), Some("bridge.png"));
        assert_eq!(seen.file_type.as_deref(), Some("image/png"));
        assert_eq!(seen.file_bytes, b"\x89PNG");
    }

    #[tokio::test]
    async fn test_video_upload_goes_to_video_endpoint() {
        let (client, received) = provider(
            StatusCode::OK,
            r#"{"secure_url":"https://res.example.com/speech.mp4","public_id":"uploads/media/videos/speech"}"#,
        )
        .await;
        let plan = UploadPlan::for_mime("video/mp4", vec![]);
        let file = UploadDescriptor::from_bytes("speech.mp4", "video/mp4", vec![0u8; 16]);

        client.upload(&plan, file).await.unwrap();

        let seen = received.lock().unwrap();
        assert_eq!(seen.path, "/heritage/video/upload");
        assert_eq!(seen.fields["folder"], "uploads/media/videos");
        assert!(!seen.fields.contains_key("transformation"));
        assert!(!seen.fields.contains_key("format"));
        assert_eq!(seen.file_bytes.len(), 16);
    }

    #[tokio::test]
    async fn test_provider_error_message_is_returned() {
        let (client, _) = provider(
            StatusCode::BAD_REQUEST,
            r#"{"error":{"message":"Invalid Signature"}}"#,
        )
        .await;
        let plan = UploadPlan::for_mime("image/png", vec![]);
        let file = UploadDescriptor::from_bytes("a.png", "image/png", b"png".to_vec());

        let err = client.upload(&plan, file).await.unwrap_err();

        assert!(matches!(&err, UploadError::Failed(message) if message == "Invalid Signature"));
        let api: crate::error::ApiError = err.into();
        assert_eq!(api.code(), "UPLOAD_FAILED");
        assert_eq!(api.to_string(), "Failed to upload file: Invalid Signature");
    }

    #[tokio::test]
    async fn test_non_json_error_body_reports_status() {
        let (client, _) = provider(StatusCode::BAD_GATEWAY, "upstream went away").await;
        let plan = UploadPlan::for_mime("image/png", vec![]);
        let file = UploadDescriptor::from_bytes("a.png", "image/png", b"png".to_vec());

        let err = client.upload(&plan, file).await.unwrap_err();

        assert_eq!(err.to_string(), "provider responded with 502 Bad Gateway");
    }
}
