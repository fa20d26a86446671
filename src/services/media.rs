//! Cloudinary upload client.
//!
//! Uploads go through the signed REST upload endpoint as a single multipart
//! request; the resource type is part of the URL path so `auto` lets
//! Cloudinary decide between image, video and raw.

use crate::config::CloudinaryConfig;
use crate::error::AppError;
use crate::models::{UploadMetadata, UploadOptions};
use crate::services::MediaStore;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use sha1::{Digest, Sha1};
use std::time::{SystemTime, UNIX_EPOCH};

pub const UPLOAD_FOLDER: &str = "children_books";

impl UploadOptions {
    /// Options for a children's book asset, optionally with a fixed public id.
    pub fn for_book(public_id: Option<String>) -> Self {
        UploadOptions {
            folder: UPLOAD_FOLDER.to_string(),
            public_id,
            resource_type: "auto".to_string(),
        }
    }
}

struct Credentials<'a> {
    cloud_name: &'a str,
    api_key: &'a str,
    api_secret: &'a str,
}

pub struct CloudinaryClient {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryClient {
    pub fn new(config: CloudinaryConfig) -> Self {
        CloudinaryClient {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn credentials(&self) -> Result<Credentials<'_>, AppError> {
        match (
            self.config.cloud_name.as_deref(),
            self.config.api_key.as_deref(),
            self.config.api_secret.as_deref(),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Ok(Credentials {
                cloud_name,
                api_key,
                api_secret,
            }),
            _ => Err(AppError::Config(
                "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be configured"
                    .to_string(),
            )),
        }
    }

    fn upload_url(&self, cloud_name: &str, resource_type: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.config.api_base.trim_end_matches('/'),
            cloud_name,
            resource_type
        )
    }
}

/// Parameters that take part in the request signature, sorted by name.
fn signed_params(options: &UploadOptions, timestamp: u64) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("folder", options.folder.clone()),
        ("timestamp", timestamp.to_string()),
    ];
    if let Some(public_id) = &options.public_id {
        params.push(("public_id", public_id.clone()));
    }
    params.sort_by(|a, b| a.0.cmp(b.0));
    params
}

/// `sha1("k1=v1&k2=v2" + secret)`, hex encoded.
pub fn sign(params: &[(&str, String)], api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[async_trait]
impl MediaStore for CloudinaryClient {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<UploadMetadata, AppError> {
        let creds = self.credentials()?;
        let params = signed_params(options, unix_timestamp());
        let signature = sign(&params, creds.api_secret);

        tracing::debug!(
            bytes = bytes.len(),
            folder = %options.folder,
            public_id = ?options.public_id,
            "Uploading to Cloudinary"
        );

        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name("file"))
            .text("api_key", creds.api_key.to_string())
            .text("signature", signature);
        for (name, value) in params {
            form = form.text(name, value);
        }

        let response = self
            .client
            .post(self.upload_url(creds.cloud_name, &options.resource_type))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        let parsed = serde_json::from_str::<Value>(&body);

        if !status.is_success() {
            return Err(match parsed {
                Ok(payload) => {
                    let message = payload
                        .pointer("/error/message")
                        .and_then(Value::as_str)
                        .map(str::to_owned)
                        .unwrap_or_else(|| format!("Cloudinary returned {status}"));
                    AppError::upstream_with_payload(message, payload)
                }
                Err(_) => AppError::upstream(format!("Cloudinary returned {status}: {body}")),
            });
        }

        let raw = parsed.map_err(|e| {
            AppError::upstream(format!("Cloudinary returned a non-JSON body: {e}"))
        })?;

        let secure_url = raw
            .get("secure_url")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| {
                AppError::upstream_with_payload("upload response missing secure_url", raw.clone())
            })?;

        Ok(UploadMetadata { secure_url, raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(api_base: &str) -> CloudinaryConfig {
        CloudinaryConfig {
            cloud_name: Some("demo".to_string()),
            api_key: Some("key-123".to_string()),
            api_secret: Some("secret".to_string()),
            api_base: api_base.to_string(),
        }
    }

    #[test]
    fn signature_covers_sorted_params() {
        let options = UploadOptions::for_book(Some("story".to_string()));
        let params = signed_params(&options, 1_700_000_000);
        let names: Vec<_> = params.iter().map(|(k, _)| *k).collect();
        assert_eq!(names, ["folder", "public_id", "timestamp"]);
        assert_eq!(
            sign(&params, "secret"),
            "7b1042a8833de56475706e7620f6e3306fa9468a"
        );
    }

    #[test]
    fn signature_without_public_id() {
        let params = signed_params(&UploadOptions::for_book(None), 1_700_000_000);
        assert_eq!(
            sign(&params, "secret"),
            "c371aa5ce655bf4bb4c13bf1cb9806105c8a18c7"
        );
    }

    #[tokio::test]
    async fn upload_returns_secure_url_and_raw_response() {
        let mock_server = MockServer::start().await;
        let provider_body = json!({
            "public_id": "children_books/story",
            "resource_type": "image",
            "secure_url": "https://res.cloudinary.com/demo/image/upload/children_books/story.png"
        });

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/auto/upload"))
            .and(body_string_contains("children_books"))
            .and(body_string_contains("key-123"))
            .and(body_string_contains("hello world"))
            .respond_with(ResponseTemplate::new(200).set_body_json(provider_body.clone()))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = CloudinaryClient::new(test_config(&mock_server.uri()));
        let meta = client
            .upload(
                b"hello world".to_vec(),
                &UploadOptions::for_book(Some("story".to_string())),
            )
            .await
            .unwrap();

        assert_eq!(
            meta.secure_url,
            "https://res.cloudinary.com/demo/image/upload/children_books/story.png"
        );
        assert_eq!(meta.raw, provider_body);
    }

    #[tokio::test]
    async fn provider_error_message_is_surfaced() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Invalid Signature"}
            })))
            .mount(&mock_server)
            .await;

        let client = CloudinaryClient::new(test_config(&mock_server.uri()));
        let err = client
            .upload(b"x".to_vec(), &UploadOptions::for_book(None))
            .await
            .unwrap_err();

        match err {
            AppError::Upstream { message, payload } => {
                assert_eq!(message, "Invalid Signature");
                assert!(payload.is_some());
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_secure_url_is_an_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&mock_server)
            .await;

        let client = CloudinaryClient::new(test_config(&mock_server.uri()));
        let err = client
            .upload(b"x".to_vec(), &UploadOptions::for_book(None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upstream { .. }));
    }

    #[tokio::test]
    async fn missing_credentials_skip_the_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock_server)
            .await;

        let mut config = test_config(&mock_server.uri());
        config.api_secret = None;
        let client = CloudinaryClient::new(config);
        let err = client
            .upload(b"x".to_vec(), &UploadOptions::for_book(None))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
