use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Default, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerationResult {
    pub story: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResult {
    pub url: String,
    pub raw: Value,
}

/// Instruction sent to the text provider.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryPrompt {
    pub text: String,
    pub max_output_tokens: u32,
}

/// Storage options for a single upload.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    pub folder: String,
    pub public_id: Option<String>,
    pub resource_type: String,
}

/// Raw bytes recovered from an upload payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPayload {
    pub bytes: Vec<u8>,
    /// MIME type from the `data:` prefix, when the payload was a data URL.
    pub mime_type: Option<String>,
}

/// What the storage provider reports after a successful upload.
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub secure_url: String,
    pub raw: Value,
}
