//! Provider seams and their HTTP implementations.

pub mod extract;
pub mod llm;
pub mod media;
pub mod payload;

use crate::error::AppError;
use crate::models::{UploadMetadata, UploadOptions};
use async_trait::async_trait;

/// Produces story text for a topic.
#[async_trait]
pub trait StoryGenerator: Send + Sync {
    /// `None` falls back to the default topic.
    async fn generate(&self, topic: Option<&str>) -> Result<String, AppError>;
}

/// Stores bytes and hands back a public URL.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        options: &UploadOptions,
    ) -> Result<UploadMetadata, AppError>;
}
