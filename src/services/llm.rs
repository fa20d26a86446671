use crate::config::GeminiConfig;
use crate::error::AppError;
use crate::models::StoryPrompt;
use crate::services::StoryGenerator;
use crate::services::extract::extract_story;
use async_trait::async_trait;
use serde_json::{Value, json};

const MAX_OUTPUT_TOKENS: u32 = 800;
const DEFAULT_TOPIC: &str = "مغامرة صغيرة";

/// Build the story instruction for a topic.
pub fn compose_prompt(topic: Option<&str>) -> StoryPrompt {
    let topic = topic.filter(|t| !t.is_empty()).unwrap_or(DEFAULT_TOPIC);
    StoryPrompt {
        text: format!(
            "اكتب كتاب أطفال قصير بالعربية مكون من 5 فصول بعنوان: {topic}. اجعل اللغة بسيطة ومناسبة للأطفال."
        ),
        max_output_tokens: MAX_OUTPUT_TOKENS,
    }
}

/// Gemini text generation over the REST API.
pub struct LLMClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl LLMClient {
    pub fn new(config: GeminiConfig) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(LLMClient { client, config })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateText",
            self.config.api_base.trim_end_matches('/'),
            self.config.model
        )
    }

    async fn call(&self, api_key: &str, prompt: &StoryPrompt) -> Result<Value, AppError> {
        tracing::debug!(
            model = %self.config.model,
            prompt_len = prompt.text.len(),
            "Sending request to Gemini API"
        );

        let response = self
            .client
            .post(self.api_url())
            .query(&[("key", api_key)])
            .header("Content-Type", "application/json")
            .json(&json!({
                "prompt": { "text": prompt.text },
                "maxOutputTokens": prompt.max_output_tokens,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = format!("Gemini API returned {status}");
            return Err(match serde_json::from_str::<Value>(&body) {
                Ok(payload) => {
                    let message = match payload.pointer("/error/message").and_then(Value::as_str) {
                        Some(reason) => format!("{message}: {reason}"),
                        None => message,
                    };
                    AppError::upstream_with_payload(message, payload)
                }
                Err(_) if body.is_empty() => AppError::upstream(message),
                Err(_) => AppError::upstream_with_payload(message, Value::String(body)),
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            AppError::upstream_with_payload(
                format!("Gemini API returned a non-JSON body: {e}"),
                Value::String(body),
            )
        })
    }
}

#[async_trait]
impl StoryGenerator for LLMClient {
    async fn generate(&self, topic: Option<&str>) -> Result<String, AppError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("GEMINI_API_KEY not configured".to_string()))?;

        let prompt = compose_prompt(topic);
        let raw = self.call(api_key, &prompt).await?;

        let (shape, story) = extract_story(&raw);
        tracing::debug!(?shape, story_len = story.len(), "Extracted story");
        Ok(story)
    }
}
