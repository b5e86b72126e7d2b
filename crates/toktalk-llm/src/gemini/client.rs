// Gemini-specific client implementation

use crate::buffer_utils::parse_sse_stream;
use crate::gemini::GenerateContentResponse;
use crate::streaming::GeminiLineParser;
use crate::traits::{ChatClient, ChatOptions, ChatRequest, ChatResponse, EventStream, TokenUsage};
use crate::types::{Content, Message};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde_json::Value;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini client (HTTP direct, no SDK)
///
/// Chat "sessions" are stateless on the wire: callers resend the whole history
/// each turn, with the persona carried as `systemInstruction`.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GeminiClient {
    /// Create new client with API key
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&api_key).context("Invalid API key format")?,
        );

        let http_client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            http_client,
            base_url: GEMINI_API_BASE.to_string(),
        })
    }

    /// Point the client at a different API root (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    /// Build generateContent payload
    pub(crate) fn build_payload(&self, messages: Vec<Message>, options: &ChatOptions) -> Value {
        let mut system_texts: Vec<String> = Vec::new();
        let mut contents: Vec<Value> = Vec::new();

        for message in messages {
            match message {
                Message::System { content } => {
                    system_texts.extend(content.texts().into_iter().map(str::to_string));
                }
                Message::Human { content } => contents.push(Self::convert_content("user", content)),
                Message::AI { content } => contents.push(Self::convert_content("model", content)),
            }
        }

        let mut request = serde_json::json!({ "contents": contents });

        if let Some(obj) = request.as_object_mut() {
            if !system_texts.is_empty() {
                obj.insert(
                    "systemInstruction".to_string(),
                    serde_json::json!({ "parts": [{ "text": system_texts.join("\n\n") }] }),
                );
            }

            let mut generation = serde_json::Map::new();
            if let Some(temp) = options.temperature {
                generation.insert("temperature".to_string(), serde_json::json!(temp));
            }
            if let Some(max_tokens) = options.max_tokens {
                generation.insert("maxOutputTokens".to_string(), serde_json::json!(max_tokens));
            }
            if !generation.is_empty() {
                obj.insert("generationConfig".to_string(), Value::Object(generation));
            }
        }

        request
    }

    fn convert_content(role: &str, content: Content) -> Value {
        let parts: Vec<Value> = content
            .texts()
            .into_iter()
            .map(|text| serde_json::json!({ "text": text }))
            .collect();

        serde_json::json!({
            "role": role,
            "parts": parts,
        })
    }

    async fn post(&self, url: String, payload: &Value) -> Result<reqwest::Response> {
        let response = self
            .http_client
            .post(url)
            .json(payload)
            .send()
            .await
            .context("Failed to send request")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Gemini API error ({}): {}", status, error_text);
        }

        Ok(response)
    }
}

#[async_trait]
impl ChatClient for GeminiClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let payload = self.build_payload(request.messages, &request.options);

        tracing::debug!(model = %request.model, "generateContent");
        let response = self
            .post(self.endpoint(&request.model, "generateContent"), &payload)
            .await?;

        let raw: Value = response.json().await.context("Failed to parse response")?;
        let parsed: GenerateContentResponse =
            serde_json::from_value(raw.clone()).context("Unexpected response shape")?;

        Ok(ChatResponse {
            content: parsed.text(),
            usage: parsed.usage_metadata.as_ref().map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
            finish_reason: parsed.finish_reason().map(str::to_string),
            raw,
        })
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        let payload = self.build_payload(request.messages, &request.options);

        tracing::debug!(model = %request.model, "streamGenerateContent");
        let url = format!("{}?alt=sse", self.endpoint(&request.model, "streamGenerateContent"));
        let response = self.post(url, &payload).await?;

        Ok(parse_sse_stream(response.bytes_stream(), GeminiLineParser))
    }
}
