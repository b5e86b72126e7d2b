use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::buffer_utils::SseLineParser;
use crate::gemini::GenerateContentResponse;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Message {
        content: String,
    },
    
    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

impl GenerateContentResponse {
    fn to_stream_events(&self) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        
        if let Some(text) = self.text() {
            if !text.is_empty() {
                events.push(StreamEvent::Message { content: text });
            }
        }
        
        if let Some(finish_reason) = self.finish_reason() {
            events.push(StreamEvent::Done {
                finish_reason: Some(finish_reason.to_string()),
            });
        }
        
        events
    }
}

/// Parses `streamGenerateContent?alt=sse` data lines
///
/// Each data line carries a complete `GenerateContentResponse` whose text is a
/// delta, not the accumulated reply.
#[derive(Debug, Default, Clone, Copy)]
pub struct GeminiLineParser;

impl SseLineParser for GeminiLineParser {
    fn parse_data_line(&self, data: &str) -> Result<Vec<StreamEvent>> {
        let chunk: GenerateContentResponse = serde_json::from_str(data)
            .map_err(|e| anyhow::anyhow!("Failed to parse Gemini chunk: {}", e))?;
        
        if let Some(feedback) = &chunk.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                anyhow::bail!("Prompt blocked by provider: {}", reason);
            }
        }
        
        Ok(chunk.to_stream_events())
    }
}
