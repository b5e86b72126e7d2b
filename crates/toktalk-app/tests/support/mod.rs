#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use toktalk_app::Clipboard;
use toktalk_llm::{ChatClient, ChatRequest, ChatResponse, EventStream, StreamEvent};
use toktalk_persist::{MemoryStore, RequestStore};

/// Streams canned replies in order; summaries come from `summary`
pub struct FakeGemini {
    replies: Mutex<VecDeque<Option<Vec<&'static str>>>>,
    summary: Option<&'static str>,
    pub summary_prompts: Mutex<Vec<String>>,
}

impl FakeGemini {
    /// `None` in `replies` makes that turn fail; `None` summary makes summarization fail
    pub fn new(replies: Vec<Option<Vec<&'static str>>>, summary: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            summary,
            summary_prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatClient for FakeGemini {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let prompt = request.messages[0].content().as_text().unwrap_or_default().to_string();
        self.summary_prompts.lock().unwrap().push(prompt);
        match self.summary {
            Some(text) => Ok(ChatResponse {
                content: Some(text.to_string()),
                usage: None,
                finish_reason: Some("STOP".to_string()),
                raw: serde_json::Value::Null,
            }),
            None => anyhow::bail!("429 Too Many Requests"),
        }
    }

    async fn chat_stream(&self, _request: ChatRequest) -> Result<EventStream> {
        let reply = self.replies.lock().unwrap().pop_front().flatten();
        match reply {
            Some(parts) => Ok(Box::pin(async_stream::stream! {
                for part in parts {
                    yield Ok(StreamEvent::Message { content: part.to_string() });
                }
                yield Ok(StreamEvent::Done { finish_reason: None });
            })),
            None => anyhow::bail!("connection refused"),
        }
    }
}

#[derive(Default)]
pub struct RecordingClipboard {
    pub fail: bool,
    pub copied: Mutex<Vec<String>>,
}

#[async_trait]
impl Clipboard for RecordingClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        if self.fail {
            anyhow::bail!("clipboard denied");
        }
        self.copied.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

pub fn memory_store() -> (MemoryStore, RequestStore) {
    let backend = MemoryStore::new();
    let store = RequestStore::new(Arc::new(backend.clone()));
    (backend, store)
}
