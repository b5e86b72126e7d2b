#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::oneshot;
use toktalk_llm::{ChatClient, ChatRequest, ChatResponse, EventStream, StreamEvent};

/// Behaviour of one scripted call
pub enum Script {
    Reply(Vec<&'static str>),
    /// Fragments, then a transport error
    BreakAfter(Vec<&'static str>),
    /// The call itself fails before any stream exists
    Refuse,
    /// Stream stays open until the sender fires
    Hold(oneshot::Receiver<()>, Vec<&'static str>),
    Answer(Option<&'static str>),
}

#[derive(Clone, Default)]
pub struct ScriptedClient {
    scripts: Arc<Mutex<VecDeque<Script>>>,
    pub requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ScriptedClient {
    pub fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Arc::new(Mutex::new(scripts.into())),
            requests: Arc::default(),
        }
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: ChatRequest) -> Script {
        self.requests.lock().unwrap().push(request);
        self.scripts.lock().unwrap().pop_front().expect("no script left")
    }
}

fn message(text: &str) -> StreamEvent {
    StreamEvent::Message { content: text.to_string() }
}

#[async_trait]
impl ChatClient for ScriptedClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        match self.next(request) {
            Script::Answer(content) => Ok(ChatResponse {
                content: content.map(str::to_string),
                usage: None,
                finish_reason: Some("STOP".to_string()),
                raw: serde_json::Value::Null,
            }),
            _ => anyhow::bail!("summary endpoint unavailable"),
        }
    }

    async fn chat_stream(&self, request: ChatRequest) -> Result<EventStream> {
        match self.next(request) {
            Script::Reply(parts) => Ok(Box::pin(async_stream::stream! {
                for part in parts {
                    yield Ok(message(part));
                }
                yield Ok(StreamEvent::Done { finish_reason: Some("STOP".to_string()) });
            })),
            Script::BreakAfter(parts) => Ok(Box::pin(async_stream::stream! {
                for part in parts {
                    yield Ok(message(part));
                }
                yield Err(anyhow::anyhow!("connection reset"));
            })),
            Script::Hold(gate, parts) => Ok(Box::pin(async_stream::stream! {
                let _ = gate.await;
                for part in parts {
                    yield Ok(message(part));
                }
                yield Ok(StreamEvent::Done { finish_reason: None });
            })),
            Script::Refuse | Script::Answer(_) => anyhow::bail!("503 Service Unavailable"),
        }
    }
}
