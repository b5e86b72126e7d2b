pub mod types;
pub mod traits;
pub mod streaming;
pub mod buffer_utils;
pub mod gemini;
pub mod config;

pub use traits::{ChatClient, ChatRequest, ChatResponse, ChatOptions, EventStream, TokenUsage};

pub use streaming::{StreamEvent, GeminiLineParser};
pub use buffer_utils::{CircularLineBuffer, SseLineParser};
pub use gemini::GeminiClient;
pub use config::{ClientFactory, GeminiConfig, ProviderConfig};
pub use types::{Message, Content, ContentPart};
