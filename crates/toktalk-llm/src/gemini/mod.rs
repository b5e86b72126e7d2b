pub mod client;
mod wire;

pub use client::GeminiClient;
pub use wire::{
    Candidate, GenerateContentResponse, PromptFeedback, UsageMetadata, WireContent, WirePart,
};
