use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Knobs for one counseling deployment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounselingConfig {
    #[serde(default = "default_model")]
    pub chat_model: String,
    #[serde(default = "default_model")]
    pub summary_model: String,
    /// Overrides the built-in persona instruction
    #[serde(default)]
    pub persona_instruction: Option<String>,
    /// Overrides the built-in summary prompt template
    #[serde(default)]
    pub summary_prompt: Option<String>,
    /// Sampling temperature for both models; provider default when unset
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Reply length cap for both models
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
    #[serde(default = "default_return_secs")]
    pub return_to_form_secs: u64,
}

fn default_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_return_secs() -> u64 {
    4
}

impl Default for CounselingConfig {
    fn default() -> Self {
        Self {
            chat_model: default_model(),
            summary_model: default_model(),
            persona_instruction: None,
            summary_prompt: None,
            temperature: None,
            max_output_tokens: None,
            return_to_form_secs: default_return_secs(),
        }
    }
}

impl CounselingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn with_summary_model(mut self, model: impl Into<String>) -> Self {
        self.summary_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_output_tokens(mut self, tokens: u32) -> Self {
        self.max_output_tokens = Some(tokens);
        self
    }

    pub fn with_return_delay(mut self, delay: Duration) -> Self {
        self.return_to_form_secs = delay.as_secs();
        self
    }

    pub fn return_delay(&self) -> Duration {
        Duration::from_secs(self.return_to_form_secs)
    }
}
