use std::sync::Arc;

use toktalk_llm::{ChatClient, ChatOptions, ChatRequest, Message};
use toktalk_types::{CounselingConfig, Transcript};

use crate::conversation::chat_options;
use crate::templates::{
    render, CONVERSATION_PLACEHOLDER, DEFAULT_SUMMARY_PROMPT, INITIAL_WORRY_PLACEHOLDER,
    STUDENT_NAME_PLACEHOLDER, SUMMARY_FAILURE_TEXT,
};

/// Result of one summarization call
///
/// Both variants end up as plain text in the stored request; the distinction
/// only exists for logging and for callers that want to react to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryOutcome {
    Generated(String),
    Failed(String),
}

impl SummaryOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Generated(text) | Self::Failed(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) | Self::Failed(text) => text,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// One-shot teacher-facing summary of a finished conversation
pub struct Summarizer {
    client: Arc<dyn ChatClient>,
    model: String,
    template: String,
    options: ChatOptions,
}

impl Summarizer {
    pub fn new(client: Arc<dyn ChatClient>, config: &CounselingConfig) -> Self {
        Self {
            client,
            model: config.summary_model.clone(),
            template: config
                .summary_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_SUMMARY_PROMPT.to_string()),
            options: chat_options(config),
        }
    }

    pub fn build_prompt(&self, student_name: &str, initial_worry: &str, transcript: &Transcript) -> String {
        let conversation = transcript.to_conversation_text();
        render(
            &self.template,
            &[
                (STUDENT_NAME_PLACEHOLDER, student_name),
                (INITIAL_WORRY_PLACEHOLDER, initial_worry),
                (CONVERSATION_PLACEHOLDER, &conversation),
            ],
        )
    }

    /// Never errors: any failure becomes the fixed failure text
    pub async fn summarize(
        &self,
        student_name: &str,
        initial_worry: &str,
        transcript: &Transcript,
    ) -> SummaryOutcome {
        let prompt = self.build_prompt(student_name, initial_worry, transcript);
        let request = ChatRequest::new(self.model.clone(), vec![Message::human(prompt)])
            .with_options(self.options.clone());

        match self.client.chat(request).await {
            Ok(response) => match response.content {
                Some(text) if !text.trim().is_empty() => {
                    tracing::info!(
                        model = %self.model,
                        messages = transcript.len(),
                        chars = text.chars().count(),
                        "summary generated"
                    );
                    SummaryOutcome::Generated(text)
                }
                _ => {
                    tracing::warn!(
                        model = %self.model,
                        finish_reason = ?response.finish_reason,
                        "summary response had no text"
                    );
                    SummaryOutcome::Failed(SUMMARY_FAILURE_TEXT.to_string())
                }
            },
            Err(e) => {
                tracing::error!(model = %self.model, error = %e, "error summarizing conversation");
                SummaryOutcome::Failed(SUMMARY_FAILURE_TEXT.to_string())
            }
        }
    }
}
