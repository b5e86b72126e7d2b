use serde::{Deserialize, Serialize};

/// Speaker of a transcript line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    /// Counselor persona; older stores wrote `"model"`
    #[serde(alias = "model")]
    Assistant,
}

impl Role {
    /// Speaker label used in teacher-facing conversation text
    pub fn speaker_label(&self) -> &'static str {
        match self {
            Role::User => "학생",
            Role::Assistant => "챗봇",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// How a failed assistant turn is written into the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureMode {
    /// Keep partial content and add the apology after it
    AppendAfterPartial,
    /// Overwrite the in-progress assistant message with the apology
    ReplaceInProgress,
}

/// Visible conversation, append-only except for the last assistant message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(ChatMessage::user(content));
    }

    /// Insert the empty placeholder that occupies the assistant's turn
    pub fn begin_assistant(&mut self) {
        self.messages.push(ChatMessage::assistant(""));
    }

    /// Replace the in-progress assistant text; no-op unless the last line is the assistant's
    pub fn update_last_assistant(&mut self, content: impl Into<String>) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => {
                last.content = content.into();
                true
            }
            _ => false,
        }
    }

    /// Write the apology for a failed turn. An empty placeholder is always replaced.
    pub fn fail_turn(&mut self, apology: impl Into<String>, mode: FailureMode) {
        let apology = apology.into();
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant && last.is_blank() => {
                last.content = apology;
            }
            Some(last) if last.role == Role::Assistant && mode == FailureMode::ReplaceInProgress => {
                last.content = apology;
            }
            _ => self.messages.push(ChatMessage::assistant(apology)),
        }
    }

    /// Messages with whitespace-only content removed
    pub fn without_blank(&self) -> Vec<ChatMessage> {
        self.messages.iter().filter(|m| !m.is_blank()).cloned().collect()
    }

    /// `학생: …` / `챗봇: …` lines, one per message
    pub fn to_conversation_text(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.speaker_label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<Vec<ChatMessage>> for Transcript {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self { messages }
    }
}
