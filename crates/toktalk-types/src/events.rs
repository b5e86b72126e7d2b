use serde::{Deserialize, Serialize};

/// Progress of one assistant turn, delivered in order over the turn channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// Empty assistant message inserted; the first fragment is on its way
    Placeholder,

    /// One streamed increment plus the assistant text so far
    Fragment {
        content: String,
        accumulated: String,
    },

    /// Turn ended in an error; the apology now sits in the transcript
    Failed {
        apology: String,
    },

    /// Turn finished normally
    Complete {
        content: String,
    },
}

impl TurnEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Complete { .. })
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Completed(String),
    Failed(String),
}

impl TurnOutcome {
    pub fn text(&self) -> &str {
        match self {
            Self::Completed(text) | Self::Failed(text) => text,
        }
    }
}
