pub mod conversation;
pub mod summarizer;
pub mod templates;
pub mod error;

pub use conversation::{ConversationSession, TurnHandle};
pub use summarizer::{Summarizer, SummaryOutcome};
pub use error::SessionError;
pub use templates::{OPENING_FAILURE_APOLOGY, SEND_FAILURE_APOLOGY, SUMMARY_FAILURE_TEXT};

// Re-export the types callers need alongside a session
pub use toktalk_types::{CounselingConfig, Transcript, TurnEvent, TurnOutcome};
