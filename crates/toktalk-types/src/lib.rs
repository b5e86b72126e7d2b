pub mod message;
pub mod request;
pub mod session;
pub mod events;
pub mod config;

pub use message::{ChatMessage, FailureMode, Role, Transcript};
pub use request::{korean_date, CounselingRequest, CounselorType};
pub use session::{SessionSelection, ValidationError};
pub use events::{TurnEvent, TurnOutcome};
pub use config::CounselingConfig;
