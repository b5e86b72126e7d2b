use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("a reply is still streaming; wait for it before sending again")]
    TurnInFlight,

    #[error("cannot send an empty message")]
    EmptyMessage,

    #[error("turn ended without a final event")]
    TurnAborted,
}

pub type Result<T> = std::result::Result<T, SessionError>;
