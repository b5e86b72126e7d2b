use thiserror::Error;
use toktalk_persist::PersistError;
use toktalk_session::SessionError;
use toktalk_types::ValidationError;

use crate::flow::FlowState;

/// Failures of the application context (launch, class setup, storage)
#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid launch URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("storage error: {0}")]
    Persist(#[from] PersistError),

    #[error("this tab is locked to the class in its link")]
    StudentOnly,

    #[error("no class has been set up yet")]
    NoActiveClass,
}

/// Failures of the student flow
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("cannot {action} while in the {state:?} step")]
    InvalidTransition { action: &'static str, state: FlowState },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no active class; the request cannot be filed")]
    NoActiveClass,

    #[error("a reply is still arriving")]
    TurnInFlight,

    #[error(transparent)]
    Session(SessionError),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<SessionError> for FlowError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::TurnInFlight => Self::TurnInFlight,
            other => Self::Session(other),
        }
    }
}
