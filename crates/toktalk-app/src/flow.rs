use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::Instant;

use toktalk_llm::ChatClient;
use toktalk_session::{ConversationSession, Summarizer, SummaryOutcome, TurnHandle};
use toktalk_types::{CounselingConfig, CounselingRequest, CounselorType, SessionSelection, Transcript};

use crate::context::AppContext;
use crate::error::FlowError;

/// Student-side steps; always visited in this order and then back to `Form`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    Form,
    Chat,
    Confirmation,
}

/// One student's pass from intake form to confirmation
pub struct StudentFlow {
    client: Arc<dyn ChatClient>,
    config: CounselingConfig,
    summarizer: Summarizer,
    state: FlowState,
    selection: Option<SessionSelection>,
    session: Option<ConversationSession>,
    return_at: Option<Instant>,
}

impl StudentFlow {
    pub fn new(client: Arc<dyn ChatClient>, config: CounselingConfig) -> Self {
        let summarizer = Summarizer::new(Arc::clone(&client), &config);
        Self {
            client,
            config,
            summarizer,
            state: FlowState::Form,
            selection: None,
            session: None,
            return_at: None,
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn selection(&self) -> Option<&SessionSelection> {
        self.selection.as_ref()
    }

    pub fn transcript(&self) -> Transcript {
        self.session
            .as_ref()
            .map(ConversationSession::transcript)
            .unwrap_or_default()
    }

    pub fn is_replying(&self) -> bool {
        self.session.as_ref().is_some_and(ConversationSession::is_in_flight)
    }

    /// Form → Chat. Opens the conversation with the worry as the first student line.
    pub fn submit(
        &mut self,
        student_name: &str,
        worry: &str,
        counselor: CounselorType,
    ) -> Result<TurnHandle, FlowError> {
        self.expect(FlowState::Form, "start counseling")?;
        let selection = SessionSelection::new(student_name, worry, counselor)?;

        let session = ConversationSession::open(Arc::clone(&self.client), &self.config);
        let opening = session.send(selection.worry.clone())?;

        tracing::info!(counselor = %selection.counselor, "counseling started");
        self.selection = Some(selection);
        self.session = Some(session);
        self.state = FlowState::Chat;
        Ok(opening)
    }

    /// Follow-up message from the student
    pub fn send(&mut self, text: &str) -> Result<TurnHandle, FlowError> {
        self.expect(FlowState::Chat, "send a message")?;
        let session = self.session.as_ref().ok_or(FlowError::InvalidTransition {
            action: "send a message",
            state: self.state,
        })?;
        Ok(session.send(text)?)
    }

    /// Chat → Confirmation: summarize, file the request, start the return timer
    ///
    /// A failed summary is filed like any other; its text is the fixed failure message.
    pub async fn finish(&mut self, ctx: &mut AppContext) -> Result<CounselingRequest, FlowError> {
        self.expect(FlowState::Chat, "finish")?;
        if self.is_replying() {
            return Err(FlowError::TurnInFlight);
        }
        let class_name = ctx.active_class().ok_or(FlowError::NoActiveClass)?.to_string();
        let (Some(selection), Some(session)) = (self.selection.as_ref(), self.session.as_ref()) else {
            return Err(FlowError::InvalidTransition {
                action: "finish",
                state: self.state,
            });
        };

        let transcript = Transcript::from(session.transcript().without_blank());
        let outcome = self
            .summarizer
            .summarize(&selection.student_name, &selection.worry, &transcript)
            .await;
        if let SummaryOutcome::Failed(_) = outcome {
            tracing::warn!(class = %class_name, "filing request with summary failure text");
        }

        let request = CounselingRequest::new(selection, outcome.into_text(), class_name, Utc::now());
        ctx.record_request(request.clone()).await?;

        tracing::info!(id = %request.id, class = %request.class_name, "counseling request filed");
        self.state = FlowState::Confirmation;
        self.return_at = Some(Instant::now() + self.config.return_delay());
        Ok(request)
    }

    /// Time left before the confirmation screen goes back to the form
    pub fn return_delay_remaining(&self) -> Option<Duration> {
        self.return_at
            .map(|at| at.saturating_duration_since(Instant::now()))
    }

    /// Confirmation → Form once the delay has passed; clears the selection
    pub async fn wait_for_return(&mut self) -> Result<(), FlowError> {
        self.expect(FlowState::Confirmation, "return to the form")?;
        if let Some(at) = self.return_at {
            tokio::time::sleep_until(at).await;
        }
        self.reset();
        Ok(())
    }

    fn reset(&mut self) {
        self.state = FlowState::Form;
        self.selection = None;
        self.session = None;
        self.return_at = None;
    }

    fn expect(&self, state: FlowState, action: &'static str) -> Result<(), FlowError> {
        if self.state == state {
            Ok(())
        } else {
            Err(FlowError::InvalidTransition {
                action,
                state: self.state,
            })
        }
    }
}
