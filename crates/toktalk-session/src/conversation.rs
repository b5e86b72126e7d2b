use std::sync::{Arc, Mutex, MutexGuard};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use toktalk_llm::{ChatClient, ChatOptions, ChatRequest, Message, StreamEvent};
use toktalk_types::{CounselingConfig, FailureMode, Transcript, TurnEvent, TurnOutcome};

use crate::error::{Result, SessionError};
use crate::templates::{DEFAULT_PERSONA_INSTRUCTION, OPENING_FAILURE_APOLOGY, SEND_FAILURE_APOLOGY};

struct SessionState {
    transcript: Transcript,
    /// Completed exchanges only; failed turns are never replayed to the model
    history: Vec<Message>,
    turns_started: usize,
    in_flight: bool,
}

/// One student's conversation with the counselor persona
///
/// Each `send` appends the user line immediately and streams the reply on a
/// background task. Only one turn may be open at a time.
#[derive(Clone)]
pub struct ConversationSession {
    client: Arc<dyn ChatClient>,
    model: String,
    persona: String,
    options: ChatOptions,
    state: Arc<Mutex<SessionState>>,
}

impl ConversationSession {
    pub fn open(client: Arc<dyn ChatClient>, config: &CounselingConfig) -> Self {
        let persona = config
            .persona_instruction
            .clone()
            .unwrap_or_else(|| DEFAULT_PERSONA_INSTRUCTION.to_string());

        tracing::debug!(model = %config.chat_model, "conversation session opened");

        Self {
            client,
            model: config.chat_model.clone(),
            persona,
            options: chat_options(config),
            state: Arc::new(Mutex::new(SessionState {
                transcript: Transcript::new(),
                history: Vec::new(),
                turns_started: 0,
                in_flight: false,
            })),
        }
    }

    /// Start a turn. The user line is in the transcript when this returns.
    pub fn send(&self, text: impl Into<String>) -> Result<TurnHandle> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let (request, mode) = {
            let mut state = lock(&self.state);
            if state.in_flight {
                return Err(SessionError::TurnInFlight);
            }
            state.in_flight = true;
            state.transcript.push_user(text.clone());

            let mode = if state.turns_started == 0 {
                FailureMode::AppendAfterPartial
            } else {
                FailureMode::ReplaceInProgress
            };
            state.turns_started += 1;

            let mut messages = Vec::with_capacity(state.history.len() + 2);
            messages.push(Message::system(self.persona.clone()));
            messages.extend(state.history.iter().cloned());
            messages.push(Message::human(text.clone()));

            let request = ChatRequest::new(self.model.clone(), messages).with_options(self.options.clone());
            (request, mode)
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let turn = Turn {
            client: Arc::clone(&self.client),
            state: Arc::clone(&self.state),
            events: tx,
            mode,
            user_text: text,
        };
        tokio::spawn(turn.run(request));

        Ok(TurnHandle { events: rx })
    }

    /// Snapshot of what the student currently sees
    pub fn transcript(&self) -> Transcript {
        lock(&self.state).transcript.clone()
    }

    pub fn is_in_flight(&self) -> bool {
        lock(&self.state).in_flight
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

/// Generation settings shared by the chat and summary requests
pub(crate) fn chat_options(config: &CounselingConfig) -> ChatOptions {
    let mut options = ChatOptions::new();
    if let Some(temperature) = config.temperature {
        options = options.temperature(temperature);
    }
    if let Some(tokens) = config.max_output_tokens {
        options = options.max_tokens(tokens);
    }
    options
}

// A panic while holding the lock leaves the transcript consistent (every
// mutation is a single call), so poisoned state is still usable
fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

struct Turn {
    client: Arc<dyn ChatClient>,
    state: Arc<Mutex<SessionState>>,
    events: mpsc::UnboundedSender<TurnEvent>,
    mode: FailureMode,
    user_text: String,
}

impl Turn {
    async fn run(self, request: ChatRequest) {
        let mut stream = match self.client.chat_stream(request).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::error!(error = %e, "failed to open reply stream");
                return self.fail();
            }
        };

        lock(&self.state).transcript.begin_assistant();
        self.emit(TurnEvent::Placeholder);

        let mut accumulated = String::new();
        while let Some(item) = stream.next().await {
            match item {
                Ok(StreamEvent::Message { content }) => {
                    accumulated.push_str(&content);
                    lock(&self.state)
                        .transcript
                        .update_last_assistant(accumulated.clone());
                    self.emit(TurnEvent::Fragment {
                        content,
                        accumulated: accumulated.clone(),
                    });
                }
                Ok(StreamEvent::Done { finish_reason }) => {
                    tracing::debug!(?finish_reason, "reply stream finished");
                    break;
                }
                Err(e) => {
                    tracing::error!(error = %e, received = accumulated.len(), "reply stream failed");
                    return self.fail();
                }
            }
        }

        {
            let mut state = lock(&self.state);
            state.history.push(Message::human(self.user_text.clone()));
            if !accumulated.is_empty() {
                state.history.push(Message::ai(accumulated.clone()));
            }
            state.in_flight = false;
        }
        self.emit(TurnEvent::Complete { content: accumulated });
    }

    fn fail(self) {
        let apology = match self.mode {
            FailureMode::AppendAfterPartial => OPENING_FAILURE_APOLOGY,
            FailureMode::ReplaceInProgress => SEND_FAILURE_APOLOGY,
        };

        {
            let mut state = lock(&self.state);
            state.transcript.fail_turn(apology, self.mode);
            state.in_flight = false;
        }
        self.emit(TurnEvent::Failed {
            apology: apology.to_string(),
        });
    }

    fn emit(&self, event: TurnEvent) {
        // The caller may have dropped its handle; the transcript is still kept current
        let _ = self.events.send(event);
    }
}

/// Ordered progress of one turn
#[derive(Debug)]
pub struct TurnHandle {
    events: mpsc::UnboundedReceiver<TurnEvent>,
}

impl TurnHandle {
    /// Next event; `None` once the terminal event has been taken
    pub async fn next(&mut self) -> Option<TurnEvent> {
        self.events.recv().await
    }

    /// Drain the turn and report how it ended
    pub async fn wait(mut self) -> Result<TurnOutcome> {
        while let Some(event) = self.events.recv().await {
            match event {
                TurnEvent::Complete { content } => return Ok(TurnOutcome::Completed(content)),
                TurnEvent::Failed { apology } => return Ok(TurnOutcome::Failed(apology)),
                TurnEvent::Placeholder | TurnEvent::Fragment { .. } => {}
            }
        }
        Err(SessionError::TurnAborted)
    }

    pub fn into_stream(self) -> impl Stream<Item = TurnEvent> {
        UnboundedReceiverStream::new(self.events)
    }
}
