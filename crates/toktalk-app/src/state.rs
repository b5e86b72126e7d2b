use std::sync::Arc;

use toktalk_llm::ChatClient;
use toktalk_types::CounselingConfig;

use crate::clipboard::Clipboard;
use crate::flow::StudentFlow;

/// Long-lived services shared by every flow in this process
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn ChatClient>,
    pub counseling: Arc<CounselingConfig>,
    pub clipboard: Arc<dyn Clipboard>,
}

impl AppState {
    pub fn new(
        client: Arc<dyn ChatClient>,
        counseling: CounselingConfig,
        clipboard: Arc<dyn Clipboard>,
    ) -> Self {
        Self {
            client,
            counseling: Arc::new(counseling),
            clipboard,
        }
    }

    /// Fresh flow for the next student
    pub fn student_flow(&self) -> StudentFlow {
        StudentFlow::new(Arc::clone(&self.client), (*self.counseling).clone())
    }
}
