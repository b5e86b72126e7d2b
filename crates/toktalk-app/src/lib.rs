pub mod clipboard;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod flow;
pub mod launch;
pub mod state;

pub use clipboard::{Clipboard, SystemClipboard};
pub use context::{AppContext, LaunchContext, View};
pub use dashboard::TeacherDashboard;
pub use error::{AppError, FlowError};
pub use flow::{FlowState, StudentFlow};
pub use launch::{share_link, LaunchUrl};
pub use state::AppState;
