use std::fmt::Write;

use toktalk_types::CounselingRequest;

use crate::clipboard::Clipboard;
use crate::context::AppContext;
use crate::error::AppError;
use crate::launch::LaunchUrl;

pub const EMPTY_TITLE: &str = "접수된 상담이 없습니다.";
pub const EMPTY_HINT: &str = "학생이 공유된 링크로 접속하여 상담을 요청하면 여기에 표시됩니다.";

/// Teacher's view of their class: share link plus filed requests
#[derive(Debug, Clone)]
pub struct TeacherDashboard {
    pub class_name: String,
    pub student_link: String,
    pub requests: Vec<CounselingRequest>,
}

impl TeacherDashboard {
    pub async fn load(ctx: &AppContext, launch: &LaunchUrl) -> Result<Self, AppError> {
        let class_name = ctx.active_class().ok_or(AppError::NoActiveClass)?.to_string();
        Ok(Self {
            student_link: launch.share_link(&class_name),
            requests: ctx.requests_for_active_class().await,
            class_name,
        })
    }

    /// Copy the student link; `false` (and a log line) when the clipboard refuses
    pub async fn copy_link(&self, clipboard: &dyn Clipboard) -> bool {
        match clipboard.write_text(&self.student_link).await {
            Ok(()) => {
                tracing::info!(class = %self.class_name, "student link copied");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to copy link");
                false
            }
        }
    }

    /// Collapsed list: one line per request
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{} 학생 상담 목록", self.class_name);
        let _ = writeln!(out, "학생용 링크: {}", self.student_link);
        let _ = writeln!(out);

        if self.requests.is_empty() {
            let _ = writeln!(out, "{}", EMPTY_TITLE);
            let _ = writeln!(out, "{}", EMPTY_HINT);
            return out;
        }

        for (index, request) in self.requests.iter().enumerate() {
            let _ = writeln!(
                out,
                "[{}] {} · {} · {}",
                index + 1,
                request.student_name,
                request.counselor_type,
                request.date
            );
            let _ = writeln!(out, "    {}", request.initial_worry);
        }
        out
    }

    /// Expanded card for the request at `index` (0-based)
    pub fn render_detail(&self, index: usize) -> Option<String> {
        let request = self.requests.get(index)?;
        let mut out = String::new();
        let _ = writeln!(out, "{} ({})", request.student_name, request.date);
        let _ = writeln!(out, "희망 상담: {}", request.counselor_type);
        let _ = writeln!(out, "최초 고민: {}", request.initial_worry);
        let _ = writeln!(out);
        let _ = writeln!(out, "{}", request.display_summary());
        Some(out)
    }
}
