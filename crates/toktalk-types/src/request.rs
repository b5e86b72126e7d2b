use chrono::{DateTime, Datelike, Local, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::session::SessionSelection;

/// Who the student wants to hear from; stored by its Korean label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CounselorType {
    #[serde(rename = "담임 선생님")]
    HomeroomTeacher,
    #[serde(rename = "상담 선생님")]
    SchoolCounselor,
    #[serde(rename = "여기에서만 이야기할래요")]
    Chatbot,
}

impl CounselorType {
    pub fn all() -> [CounselorType; 3] {
        [Self::HomeroomTeacher, Self::SchoolCounselor, Self::Chatbot]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::HomeroomTeacher => "담임 선생님",
            Self::SchoolCounselor => "상담 선생님",
            Self::Chatbot => "여기에서만 이야기할래요",
        }
    }
}

impl fmt::Display for CounselorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Stored outcome of one finished conversation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounselingRequest {
    /// Creation instant, RFC 3339 with milliseconds
    pub id: String,
    pub student_name: String,
    pub initial_worry: String,
    pub counselor_type: CounselorType,
    /// Model summary, or the fixed failure sentence
    pub summary: String,
    pub date: String,
    pub class_name: String,
}

impl CounselingRequest {
    pub fn new(
        selection: &SessionSelection,
        summary: impl Into<String>,
        class_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            student_name: selection.student_name.clone(),
            initial_worry: selection.worry.clone(),
            counselor_type: selection.counselor,
            summary: summary.into(),
            date: korean_date(created_at.with_timezone(&Local).date_naive()),
            class_name: class_name.into(),
        }
    }

    pub fn display_summary(&self) -> &str {
        if self.summary.is_empty() {
            "요약 내용이 없습니다."
        } else {
            &self.summary
        }
    }
}

/// `ko-KR` short date, e.g. `2024. 5. 3.`
pub fn korean_date(date: NaiveDate) -> String {
    format!("{}. {}. {}.", date.year(), date.month(), date.day())
}
