use thiserror::Error;

use crate::request::CounselorType;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("이름과 고민 내용을 모두 입력해주세요.")]
    MissingNameOrWorry,

    #[error("학급 이름을 입력해주세요.")]
    MissingClassName,
}

/// What the student chose on the intake form; lives for one flow only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSelection {
    pub student_name: String,
    pub worry: String,
    pub counselor: CounselorType,
}

impl SessionSelection {
    /// Name and worry are kept as typed; only the emptiness check trims
    pub fn new(
        student_name: impl Into<String>,
        worry: impl Into<String>,
        counselor: CounselorType,
    ) -> Result<Self, ValidationError> {
        let student_name = student_name.into();
        let worry = worry.into();

        if student_name.trim().is_empty() || worry.trim().is_empty() {
            return Err(ValidationError::MissingNameOrWorry);
        }

        Ok(Self {
            student_name,
            worry,
            counselor,
        })
    }
}
