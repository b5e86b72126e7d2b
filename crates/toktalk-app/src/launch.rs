use url::Url;

use crate::error::AppError;

/// Query parameter that turns a launch into a student-only session
pub const CLASS_PARAM: &str = "class";

/// The address the app was opened with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchUrl {
    url: Url,
}

impl LaunchUrl {
    pub fn parse(input: &str) -> Result<Self, AppError> {
        Ok(Self {
            url: Url::parse(input)?,
        })
    }

    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// Decoded `class` value; an absent or empty parameter means no class
    pub fn class_param(&self) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == CLASS_PARAM)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    }

    /// Origin plus path, without query or fragment
    pub fn base(&self) -> String {
        format!("{}{}", self.url.origin().ascii_serialization(), self.url.path())
    }

    /// Student link for `class_name` rooted at this address
    pub fn share_link(&self, class_name: &str) -> String {
        share_link(&self.base(), class_name)
    }
}

/// `base` + `?class=` + percent-encoded class name
pub fn share_link(base: &str, class_name: &str) -> String {
    format!("{}?{}={}", base, CLASS_PARAM, urlencoding::encode(class_name))
}
