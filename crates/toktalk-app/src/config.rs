use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use toktalk_types::CounselingConfig;

/// Sent when no key is configured; every model call will then fail and fall back to apologies
pub const PLACEHOLDER_API_KEY: &str = "API_KEY_PLACEHOLDER";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub llm: LlmConfig,
    pub storage: StorageConfig,
    pub flow: FlowConfig,
    pub share: ShareConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub chat_model: String,
    pub summary_model: String,
    /// Override for the Gemini API root
    #[serde(default)]
    pub base_url: Option<String>,
    /// File whose contents replace the built-in persona instruction
    #[serde(default)]
    pub persona_file: Option<PathBuf>,
    /// File whose contents replace the built-in summary prompt
    #[serde(default)]
    pub summary_prompt_file: Option<PathBuf>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_output_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Unset keeps everything in memory for this process only
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    pub poll_interval_ms: u64,
}

impl StorageConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FlowConfig {
    pub return_to_form_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShareConfig {
    /// Address used when the app is started without `--url`
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

/// Where the Gemini key came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKey {
    Provided(String),
    Placeholder,
}

impl ApiKey {
    /// `GEMINI_API_KEY`, then `API_KEY`; blank values count as missing
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        ["GEMINI_API_KEY", "API_KEY"]
            .into_iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
            .map(Self::Provided)
            .unwrap_or(Self::Placeholder)
    }

    pub fn from_env() -> Self {
        Self::resolve(|name| std::env::var(name).ok())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Provided(key) => key,
            Self::Placeholder => PLACEHOLDER_API_KEY,
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. `explicit` file, when given
    /// 4. Environment variables `TOKTALK_<SECTION>__<KEY>` (e.g. `TOKTALK_LLM__CHAT_MODEL`)
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("TOKTALK")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Settings the session layer needs, with prompt files read in
    pub fn counseling(&self) -> std::io::Result<CounselingConfig> {
        let read = |path: &Option<PathBuf>| -> std::io::Result<Option<String>> {
            path.as_ref().map(std::fs::read_to_string).transpose()
        };

        Ok(CounselingConfig {
            chat_model: self.llm.chat_model.clone(),
            summary_model: self.llm.summary_model.clone(),
            persona_instruction: read(&self.llm.persona_file)?,
            summary_prompt: read(&self.llm.summary_prompt_file)?,
            temperature: self.llm.temperature,
            max_output_tokens: self.llm.max_output_tokens,
            return_to_form_secs: self.flow.return_to_form_secs,
        })
    }
}
