use anyhow::{Context, Result};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[async_trait]
pub trait Clipboard: Send + Sync {
    async fn write_text(&self, text: &str) -> Result<()>;
}

type Candidate = (&'static str, &'static [&'static str]);

const MACOS: &[Candidate] = &[("pbcopy", &[])];
const WINDOWS: &[Candidate] = &[("clip", &[])];
const UNIX: &[Candidate] = &[
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

/// Pipes text into the platform's clipboard command
pub struct SystemClipboard {
    candidates: &'static [Candidate],
}

impl SystemClipboard {
    pub fn new() -> Self {
        let candidates = if cfg!(target_os = "macos") {
            MACOS
        } else if cfg!(target_os = "windows") {
            WINDOWS
        } else {
            UNIX
        };
        Self { candidates }
    }

    async fn pipe_to(program: &str, args: &[&str], text: &str) -> Result<()> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to start {}", program))?;

        let mut stdin = child
            .stdin
            .take()
            .context("clipboard command has no stdin")?;
        stdin.write_all(text.as_bytes()).await?;
        drop(stdin);

        let status = child.wait().await?;
        if !status.success() {
            anyhow::bail!("{} exited with {}", program, status);
        }
        Ok(())
    }
}

impl Default for SystemClipboard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clipboard for SystemClipboard {
    async fn write_text(&self, text: &str) -> Result<()> {
        let mut last_error = None;
        for (program, args) in self.candidates {
            match Self::pipe_to(program, args, text).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::debug!(program = %program, error = %e, "clipboard command unavailable");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("no clipboard command for this platform")))
    }
}
