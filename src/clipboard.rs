// Plain-text request summaries and clipboard output

use crate::error::CopyError;
use crate::models::Request;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::process::{Command, Stdio};
use tracing::debug;

/// Human-readable summary of a request, suitable for pasting into chat
pub fn summary(request: &Request) -> String {
    let due = request
        .due_date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "none".to_string());

    let mut text = format!(
        "3D print request from {}\nStatus: {} | Priority: {} | Due: {}\n\n{}\n",
        request.name, request.status, request.priority, due, request.description
    );
    if !request.dev_notes.trim().is_empty() {
        text.push_str(&format!("\nDev notes: {}\n", request.dev_notes.trim()));
    }
    text
}

/// Destination for copied text
pub trait Clipboard {
    fn write_text(&self, text: &str) -> Result<(), CopyError>;
}

/// External program that reads clipboard content on stdin (`pbcopy`, `wl-copy`, `xclip -selection clipboard`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandClipboard {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl Clipboard for CommandClipboard {
    fn write_text(&self, text: &str) -> Result<(), CopyError> {
        let spawn_error = |source: std::io::Error| CopyError::Spawn {
            program: self.program.clone(),
            source,
        };

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).map_err(spawn_error)?;
        }
        let status = child.wait().map_err(spawn_error)?;
        if !status.success() {
            return Err(CopyError::Failed {
                program: self.program.clone(),
                status,
            });
        }

        debug!(program = %self.program, bytes = text.len(), "Copied text to clipboard");
        Ok(())
    }
}

/// Copy the summary of `request`; `None` means no clipboard is configured
pub fn copy_summary(clipboard: Option<&dyn Clipboard>, request: &Request) -> Result<String, CopyError> {
    let clipboard = clipboard.ok_or(CopyError::NotConfigured)?;
    let text = summary(request);
    clipboard.write_text(&text)?;
    Ok(text)
}
