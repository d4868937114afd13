//! Output formatting for CLI commands.
//!
//! Results are printed as text by default or as JSON DTOs with `--json`.

use anyhow::Result;
use blobtree_core::Hash;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Prints command results on stdout and failures on stderr.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        let format = match json {
            true => OutputFormat::Json,
            false => OutputFormat::Text,
        };
        Self { format }
    }

    /// Render a result. In text mode `text_fn` supplies the whole output,
    /// trailing newline included; in JSON mode `data` is pretty-printed.
    pub fn render<T: Serialize>(&self, data: &T, text_fn: impl FnOnce() -> String) -> Result<String> {
        Ok(match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(data)? + "\n",
            OutputFormat::Text => text_fn(),
        })
    }

    /// Render a failure with its whole context chain.
    pub fn render_error(&self, error: &anyhow::Error, result_code: u8) -> String {
        let message = format!("{:#}", error);
        match self.format {
            OutputFormat::Json => {
                let dto = ErrorOutput {
                    success: false,
                    result_code,
                    error: message.clone(),
                };
                match serde_json::to_string_pretty(&dto) {
                    Ok(json) => json + "\n",
                    Err(_) => format!("Error: {}\n", message),
                }
            }
            OutputFormat::Text => format!("Error: {}\n", message),
        }
    }

    pub fn write<T: Serialize>(&self, data: &T, text_fn: impl FnOnce() -> String) -> Result<()> {
        let rendered = self.render(data, text_fn)?;
        let mut stdout = io::stdout().lock();
        stdout.write_all(rendered.as_bytes())?;
        stdout.flush()?;
        Ok(())
    }

    pub fn write_error(&self, error: &anyhow::Error, result_code: u8) {
        let _ = io::stderr().write_all(self.render_error(error, result_code).as_bytes());
    }
}

// ============================================================================
// Data Transfer Objects (DTOs) for JSON output
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorOutput {
    pub success: bool,
    pub result_code: u8,
    pub error: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Node,
    Blob,
}

/// One line of `ls` output.
#[derive(Debug, Clone, Serialize)]
pub struct TreeEntry {
    pub kind: EntryKind,
    pub path: String,
    pub level: usize,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct LsOutput {
    pub success: bool,
    pub result_code: u8,
    pub root: String,
    pub entries: Vec<TreeEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlobInfo {
    pub name: String,
    pub size: u64,
    pub hash: Hash,
}

#[derive(Debug, Serialize)]
pub struct FlattenOutput {
    pub success: bool,
    pub result_code: u8,
    pub blobs: Vec<BlobInfo>,
}

#[derive(Debug, Serialize)]
pub struct SizeOutput {
    pub success: bool,
    pub result_code: u8,
    pub bytes: u64,
    pub blobs: usize,
}

#[derive(Debug, Serialize)]
pub struct FindOutput {
    pub success: bool,
    pub result_code: u8,
    pub path: String,
    pub kind: EntryKind,
    pub size: u64,
    pub hash: Hash,
}

#[derive(Debug, Serialize)]
pub struct HashOutput {
    pub success: bool,
    pub result_code: u8,
    pub hash: Hash,
    /// Digest the caller asked to check against, when given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<Hash>,
}

#[derive(Debug, Serialize)]
pub struct CopyOutput {
    pub success: bool,
    pub result_code: u8,
    pub source: String,
    pub destination: String,
    pub blobs: usize,
    pub bytes: u64,
}
