use std::path::{Path, PathBuf};

use shared::domain::Mode;

use crate::error::ComposerError;

/// Receives text for the system clipboard. Front ends plug in their own
/// clipboard handle; tests use an in-memory sink.
pub trait ClipboardSink {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()>;
}

impl ClipboardSink for String {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
        self.clear();
        self.push_str(text);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFile {
    pub filename: String,
    pub contents: String,
}

impl DownloadFile {
    pub fn new(mode: Mode, unix_millis: u128, contents: impl Into<String>) -> Self {
        Self {
            filename: download_filename(mode, unix_millis),
            contents: contents.into(),
        }
    }

    /// Saves under the suggested file name inside `dir`.
    pub fn write_into(&self, dir: &Path) -> Result<PathBuf, ComposerError> {
        let path = dir.join(&self.filename);
        self.write_to(&path)?;
        Ok(path)
    }

    pub fn write_to(&self, path: &Path) -> Result<(), ComposerError> {
        std::fs::write(path, self.contents.as_bytes()).map_err(|source| ComposerError::Save {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = self.contents.len(), "result saved");
        Ok(())
    }
}

pub fn download_filename(mode: Mode, unix_millis: u128) -> String {
    format!("{}_{unix_millis}.txt", mode.key())
}
