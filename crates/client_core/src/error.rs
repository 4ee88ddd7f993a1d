use std::path::PathBuf;

use thiserror::Error;

/// A local check that blocks an action before anything is sent. The message
/// is what the user sees in the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationPrompt {
    #[error("Введите тему!")]
    EmptyTopic,
    #[error("Введите поисковый запрос!")]
    EmptyQuery,
    #[error("Нет текста для копирования!")]
    NothingToCopy,
    #[error("Нет текста для скачивания!")]
    NothingToDownload,
}

#[derive(Debug, Error)]
pub enum ComposerError {
    #[error(transparent)]
    Validation(#[from] ValidationPrompt),
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("failed to save '{}': {source}", path.display())]
    Save {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl ComposerError {
    pub fn prompt(&self) -> Option<ValidationPrompt> {
        match self {
            ComposerError::Validation(prompt) => Some(*prompt),
            _ => None,
        }
    }
}
