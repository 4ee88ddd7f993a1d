//! UI layer for desktop GUI: the composer window and its panels.

pub mod app;
pub mod clipboard;

pub use app::ComposerApp;
