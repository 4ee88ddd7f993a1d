use arboard::Clipboard;
use client_core::ClipboardSink;

/// System clipboard opened on first use and kept for the app's lifetime.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<Clipboard>,
}

impl ClipboardSink for SystemClipboard {
    fn set_text(&mut self, text: &str) -> anyhow::Result<()> {
        let clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => Clipboard::new()?,
        };
        self.inner.insert(clipboard).set_text(text.to_owned())?;
        Ok(())
    }
}
