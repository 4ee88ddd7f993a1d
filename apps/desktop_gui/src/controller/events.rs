//! Events flowing from the backend worker back to the UI thread.

use client_core::{GenerateOutcome, RequestTicket, SearchOutcome};

#[derive(Debug)]
pub enum UiEvent {
    BackendReady,
    SearchFinished {
        ticket: RequestTicket,
        outcome: SearchOutcome,
    },
    GenerationFinished {
        ticket: RequestTicket,
        outcome: GenerateOutcome,
    },
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Dispatch,
}

#[derive(Debug, Clone)]
pub struct UiError {
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            context,
            message: message.into(),
        }
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Startup failures leave no worker behind, so every later request
    /// would fail the same way.
    pub fn is_fatal(&self) -> bool {
        self.context == UiErrorContext::BackendStartup
    }
}
