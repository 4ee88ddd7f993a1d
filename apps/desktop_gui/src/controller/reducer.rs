//! Applies backend events to the composer state.

use client_core::ComposerState;

use crate::controller::events::UiEvent;

#[derive(Debug, Default)]
pub struct ShellStatus {
    pub backend_ready: bool,
    pub message: Option<String>,
}

pub fn reduce(state: &mut ComposerState, shell: &mut ShellStatus, event: UiEvent) {
    match event {
        UiEvent::BackendReady => {
            shell.backend_ready = true;
        }
        UiEvent::SearchFinished { ticket, outcome } => {
            state.finish_search(ticket, outcome);
        }
        UiEvent::GenerationFinished { ticket, outcome } => {
            state.finish_generation(ticket, outcome);
        }
        UiEvent::Error(err) => {
            tracing::warn!(context = ?err.context(), message = err.message(), "ui error");
            if err.is_fatal() {
                shell.backend_ready = false;
                state.cancel_search();
                state.cancel_generation();
            }
            shell.message = Some(err.message().to_string());
        }
    }
}
