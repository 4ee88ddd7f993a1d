//! Command orchestration helpers from UI actions to backend command queue.

use std::time::Instant;

use client_core::{ComposerState, ValidationPrompt};
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext};
use crate::controller::reducer::ShellStatus;

/// Queues a command for the backend worker. When the queue refuses it the
/// returned error is meant for the status line; the caller must release
/// whatever request it had started.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), UiError> {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => Err(UiError::from_message(
            UiErrorContext::Dispatch,
            "Очередь запросов переполнена, повторите попытку",
        )),
        Err(TrySendError::Disconnected(_)) => Err(UiError::from_message(
            UiErrorContext::Dispatch,
            "Фоновый обработчик запросов недоступен, перезапустите приложение",
        )),
    }
}

/// Starts a search and hands it to the worker. A refused dispatch releases
/// the search again and lands on the status line.
pub fn submit_search(
    state: &mut ComposerState,
    shell: &mut ShellStatus,
    cmd_tx: &Sender<BackendCommand>,
) -> Result<(), ValidationPrompt> {
    let (ticket, request) = state.begin_search()?;
    if let Err(err) = dispatch_backend_command(cmd_tx, BackendCommand::Search { ticket, request }) {
        state.cancel_search();
        shell.message = Some(err.message().to_string());
    }
    Ok(())
}

pub fn submit_generation(
    state: &mut ComposerState,
    shell: &mut ShellStatus,
    cmd_tx: &Sender<BackendCommand>,
    now: Instant,
) -> Result<(), ValidationPrompt> {
    let (ticket, request) = state.begin_generation(now)?;
    if let Err(err) =
        dispatch_backend_command(cmd_tx, BackendCommand::Generate { ticket, request })
    {
        state.cancel_generation();
        shell.message = Some(err.message().to_string());
    }
    Ok(())
}

pub fn abort_search(
    state: &mut ComposerState,
    shell: &mut ShellStatus,
    cmd_tx: &Sender<BackendCommand>,
) {
    if !state.cancel_search() {
        return;
    }
    if let Err(err) = dispatch_backend_command(cmd_tx, BackendCommand::CancelSearch) {
        shell.message = Some(err.message().to_string());
    }
}

/// Clear also drops a search still in flight, so the worker is told to
/// abort it.
pub fn clear_composer(
    state: &mut ComposerState,
    shell: &mut ShellStatus,
    cmd_tx: &Sender<BackendCommand>,
) {
    abort_search(state, shell, cmd_tx);
    state.clear();
}

pub fn abort_generation(
    state: &mut ComposerState,
    shell: &mut ShellStatus,
    cmd_tx: &Sender<BackendCommand>,
) {
    if !state.cancel_generation() {
        return;
    }
    if let Err(err) = dispatch_backend_command(cmd_tx, BackendCommand::CancelGeneration) {
        shell.message = Some(err.message().to_string());
    }
}
