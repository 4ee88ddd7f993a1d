//! Runtime bridge between UI command queue and backend event intake.

use std::{thread, time::Duration};

use client_core::{request_generation, request_search, HttpBackend};
use crossbeam_channel::{Receiver, Sender};
use tokio::task::JoinHandle;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub server_url: String,
    pub search_timeout: Duration,
    pub generation_timeout: Duration,
}

/// Spawns the backend worker thread. Every request runs as its own task so
/// a newer request or a cancel command can abort the one in flight.
pub fn launch(
    config: BackendConfig,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    repaint: egui::Context,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!("failed to build backend runtime: {err}");
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("Не удалось запустить фоновый обработчик: {err}"),
                )));
                repaint.request_repaint();
                return;
            }
        };

        let backend = match HttpBackend::new(&config.server_url) {
            Ok(backend) => backend,
            Err(err) => {
                tracing::error!(server_url = %config.server_url, "invalid server url: {err:#}");
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("Неверный адрес сервера: {err:#}"),
                )));
                repaint.request_repaint();
                return;
            }
        };
        tracing::info!(server_url = %backend.server_url(), "backend worker ready");
        let _ = ui_tx.try_send(UiEvent::BackendReady);

        let mut search_task: Option<JoinHandle<()>> = None;
        let mut generation_task: Option<JoinHandle<()>> = None;
        while let Ok(cmd) = cmd_rx.recv() {
            match cmd {
                BackendCommand::Search { ticket, request } => {
                    abort(&mut search_task);
                    let backend = backend.clone();
                    let ui_tx = ui_tx.clone();
                    let repaint = repaint.clone();
                    let limit = config.search_timeout;
                    search_task = Some(runtime.spawn(async move {
                        let outcome = request_search(&backend, &request, limit).await;
                        let _ = ui_tx.try_send(UiEvent::SearchFinished { ticket, outcome });
                        repaint.request_repaint();
                    }));
                }
                BackendCommand::Generate { ticket, request } => {
                    abort(&mut generation_task);
                    let backend = backend.clone();
                    let ui_tx = ui_tx.clone();
                    let repaint = repaint.clone();
                    let limit = config.generation_timeout;
                    generation_task = Some(runtime.spawn(async move {
                        let outcome = request_generation(&backend, &request, limit).await;
                        let _ = ui_tx.try_send(UiEvent::GenerationFinished { ticket, outcome });
                        repaint.request_repaint();
                    }));
                }
                BackendCommand::CancelSearch => abort(&mut search_task),
                BackendCommand::CancelGeneration => abort(&mut generation_task),
            }
        }
        tracing::info!("ui command queue closed, backend worker exiting");
    });
}

fn abort(task: &mut Option<JoinHandle<()>>) {
    if let Some(task) = task.take() {
        if !task.is_finished() {
            tracing::debug!("aborting in-flight request");
            task.abort();
        }
    }
}
