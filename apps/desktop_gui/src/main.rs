use std::time::Duration;

mod backend_bridge;
mod controller;
mod ui;

use backend_bridge::{commands::BackendCommand, runtime::BackendConfig};
use clap::Parser;
use client_core::{DEFAULT_GENERATION_TIMEOUT, DEFAULT_SEARCH_TIMEOUT, DEFAULT_SERVER_URL};
use controller::events::UiEvent;
use crossbeam_channel::bounded;
use eframe::egui;
use tracing_subscriber::EnvFilter;
use ui::ComposerApp;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "AUTOCONSPECT_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,
    #[arg(long, default_value_t = DEFAULT_SEARCH_TIMEOUT.as_secs())]
    search_timeout_secs: u64,
    #[arg(long, default_value_t = DEFAULT_GENERATION_TIMEOUT.as_secs())]
    generation_timeout_secs: u64,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();
    let config = BackendConfig {
        server_url: args.server_url,
        search_timeout: Duration::from_secs(args.search_timeout_secs),
        generation_timeout: Duration::from_secs(args.generation_timeout_secs),
    };

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(64);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(256);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("AutoConspect")
            .with_inner_size([960.0, 820.0])
            .with_min_inner_size([640.0, 520.0]),
        ..Default::default()
    };
    eframe::run_native(
        "AutoConspect",
        options,
        Box::new(move |cc| {
            backend_bridge::runtime::launch(config, cmd_rx, ui_tx, cc.egui_ctx.clone());
            Ok(Box::new(ComposerApp::new(cmd_tx, ui_rx)))
        }),
    )
}
