mod chat;
mod common;
mod config;
mod error;
mod network;
mod store;
mod ui;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use network::{ApiClient, ApiWorker, SocketIoTransport};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use ui::DevConnectApp;

use crate::chat::ConversationViewModel;
use crate::common::ApiCommand;
use crate::config::AppConfig;
use crate::store::AppStore;

#[derive(Parser)]
#[command(
    name = "devconnect",
    version,
    about = "DevConnect desktop client with real-time chat"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Override the backend base URL
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Write the effective configuration to the config file and exit
    SaveConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env();
    if let Some(api_url) = cli.api_url {
        app_config.api_url = api_url;
    }

    if cli.mode == Some(Mode::SaveConfig) {
        config::save_config(&cli.config, &app_config)?;
        log::info!("Saved configuration to {}", cli.config);
        return Ok(());
    }

    run_client(app_config).await?;
    Ok(())
}

async fn run_client(app_config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let api = Arc::new(ApiClient::new(&app_config.api_url)?);
    let transport = Arc::new(SocketIoTransport::new(&app_config.socket_endpoint()));
    log::info!(
        "Using API {} and chat socket {}",
        app_config.api_url,
        transport.url()
    );

    // UI -> API worker
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // API worker -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    tokio::spawn(ApiWorker::new(api.clone(), event_tx, cmd_rx).run());

    // restore an existing session cookie, if any
    if let Err(err) = cmd_tx.send(ApiCommand::LoadProfile).await {
        log::warn!("Failed to request profile: {err}");
    }

    let chat = ConversationViewModel::new(api, transport, Handle::current());
    let store = AppStore::new();

    let options = eframe::NativeOptions::default();

    eframe::run_native(
        "DevConnect",
        options,
        Box::new(move |cc| {
            Ok(Box::new(DevConnectApp::new(
                cc, store, chat, cmd_tx, event_rx,
            )))
        }),
    )?;
    Ok(())
}
