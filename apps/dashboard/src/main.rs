use std::{path::PathBuf, sync::Arc, thread};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use reactions::{dashboard_initial_state, dashboard_reactions, MissingWalletConnector, WalletConnector};
use store_core::Store;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod controller;
mod demo_wallet;

use controller::{events::UiEvent, orchestration, render};
use demo_wallet::DemoWalletConnector;

#[derive(Parser, Debug)]
#[command(about = "Headless host for the bundle dashboard store")]
struct Args {
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Overrides the configured tracing filter.
    #[arg(long)]
    log_filter: Option<String>,
    /// Use a simulated wallet instead of reporting none.
    #[arg(long)]
    demo_wallet: bool,
    /// After startup, bundle the first short and long tokens.
    #[arg(long)]
    bundle: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = config::load_settings(&args.config)?;
    if let Some(filter) = args.log_filter {
        settings.log_filter = filter;
    }

    let filter = EnvFilter::try_new(&settings.log_filter)
        .with_context(|| format!("invalid log filter '{}'", settings.log_filter))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let wallet_connector: Arc<dyn WalletConnector> = if args.demo_wallet {
        Arc::new(DemoWalletConnector::new(settings.wallet_connect_delay() / 2))
    } else {
        Arc::new(MissingWalletConnector)
    };

    let store = Store::new(dashboard_initial_state()?);
    store.use_reactions(dashboard_reactions(
        &settings.reaction_settings(),
        wallet_connector,
    ));

    let (ui_tx, ui_rx) = crossbeam_channel::unbounded();
    let listener_tx = ui_tx.clone();
    store.subscribe(move || {
        // The render loop only stops after Shutdown, which is sent last.
        let _ = listener_tx.send(UiEvent::StateChanged);
    });
    let render_store = store.clone();
    let renderer = thread::Builder::new()
        .name("dashboard-render".into())
        .spawn(move || render::run_render_loop(render_store, ui_rx))
        .context("failed to start render thread")?;

    let outcome = run(&store, &settings, args.bundle).await;

    let _ = ui_tx.send(UiEvent::Shutdown);
    let frames = renderer
        .join()
        .map_err(|_| anyhow!("render thread panicked"))?;
    outcome?;

    info!(frames, "dashboard session finished");
    println!("{}", serde_json::to_string_pretty(&store.get_state().to_value())?);
    Ok(())
}

async fn run(store: &Store, settings: &config::Settings, bundle: bool) -> Result<()> {
    orchestration::run_startup(store, settings).await?;
    if bundle {
        orchestration::run_bundling_demo(store).await?;
    }
    Ok(())
}
