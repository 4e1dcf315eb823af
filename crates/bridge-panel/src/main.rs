use std::sync::Arc;

use anyhow::Context;
use bridge_panel::cli::{Args, Command};
use bridge_panel::config::{load_panel_config_or_default, resolve_settings, SettingsOverrides};
use bridge_panel::logging::init_tracing;
use bridge_panel::render::render_panel;
use bridge_panel::transport::HttpTransport;
use bridge_panel::{PanelController, PanelError};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let _log_guard = init_tracing(args.log_dir.as_deref(), args.log_to_stderr)?;

    let overrides = SettingsOverrides {
        base_url: args.base_url.clone(),
        service: args.service.clone(),
    };
    let config = load_panel_config_or_default(&args.config, &overrides)?;
    let settings = resolve_settings(config, &overrides)
        .with_context(|| format!("invalid config {}", args.config.display()))?;
    info!(
        base_url = %settings.base_url,
        service = %settings.options.service,
        "bridge panel starting"
    );

    let transport = HttpTransport::new(&settings.base_url, settings.connect_timeout)
        .context("failed to build http client")?;
    let panel = PanelController::new(
        settings.options.clone(),
        Arc::new(transport),
        settings.credentials.provider(),
    )?;

    let mounted = panel.mount().await;
    print_panel(&panel);
    mounted.context("panel failed to load")?;

    match args.command {
        Command::Status => Ok(()),
        Command::Action { name } => {
            if !panel.available_actions().contains(&name) {
                tracing::warn!(action = %name, "action is not offered in the current state");
            }
            finish(&panel, panel.dispatch(name).await)
        }
        Command::Build { profile } => {
            if !panel.can_build() {
                tracing::warn!(profile = %profile, "build is not offered in the current state");
            }
            finish(&panel, panel.request_build(profile).await)
        }
        Command::Watch { interval } => watch(&panel, interval).await,
    }
}

fn print_panel(panel: &PanelController) {
    println!("{}", render_panel(&panel.state(), panel.service()));
}

fn finish(panel: &PanelController, result: Result<(), PanelError>) -> anyhow::Result<()> {
    println!();
    print_panel(panel);
    result.map_err(anyhow::Error::from)
}

async fn watch(panel: &PanelController, interval: std::time::Duration) -> anyhow::Result<()> {
    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown(shutdown.clone()));
    panel
        .watch(interval, shutdown, |state| {
            println!();
            println!("{}", render_panel(state, panel.service()));
        })
        .await;
    panel.teardown();
    Ok(())
}

async fn wait_for_shutdown(shutdown: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
    shutdown.cancel();
}
