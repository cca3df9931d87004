mod cli;
mod commands;
mod platform;
mod render;
mod settings;

use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use lens_core::{Msg, UserIdentity};
use lens_engine::{EngineHandle, ReqwestApiClient};
use lens_logging::{lens_info, LogDestination};

use crate::cli::Cli;
use crate::platform::app::App;
use crate::platform::persistence::RonContextStore;
use crate::settings::Settings;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let destination = match &cli.log {
        Some(path) => LogDestination::Both(path.clone()),
        None => LogDestination::Terminal,
    };
    lens_logging::initialize(destination, cli.log_filter());
    lens_info!("lens v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    let api = ReqwestApiClient::new(settings.api_config()).context("building HTTP client")?;
    let engine = EngineHandle::new(Arc::new(api), settings.engine_settings())
        .context("starting engine runtime")?;
    let store = RonContextStore::new(settings.state_dir());

    let mut app = App::new(
        engine,
        Box::new(store),
        settings.timings(),
        cli.command.duplicate_policy(),
    );
    if let Some(email) = cli.email.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        app.dispatch(Msg::SignedIn(UserIdentity {
            email: email.to_string(),
            is_admin: cli.admin,
        }));
    }

    commands::run(&cli.command, &mut app, Duration::from_secs(cli.timeout))
}
