//! CLI smoke entry point.
//!
//! # Responsibility
//! - Select settings from `APP_ENV` once per process.
//! - Exercise logging, database bootstrap and field wiring end to end.
//! - Keep output deterministic for quick local sanity checks.

use log::info;
use once_cell::sync::OnceCell;
use repowire_core::db::open_target;
use repowire_core::{init_logging_from_settings, Settings, SettingsService, TransactionHandle};
use std::error::Error;
use std::process::ExitCode;

static SETTINGS: OnceCell<Settings> = OnceCell::new();

fn settings() -> std::io::Result<&'static Settings> {
    SETTINGS.get_or_try_init(Settings::from_process_env)
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("repowire error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let settings = settings()?;
    println!("repowire_core version={}", repowire_core::core_version());
    println!("env={}", settings.env);
    println!("environment={}", settings.config.environment.as_str());
    println!("app_path={}", settings.app_path.display());

    init_logging_from_settings(settings)?;

    let conn = open_target(settings.config.database, &settings.app_path)?;
    let service = SettingsService::new(Some(TransactionHandle::begin(conn)?))?;
    service.set("last_env", &settings.env)?;
    let stored = service.get_or("last_env", "unknown")?;
    service.commit()?;

    info!("event=cli_smoke module=cli status=ok env={}", settings.env);
    println!("wired_store=ok last_env={stored}");
    Ok(())
}
