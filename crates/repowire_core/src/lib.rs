//! Start-up facilities: field wiring of repositories and environment-driven
//! configuration selection.

pub mod config;
pub mod db;
pub mod logging;
pub mod repo;
pub mod service;
pub mod wire;

pub use config::{
    app_path, resolve_app_path, select_config, select_environment, AppConfig, DatabaseTarget,
    Environment, Settings, APP_ROOT_VAR, ENV_FLAG_VAR,
};
pub use db::{DbError, DbResult, TransactionHandle};
pub use logging::{init_logging, init_logging_from_settings, logging_status};
pub use repo::kv_repo::{KvRepository, RepoError, RepoResult, SqliteKvRepository};
pub use service::settings_service::SettingsService;
pub use wire::{
    wire_field, DeclaredType, FieldRegistry, FieldSlot, FromTransaction, Owner, TypeReflector,
    WireError, WireResult, Wired,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
