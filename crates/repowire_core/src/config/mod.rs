//! Environment-driven configuration selection.
//!
//! # Responsibility
//! - Define the static `development`, `test` and `production` bundles.
//! - Select one bundle from a single environment flag.
//! - Expose the application root path next to the selection.
//!
//! # Invariants
//! - Selection is a pure function of the flag; callers own any caching.
//! - Only the exact flags `test` and `production` leave the default bundle.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

/// Process environment variable holding the environment flag.
pub const ENV_FLAG_VAR: &str = "APP_ENV";
/// Process environment variable overriding the application root.
pub const APP_ROOT_VAR: &str = "APP_ROOT";

const TEST_FLAG: &str = "test";
const PRODUCTION_FLAG: &str = "production";
const DEFAULT_ENV_NAME: &str = "development";

/// Deployment environment a bundle belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Development => DEFAULT_ENV_NAME,
            Self::Test => TEST_FLAG,
            Self::Production => PRODUCTION_FLAG,
        }
    }
}

/// Where the application database lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "path")]
pub enum DatabaseTarget {
    /// Private in-memory database, discarded on close.
    InMemory,
    /// File path relative to the application root.
    File(&'static str),
}

impl DatabaseTarget {
    /// Resolves the target against `root`. `None` for in-memory targets.
    pub fn resolve(self, root: &Path) -> Option<PathBuf> {
        match self {
            Self::InMemory => None,
            Self::File(relative) => Some(root.join(relative)),
        }
    }
}

/// One static configuration bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    pub environment: Environment,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: &'static str,
    pub database: DatabaseTarget,
    pub debug: bool,
}

pub static DEVELOPMENT: AppConfig = AppConfig {
    environment: Environment::Development,
    log_level: "debug",
    database: DatabaseTarget::File("data/development.sqlite3"),
    debug: true,
};

pub static TEST: AppConfig = AppConfig {
    environment: Environment::Test,
    log_level: "warn",
    database: DatabaseTarget::InMemory,
    debug: true,
};

pub static PRODUCTION: AppConfig = AppConfig {
    environment: Environment::Production,
    log_level: "info",
    database: DatabaseTarget::File("data/production.sqlite3"),
    debug: false,
};

/// Maps the environment flag to an environment.
///
/// `"test"` and `"production"` select their environments; an unset flag or
/// any other value falls back to `Development`.
pub fn select_environment(flag: Option<&str>) -> Environment {
    match flag {
        Some(TEST_FLAG) => Environment::Test,
        Some(PRODUCTION_FLAG) => Environment::Production,
        _ => Environment::Development,
    }
}

/// Returns the static bundle for the environment flag.
pub fn select_config(flag: Option<&str>) -> &'static AppConfig {
    config_for(select_environment(flag))
}

pub fn config_for(environment: Environment) -> &'static AppConfig {
    match environment {
        Environment::Development => &DEVELOPMENT,
        Environment::Test => &TEST,
        Environment::Production => &PRODUCTION,
    }
}

/// Application root directory.
///
/// `APP_ROOT` wins when set; otherwise the directory holding the running
/// executable. Resolved at run time, so a deployed binary roots its data and
/// logs next to itself.
pub fn app_path() -> io::Result<PathBuf> {
    let root_override = std::env::var_os(APP_ROOT_VAR);
    resolve_app_path(root_override.as_deref().map(Path::new))
}

/// Resolves the application root from an optional explicit override.
///
/// # Errors
/// - The override is relative.
/// - The executable path cannot be determined or has no parent.
pub fn resolve_app_path(root_override: Option<&Path>) -> io::Result<PathBuf> {
    if let Some(root) = root_override.filter(|root| !root.as_os_str().is_empty()) {
        if !root.is_absolute() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{APP_ROOT_VAR} must be an absolute path, got `{}`", root.display()),
            ));
        }
        return Ok(root.to_path_buf());
    }

    let exe = std::env::current_exe()?;
    exe.parent().map(Path::to_path_buf).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("executable `{}` has no parent directory", exe.display()),
        )
    })
}

/// Selected configuration together with its environment name and root path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    /// Raw environment name; `"development"` when the flag is unset or empty.
    pub env: String,
    pub config: &'static AppConfig,
    pub app_path: PathBuf,
}

impl Settings {
    /// Selects from `flag` with an already resolved root.
    pub fn new(flag: Option<&str>, app_path: PathBuf) -> Self {
        let env = flag
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_ENV_NAME)
            .to_string();
        Self {
            env,
            config: select_config(flag),
            app_path,
        }
    }

    /// Selects from `flag`, rooted at `app_path()`.
    pub fn from_flag(flag: Option<&str>) -> io::Result<Self> {
        Ok(Self::new(flag, app_path()?))
    }

    /// Reads `APP_ENV` (and `APP_ROOT`) from the process environment.
    pub fn from_process_env() -> io::Result<Self> {
        let flag = std::env::var(ENV_FLAG_VAR).ok();
        Self::from_flag(flag.as_deref())
    }

    /// Absolute database path for file targets, `None` for in-memory ones.
    pub fn database_path(&self) -> Option<PathBuf> {
        self.config.database.resolve(&self.app_path)
    }
}
