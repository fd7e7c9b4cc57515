//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory
//! (or the path given with `-f`), then applies `EFFECTIVA_DB_PATH`, `PORT`,
//! `EFFECTIVA_LOG_LEVEL` and `DEBUG_MODE` overrides. API keys and messaging
//! tokens are read from the environment only, never from TOML.

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::error::AppError;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Service name reported by `/health`.
    pub name: String,
    /// Socket address the listener binds to.
    pub bind: String,
}

/// Context-window helper defaults.
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Token budget used when a request does not name one.
    pub max_tokens: usize,
    /// Number of trailing messages kept verbatim when history is folded.
    pub keep_last: usize,
}

/// Credentials for external collaborators. Sourced from env vars only.
#[derive(Clone, Default)]
pub struct Secrets {
    pub google_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub prompt_service_api_key: Option<String>,
    pub telegram_bot_token: Option<String>,
    pub discord_bot_token: Option<String>,
    pub whatsapp_token: Option<String>,
}

impl Secrets {
    fn from_env() -> Self {
        Self {
            google_api_key: non_empty_env("GOOGLE_API_KEY"),
            openai_api_key: non_empty_env("OPENAI_API_KEY"),
            prompt_service_api_key: non_empty_env("PROMPT_SERVICE_API_KEY"),
            telegram_bot_token: non_empty_env("TELEGRAM_BOT_TOKEN"),
            discord_bot_token: non_empty_env("DISCORD_BOT_TOKEN"),
            whatsapp_token: non_empty_env("WHATSAPP_TOKEN"),
        }
    }

    /// Which integrations have credentials, by name. Values are never exposed.
    pub fn configured(&self) -> Vec<(&'static str, bool)> {
        vec![
            ("google", self.google_api_key.is_some()),
            ("openai", self.openai_api_key.is_some()),
            ("prompt_service", self.prompt_service_api_key.is_some()),
            ("telegram", self.telegram_bot_token.is_some()),
            ("discord", self.discord_bot_token.is_some()),
            ("whatsapp", self.whatsapp_token.is_some()),
        ]
    }
}

// Keys must never reach logs through a derived Debug.
impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Secrets");
        for (name, present) in self.configured() {
            s.field(name, &if present { "<set>" } else { "<unset>" });
        }
        s.finish()
    }
}

/// Fully-resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    /// SQLite database file (already expanded, no `~`).
    pub db_path: PathBuf,
    pub log_level: String,
    /// `log_level` came from `EFFECTIVA_LOG_LEVEL` rather than the file.
    pub log_level_from_env: bool,
    /// Debug mode forces `debug` logging.
    pub debug: bool,
    pub context: ContextConfig,
    pub secrets: Secrets,
}

impl Config {
    /// Log level after applying the debug flag.
    pub fn effective_log_level(&self) -> &str {
        if self.debug { "debug" } else { &self.log_level }
    }

    /// Whether the effective level should win over `RUST_LOG`.
    pub fn log_level_is_explicit(&self) -> bool {
        self.debug || self.log_level_from_env
    }
}

/// Env-var overrides, collected up front so tests can pass them directly.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub db_path: Option<String>,
    pub port: Option<String>,
    pub log_level: Option<String>,
    pub debug: Option<String>,
}

impl Overrides {
    pub fn from_env() -> Self {
        Self {
            db_path: env::var("EFFECTIVA_DB_PATH").ok(),
            port: env::var("PORT").ok(),
            log_level: env::var("EFFECTIVA_LOG_LEVEL").ok(),
            debug: env::var("DEBUG_MODE").ok(),
        }
    }
}

/// Raw TOML shape, resolved into [`Config`] by [`load_from`].
#[derive(Deserialize)]
struct RawConfig {
    server: RawServer,
    #[serde(default)]
    database: RawDatabase,
    #[serde(default)]
    context: RawContext,
}

#[derive(Deserialize)]
struct RawServer {
    #[serde(default = "default_service_name")]
    name: String,
    #[serde(default = "default_bind")]
    bind: String,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default)]
    debug: bool,
}

#[derive(Deserialize)]
struct RawDatabase {
    #[serde(default = "default_db_path")]
    path: String,
}

impl Default for RawDatabase {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[derive(Deserialize)]
struct RawContext {
    #[serde(default = "default_max_tokens")]
    max_tokens: usize,
    #[serde(default = "default_keep_last")]
    keep_last: usize,
}

impl Default for RawContext {
    fn default() -> Self {
        Self { max_tokens: default_max_tokens(), keep_last: default_keep_last() }
    }
}

fn default_service_name() -> String { "effectiva".to_string() }
fn default_bind() -> String { "127.0.0.1:7777".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_db_path() -> String { "~/.effectiva/effectiva.db".to_string() }
fn default_max_tokens() -> usize { 2048 }
fn default_keep_last() -> usize { 5 }

/// Load config from `path` (default `config/default.toml`), then apply
/// env-var overrides.
pub fn load(path: Option<&str>) -> Result<Config, AppError> {
    let path = Path::new(path.unwrap_or("config/default.toml"));
    load_from(path, &Overrides::from_env())
}

/// Load from an explicit path with the given overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(path: &Path, overrides: &Overrides) -> Result<Config, AppError> {
    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    let s = parsed.server;

    let bind = match overrides.port.as_deref() {
        Some(port) => replace_port(&s.bind, port)?,
        None => s.bind,
    };

    let debug = match overrides.debug.as_deref() {
        Some(v) => v.trim().eq_ignore_ascii_case("true") || v.trim() == "1",
        None => s.debug,
    };

    if parsed.context.keep_last == 0 {
        return Err(AppError::Config("context.keep_last must be > 0".into()));
    }

    Ok(Config {
        server: ServerConfig { name: s.name, bind },
        db_path: expand_home(overrides.db_path.as_deref().unwrap_or(&parsed.database.path)),
        log_level_from_env: overrides.log_level.is_some(),
        log_level: overrides.log_level.clone().unwrap_or(s.log_level),
        debug,
        context: ContextConfig {
            max_tokens: parsed.context.max_tokens,
            keep_last: parsed.context.keep_last,
        },
        secrets: Secrets::from_env(),
    })
}

/// Swap the port of a `host:port` bind address.
fn replace_port(bind: &str, port: &str) -> Result<String, AppError> {
    let port: u16 = port
        .trim()
        .parse()
        .map_err(|_| AppError::Config(format!("PORT must be a number, got '{port}'")))?;
    let host = bind.rsplit_once(':').map_or(bind, |(host, _)| host);
    Ok(format!("{host}:{port}"))
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// `Config` for tests: the given database, no secrets.
    pub fn test_default(db_path: &Path) -> Self {
        Self {
            server: ServerConfig {
                name: "effectiva-test".into(),
                bind: "127.0.0.1:0".into(),
            },
            db_path: db_path.to_path_buf(),
            log_level: "info".into(),
            log_level_from_env: false,
            debug: false,
            context: ContextConfig {
                max_tokens: default_max_tokens(),
                keep_last: default_keep_last(),
            },
            secrets: Secrets::default(),
        }
    }
}
