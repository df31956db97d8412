// Client configuration loaded from `config/wattpad.toml`.
//
// Every key is optional; a missing file or section falls back to the
// library defaults. `defaults/wattpad.toml` seeds `config/` on first run.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use crate::constants::{
    DEFAULT_CACHE_DIR, DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, DEFAULT_USER_AGENT,
};

pub const CONFIG_FILE_NAME: &str = "wattpad.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no client config at {path}")]
    FileNotFound { path: PathBuf },

    #[error("invalid TOML in {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("bad value for `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("could not seed config from defaults ({path}): {source}")]
    DefaultsCopyError {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ---------------------------------------------------------------------------
// Assembled config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    pub enabled: bool,
    pub directory: PathBuf,
    /// `None` keeps entries forever.
    pub max_age: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            cache: CacheConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            enabled: true,
            directory: default_cache_dir(),
            max_age: None,
        }
    }
}

/// Platform cache directory (e.g. `~/.cache/wattpad-client`), or the
/// relative `DEFAULT_CACHE_DIR` when the platform has none.
pub fn default_cache_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "wattpad", "wattpad-client")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR))
}

// ---------------------------------------------------------------------------
// wattpad.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    client: ClientSection,
    http: HttpSection,
    cache: CacheSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ClientSection {
    user_agent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct HttpSection {
    connect_timeout_secs: Option<u64>,
    read_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct CacheSection {
    enabled: Option<bool>,
    directory: Option<PathBuf>,
    max_age_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Parse configuration text. `path` is only used in error messages.
pub fn parse_config(text: &str, path: &Path) -> Result<ClientConfig, ConfigError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })?;

    validate(&file)?;

    let defaults = ClientConfig::default();
    Ok(ClientConfig {
        user_agent: file.client.user_agent.unwrap_or(defaults.user_agent),
        connect_timeout: file
            .http
            .connect_timeout_secs
            .map_or(defaults.connect_timeout, Duration::from_secs),
        read_timeout: file
            .http
            .read_timeout_secs
            .map_or(defaults.read_timeout, Duration::from_secs),
        cache: CacheConfig {
            enabled: file.cache.enabled.unwrap_or(defaults.cache.enabled),
            directory: file.cache.directory.unwrap_or(defaults.cache.directory),
            max_age: file.cache.max_age_secs.map(Duration::from_secs),
        },
    })
}

/// Load an explicitly named config file; it must exist.
pub fn load_config_file(path: &Path) -> Result<ClientConfig, ConfigError> {
    let text = read_file(path)?;
    parse_config(&text, path)
}

/// Load `config/wattpad.toml` under `base_dir`, falling back to defaults
/// when the file does not exist.
pub fn load_config_from(base_dir: &Path) -> Result<ClientConfig, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(ClientConfig::default());
    }
    load_config_file(&path)
}

/// Seed `config/` from `defaults/`, copying every file that is not there yet.
/// Existing config files are never overwritten and `.example` files are
/// skipped. Returns the paths written.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.is_dir() {
        return Ok(vec![]);
    }
    std::fs::create_dir_all(&config_dir).map_err(|e| seed_error(&config_dir, e))?;

    let mut seeded = Vec::new();
    for entry in std::fs::read_dir(&defaults_dir).map_err(|e| seed_error(&defaults_dir, e))? {
        let source = entry.map_err(|e| seed_error(&defaults_dir, e))?.path();
        let Some(file_name) = source.file_name().filter(|_| source.is_file()) else {
            continue;
        };
        if file_name.to_string_lossy().ends_with(".example") {
            continue;
        }

        let target = config_dir.join(file_name);
        if seed_file(&source, &target)? {
            info!(path = %target.display(), "seeded config file from defaults");
            seeded.push(target);
        }
    }
    Ok(seeded)
}

/// Copy `source` to `target` unless `target` already exists.
fn seed_file(source: &Path, target: &Path) -> Result<bool, ConfigError> {
    let mut dest = match std::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
    {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => return Ok(false),
        Err(e) => return Err(seed_error(target, e)),
    };
    let content = std::fs::read(source).map_err(|e| seed_error(source, e))?;
    dest.write_all(&content).map_err(|e| seed_error(target, e))?;
    Ok(true)
}

fn seed_error(path: &Path, source: std::io::Error) -> ConfigError {
    ConfigError::DefaultsCopyError {
        path: path.to_path_buf(),
        source,
    }
}

/// Load relative to the current working directory, seeding `config/` from
/// `defaults/` first.
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(file: &ConfigFile) -> Result<(), ConfigError> {
    if let Some(ua) = &file.client.user_agent {
        if ua.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "client.user_agent".into(),
                message: "must not be empty".into(),
            });
        }
    }

    let positive: &[(&str, Option<u64>)] = &[
        ("http.connect_timeout_secs", file.http.connect_timeout_secs),
        ("http.read_timeout_secs", file.http.read_timeout_secs),
        ("cache.max_age_secs", file.cache.max_age_secs),
    ];
    for (name, val) in positive {
        if *val == Some(0) {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    if let Some(dir) = &file.cache.directory {
        if dir.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "cache.directory".into(),
                message: "must not be empty".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
