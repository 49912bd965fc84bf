// Persistent settings for the server.
//
// Config file: `$XDG_CONFIG_HOME/quip-mcp/config.yaml`, falling back to
// `~/.config/quip-mcp/config.yaml`, then `./.quip-mcp-config.yaml`.

use quip_client::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable holding the API token.
pub const TOKEN_ENV: &str = "QUIP_API_TOKEN";
/// Environment variable overriding the API base URL.
pub const BASE_URL_ENV: &str = "QUIP_API_URL";
/// Environment variable overriding the request timeout.
pub const TIMEOUT_ENV: &str = "QUIP_TIMEOUT_SECS";
/// Shortest token accepted by setup.
pub const MIN_TOKEN_LEN: usize = 10;
/// Where users obtain a personal access token.
pub const TOKEN_URL: &str = "https://quip.com/dev/token";

const APP_DIR: &str = "quip-mcp";
const FILE_NAME: &str = "config.yaml";
const FALLBACK_FILE_NAME: &str = ".quip-mcp-config.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error in {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("config serialize error: {0}")]
    Serialize(#[from] serde_yaml::Error),

    #[error("no API token configured: set QUIP_API_TOKEN or run with --setup")]
    MissingToken,

    #[error("invalid API token: {0}")]
    InvalidToken(String),

    #[error("invalid {name}: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// Server settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Personal access token.
    pub quip_api_token: Option<String>,

    /// API base URL; the production API when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings from `path`, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut settings = Self::load_from(path)?;
        settings.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(settings)
    }

    /// Load settings from `path` only. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No config file at {}", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents).map_err(|reason| ConfigError::Parse {
            path: path.to_path_buf(),
            reason,
        })
    }

    /// Parse YAML, falling back to JSON.
    fn parse(contents: &str) -> Result<Self, String> {
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        match serde_yaml::from_str(contents) {
            Ok(settings) => Ok(settings),
            Err(yaml) => serde_json::from_str(contents)
                .map_err(|json| format!("not YAML ({}) nor JSON ({})", yaml, json)),
        }
    }

    /// Apply environment overrides. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(token) = lookup(TOKEN_ENV) {
            self.quip_api_token = Some(token.trim().to_string());
        }
        if let Some(url) = lookup(BASE_URL_ENV) {
            self.base_url = Some(url.trim().to_string());
        }
        if let Some(timeout) = lookup(TIMEOUT_ENV) {
            let secs = timeout
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue {
                    name: TIMEOUT_ENV,
                    reason: e.to_string(),
                })?;
            self.timeout_secs = Some(secs);
        }
        Ok(())
    }

    /// Save to `path` with owner-only permissions, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_yaml::to_string(self)?;
        std::fs::write(path, contents)?;
        restrict_permissions(path)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// The configured token, if non-blank.
    pub fn token(&self) -> Option<&str> {
        self.quip_api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    /// Whether a plausible token is configured.
    pub fn has_valid_token(&self) -> bool {
        self.token().is_some_and(|token| validate_token(token).is_ok())
    }

    /// Effective base URL.
    pub fn base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL)
    }

    /// Effective timeout in seconds.
    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    /// Build a client configuration.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let token = self.token().ok_or(ConfigError::MissingToken)?;
        Ok(ClientConfig::new(token)
            .with_base_url(self.base_url())
            .with_timeout_secs(self.timeout_secs()))
    }
}

/// Default config file location for this environment.
pub fn default_config_path() -> PathBuf {
    resolve_config_path(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        dirs::home_dir(),
    )
}

/// Resolve the config file location from an XDG config dir and a home dir.
pub fn resolve_config_path(xdg_config_home: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = xdg_config_home.filter(|d| !d.as_os_str().is_empty()) {
        return dir.join(APP_DIR).join(FILE_NAME);
    }
    if let Some(home) = home {
        return home.join(".config").join(APP_DIR).join(FILE_NAME);
    }
    PathBuf::from(FALLBACK_FILE_NAME)
}

/// Check that a token looks usable.
pub fn validate_token(token: &str) -> Result<(), ConfigError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ConfigError::InvalidToken("token is empty".to_string()));
    }
    if token.chars().count() < MIN_TOKEN_LEN {
        return Err(ConfigError::InvalidToken(format!(
            "token is too short (minimum {} characters)",
            MIN_TOKEN_LEN
        )));
    }
    Ok(())
}

/// Mask a token for display: first and last four characters only.
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}

/// Interactive setup: prompt for a token on `output`, obtain it from
/// `read_token`, validate and save it to `path`. Other settings in the file
/// are kept.
///
/// The token is never written to `output`; the binary passes a reader that
/// suppresses echo when stdin is a terminal.
pub fn setup_interactive<F, W>(path: &Path, read_token: F, mut output: W) -> Result<Settings, ConfigError>
where
    F: FnOnce() -> std::io::Result<String>,
    W: Write,
{
    writeln!(output, "Quip MCP Server Setup")?;
    writeln!(output, "=====================")?;
    writeln!(output)?;
    writeln!(output, "Get a personal access token at {}", TOKEN_URL)?;
    write!(output, "Enter your Quip API token: ")?;
    output.flush()?;

    let line = read_token()?;
    let token = line.trim();
    validate_token(token)?;

    let mut settings = Settings::load_from(path)?;
    settings.quip_api_token = Some(token.to_string());
    settings.save_to(path)?;

    writeln!(output)?;
    writeln!(output, "Configuration saved to {}", path.display())?;
    Ok(settings)
}

/// Read one line of token input from a non-terminal source such as a pipe.
pub fn read_token_line<R: BufRead>(mut input: R) -> std::io::Result<String> {
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
