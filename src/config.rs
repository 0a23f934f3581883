use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConfigError;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
pub const SERVER_URL_ENV: &str = "CHARGE_PROCESSOR_URL";

/// On-disk TOML layout. Every field is optional so a partial file only
/// overrides what it names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub server_url: Option<String>,
    pub progress: Option<ProgressFile>,
    pub window: Option<WindowFile>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgressFile {
    pub mode: Option<ProgressMode>,
    pub initial_percent: Option<u8>,
    pub step_percent: Option<u8>,
    pub ceiling_percent: Option<u8>,
    pub interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WindowFile {
    pub width: Option<f32>,
    pub height: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// Timer-driven approximation.
    #[default]
    Cosmetic,
    /// Bytes handed to the request body.
    Transfer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSettings {
    pub mode: ProgressMode,
    pub initial_percent: u8,
    pub step_percent: u8,
    /// Automatic advancement stays strictly below this value.
    pub ceiling_percent: u8,
    pub interval: Duration,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            mode: ProgressMode::Cosmetic,
            initial_percent: 10,
            step_percent: 5,
            ceiling_percent: 90,
            interval: Duration::from_millis(500),
        }
    }
}

/// Resolved settings used by the application.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub server_url: String,
    pub progress: ProgressSettings,
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            progress: ProgressSettings::default(),
            window_size: [720.0, 760.0],
        }
    }
}

impl AppConfig {
    /// Cascade `./.charge-processor.toml` over the platform config file, then
    /// apply `CHARGE_PROCESSOR_URL`. Unreadable files are logged and skipped.
    pub fn load() -> Self {
        let platform = config_path().and_then(|p| load_logged(&p));
        let cwd = load_logged(Path::new(".charge-processor.toml"));

        let file = match (platform, cwd) {
            (None, None) => ConfigFile::default(),
            (Some(p), None) => p,
            (None, Some(c)) => c,
            (Some(p), Some(c)) => merge(p, c),
        };

        let mut config = Self::from_file(file);
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            match validate_server_url(&url) {
                Ok(url) => config.server_url = url,
                Err(e) => warn!("ignoring {}: {}", SERVER_URL_ENV, e),
            }
        }
        config
    }

    pub fn from_file(file: ConfigFile) -> Self {
        let defaults = Self::default();

        let server_url = match file.server_url.as_deref().map(validate_server_url) {
            Some(Ok(url)) => url,
            Some(Err(e)) => {
                warn!("{}; using {}", e, defaults.server_url);
                defaults.server_url
            }
            None => defaults.server_url,
        };

        let p = file.progress.unwrap_or_default();
        let d = defaults.progress;
        let progress = ProgressSettings {
            mode: p.mode.unwrap_or(d.mode),
            initial_percent: p.initial_percent.unwrap_or(d.initial_percent).min(100),
            step_percent: p.step_percent.unwrap_or(d.step_percent),
            ceiling_percent: p.ceiling_percent.unwrap_or(d.ceiling_percent).min(100),
            interval: p
                .interval_ms
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis)
                .unwrap_or(d.interval),
        };

        let w = file.window.unwrap_or_default();
        let window_size = [
            w.width.unwrap_or(defaults.window_size[0]),
            w.height.unwrap_or(defaults.window_size[1]),
        ];

        Self {
            server_url,
            progress,
            window_size,
        }
    }
}

/// `<config_dir>/charge-processor/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("charge-processor").join("config.toml"))
}

pub fn load_from_path(path: &Path) -> Result<ConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

fn load_logged(path: &Path) -> Option<ConfigFile> {
    if !path.exists() {
        return None;
    }
    match load_from_path(path) {
        Ok(file) => {
            debug!("loaded config from {}", path.display());
            Some(file)
        }
        Err(e) => {
            warn!("skipping {}: {}", path.display(), e);
            None
        }
    }
}

/// `overlay` values win over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let bp = base.progress.unwrap_or_default();
    let op = overlay.progress.unwrap_or_default();
    let bw = base.window.unwrap_or_default();
    let ow = overlay.window.unwrap_or_default();

    ConfigFile {
        server_url: overlay.server_url.or(base.server_url),
        progress: Some(ProgressFile {
            mode: op.mode.or(bp.mode),
            initial_percent: op.initial_percent.or(bp.initial_percent),
            step_percent: op.step_percent.or(bp.step_percent),
            ceiling_percent: op.ceiling_percent.or(bp.ceiling_percent),
            interval_ms: op.interval_ms.or(bp.interval_ms),
        }),
        window: Some(WindowFile {
            width: ow.width.or(bw.width),
            height: ow.height.or(bw.height),
        }),
    }
}

/// Trailing slashes are dropped so endpoint paths can be appended directly.
pub fn validate_server_url(url: &str) -> Result<String, ConfigError> {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Err(ConfigError::InvalidServerUrl(url.to_string()))
    }
}
