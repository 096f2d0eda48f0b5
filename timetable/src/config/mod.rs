//! Configuration for the `timetable` client.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/timetable/config.toml`)
//! 4. Compiled defaults
//!
//! Missing config file is not an error (defaults are used). An explicit
//! `--config` path that doesn't exist is an error.

use std::path::PathBuf;
use std::time::Duration;

use timetable_proto::Weekday;

use crate::auth::memory::MemoryAuthConfig;
use crate::board::{BoardConfig, DEFAULT_COLLECTION};
use crate::export::command::DEFAULT_PROGRAM;
use crate::export::{ExportOptions, Orientation, PageSize};
use crate::session::{DEFAULT_MIN_PASSWORD_LEN, SessionConfig};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// A value parsed but is out of range.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue {
        /// Dotted key, e.g. `board.default_day`.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    auth: AuthFileConfig,
    store: StoreFileConfig,
    board: BoardFileConfig,
    export: ExportFileConfig,
    ui: UiFileConfig,
}

/// `[auth]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct AuthFileConfig {
    min_password_len: Option<usize>,
    max_failed_attempts: Option<u32>,
}

/// `[store]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StoreFileConfig {
    collection: Option<String>,
}

/// `[board]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BoardFileConfig {
    default_day: Option<String>,
}

/// `[export]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ExportFileConfig {
    renderer_program: Option<String>,
    output_dir: Option<PathBuf>,
    filename: Option<String>,
    margin_in: Option<f64>,
    image_quality: Option<f64>,
    raster_scale: Option<u32>,
    page_size: Option<PageSize>,
    orientation: Option<Orientation>,
}

/// `[ui]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct UiFileConfig {
    poll_timeout_ms: Option<u64>,
    notice_timeout_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Resolved configuration (concrete types, all fields populated)
// ---------------------------------------------------------------------------

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -- Auth --
    /// Minimum sign-up password length, checked before any request.
    pub min_password_len: usize,
    /// Failed sign-ins per email before the in-memory provider locks it.
    pub max_failed_attempts: u32,

    // -- Store --
    /// Top-level collection holding each user's tasks.
    pub collection: String,

    // -- Board --
    /// Day selected after sign-in.
    pub default_day: Weekday,

    // -- Export --
    /// HTML-to-PDF program, a bare name looked up on `PATH` or a path.
    pub renderer_program: String,
    /// Renderer settings.
    pub export: ExportOptions,

    // -- UI --
    /// Poll timeout for the TUI event loop.
    pub poll_timeout: Duration,
    /// How long status bar notices stay up.
    pub notice_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            min_password_len: DEFAULT_MIN_PASSWORD_LEN,
            max_failed_attempts: MemoryAuthConfig::default().max_failed_attempts,
            collection: DEFAULT_COLLECTION.to_string(),
            default_day: Weekday::Monday,
            renderer_program: DEFAULT_PROGRAM.to_string(),
            export: ExportOptions::default(),
            poll_timeout: Duration::from_millis(50),
            notice_timeout: Duration::from_secs(4),
        }
    }
}

impl ClientConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an
    /// error. Otherwise the default path
    /// (`~/.config/timetable/config.toml`) is tried and silently ignored if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the config file cannot be read or parsed,
    /// or a value is out of range.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Resolve a `ClientConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let default_day = match &file.board.default_day {
            Some(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: "board.default_day",
                reason: format!("{e}"),
            })?,
            None => defaults.default_day,
        };

        let image_quality = file
            .export
            .image_quality
            .unwrap_or(defaults.export.image_quality);
        if !(0.0..=1.0).contains(&image_quality) {
            return Err(ConfigError::InvalidValue {
                key: "export.image_quality",
                reason: format!("{image_quality} is outside 0.0..=1.0"),
            });
        }
        let margin_in = file.export.margin_in.unwrap_or(defaults.export.margin_in);
        if margin_in < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "export.margin_in",
                reason: format!("{margin_in} is negative"),
            });
        }

        Ok(Self {
            min_password_len: file
                .auth
                .min_password_len
                .unwrap_or(defaults.min_password_len),
            max_failed_attempts: file
                .auth
                .max_failed_attempts
                .unwrap_or(defaults.max_failed_attempts),
            collection: cli
                .collection
                .clone()
                .or_else(|| file.store.collection.clone())
                .unwrap_or(defaults.collection),
            default_day: cli.day.unwrap_or(default_day),
            renderer_program: cli
                .renderer
                .clone()
                .or_else(|| file.export.renderer_program.clone())
                .unwrap_or(defaults.renderer_program),
            export: ExportOptions {
                margin_in,
                filename: file
                    .export
                    .filename
                    .clone()
                    .unwrap_or(defaults.export.filename),
                output_dir: cli
                    .output_dir
                    .clone()
                    .or_else(|| file.export.output_dir.clone())
                    .unwrap_or(defaults.export.output_dir),
                image_quality,
                raster_scale: file
                    .export
                    .raster_scale
                    .unwrap_or(defaults.export.raster_scale),
                page_size: file.export.page_size.unwrap_or(defaults.export.page_size),
                orientation: file
                    .export
                    .orientation
                    .unwrap_or(defaults.export.orientation),
            },
            poll_timeout: file
                .ui
                .poll_timeout_ms
                .map_or(defaults.poll_timeout, Duration::from_millis),
            notice_timeout: file
                .ui
                .notice_timeout_ms
                .map_or(defaults.notice_timeout, Duration::from_millis),
        })
    }

    /// Session settings.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            min_password_len: self.min_password_len,
        }
    }

    /// Settings for the in-memory auth provider.
    #[must_use]
    pub fn memory_auth_config(&self) -> MemoryAuthConfig {
        MemoryAuthConfig {
            max_failed_attempts: self.max_failed_attempts,
            min_password_len: self.min_password_len,
            ..MemoryAuthConfig::default()
        }
    }

    /// Board settings.
    #[must_use]
    pub fn board_config(&self) -> BoardConfig {
        BoardConfig {
            collection: self.collection.clone(),
            default_day: self.default_day,
            export: self.export.clone(),
        }
    }
}

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Weekly study timetable")]
pub struct CliArgs {
    /// Path to config file (default: `~/.config/timetable/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Store collection holding each user's tasks.
    #[arg(long, env = "TIMETABLE_COLLECTION")]
    pub collection: Option<String>,

    /// Day selected after sign-in (full or three-letter name).
    #[arg(long)]
    pub day: Option<Weekday>,

    /// HTML-to-PDF program used for export.
    #[arg(long, env = "TIMETABLE_RENDERER")]
    pub renderer: Option<String>,

    /// Directory exported files are written to.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TIMETABLE_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/timetable.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file.
///
/// If `explicit_path` is `Some`, the file must exist (error if not).
/// If `explicit_path` is `None`, the default path is tried and missing file
/// is treated as empty config.
fn load_config_file(explicit_path: Option<&std::path::Path>) -> Result<ConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ConfigFile::default());
        };
        config_dir.join("timetable").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
