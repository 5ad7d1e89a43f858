// Application settings
// Loaded from ~/.config/modelsift/settings.toml

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use modelsift_engine::command::{DEFAULT_LOGDIR_PREFIX, DEFAULT_TOOL};
use modelsift_engine::{
    CommandBuilder, KeyScope, NameParserMode, SessionOptions, DEFAULT_MARKER_FILENAME,
};
use serde::{Deserialize, Serialize};

/// Where the monitoring tool serves its UI by default.
pub const DEFAULT_MONITOR_URL: &str = "http://localhost:6006";

#[derive(Debug)]
pub enum ConfigError {
    Read { path: PathBuf, message: String },
    Parse { path: PathBuf, message: String },
    Write { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {}: {message}", path.display()),
            Self::Parse { path, message } => write!(f, "invalid settings in {}: {message}", path.display()),
            Self::Write { path, message } => write!(f, "cannot write {}: {message}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Monitoring command settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandSettings {
    /// Executable placed in front of `--logdir=`
    pub tool: String,

    /// Prepended to every model title to form its log directory
    pub logdir_prefix: String,

    /// Emit each log directory once even if several runs share a title
    pub dedupe_logdirs: bool,

    /// Shown next to the command; not derived from data
    pub monitor_url: String,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            logdir_prefix: DEFAULT_LOGDIR_PREFIX.to_string(),
            dedupe_logdirs: false,
            monitor_url: DEFAULT_MONITOR_URL.to_string(),
        }
    }
}

/// Folder-name parsing settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingSettings {
    /// Reject titles that do not follow the naming convention instead of
    /// keeping them with few or no attributes
    pub strict_titles: bool,

    /// "first": filter keys from the first model only; "union": from all models
    pub key_scope: KeyScope,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// One file with this name marks one model run directory
    pub marker_filename: String,

    pub parsing: ParsingSettings,

    pub command: CommandSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            marker_filename: DEFAULT_MARKER_FILENAME.to_string(),
            parsing: ParsingSettings::default(),
            command: CommandSettings::default(),
        }
    }
}

const DEFAULT_FILE: &str = r#"# modelsift settings

# One file with this name marks one model run directory
marker_filename = "model.ckpt.meta"

[parsing]
# Reject folder names that do not follow <type>-<k>-<v>-...-<x>-<y>
strict_titles = false
# "first" offers the first model's keys as filters, "union" offers every key seen
key_scope = "first"

[command]
tool = "tensorboard"
logdir_prefix = "models/"
# Emit each log directory once even if several runs share a title
dedupe_logdirs = false
monitor_url = "http://localhost:6006"
"#;

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("modelsift")
            .join("settings.toml")
    }

    /// Load settings from the default path; a missing file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&contents).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    pub fn from_toml(input: &str) -> Result<Self, String> {
        toml::from_str(input).map_err(|e| e.to_string())
    }

    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| e.to_string())
    }

    /// Write the commented default file. Refuses to overwrite.
    pub fn write_default_file(path: &Path) -> Result<(), ConfigError> {
        let write_err = |message: String| ConfigError::Write {
            path: path.to_path_buf(),
            message,
        };
        if path.exists() {
            return Err(write_err("file already exists".to_string()));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| write_err(e.to_string()))?;
        }
        fs::write(path, DEFAULT_FILE).map_err(|e| write_err(e.to_string()))
    }

    /// Engine options these settings describe.
    pub fn session_options(&self) -> SessionOptions {
        let command = CommandBuilder::new(self.command.tool.clone())
            .with_prefix(self.command.logdir_prefix.clone())
            .with_dedupe(self.command.dedupe_logdirs);
        SessionOptions {
            marker_filename: self.marker_filename.clone(),
            parser: if self.parsing.strict_titles {
                NameParserMode::Strict
            } else {
                NameParserMode::Lenient
            },
            key_scope: self.parsing.key_scope,
            command,
        }
    }
}
