// Configuration loading

pub mod settings;

pub use settings::{CommandSettings, ConfigError, ParsingSettings, Settings};
