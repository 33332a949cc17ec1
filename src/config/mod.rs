pub mod cli;
#[cfg(feature = "cli")]
pub mod commands;
pub mod toml_config;

use crate::core::calendar::BookingRules;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use std::collections::HashMap;
use toml_config::{LogFormat, TomlConfig};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_STATE_DIR: &str = "./.pawcare";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// Effective configuration: defaults, then the TOML file, then command line / env.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_base_url: String,
    pub state_dir: String,
    pub timeout_seconds: u64,
    pub headers: HashMap<String, String>,
    pub booking: BookingRules,
    pub log_level: Option<String>,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            state_dir: DEFAULT_STATE_DIR.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            headers: HashMap::new(),
            booking: BookingRules::default(),
            log_level: None,
            log_format: LogFormat::Compact,
        }
    }
}

impl From<TomlConfig> for Settings {
    fn from(config: TomlConfig) -> Self {
        let defaults = Settings::default();
        Self {
            api_base_url: config.api.base_url.unwrap_or(defaults.api_base_url),
            state_dir: config.storage.state_dir.unwrap_or(defaults.state_dir),
            timeout_seconds: config
                .api
                .timeout_seconds
                .unwrap_or(defaults.timeout_seconds),
            headers: config.api.headers,
            booking: config.booking,
            log_level: config.logging.level,
            log_format: config.logging.format,
        }
    }
}

impl Settings {
    /// Loads the TOML file when one is given, otherwise starts from defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        match config_path {
            Some(path) => {
                tracing::debug!("Loading configuration from {}", path);
                Ok(TomlConfig::from_file(path)?.into())
            }
            None => Ok(Settings::default()),
        }
    }

    pub fn with_overrides(
        mut self,
        api_base_url: Option<String>,
        state_dir: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Self {
        if let Some(url) = api_base_url {
            self.api_base_url = url;
        }
        if let Some(dir) = state_dir {
            self.state_dir = dir;
        }
        if let Some(timeout) = timeout_seconds {
            self.timeout_seconds = timeout;
        }
        self
    }
}

impl ConfigProvider for Settings {
    fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    fn state_dir(&self) -> &str {
        &self.state_dir
    }

    fn request_timeout_secs(&self) -> u64 {
        self.timeout_seconds
    }

    fn extra_headers(&self) -> &HashMap<String, String> {
        &self.headers
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        validation::validate_url("api.base_url", &self.api_base_url)?;
        validation::validate_path("storage.state_dir", &self.state_dir)?;
        validation::validate_positive_number("api.timeout_seconds", self.timeout_seconds, 1)?;

        let booking = &self.booking;
        validation::validate_range("booking.window_days", booking.window_days, 1, 3650)?;
        validation::validate_range("booking.opening_hour", booking.opening_hour, 0, 23)?;
        validation::validate_range("booking.closing_hour", booking.closing_hour, 1, 24)?;
        if booking.opening_hour >= booking.closing_hour {
            return Err(crate::utils::error::PawcareError::ConfigValidationError {
                field: "booking.closing_hour".to_string(),
                message: "closing hour must be after opening hour".to_string(),
            });
        }
        validation::validate_range("booking.slot_minutes", booking.slot_minutes, 5, 240)?;
        validation::validate_non_negative("booking.doctor_fee", booking.doctor_fee)?;
        validation::validate_non_negative("booking.caretaker_fee", booking.caretaker_fee)?;
        validation::validate_non_empty_string("booking.currency", &booking.currency)?;
        Ok(())
    }
}

#[cfg(feature = "cli")]
pub use cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use super::commands::Command;
    use super::Settings;
    use crate::utils::error::Result;
    use clap::Parser;

    #[derive(Debug, Clone, Parser)]
    #[command(name = "pawcare")]
    #[command(about = "Book and manage pet-care services from the terminal")]
    pub struct CliConfig {
        /// Base URL of the booking API
        #[arg(long, global = true, env = "PAWCARE_API_URL")]
        pub api_base_url: Option<String>,

        /// Where the session and reservation draft are kept
        #[arg(long, global = true, env = "PAWCARE_STATE_DIR")]
        pub state_dir: Option<String>,

        /// Path to a TOML configuration file
        #[arg(short, long, global = true, env = "PAWCARE_CONFIG")]
        pub config: Option<String>,

        /// Request timeout in seconds
        #[arg(long, global = true)]
        pub timeout: Option<u64>,

        /// Enable verbose output
        #[arg(short, long, global = true)]
        pub verbose: bool,

        #[command(subcommand)]
        pub command: Command,
    }

    impl CliConfig {
        pub fn resolve(&self) -> Result<Settings> {
            Ok(Settings::load(self.config.as_deref())?.with_overrides(
                self.api_base_url.clone(),
                self.state_dir.clone(),
                self.timeout,
            ))
        }
    }
}
