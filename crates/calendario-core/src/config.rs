use anyhow::{Context, Result};
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Calendar behaviour
    #[serde(default)]
    pub calendar: CalendarConfig,

    /// UI preferences
    #[serde(default)]
    pub ui: UiConfig,
}

/// First day of the week shown in the month grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Sunday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
}

impl WeekStart {
    pub fn to_weekday(self) -> Weekday {
        match self {
            WeekStart::Sunday => Weekday::Sun,
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Tuesday => Weekday::Tue,
            WeekStart::Wednesday => Weekday::Wed,
            WeekStart::Thursday => Weekday::Thu,
            WeekStart::Friday => Weekday::Fri,
            WeekStart::Saturday => Weekday::Sat,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarConfig {
    /// First weekday of the grid
    #[serde(default)]
    pub week_start: WeekStart,

    /// Days fetched before and after the month to cover adjacent-month cells
    #[serde(default = "default_fetch_buffer_days")]
    pub fetch_buffer_days: u32,

    /// IANA time zone name; empty or absent means the system zone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,

    /// Host-side timeout for a single fetch, 0 disables it
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

fn default_fetch_buffer_days() -> u32 {
    7
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            week_start: WeekStart::default(),
            fetch_buffer_days: default_fetch_buffer_days(),
            time_zone: None,
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl CalendarConfig {
    /// The configured zone name, ignoring blank values
    pub fn time_zone_name(&self) -> Option<&str> {
        self.time_zone
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// User closed the "No calendar access" banner
    #[serde(default)]
    pub dismissed_access_warning: bool,

    /// Start with the session (registration itself is done by the host)
    #[serde(default)]
    pub launch_at_login: bool,

    /// URL scheme used to open the native calendar app at a date
    #[serde(default = "default_calendar_url_scheme")]
    pub calendar_url_scheme: String,
}

fn default_calendar_url_scheme() -> String {
    "ical".to_string()
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dismissed_access_warning: false,
            launch_at_login: false,
            calendar_url_scheme: default_calendar_url_scheme(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("calendario");

        Self {
            config_dir,
            calendar: CalendarConfig::default(),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, creating default if it doesn't exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let mut config = Self::default();
            if let Some(parent) = config_path.parent() {
                config.config_dir = parent.to_path_buf();
            }
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        if self.calendar.fetch_buffer_days == 0 {
            result.add_warning(
                "calendar.fetch_buffer_days",
                "No buffer days: cells from adjacent months will show no events",
            );
        } else if self.calendar.fetch_buffer_days > 31 {
            result.add_warning(
                "calendar.fetch_buffer_days",
                "Buffer is larger than a month; fetches will be slow",
            );
        }

        if let Some(name) = self.calendar.time_zone_name() {
            if name.parse::<chrono_tz::Tz>().is_err() {
                result.add_error(
                    "calendar.time_zone",
                    format!("Unknown IANA time zone: {}", name),
                );
            }
        }

        if self.calendar.fetch_timeout_secs > 300 {
            result.add_warning(
                "calendar.fetch_timeout_secs",
                "Fetch timeout is more than 5 minutes",
            );
        }

        let scheme = self.ui.calendar_url_scheme.trim();
        if scheme.is_empty() {
            result.add_error("ui.calendar_url_scheme", "URL scheme cannot be empty");
        } else if !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        {
            result.add_error(
                "ui.calendar_url_scheme",
                format!("Invalid URL scheme: {}", scheme),
            );
        }

        result
    }

    /// Save configuration to its default location
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("calendario");

        Ok(config_dir.join("config.toml"))
    }
}
