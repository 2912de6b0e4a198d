use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveTime;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::booking::StrategyKind;
use crate::catalog::CandidateCatalog;
use crate::payload::ServiceTarget;
use crate::schedule::PollSchedule;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub upstream: UpstreamConfig,
    pub monitor: MonitorConfig,
    pub booking: BookingConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub bot_token: SecretString,
    pub api_base_url: String,
    pub admin_chat_id: Option<String>,
}

#[derive(Clone, Debug)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub branch_id: String,
    pub service_id: String,
    pub slot_length: u32,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub accept_invalid_certs: bool,
    pub retry: RetryConfig,
}

#[derive(Clone, Debug)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Clone, Debug)]
pub struct MonitorConfig {
    /// Daily release window, `HH:MM` local time.
    pub window_start: String,
    pub window_end: String,
    pub prewindow_lead_minutes: u32,
    pub release_interval_ms: u64,
    pub prewindow_interval_ms: u64,
    pub default_interval_ms: u64,
    /// Hour of day for the operator heartbeat message.
    pub heartbeat_hour: u8,
}

#[derive(Clone, Debug)]
pub struct BookingConfig {
    pub strategy: StrategyKind,
    /// Operating hours of the service, `HH:MM`.
    pub day_opens: String,
    pub day_closes: String,
    pub granularity_minutes: u32,
    pub priority_center: String,
    pub attempt_timeout_ms: u64,
    /// Public booking page, included in manual-fallback notifications.
    pub booking_page_url: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub health_check_port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub telegram_enabled: Option<bool>,
    pub telegram_bot_token: Option<String>,
    pub telegram_admin_chat_id: Option<String>,
    pub upstream_base_url: Option<String>,
    pub upstream_branch_id: Option<String>,
    pub upstream_service_id: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://slotrace.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            telegram: TelegramConfig {
                enabled: false,
                bot_token: String::new().into(),
                api_base_url: "https://api.telegram.org".to_string(),
                admin_chat_id: None,
            },
            upstream: UpstreamConfig {
                base_url: String::new(),
                branch_id: String::new(),
                service_id: String::new(),
                slot_length: 10,
                connect_timeout_ms: 1_000,
                request_timeout_ms: 3_000,
                accept_invalid_certs: false,
                retry: RetryConfig { max_attempts: 3, base_delay_ms: 500, max_delay_ms: 5_000 },
            },
            monitor: MonitorConfig {
                window_start: "12:00".to_string(),
                window_end: "14:00".to_string(),
                prewindow_lead_minutes: 5,
                release_interval_ms: 300,
                prewindow_interval_ms: 1_000,
                default_interval_ms: 30_000,
                heartbeat_hour: 9,
            },
            booking: BookingConfig {
                strategy: StrategyKind::Http,
                day_opens: "08:00".to_string(),
                day_closes: "14:00".to_string(),
                granularity_minutes: 5,
                priority_center: "10:00".to_string(),
                attempt_timeout_ms: 2_500,
                booking_page_url: None,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                health_check_port: 8080,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl UpstreamConfig {
    pub fn target(&self) -> ServiceTarget {
        ServiceTarget {
            service_id: self.service_id.clone(),
            branch_id: self.branch_id.clone(),
            slot_length: self.slot_length,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl MonitorConfig {
    pub fn schedule(&self) -> Result<PollSchedule, ConfigError> {
        Ok(PollSchedule::new(
            parse_time("monitor.window_start", &self.window_start)?,
            parse_time("monitor.window_end", &self.window_end)?,
            self.prewindow_lead_minutes,
            Duration::from_millis(self.release_interval_ms),
            Duration::from_millis(self.prewindow_interval_ms),
            Duration::from_millis(self.default_interval_ms),
        ))
    }
}

impl BookingConfig {
    pub fn catalog(&self) -> Result<CandidateCatalog, ConfigError> {
        CandidateCatalog::build(
            parse_time("booking.day_opens", &self.day_opens)?,
            parse_time("booking.day_closes", &self.day_closes)?,
            self.granularity_minutes,
            parse_time("booking.priority_center", &self.priority_center)?,
        )
        .map_err(|error| ConfigError::Validation(error.to_string()))
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("slotrace.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(telegram) = patch.telegram {
            if let Some(enabled) = telegram.enabled {
                self.telegram.enabled = enabled;
            }
            if let Some(bot_token_value) = telegram.bot_token {
                self.telegram.bot_token = secret_value(bot_token_value);
            }
            if let Some(api_base_url) = telegram.api_base_url {
                self.telegram.api_base_url = api_base_url;
            }
            if let Some(admin_chat_id) = telegram.admin_chat_id {
                self.telegram.admin_chat_id = Some(admin_chat_id);
            }
        }

        if let Some(upstream) = patch.upstream {
            if let Some(base_url) = upstream.base_url {
                self.upstream.base_url = base_url;
            }
            if let Some(branch_id) = upstream.branch_id {
                self.upstream.branch_id = branch_id;
            }
            if let Some(service_id) = upstream.service_id {
                self.upstream.service_id = service_id;
            }
            if let Some(slot_length) = upstream.slot_length {
                self.upstream.slot_length = slot_length;
            }
            if let Some(connect_timeout_ms) = upstream.connect_timeout_ms {
                self.upstream.connect_timeout_ms = connect_timeout_ms;
            }
            if let Some(request_timeout_ms) = upstream.request_timeout_ms {
                self.upstream.request_timeout_ms = request_timeout_ms;
            }
            if let Some(accept_invalid_certs) = upstream.accept_invalid_certs {
                self.upstream.accept_invalid_certs = accept_invalid_certs;
            }
            if let Some(retry) = upstream.retry {
                if let Some(max_attempts) = retry.max_attempts {
                    self.upstream.retry.max_attempts = max_attempts;
                }
                if let Some(base_delay_ms) = retry.base_delay_ms {
                    self.upstream.retry.base_delay_ms = base_delay_ms;
                }
                if let Some(max_delay_ms) = retry.max_delay_ms {
                    self.upstream.retry.max_delay_ms = max_delay_ms;
                }
            }
        }

        if let Some(monitor) = patch.monitor {
            if let Some(window_start) = monitor.window_start {
                self.monitor.window_start = window_start;
            }
            if let Some(window_end) = monitor.window_end {
                self.monitor.window_end = window_end;
            }
            if let Some(prewindow_lead_minutes) = monitor.prewindow_lead_minutes {
                self.monitor.prewindow_lead_minutes = prewindow_lead_minutes;
            }
            if let Some(release_interval_ms) = monitor.release_interval_ms {
                self.monitor.release_interval_ms = release_interval_ms;
            }
            if let Some(prewindow_interval_ms) = monitor.prewindow_interval_ms {
                self.monitor.prewindow_interval_ms = prewindow_interval_ms;
            }
            if let Some(default_interval_ms) = monitor.default_interval_ms {
                self.monitor.default_interval_ms = default_interval_ms;
            }
            if let Some(heartbeat_hour) = monitor.heartbeat_hour {
                self.monitor.heartbeat_hour = heartbeat_hour;
            }
        }

        if let Some(booking) = patch.booking {
            if let Some(strategy) = booking.strategy {
                self.booking.strategy = strategy;
            }
            if let Some(day_opens) = booking.day_opens {
                self.booking.day_opens = day_opens;
            }
            if let Some(day_closes) = booking.day_closes {
                self.booking.day_closes = day_closes;
            }
            if let Some(granularity_minutes) = booking.granularity_minutes {
                self.booking.granularity_minutes = granularity_minutes;
            }
            if let Some(priority_center) = booking.priority_center {
                self.booking.priority_center = priority_center;
            }
            if let Some(attempt_timeout_ms) = booking.attempt_timeout_ms {
                self.booking.attempt_timeout_ms = attempt_timeout_ms;
            }
            if let Some(booking_page_url) = booking.booking_page_url {
                self.booking.booking_page_url = Some(booking_page_url);
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("SLOTRACE_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("SLOTRACE_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("SLOTRACE_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("SLOTRACE_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("SLOTRACE_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("SLOTRACE_TELEGRAM_ENABLED") {
            self.telegram.enabled = parse_bool("SLOTRACE_TELEGRAM_ENABLED", &value)?;
        }
        if let Some(value) = read_env("SLOTRACE_TELEGRAM_BOT_TOKEN") {
            self.telegram.bot_token = secret_value(value);
        }
        if let Some(value) = read_env("SLOTRACE_TELEGRAM_API_BASE_URL") {
            self.telegram.api_base_url = value;
        }
        if let Some(value) = read_env("SLOTRACE_TELEGRAM_ADMIN_CHAT_ID") {
            self.telegram.admin_chat_id = Some(value);
        }

        if let Some(value) = read_env("SLOTRACE_UPSTREAM_BASE_URL") {
            self.upstream.base_url = value;
        }
        if let Some(value) = read_env("SLOTRACE_UPSTREAM_BRANCH_ID") {
            self.upstream.branch_id = value;
        }
        if let Some(value) = read_env("SLOTRACE_UPSTREAM_SERVICE_ID") {
            self.upstream.service_id = value;
        }
        if let Some(value) = read_env("SLOTRACE_UPSTREAM_SLOT_LENGTH") {
            self.upstream.slot_length = parse_u32("SLOTRACE_UPSTREAM_SLOT_LENGTH", &value)?;
        }
        if let Some(value) = read_env("SLOTRACE_UPSTREAM_REQUEST_TIMEOUT_MS") {
            self.upstream.request_timeout_ms =
                parse_u64("SLOTRACE_UPSTREAM_REQUEST_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = read_env("SLOTRACE_UPSTREAM_ACCEPT_INVALID_CERTS") {
            self.upstream.accept_invalid_certs =
                parse_bool("SLOTRACE_UPSTREAM_ACCEPT_INVALID_CERTS", &value)?;
        }

        if let Some(value) = read_env("SLOTRACE_MONITOR_RELEASE_INTERVAL_MS") {
            self.monitor.release_interval_ms =
                parse_u64("SLOTRACE_MONITOR_RELEASE_INTERVAL_MS", &value)?;
        }
        if let Some(value) = read_env("SLOTRACE_MONITOR_DEFAULT_INTERVAL_MS") {
            self.monitor.default_interval_ms =
                parse_u64("SLOTRACE_MONITOR_DEFAULT_INTERVAL_MS", &value)?;
        }

        if let Some(value) = read_env("SLOTRACE_BOOKING_STRATEGY") {
            self.booking.strategy = value
                .parse()
                .map_err(|message: String| ConfigError::Validation(message))?;
        }
        if let Some(value) = read_env("SLOTRACE_BOOKING_ATTEMPT_TIMEOUT_MS") {
            self.booking.attempt_timeout_ms =
                parse_u64("SLOTRACE_BOOKING_ATTEMPT_TIMEOUT_MS", &value)?;
        }

        if let Some(value) = read_env("SLOTRACE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("SLOTRACE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("SLOTRACE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }
        if let Some(value) = read_env("SLOTRACE_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("SLOTRACE_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level =
            read_env("SLOTRACE_LOGGING_LEVEL").or_else(|| read_env("SLOTRACE_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("SLOTRACE_LOGGING_FORMAT").or_else(|| read_env("SLOTRACE_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(enabled) = overrides.telegram_enabled {
            self.telegram.enabled = enabled;
        }
        if let Some(bot_token) = overrides.telegram_bot_token {
            self.telegram.bot_token = secret_value(bot_token);
        }
        if let Some(admin_chat_id) = overrides.telegram_admin_chat_id {
            self.telegram.admin_chat_id = Some(admin_chat_id);
        }
        if let Some(base_url) = overrides.upstream_base_url {
            self.upstream.base_url = base_url;
        }
        if let Some(branch_id) = overrides.upstream_branch_id {
            self.upstream.branch_id = branch_id;
        }
        if let Some(service_id) = overrides.upstream_service_id {
            self.upstream.service_id = service_id;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_telegram(&self.telegram)?;
        validate_upstream(&self.upstream)?;
        validate_monitor(&self.monitor)?;
        validate_booking(&self.booking)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("slotrace.toml"), PathBuf::from("config/slotrace.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn parse_time(key: &str, value: &str) -> Result<NaiveTime, ConfigError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| {
        ConfigError::Validation(format!("{key} must be a `HH:MM` time, got `{value}`"))
    })
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_telegram(telegram: &TelegramConfig) -> Result<(), ConfigError> {
    if !telegram.enabled {
        return Ok(());
    }

    let token = telegram.bot_token.expose_secret();
    if token.trim().is_empty() {
        return Err(ConfigError::Validation(
            "telegram.bot_token is required when telegram.enabled is true. Get it from @BotFather"
                .to_string(),
        ));
    }
    if !token.contains(':') {
        return Err(ConfigError::Validation(
            "telegram.bot_token does not look like a bot token (expected `<id>:<secret>`)"
                .to_string(),
        ));
    }

    if !telegram.api_base_url.starts_with("http://")
        && !telegram.api_base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "telegram.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_upstream(upstream: &UpstreamConfig) -> Result<(), ConfigError> {
    if !upstream.base_url.starts_with("http://") && !upstream.base_url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "upstream.base_url must start with http:// or https://".to_string(),
        ));
    }
    if upstream.branch_id.trim().is_empty() {
        return Err(ConfigError::Validation("upstream.branch_id is required".to_string()));
    }
    if upstream.service_id.trim().is_empty() {
        return Err(ConfigError::Validation("upstream.service_id is required".to_string()));
    }
    if upstream.slot_length == 0 {
        return Err(ConfigError::Validation(
            "upstream.slot_length must be greater than zero".to_string(),
        ));
    }

    // A slow request is worse than a failed one: the race is over within
    // seconds, so timeouts above 30s are configuration mistakes.
    if upstream.connect_timeout_ms == 0 || upstream.connect_timeout_ms > 30_000 {
        return Err(ConfigError::Validation(
            "upstream.connect_timeout_ms must be in range 1..=30000".to_string(),
        ));
    }
    if upstream.request_timeout_ms == 0 || upstream.request_timeout_ms > 30_000 {
        return Err(ConfigError::Validation(
            "upstream.request_timeout_ms must be in range 1..=30000".to_string(),
        ));
    }

    if upstream.retry.max_attempts == 0 {
        return Err(ConfigError::Validation(
            "upstream.retry.max_attempts must be at least 1".to_string(),
        ));
    }
    if upstream.retry.max_delay_ms < upstream.retry.base_delay_ms {
        return Err(ConfigError::Validation(
            "upstream.retry.max_delay_ms must not be below base_delay_ms".to_string(),
        ));
    }

    Ok(())
}

fn validate_monitor(monitor: &MonitorConfig) -> Result<(), ConfigError> {
    let start = parse_time("monitor.window_start", &monitor.window_start)?;
    let end = parse_time("monitor.window_end", &monitor.window_end)?;
    if start >= end {
        return Err(ConfigError::Validation(
            "monitor.window_start must be before monitor.window_end".to_string(),
        ));
    }

    for (key, value) in [
        ("monitor.release_interval_ms", monitor.release_interval_ms),
        ("monitor.prewindow_interval_ms", monitor.prewindow_interval_ms),
        ("monitor.default_interval_ms", monitor.default_interval_ms),
    ] {
        if value == 0 {
            return Err(ConfigError::Validation(format!("{key} must be greater than zero")));
        }
    }

    if monitor.heartbeat_hour > 23 {
        return Err(ConfigError::Validation(
            "monitor.heartbeat_hour must be in range 0..=23".to_string(),
        ));
    }

    Ok(())
}

fn validate_booking(booking: &BookingConfig) -> Result<(), ConfigError> {
    // Parses hours, granularity, and center together.
    booking.catalog()?;

    if booking.attempt_timeout_ms == 0 || booking.attempt_timeout_ms > 30_000 {
        return Err(ConfigError::Validation(
            "booking.attempt_timeout_ms must be in range 1..=30000".to_string(),
        ));
    }

    if let Some(url) = &booking.booking_page_url {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "booking.booking_page_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.health_check_port == 0 {
        return Err(ConfigError::Validation(
            "server.health_check_port must be greater than zero".to_string(),
        ));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    telegram: Option<TelegramPatch>,
    upstream: Option<UpstreamPatch>,
    monitor: Option<MonitorPatch>,
    booking: Option<BookingPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct TelegramPatch {
    enabled: Option<bool>,
    bot_token: Option<String>,
    api_base_url: Option<String>,
    admin_chat_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct UpstreamPatch {
    base_url: Option<String>,
    branch_id: Option<String>,
    service_id: Option<String>,
    slot_length: Option<u32>,
    connect_timeout_ms: Option<u64>,
    request_timeout_ms: Option<u64>,
    accept_invalid_certs: Option<bool>,
    retry: Option<RetryPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RetryPatch {
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct MonitorPatch {
    window_start: Option<String>,
    window_end: Option<String>,
    prewindow_lead_minutes: Option<u32>,
    release_interval_ms: Option<u64>,
    prewindow_interval_ms: Option<u64>,
    default_interval_ms: Option<u64>,
    heartbeat_hour: Option<u8>,
}

#[derive(Debug, Default, Deserialize)]
struct BookingPatch {
    strategy: Option<StrategyKind>,
    day_opens: Option<String>,
    day_closes: Option<String>,
    granularity_minutes: Option<u32>,
    priority_center: Option<String>,
    attempt_timeout_ms: Option<u64>,
    booking_page_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    health_check_port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
