//! Rollcall configuration system.
//!
//! Values come from `~/.rollcall/config.toml` (or an explicit path), then
//! `BOT_TOKEN`, `CHAT_ID`, `PORT` and `WEBHOOK_URL` from the environment or a
//! `.env` file override the file.

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Result, RollcallError};

/// Load `.env` from the working directory (silently ignored if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollcallConfig {
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
}

impl RollcallConfig {
    /// Load config from the default path, falling back to defaults.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RollcallError::Config(format!("Failed to read config: {e}")))?;
        Self::parse(&content)
    }

    /// Parse config from TOML text.
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RollcallError::Config(format!("Failed to parse config: {e}")))
    }

    /// Save config to a path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| RollcallError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Apply process environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup (environment in production).
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get("BOT_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = get("CHAT_ID") {
            self.telegram.chat_id = chat_id;
        }
        if let Some(url) = get("WEBHOOK_URL") {
            self.telegram.webhook_url = url;
            self.telegram.mode = TransportMode::Webhook;
        }
        if let Some(port) = get("PORT") {
            match port.parse() {
                Ok(p) => self.gateway.port = p,
                Err(_) => tracing::warn!("Ignoring invalid PORT value '{port}'"),
            }
        }
    }

    /// Check the settings the bot cannot run without.
    pub fn validate(&self) -> Result<()> {
        if self.telegram.bot_token.trim().is_empty() {
            return Err(RollcallError::Config(
                "telegram.bot_token is empty (set BOT_TOKEN)".into(),
            ));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(RollcallError::Config(
                "telegram.chat_id is empty (set CHAT_ID)".into(),
            ));
        }
        if self.telegram.mode == TransportMode::Webhook && self.telegram.webhook_url.is_empty() {
            return Err(RollcallError::Config(
                "webhook mode requires telegram.webhook_url".into(),
            ));
        }
        self.schedule.zone()?;
        if self.schedule.open_poll.is_empty() || self.schedule.reminder.is_empty() {
            return Err(RollcallError::Config(
                "schedule.open_poll and schedule.reminder need at least one entry".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Rollcall home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".rollcall")
    }
}

/// How updates arrive from Telegram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportMode {
    #[default]
    Polling,
    Webhook,
}

/// Telegram bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Group chat the poll is posted to.
    #[serde(default)]
    pub chat_id: String,
    #[serde(default)]
    pub mode: TransportMode,
    /// Seconds between long-polling requests.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,
    /// Public base URL for webhook mode (e.g. https://bot.example.com).
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
    /// Sent to Telegram on setWebhook and checked on every delivery.
    #[serde(default)]
    pub webhook_secret: String,
}

fn default_poll_interval() -> u64 { 1 }
fn default_webhook_path() -> String { "/webhook".into() }

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_id: String::new(),
            mode: TransportMode::default(),
            poll_interval: default_poll_interval(),
            webhook_url: String::new(),
            webhook_path: default_webhook_path(),
            webhook_secret: String::new(),
        }
    }
}

/// Trigger times. Cron fields are read as wall-clock time in `timezone`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// IANA zone name, e.g. "Europe/Chisinau".
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default = "default_open_poll")]
    pub open_poll: Vec<String>,
    #[serde(default = "default_reminder")]
    pub reminder: Vec<String>,
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
    /// Missed triggers older than this are skipped instead of fired late.
    #[serde(default = "default_misfire_grace")]
    pub misfire_grace_secs: u64,
}

fn default_timezone() -> String { "Europe/Chisinau".into() }
fn default_open_poll() -> Vec<String> { vec!["0 18 * * 6".into(), "59 23 * * 6".into()] }
fn default_reminder() -> Vec<String> { vec!["0 8 * * 0".into()] }
fn default_check_interval() -> u64 { 30 }
fn default_misfire_grace() -> u64 { 3600 }

impl ScheduleConfig {
    /// Resolve `timezone` against the tz database.
    pub fn zone(&self) -> Result<Tz> {
        self.timezone.trim().parse::<Tz>().map_err(|e| {
            RollcallError::Config(format!("Unknown schedule.timezone '{}': {e}", self.timezone))
        })
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            open_poll: default_open_poll(),
            reminder: default_reminder(),
            check_interval_secs: default_check_interval(),
            misfire_grace_secs: default_misfire_grace(),
        }
    }
}

/// Poll wording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_question")]
    pub question: String,
    #[serde(default = "default_affirmative")]
    pub affirmative: String,
    #[serde(default = "default_negative")]
    pub negative: String,
    /// Follow-up nudge posted after the poll. Empty disables it.
    #[serde(default = "default_announce")]
    pub announce: String,
}

fn default_question() -> String { "Will you be at the meeting tomorrow?".into() }
fn default_affirmative() -> String { "Yes".into() }
fn default_negative() -> String { "No".into() }
fn default_announce() -> String { "@all Please answer the poll above 🙏".into() }

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            question: default_question(),
            affirmative: default_affirmative(),
            negative: default_negative(),
            announce: default_announce(),
        }
    }
}

/// Reminder wording and roster sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_header")]
    pub header: String,
    #[serde(default = "default_confirmed_label")]
    pub confirmed_label: String,
    #[serde(default = "default_unanswered_label")]
    pub unanswered_label: String,
    /// Used when nobody confirmed and everyone gets mentioned.
    #[serde(default = "default_escalation_label")]
    pub escalation_label: String,
    /// Add the chat administrators to the roster at report time.
    #[serde(default = "bool_true")]
    pub include_admins: bool,
}

fn bool_true() -> bool { true }
fn default_header() -> String { "⛪ Good morning!".into() }
fn default_confirmed_label() -> String { "✅ Planning to come:".into() }
fn default_unanswered_label() -> String { "❗ Haven't answered:".into() }
fn default_escalation_label() -> String { "📣 Nobody has confirmed yet:".into() }

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            header: default_header(),
            confirmed_label: default_confirmed_label(),
            unanswered_label: default_unanswered_label(),
            escalation_label: default_escalation_label(),
            include_admins: true,
        }
    }
}

/// Where state files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String { "~/.rollcall".into() }

impl StorageConfig {
    /// Data directory with `~` expanded.
    pub fn resolved_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.data_dir).to_string())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// HTTP gateway (health + webhook).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "bool_true")]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 8000 }

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_host(),
            port: default_port(),
        }
    }
}
