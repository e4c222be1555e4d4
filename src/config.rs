use anyhow::{anyhow, Result};
use std::env;
use std::str::FromStr;

use crate::services::EngineSettings;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/worktime.db";
pub const DEFAULT_CALENDAR_PATH: &str = "./calendar/weekends_2026.json";
pub const DEFAULT_SWEEP_CRON: &str = "0 0 3 * * *";

#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_bot_token: String,
    pub database_url: String,
    pub http_port: u16,
    pub base_admin_chat_id: Option<i64>,
    pub calendar_path: String,
    pub platform_epoch_year: i32,
    pub default_minutes_per_day: i64,
    pub recompute_sweep_cron: String,
}

impl Config {
    /// Reads the configuration from the environment, after loading `.env` if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let token = env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| anyhow!("TELEGRAM_BOT_TOKEN must be set"))?;

        if token.trim().is_empty() {
            return Err(anyhow!("TELEGRAM_BOT_TOKEN must be set"));
        }

        let default_minutes_per_day: i64 = parse_var("DEFAULT_MINUTES_PER_DAY", 520)?;
        if !(1..=1440).contains(&default_minutes_per_day) {
            return Err(anyhow!("Invalid DEFAULT_MINUTES_PER_DAY: must be between 1 and 1440"));
        }

        let platform_epoch_year: i32 = parse_var("PLATFORM_EPOCH_YEAR", 2026)?;
        if !(2000..=2100).contains(&platform_epoch_year) {
            return Err(anyhow!("Invalid PLATFORM_EPOCH_YEAR: must be between 2000 and 2100"));
        }

        let base_admin_chat_id = match non_empty_var("BASE_ADMIN_CHAT_ID") {
            Some(raw) => Some(
                raw.parse()
                    .map_err(|_| anyhow!("Invalid BASE_ADMIN_CHAT_ID"))?,
            ),
            None => None,
        };

        Ok(Config {
            telegram_bot_token: token,
            database_url: database_url_from_env(),
            http_port: parse_var("HTTP_PORT", 3000)?,
            base_admin_chat_id,
            calendar_path: non_empty_var("CALENDAR_PATH")
                .unwrap_or_else(|| DEFAULT_CALENDAR_PATH.to_string()),
            platform_epoch_year,
            default_minutes_per_day,
            recompute_sweep_cron: non_empty_var("RECOMPUTE_SWEEP_CRON")
                .unwrap_or_else(|| DEFAULT_SWEEP_CRON.to_string()),
        })
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            epoch_year: self.platform_epoch_year,
            default_minutes_per_day: self.default_minutes_per_day,
            ..EngineSettings::default()
        }
    }
}

/// `DATABASE_URL` or the default; needs no bot token, so tooling can use it alone.
pub fn database_url_from_env() -> String {
    non_empty_var("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T> {
    match non_empty_var(name) {
        Some(raw) => raw.parse().map_err(|_| anyhow!("Invalid {}", name)),
        None => Ok(default),
    }
}
