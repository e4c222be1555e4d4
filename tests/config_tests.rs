#![allow(clippy::unwrap_used)]

use std::env;
use std::sync::Mutex;
use work_schedule_bot::config::Config;

// Config tests share process-wide environment variables and must not interleave
static CONFIG_TEST_MUTEX: Mutex<()> = Mutex::new(());

const VARS: [&str; 8] = [
    "TELEGRAM_BOT_TOKEN",
    "DATABASE_URL",
    "HTTP_PORT",
    "BASE_ADMIN_CHAT_ID",
    "CALENDAR_PATH",
    "PLATFORM_EPOCH_YEAR",
    "DEFAULT_MINUTES_PER_DAY",
    "RECOMPUTE_SWEEP_CRON",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_config_from_env_with_all_vars() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    env::set_var("TELEGRAM_BOT_TOKEN", "test_token_123");
    env::set_var("DATABASE_URL", "sqlite:test.db");
    env::set_var("HTTP_PORT", "8080");
    env::set_var("BASE_ADMIN_CHAT_ID", "123456789");
    env::set_var("CALENDAR_PATH", "/etc/worktime/weekends.json");
    env::set_var("PLATFORM_EPOCH_YEAR", "2027");
    env::set_var("DEFAULT_MINUTES_PER_DAY", "480");
    env::set_var("RECOMPUTE_SWEEP_CRON", "0 */10 * * * *");

    let config = Config::from_env().unwrap();

    assert_eq!(config.telegram_bot_token, "test_token_123");
    assert_eq!(config.database_url, "sqlite:test.db");
    assert_eq!(config.http_port, 8080);
    assert_eq!(config.base_admin_chat_id, Some(123456789));
    assert_eq!(config.calendar_path, "/etc/worktime/weekends.json");
    assert_eq!(config.platform_epoch_year, 2027);
    assert_eq!(config.default_minutes_per_day, 480);
    assert_eq!(config.recompute_sweep_cron, "0 */10 * * * *");

    let settings = config.engine_settings();
    assert_eq!(settings.epoch_year, 2027);
    assert_eq!(settings.default_minutes_per_day, 480);
    assert_eq!(settings.backdate_warning_hours, 24);

    clear_env();
}

#[test]
fn test_config_from_env_with_defaults() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    env::set_var("TELEGRAM_BOT_TOKEN", "required_token");

    let config = Config::from_env().unwrap();

    assert_eq!(config.telegram_bot_token, "required_token");
    assert_eq!(config.database_url, "sqlite:./data/worktime.db");
    assert_eq!(config.http_port, 3000);
    assert_eq!(config.base_admin_chat_id, None);
    assert_eq!(config.calendar_path, "./calendar/weekends_2026.json");
    assert_eq!(config.platform_epoch_year, 2026);
    assert_eq!(config.default_minutes_per_day, 520);
    assert_eq!(config.recompute_sweep_cron, "0 0 3 * * *");

    clear_env();
}

#[test]
fn test_config_missing_required_token() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    let error_msg = Config::from_env().unwrap_err().to_string();
    assert!(error_msg.contains("TELEGRAM_BOT_TOKEN must be set"));

    env::set_var("TELEGRAM_BOT_TOKEN", "   ");
    assert!(Config::from_env().is_err());

    clear_env();
}

#[test]
fn test_config_invalid_numbers() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();
    env::set_var("TELEGRAM_BOT_TOKEN", "test_token");

    env::set_var("HTTP_PORT", "invalid_port");
    let error_msg = Config::from_env().unwrap_err().to_string();
    assert!(error_msg.contains("Invalid HTTP_PORT"));
    env::remove_var("HTTP_PORT");

    env::set_var("HTTP_PORT", "-1");
    assert!(Config::from_env().is_err());
    env::remove_var("HTTP_PORT");

    env::set_var("BASE_ADMIN_CHAT_ID", "admin");
    let error_msg = Config::from_env().unwrap_err().to_string();
    assert!(error_msg.contains("Invalid BASE_ADMIN_CHAT_ID"));
    env::remove_var("BASE_ADMIN_CHAT_ID");

    env::set_var("DEFAULT_MINUTES_PER_DAY", "1441");
    let error_msg = Config::from_env().unwrap_err().to_string();
    assert!(error_msg.contains("Invalid DEFAULT_MINUTES_PER_DAY"));
    env::set_var("DEFAULT_MINUTES_PER_DAY", "0");
    assert!(Config::from_env().is_err());
    env::remove_var("DEFAULT_MINUTES_PER_DAY");

    env::set_var("PLATFORM_EPOCH_YEAR", "1999");
    let error_msg = Config::from_env().unwrap_err().to_string();
    assert!(error_msg.contains("Invalid PLATFORM_EPOCH_YEAR"));

    clear_env();
}

#[test]
fn test_config_port_edge_cases() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();
    env::set_var("TELEGRAM_BOT_TOKEN", "test_token");

    env::set_var("HTTP_PORT", "0");
    assert_eq!(Config::from_env().unwrap().http_port, 0);

    env::set_var("HTTP_PORT", "65535");
    assert_eq!(Config::from_env().unwrap().http_port, 65535);

    env::set_var("HTTP_PORT", "65536");
    assert!(Config::from_env().is_err());

    clear_env();
}

#[test]
fn test_config_blank_values_fall_back_to_defaults() {
    let _guard = CONFIG_TEST_MUTEX.lock().unwrap();
    clear_env();

    env::set_var("TELEGRAM_BOT_TOKEN", "valid_token");
    env::set_var("DATABASE_URL", "");
    env::set_var("BASE_ADMIN_CHAT_ID", "  ");
    env::set_var("HTTP_PORT", "  3001  ");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database_url, "sqlite:./data/worktime.db");
    assert_eq!(config.base_admin_chat_id, None);
    assert_eq!(config.http_port, 3001);

    clear_env();
}
