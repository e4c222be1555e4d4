use tracing::{debug, error, info, warn};

use crate::error::{EngineError, ErrorKind};

/// Logs command start with consistent format
pub fn log_command_start(command: &str, user: &str, chat_id: i64, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_START: {} by {} in chat {} - {}", command, user, chat_id, d),
        None => info!("CMD_START: {} by {} in chat {}", command, user, chat_id),
    }
}

/// Logs command completion with consistent format
pub fn log_command_success(command: &str, user: &str, chat_id: i64, details: Option<&str>) {
    match details {
        Some(d) => info!("CMD_SUCCESS: {} by {} in chat {} - {}", command, user, chat_id, d),
        None => info!("CMD_SUCCESS: {} by {} in chat {}", command, user, chat_id),
    }
}

/// Logs an engine failure. Storage failures are errors; everything else is the caller's
/// business and only warrants a warning.
pub fn log_command_error(command: &str, user: &str, chat_id: i64, err: &EngineError) {
    match err.kind() {
        ErrorKind::Storage => error!(
            "CMD_ERROR: {} by {} in chat {} - {}",
            command, user, chat_id, err
        ),
        kind => warn!(
            "CMD_ERROR: {} by {} in chat {} - {:?}: {}",
            command, user, chat_id, kind, err
        ),
    }
}

/// Logs argument parsing failures with consistent format
pub fn log_validation_error(command: &str, value: &str, error: &str, user: &str, chat_id: i64) {
    warn!(
        "VALIDATION_ERROR: {} - '{}' invalid: {} - user {} in chat {}",
        command, value, error, user, chat_id
    );
}

/// Logs database operations with consistent format
pub fn log_database_operation(operation: &str, table: &str, details: Option<&str>) {
    match details {
        Some(d) => debug!("DB_OP: {} on {} - {}", operation, table, d),
        None => debug!("DB_OP: {} on {}", operation, table),
    }
}

/// Logs system events with consistent format
pub fn log_system_event(event: &str, details: Option<&str>) {
    match details {
        Some(d) => info!("SYSTEM: {} - {}", event, d),
        None => info!("SYSTEM: {}", event),
    }
}
