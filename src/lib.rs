//! # Work Schedule Bot
//!
//! A Telegram bot for time-and-attendance tracking with a monthly reconciliation engine.
//!
//! ## Features
//! - Clock in and out, with backdating and holiday confirmation
//! - Vacations, sick leave and days off credited as worked time
//! - Monthly schedules generated from the production calendar
//! - Per-user monthly statistics (planned, worked, overtime, deficit) kept current by a
//!   background recompute queue
//! - Persistent storage with SQLite

/// Bot command handlers and message processing
pub mod bot;
/// Configuration management and environment variables
pub mod config;
/// Database models, connections, and migrations
pub mod database;
/// Engine error taxonomy
pub mod error;
/// Attendance engine services and background jobs
pub mod services;
/// Utility functions for datetime, validation, and formatting
pub mod utils;

pub use error::{EngineError, EngineResult, ErrorKind};
