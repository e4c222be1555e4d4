#![allow(dead_code, clippy::unwrap_used)]

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::Arc;
use tempfile::{tempdir, TempDir};
use work_schedule_bot::database::connection::DatabaseManager;
use work_schedule_bot::database::models::User;
use work_schedule_bot::services::user::AdminGrant;
use work_schedule_bot::services::{EngineSettings, Services};
use work_schedule_bot::utils::datetime::FixedClock;

pub struct TestEnv {
    pub db: Arc<DatabaseManager>,
    pub services: Services,
    _temp_dir: TempDir,
}

pub async fn setup_test_db() -> Result<(Arc<DatabaseManager>, TempDir)> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db_manager = DatabaseManager::new(&database_url).await?;
    db_manager.run_migrations().await?;

    Ok((Arc::new(db_manager), temp_dir))
}

/// Fresh database with every service wired to a clock pinned at `now` and a running
/// recompute worker.
pub async fn setup_services(now: NaiveDateTime) -> Result<TestEnv> {
    let (db, temp_dir) = setup_test_db().await?;
    let (services, worker) = Services::new(
        db.clone(),
        EngineSettings::default(),
        Arc::new(FixedClock(now)),
    );
    worker.spawn();

    Ok(TestEnv {
        db,
        services,
        _temp_dir: temp_dir,
    })
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> NaiveDateTime {
    date(year, month, day).and_hms_opt(hour, minute, 0).unwrap()
}

pub async fn register(services: &Services, chat_id: i64, first_name: &str) -> Result<User> {
    Ok(services
        .users
        .register(chat_id, None, first_name, None)
        .await?)
}

/// Loads `dates` as the non-working day snapshot.
pub async fn load_calendar(services: &Services, dates: &[NaiveDate]) -> Result<u64> {
    Ok(services
        .calendar
        .load_snapshot(&AdminGrant::system(), dates)
        .await?)
}
