#![allow(clippy::unwrap_used)]

mod common;

use anyhow::Result;
use common::{at, date, load_calendar, setup_services};
use tempfile::tempdir;
use work_schedule_bot::services::user::AdminGrant;
use work_schedule_bot::{EngineError, ErrorKind};

const BUNDLED_FEED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/calendar/weekends_2026.json");

#[tokio::test]
async fn test_bundled_feed_drives_the_year() -> Result<()> {
    let env = setup_services(at(2026, 1, 12, 10, 0)).await?;
    let grant = AdminGrant::system();

    let stored = env.services.calendar.load_from_feed(&grant, BUNDLED_FEED).await?;
    assert_eq!(stored, 118);
    assert_eq!(env.services.calendar.snapshot_size().await?, 118);

    assert!(env.services.calendar.is_non_working_day(date(2026, 1, 1)).await?);
    assert!(!env.services.calendar.is_non_working_day(date(2026, 1, 12)).await?);
    // Shortened pre-holiday days are working days
    assert!(!env.services.calendar.is_non_working_day(date(2026, 4, 30)).await?);

    let january = env
        .services
        .calendar
        .non_working_days_in_month_list(2026, 1)
        .await?;
    assert_eq!(january.len(), 16);
    assert_eq!(january[0], date(2026, 1, 1));
    assert_eq!(env.services.calendar.non_working_days_in_month(2026, 1).await?, 16);

    let report = env.services.schedules.generate_for_year(&grant, 2026, 520).await?;
    let work_days: i64 = report.schedules.iter().map(|s| s.work_days).sum();
    assert_eq!(work_days, 247);

    Ok(())
}

#[tokio::test]
async fn test_snapshot_is_replaced() -> Result<()> {
    let env = setup_services(at(2026, 1, 12, 10, 0)).await?;

    load_calendar(&env.services, &[date(2026, 3, 8), date(2026, 3, 9)]).await?;
    let stored = load_calendar(&env.services, &[date(2026, 3, 9), date(2026, 3, 10)]).await?;
    assert_eq!(stored, 2);

    assert!(!env.services.calendar.is_non_working_day(date(2026, 3, 8)).await?);
    assert!(env.services.calendar.is_non_working_day(date(2026, 3, 9)).await?);
    assert!(env.services.calendar.is_non_working_day(date(2026, 3, 10)).await?);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_dates_are_stored_once() -> Result<()> {
    let env = setup_services(at(2026, 1, 12, 10, 0)).await?;

    let stored = load_calendar(
        &env.services,
        &[date(2026, 5, 1), date(2026, 5, 1), date(2026, 5, 9)],
    )
    .await?;
    assert_eq!(stored, 2);
    assert_eq!(env.services.calendar.snapshot_size().await?, 2);

    Ok(())
}

#[tokio::test]
async fn test_malformed_feed_keeps_snapshot() -> Result<()> {
    let env = setup_services(at(2026, 1, 12, 10, 0)).await?;
    let grant = AdminGrant::system();
    load_calendar(&env.services, &[date(2026, 1, 1)]).await?;

    let dir = tempdir()?;
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, r#"{"year":2026,"months":[{"month":2,"days":"30"}]}"#)?;

    let err = env
        .services
        .calendar
        .load_from_feed(&grant, &broken)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CalendarFeed(_)));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = env
        .services
        .calendar
        .load_from_feed(&grant, dir.path().join("missing.json"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    assert_eq!(env.services.calendar.snapshot_size().await?, 1);
    assert!(env.services.calendar.is_non_working_day(date(2026, 1, 1)).await?);

    Ok(())
}

#[tokio::test]
async fn test_month_queries_validate_month() -> Result<()> {
    let env = setup_services(at(2026, 1, 12, 10, 0)).await?;

    let err = env
        .services
        .calendar
        .non_working_days_in_month(2026, 13)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(env
        .services
        .calendar
        .non_working_days_in_month_list(2026, 2)
        .await?
        .is_empty());

    Ok(())
}
