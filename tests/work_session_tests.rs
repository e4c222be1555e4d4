#![allow(clippy::unwrap_used)]

mod common;

use anyhow::Result;
use common::{at, date, load_calendar, register, setup_services};
use work_schedule_bot::database::models::{SessionKind, SessionStatus};
use work_schedule_bot::services::user::AdminGrant;
use work_schedule_bot::services::work_session::ClockWarning;
use work_schedule_bot::{EngineError, ErrorKind};

#[tokio::test]
async fn test_clock_in_twice_is_rejected() -> Result<()> {
    let env = setup_services(at(2026, 2, 10, 18, 0)).await?;
    let user = register(&env.services, 1001, "Anna").await?;

    let outcome = env
        .services
        .sessions
        .clock_in(user.id, at(2026, 2, 10, 9, 0), 520)
        .await?;
    assert_eq!(outcome.session.status, SessionStatus::Active);
    assert!(outcome.session.is_active());
    assert!(!outcome.session.is_absence());
    assert_eq!(outcome.session.session_kind, SessionKind::Work);
    assert_eq!(outcome.session.date, date(2026, 2, 10));
    assert_eq!(outcome.session.diff_minutes, -520);
    assert!(outcome.warnings.is_empty());

    let err = env
        .services
        .sessions
        .clock_in(user.id, at(2026, 2, 10, 9, 30), 520)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyActive));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // Another day does not help while a session is open
    let err = env
        .services
        .sessions
        .clock_in(user.id, at(2026, 2, 9, 9, 0), 520)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::AlreadyActive));

    Ok(())
}

#[tokio::test]
async fn test_clock_out_updates_monthly_stats() -> Result<()> {
    let env = setup_services(at(2026, 2, 10, 18, 0)).await?;
    let user = register(&env.services, 1001, "Anna").await?;
    env.services
        .schedules
        .create(&AdminGrant::system(), 2026, 2, 1, 520)
        .await?;

    env.services
        .sessions
        .clock_in(user.id, at(2026, 2, 10, 9, 0), 520)
        .await?;
    let outcome = env
        .services
        .sessions
        .clock_out(user.id, at(2026, 2, 10, 17, 30), false)
        .await?;

    assert_eq!(outcome.session.status, SessionStatus::Completed);
    assert_eq!(outcome.session.worked_minutes, 510);
    assert_eq!(outcome.session.diff_minutes, -10);
    assert_eq!(outcome.session.clock_out_time, Some(at(2026, 2, 10, 17, 30)));
    assert!(outcome.warnings.is_empty());

    env.services.queue.flush().await;
    let stat = env.services.stats.get(user.id, 2026, 2).await?.unwrap();
    assert_eq!(stat.planned_days, 1);
    assert_eq!(stat.planned_minutes, 520);
    assert_eq!(stat.worked_days, 1);
    assert_eq!(stat.worked_minutes, 510);
    assert_eq!(stat.overtime_minutes, 0);
    assert_eq!(stat.deficit_minutes, 10);

    assert!(env.services.sessions.active_session(user.id).await?.is_none());
    assert_eq!(env.services.queue.pending_count().await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_future_timestamps_are_rejected() -> Result<()> {
    let env = setup_services(at(2026, 2, 10, 18, 0)).await?;
    let user = register(&env.services, 1001, "Anna").await?;

    let err = env
        .services
        .sessions
        .clock_in(user.id, at(2026, 2, 10, 18, 1), 520)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    env.services
        .sessions
        .clock_in(user.id, at(2026, 2, 10, 9, 0), 520)
        .await?;
    let err = env
        .services
        .sessions
        .clock_out(user.id, at(2026, 2, 11, 9, 0), false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(env.services.sessions.active_session(user.id).await?.is_some());

    Ok(())
}

#[tokio::test]
async fn test_clock_in_before_epoch_is_rejected() -> Result<()> {
    let env = setup_services(at(2026, 2, 10, 18, 0)).await?;
    let user = register(&env.services, 1001, "Anna").await?;

    let err = env
        .services
        .sessions
        .clock_in(user.id, at(2025, 12, 30, 9, 0), 520)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = env
        .services
        .sessions
        .clock_in(user.id, at(2026, 2, 10, 9, 0), 0)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    Ok(())
}

#[tokio::test]
async fn test_clock_in_on_non_working_day() -> Result<()> {
    let env = setup_services(at(2026, 2, 10, 18, 0)).await?;
    let user = register(&env.services, 1001, "Anna").await?;
    load_calendar(&env.services, &[date(2026, 2, 8)]).await?;

    let err = env
        .services
        .sessions
        .clock_in(user.id, at(2026, 2, 8, 10, 0), 520)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NonWorkingDay(d) if d == date(2026, 2, 8)));
    assert_eq!(err.kind(), ErrorKind::Validation);

    Ok(())
}

#[tokio::test]
async fn test_clock_out_errors() -> Result<()> {
    let env = setup_services(at(2026, 2, 10, 18, 0)).await?;
    let user = register(&env.services, 1001, "Anna").await?;

    let err = env
        .services
        .sessions
        .clock_out(user.id, at(2026, 2, 10, 17, 0), false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NoActiveSession));
    assert_eq!(err.kind(), ErrorKind::NotFound);

    env.services
        .sessions
        .clock_in(user.id, at(2026, 2, 10, 9, 0), 520)
        .await?;
    let err = env
        .services
        .sessions
        .clock_out(user.id, at(2026, 2, 10, 8, 59), false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::TimeBeforeClockIn { .. }));
    assert_eq!(err.kind(), ErrorKind::Validation);

    Ok(())
}

#[tokio::test]
async fn test_zero_length_session() -> Result<()> {
    let env = setup_services(at(2026, 2, 10, 18, 0)).await?;
    let user = register(&env.services, 1001, "Anna").await?;

    env.services
        .sessions
        .clock_in(user.id, at(2026, 2, 10, 9, 0), 520)
        .await?;
    let outcome = env
        .services
        .sessions
        .clock_out(user.id, at(2026, 2, 10, 9, 0), false)
        .await?;

    assert_eq!(outcome.session.worked_minutes, 0);
    assert_eq!(outcome.session.diff_minutes, -520);

    Ok(())
}

#[tokio::test]
async fn test_holiday_clock_out_needs_confirmation() -> Result<()> {
    let env = setup_services(at(2026, 2, 10, 18, 0)).await?;
    let user = register(&env.services, 1001, "Anna").await?;
    load_calendar(&env.services, &[date(2026, 2, 8)]).await?;

    env.services
        .sessions
        .clock_in(user.id, at(2026, 2, 7, 20, 0), 520)
        .await?;

    let err = env
        .services
        .sessions
        .clock_out(user.id, at(2026, 2, 8, 2, 0), false)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::HolidayConfirmationRequired(d) if d == date(2026, 2, 8)));
    assert_eq!(err.kind(), ErrorKind::ConfirmationRequired);

    // Nothing changed, the session is still open
    let active = env.services.sessions.active_session(user.id).await?.unwrap();
    assert_eq!(active.date, date(2026, 2, 7));

    let outcome = env
        .services
        .sessions
        .clock_out(user.id, at(2026, 2, 8, 2, 0), true)
        .await?;
    assert_eq!(outcome.session.date, date(2026, 2, 7));
    assert_eq!(outcome.session.worked_minutes, 360);
    assert!(outcome
        .warnings
        .contains(&ClockWarning::HolidayWork(date(2026, 2, 8))));
    assert!(outcome
        .warnings
        .iter()
        .any(|w| matches!(w, ClockWarning::Backdated { .. })));

    Ok(())
}

#[tokio::test]
async fn test_backdated_clock_in_warns() -> Result<()> {
    let env = setup_services(at(2026, 2, 10, 18, 0)).await?;
    let user = register(&env.services, 1001, "Anna").await?;

    let outcome = env
        .services
        .sessions
        .clock_in(user.id, at(2026, 2, 5, 9, 0), 520)
        .await?;
    assert_eq!(outcome.warnings, vec![ClockWarning::Backdated { hours: 129 }]);

    Ok(())
}

#[tokio::test]
async fn test_one_record_per_date() -> Result<()> {
    let env = setup_services(at(2026, 2, 10, 18, 0)).await?;
    let user = register(&env.services, 1001, "Anna").await?;

    env.services
        .sessions
        .clock_in(user.id, at(2026, 2, 9, 9, 0), 520)
        .await?;
    env.services
        .sessions
        .clock_out(user.id, at(2026, 2, 9, 18, 0), false)
        .await?;

    let err = env
        .services
        .sessions
        .clock_in(user.id, at(2026, 2, 9, 19, 0), 520)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DateOccupied(d) if d == date(2026, 2, 9)));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // A different user is unaffected
    let other = register(&env.services, 1002, "Boris").await?;
    env.services
        .sessions
        .clock_in(other.id, at(2026, 2, 9, 19, 0), 520)
        .await?;

    Ok(())
}

#[tokio::test]
async fn test_session_queries() -> Result<()> {
    let env = setup_services(at(2026, 2, 10, 18, 0)).await?;
    let user = register(&env.services, 1001, "Anna").await?;

    for day in [2, 3, 4] {
        env.services
            .sessions
            .clock_in(user.id, at(2026, 2, day, 9, 0), 520)
            .await?;
        env.services
            .sessions
            .clock_out(user.id, at(2026, 2, day, 17, 40), false)
            .await?;
    }
    env.services
        .sessions
        .clock_in(user.id, at(2026, 2, 10, 9, 0), 520)
        .await?;

    let history = env.services.sessions.history(user.id, 2).await?;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].date, date(2026, 2, 10));
    assert_eq!(history[1].date, date(2026, 2, 4));

    let month = env.services.sessions.month_sessions(user.id, 2026, 2).await?;
    assert_eq!(month.len(), 4);
    assert!(env.services.sessions.month_sessions(user.id, 2026, 3).await?.is_empty());

    let day = env
        .services
        .sessions
        .session_for_date(user.id, date(2026, 2, 3))
        .await?
        .unwrap();
    assert_eq!(day.worked_minutes, 520);
    assert_eq!(day.diff_minutes, 0);

    env.services.queue.flush().await;
    let stat = env.services.stats.get(user.id, 2026, 2).await?.unwrap();
    assert_eq!(stat.worked_days, 3);
    assert_eq!(stat.worked_minutes, 3 * 520);

    Ok(())
}
