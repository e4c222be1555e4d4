#![allow(clippy::unwrap_used)]

mod common;

use anyhow::Result;
use common::{at, date, register, setup_services};
use work_schedule_bot::database::models::{AbsenceKind, Role, SessionKind, SessionStatus, WorkSession};
use work_schedule_bot::services::user::{AdminGrant, Caller};
use work_schedule_bot::{EngineError, ErrorKind};

#[tokio::test]
async fn test_vacation_synthesizes_absent_sessions() -> Result<()> {
    let env = setup_services(at(2026, 6, 1, 9, 0)).await?;
    let user = register(&env.services, 2001, "Vera").await?;

    let record = env
        .services
        .absences
        .add_vacation(user.id, date(2026, 7, 1), date(2026, 7, 14))
        .await?;

    assert_eq!(record.period.kind, AbsenceKind::Vacation);
    assert_eq!(record.period.days(), 14);
    assert_eq!(record.sessions.len(), 14);
    for session in &record.sessions {
        assert_eq!(session.status, SessionStatus::Absent);
        assert_eq!(session.session_kind, SessionKind::Vacation);
        assert_eq!(session.absence_period_id, Some(record.period.id));
        assert_eq!(session.worked_minutes, 520);
        assert_eq!(session.required_minutes, 520);
        assert_eq!(session.diff_minutes, 0);
        assert!(session.is_absence());
        assert!(!session.is_active());
    }
    // Weekends inside the range are covered too
    assert!(record.sessions.iter().any(|s| s.date == date(2026, 7, 4)));

    env.services.queue.flush().await;
    let july = env.services.stats.get(user.id, 2026, 7).await?.unwrap();
    assert_eq!(july.worked_days, 14);
    assert_eq!(july.worked_minutes, 14 * 520);

    Ok(())
}

#[tokio::test]
async fn test_absence_uses_schedule_minutes() -> Result<()> {
    let env = setup_services(at(2026, 6, 1, 9, 0)).await?;
    let user = register(&env.services, 2001, "Vera").await?;
    env.services
        .schedules
        .create(&AdminGrant::system(), 2026, 7, 23, 480)
        .await?;

    let record = env
        .services
        .absences
        .add_vacation(user.id, date(2026, 6, 30), date(2026, 7, 2))
        .await?;

    assert_eq!(record.sessions[0].required_minutes, 520);
    assert_eq!(record.sessions[1].required_minutes, 480);
    assert_eq!(record.sessions[2].worked_minutes, 480);

    Ok(())
}

#[tokio::test]
async fn test_vacation_in_the_past_is_rejected() -> Result<()> {
    let env = setup_services(at(2026, 6, 1, 9, 0)).await?;
    let user = register(&env.services, 2001, "Vera").await?;

    let err = env
        .services
        .absences
        .add_vacation(user.id, date(2026, 5, 31), date(2026, 6, 5))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // Sick leave can be reported after the fact
    let record = env
        .services
        .absences
        .add_sick_leave(user.id, date(2026, 5, 25), date(2026, 5, 27))
        .await?;
    assert_eq!(record.sessions.len(), 3);
    assert!(record
        .sessions
        .iter()
        .all(|s| s.session_kind == SessionKind::SickLeave));

    Ok(())
}

#[tokio::test]
async fn test_overlapping_absence_is_rejected_atomically() -> Result<()> {
    let env = setup_services(at(2026, 6, 1, 9, 0)).await?;
    let user = register(&env.services, 2001, "Vera").await?;

    env.services
        .absences
        .add_vacation(user.id, date(2026, 7, 1), date(2026, 7, 14))
        .await?;

    let err = env
        .services
        .absences
        .add_sick_leave(user.id, date(2026, 7, 10), date(2026, 7, 20))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        EngineError::AbsenceOverlap { start, end } if start == date(2026, 7, 1) && end == date(2026, 7, 14)
    ));
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let july = env.services.sessions.month_sessions(user.id, 2026, 7).await?;
    assert_eq!(july.len(), 14);
    assert!(july.iter().all(|s| s.session_kind == SessionKind::Vacation));

    Ok(())
}

#[tokio::test]
async fn test_absence_on_worked_date_is_rejected() -> Result<()> {
    let env = setup_services(at(2026, 6, 1, 9, 0)).await?;
    let user = register(&env.services, 2001, "Vera").await?;

    env.services
        .sessions
        .clock_in(user.id, at(2026, 6, 1, 8, 0), 520)
        .await?;

    let err = env
        .services
        .absences
        .add_day_off(user.id, date(2026, 6, 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::DateOccupied(d) if d == date(2026, 6, 1)));
    assert!(env.services.absences.list_for_user(user.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_delete_absence_cascades() -> Result<()> {
    let env = setup_services(at(2026, 6, 1, 9, 0)).await?;
    let user = register(&env.services, 2001, "Vera").await?;
    let caller = env.services.users.caller_for_chat(2001).await?;

    let record = env
        .services
        .absences
        .add_vacation(user.id, date(2026, 6, 29), date(2026, 7, 2))
        .await?;
    env.services.queue.flush().await;
    let stored = WorkSession::list_by_absence_period(&env.db.pool, record.period.id).await?;
    assert_eq!(stored, record.sessions);
    assert_eq!(
        env.services.stats.get(user.id, 2026, 6).await?.unwrap().worked_days,
        2
    );

    let deleted = env.services.absences.delete(&caller, record.period.id).await?;
    assert_eq!(deleted.id, record.period.id);
    env.services.queue.flush().await;

    assert!(WorkSession::list_by_absence_period(&env.db.pool, record.period.id)
        .await?
        .is_empty());
    assert!(env.services.sessions.month_sessions(user.id, 2026, 6).await?.is_empty());
    assert!(env.services.sessions.month_sessions(user.id, 2026, 7).await?.is_empty());
    for month in [6, 7] {
        let stat = env.services.stats.get(user.id, 2026, month).await?.unwrap();
        assert_eq!(stat.worked_days, 0);
        assert_eq!(stat.worked_minutes, 0);
    }

    let err = env
        .services
        .absences
        .delete(&caller, record.period.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    Ok(())
}

#[tokio::test]
async fn test_only_owner_or_admin_can_delete() -> Result<()> {
    let env = setup_services(at(2026, 6, 1, 9, 0)).await?;
    let owner = register(&env.services, 2001, "Vera").await?;
    let other = register(&env.services, 2002, "Gleb").await?;

    let record = env
        .services
        .absences
        .add_day_off(owner.id, date(2026, 6, 5))
        .await?;

    let stranger = Caller::from_user(&other);
    let err = env
        .services
        .absences
        .delete(&stranger, record.period.id)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Forbidden));
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    env.services
        .users
        .set_role(&AdminGrant::system(), 2002, Role::Admin)
        .await?;
    let admin = env.services.users.caller_for_chat(2002).await?;
    env.services.absences.delete(&admin, record.period.id).await?;
    assert!(env.services.absences.list_for_user(owner.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_absences_grouped_by_kind() -> Result<()> {
    let env = setup_services(at(2026, 6, 1, 9, 0)).await?;
    let user = register(&env.services, 2001, "Vera").await?;

    env.services
        .absences
        .add_day_off(user.id, date(2026, 6, 12))
        .await?;
    env.services
        .absences
        .add_vacation(user.id, date(2026, 7, 1), date(2026, 7, 14))
        .await?;
    env.services
        .absences
        .add_day_off(user.id, date(2026, 6, 19))
        .await?;

    let groups = env.services.absences.list_for_user(user.id).await?;
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].kind, AbsenceKind::Vacation);
    assert_eq!(groups[0].total_days, 14);
    assert_eq!(groups[1].kind, AbsenceKind::DayOff);
    assert_eq!(groups[1].periods.len(), 2);
    assert_eq!(groups[1].total_days, 2);

    let current = env
        .services
        .absences
        .current_absence(user.id, date(2026, 7, 5))
        .await?
        .unwrap();
    assert_eq!(current.kind, AbsenceKind::Vacation);
    assert!(env
        .services
        .absences
        .current_absence(user.id, date(2026, 6, 13))
        .await?
        .is_none());

    Ok(())
}

#[tokio::test]
async fn test_absence_range_validation() -> Result<()> {
    let env = setup_services(at(2026, 6, 1, 9, 0)).await?;
    let user = register(&env.services, 2001, "Vera").await?;

    let err = env
        .services
        .absences
        .add_vacation(user.id, date(2026, 7, 14), date(2026, 7, 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = env
        .services
        .absences
        .add_sick_leave(user.id, date(2026, 6, 1), date(2027, 6, 2))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // Exactly 366 days is allowed
    let record = env
        .services
        .absences
        .add_sick_leave(user.id, date(2026, 6, 1), date(2027, 6, 1))
        .await?;
    assert_eq!(record.sessions.len(), 366);

    Ok(())
}
