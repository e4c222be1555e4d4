use chrono::{NaiveDate, NaiveDateTime};
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::commands::CommandContext;
use crate::database::models::{SessionStatus, WorkSession};
use crate::error::EngineError;
use crate::services::work_session::ClockWarning;
use crate::services::Services;
use crate::utils::datetime::{
    format_date, format_minutes, format_time, parse_clock_arguments,
};
use crate::utils::markdown::{bold, escape_markdown};

const HISTORY_LIMIT: i64 = 10;
const CLOCK_SUGGESTION: &str =
    "Use /in or /out alone for now, or add a date (dd.mm.yyyy) and/or a time (hh:mm)";

pub async fn handle_clock_in(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "in");
    ctx.started(Some(&args));

    let Some(caller) = ctx.caller(services).await? else {
        return Ok(());
    };

    let time = match parse_clock_arguments(&args, services.clock.now()) {
        Ok(time) => time,
        Err(e) => return ctx.invalid(&args, &e.to_string(), CLOCK_SUGGESTION).await,
    };

    let required = match services.schedules.required_minutes_for(time.date()).await {
        Ok(required) => required,
        Err(e) => return ctx.fail(&e).await,
    };

    match services.sessions.clock_in(caller.user_id, time, required).await {
        Ok(outcome) => {
            let mut message = format!(
                "Clocked in at {} on {}.\nRequired today: {}",
                format_time(&outcome.session.clock_in_time),
                format_date(&outcome.session.date),
                format_minutes(outcome.session.required_minutes)
            );
            push_warnings(&mut message, &outcome.warnings);
            ctx.feedback.success(&message).await?;
            ctx.succeeded(Some(&format!("session {}", outcome.session.id)));
        }
        Err(e) => ctx.fail(&e).await?,
    }

    Ok(())
}

pub async fn handle_clock_out(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "out");
    ctx.started(Some(&args));

    let Some(caller) = ctx.caller(services).await? else {
        return Ok(());
    };

    let time = match parse_clock_arguments(&args, services.clock.now()) {
        Ok(time) => time,
        Err(e) => return ctx.invalid(&args, &e.to_string(), CLOCK_SUGGESTION).await,
    };

    finish_clock_out(&ctx, services, caller.user_id, time, false).await
}

/// Runs a clock-out and renders its outcome. A holiday clock-out without confirmation
/// turns into a confirm/cancel question instead of an error.
pub async fn finish_clock_out(
    ctx: &CommandContext,
    services: &Services,
    user_id: i64,
    time: NaiveDateTime,
    confirm_holiday: bool,
) -> ResponseResult<()> {
    match services.sessions.clock_out(user_id, time, confirm_holiday).await {
        Ok(outcome) => {
            let session = &outcome.session;
            let mut message = format!(
                "Clocked out at {}.\nWorked: {} of {} ({})",
                format_time(&time),
                format_minutes(session.worked_minutes),
                format_minutes(session.required_minutes),
                signed_minutes(session.diff_minutes)
            );
            push_warnings(&mut message, &outcome.warnings);
            ctx.feedback.success(&message).await?;
            ctx.succeeded(Some(&format!("session {}", session.id)));
        }
        Err(EngineError::HolidayConfirmationRequired(date)) => {
            tracing::debug!("Clock-out on non-working day {} needs confirmation", date);
            ctx.feedback.ask_holiday_confirmation(&time).await?;
        }
        Err(e) => ctx.fail(&e).await?,
    }
    Ok(())
}

pub async fn handle_today(bot: Bot, msg: Message, services: &Services) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "today");
    ctx.started(None);

    let Some(caller) = ctx.caller(services).await? else {
        return Ok(());
    };
    let today = services.clock.today();

    let session = match services.sessions.active_session(caller.user_id).await {
        Ok(Some(active)) => Some(active),
        Ok(None) => match services.sessions.session_for_date(caller.user_id, today).await {
            Ok(session) => session,
            Err(e) => return ctx.fail(&e).await,
        },
        Err(e) => return ctx.fail(&e).await,
    };

    match session {
        Some(session) => ctx.feedback.info(&describe_session(&session)).await?,
        None => match idle_day_hint(services, today).await {
            Ok(hint) => ctx.feedback.info(&hint).await?,
            Err(e) => return ctx.fail(&e).await,
        },
    };

    ctx.succeeded(None);
    Ok(())
}

/// Reply for a day with nothing recorded yet.
async fn idle_day_hint(services: &Services, today: NaiveDate) -> Result<String, EngineError> {
    if services.schedules.is_working_day(today).await? {
        Ok(format!("Nothing recorded for {} yet. Use /in to clock in.", format_date(&today)))
    } else {
        Ok(format!("{} is a non-working day. Enjoy your rest!", format_date(&today)))
    }
}

pub async fn handle_history(bot: Bot, msg: Message, services: &Services) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "history");
    ctx.started(None);

    let Some(caller) = ctx.caller(services).await? else {
        return Ok(());
    };

    let sessions = match services.sessions.history(caller.user_id, HISTORY_LIMIT).await {
        Ok(sessions) => sessions,
        Err(e) => return ctx.fail(&e).await,
    };

    if sessions.is_empty() {
        ctx.feedback
            .info("No sessions recorded yet. Use /in to clock in.")
            .await?;
        return Ok(());
    }

    let mut text = format!("🗓 {}\n\n", bold("Recent sessions"));
    for session in &sessions {
        text.push_str(&escape_markdown(&history_line(session)));
        text.push('\n');
    }

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    ctx.succeeded(Some(&format!("{} sessions", sessions.len())));
    Ok(())
}

fn push_warnings(message: &mut String, warnings: &[ClockWarning]) {
    for warning in warnings {
        let line = match warning {
            ClockWarning::Backdated { hours } => {
                format!("\n⚠️ Recorded {} hours after the fact.", hours)
            }
            ClockWarning::HolidayWork(date) => {
                format!("\n⚠️ Work on non-working day {} recorded.", format_date(date))
            }
        };
        message.push_str(&line);
    }
}

fn signed_minutes(minutes: i64) -> String {
    if minutes > 0 {
        format!("+{}", format_minutes(minutes))
    } else {
        format_minutes(minutes)
    }
}

fn describe_session(session: &WorkSession) -> String {
    match session.status {
        SessionStatus::Active => format!(
            "Clocked in since {} on {}. Required: {}",
            format_time(&session.clock_in_time),
            format_date(&session.date),
            format_minutes(session.required_minutes)
        ),
        SessionStatus::Absent => format!(
            "{}: {} credited",
            session.session_kind.label(),
            format_minutes(session.worked_minutes)
        ),
        SessionStatus::Completed => format!(
            "{} worked on {} ({})",
            format_minutes(session.worked_minutes),
            format_date(&session.date),
            signed_minutes(session.diff_minutes)
        ),
    }
}

fn history_line(session: &WorkSession) -> String {
    let window = match session.clock_out_time {
        Some(out) => format!("{}-{}", format_time(&session.clock_in_time), format_time(&out)),
        None => format!("{}-...", format_time(&session.clock_in_time)),
    };
    match session.status {
        SessionStatus::Active => format!("{} {} in progress", format_date(&session.date), window),
        SessionStatus::Absent => format!(
            "{} {}",
            format_date(&session.date),
            session.session_kind.label()
        ),
        SessionStatus::Completed => format!(
            "{} {} {} ({})",
            format_date(&session.date),
            window,
            format_minutes(session.worked_minutes),
            signed_minutes(session.diff_minutes)
        ),
    }
}
