use chrono::NaiveDate;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::commands::{split_args, CommandContext};
use crate::database::models::AbsenceKind;
use crate::error::EngineResult;
use crate::services::absence::AbsenceRecord;
use crate::services::Services;
use crate::utils::datetime::{format_date, parse_date};
use crate::utils::markdown::{bold, escape_markdown};

/// Parsed `start [end]` arguments; a missing end means a single day.
fn parse_range(args: &str, end_required: bool) -> anyhow::Result<(NaiveDate, NaiveDate)> {
    match split_args(args)[..] {
        [start] if !end_required => {
            let start = parse_date(start)?;
            Ok((start, start))
        }
        [start, end] => Ok((parse_date(start)?, parse_date(end)?)),
        _ if end_required => Err(anyhow::anyhow!("Expected a start and an end date")),
        _ => Err(anyhow::anyhow!("Expected a start date and an optional end date")),
    }
}

pub async fn handle_vacation(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "vacation");
    ctx.started(Some(&args));

    let Some(caller) = ctx.caller(services).await? else {
        return Ok(());
    };
    let (start, end) = match parse_range(&args, true) {
        Ok(range) => range,
        Err(e) => {
            return ctx
                .invalid(
                    &args,
                    &e.to_string(),
                    "Use /vacation dd.mm.yyyy dd.mm.yyyy, e.g. /vacation 01.07.2026 14.07.2026",
                )
                .await
        }
    };

    let result = services.absences.add_vacation(caller.user_id, start, end).await;
    reply_with_record(&ctx, result).await
}

pub async fn handle_sick(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "sick");
    ctx.started(Some(&args));

    let Some(caller) = ctx.caller(services).await? else {
        return Ok(());
    };
    let (start, end) = match parse_range(&args, false) {
        Ok(range) => range,
        Err(e) => {
            return ctx
                .invalid(
                    &args,
                    &e.to_string(),
                    "Use /sick dd.mm.yyyy [dd.mm.yyyy]; past dates are allowed",
                )
                .await
        }
    };

    let result = services.absences.add_sick_leave(caller.user_id, start, end).await;
    reply_with_record(&ctx, result).await
}

pub async fn handle_day_off(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "dayoff");
    ctx.started(Some(&args));

    let Some(caller) = ctx.caller(services).await? else {
        return Ok(());
    };
    let date = if args.trim().is_empty() {
        services.clock.today()
    } else {
        match parse_date(&args) {
            Ok(date) => date,
            Err(e) => {
                return ctx
                    .invalid(&args, &e.to_string(), "Use /dayoff or /dayoff dd.mm.yyyy")
                    .await
            }
        }
    };

    let result = services.absences.add_day_off(caller.user_id, date).await;
    reply_with_record(&ctx, result).await
}

async fn reply_with_record(
    ctx: &CommandContext,
    result: EngineResult<AbsenceRecord>,
) -> ResponseResult<()> {
    match result {
        Ok(record) => {
            let period = &record.period;
            let range = if period.start_date == period.end_date {
                format_date(&period.start_date)
            } else {
                format!(
                    "{} - {}",
                    format_date(&period.start_date),
                    format_date(&period.end_date)
                )
            };
            ctx.feedback
                .success(&format!(
                    "{} booked for {} ({} days credited).\nID: {} (use /cancelabsence {} to undo)",
                    period.kind.label(),
                    range,
                    record.sessions.len(),
                    period.id,
                    period.id
                ))
                .await?;
            ctx.succeeded(Some(&format!("period {}", period.id)));
        }
        Err(e) => ctx.fail(&e).await?,
    }
    Ok(())
}

pub async fn handle_absences(bot: Bot, msg: Message, services: &Services) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "absences");
    ctx.started(None);

    let Some(caller) = ctx.caller(services).await? else {
        return Ok(());
    };

    let groups = match services.absences.list_for_user(caller.user_id).await {
        Ok(groups) => groups,
        Err(e) => return ctx.fail(&e).await,
    };

    if groups.is_empty() {
        ctx.feedback
            .info("No absences recorded. Use /vacation, /sick or /dayoff to add one.")
            .await?;
        return Ok(());
    }

    let today = services.clock.today();
    let mut text = format!("🏖 {}\n", bold("Your absences"));
    for group in &groups {
        text.push_str(&format!(
            "\n{}\n",
            bold(&format!("{} ({} days)", kind_heading(group.kind), group.total_days))
        ));
        for period in &group.periods {
            let marker = if period.contains(today) { " (now)" } else { "" };
            text.push_str(&escape_markdown(&format!(
                "#{} {} - {}, {} days{}\n",
                period.id,
                format_date(&period.start_date),
                format_date(&period.end_date),
                period.days(),
                marker
            )));
        }
    }

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    ctx.succeeded(Some(&format!("{} kinds", groups.len())));
    Ok(())
}

pub async fn handle_cancel_absence(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "cancelabsence");
    ctx.started(Some(&args));

    let Some(caller) = ctx.caller(services).await? else {
        return Ok(());
    };
    let period_id: i64 = match args.trim().trim_start_matches('#').parse() {
        Ok(id) => id,
        Err(_) => {
            return ctx
                .invalid(
                    &args,
                    "Absence ID must be a number",
                    "Look the ID up with /absences, then use /cancelabsence ID",
                )
                .await
        }
    };

    match services.absences.delete(&caller, period_id).await {
        Ok(period) => {
            ctx.feedback
                .success(&format!(
                    "{} {} - {} cancelled.",
                    period.kind.label(),
                    format_date(&period.start_date),
                    format_date(&period.end_date)
                ))
                .await?;
            ctx.succeeded(Some(&format!("period {}", period.id)));
        }
        Err(e) => ctx.fail(&e).await?,
    }
    Ok(())
}

fn kind_heading(kind: AbsenceKind) -> &'static str {
    match kind {
        AbsenceKind::Vacation => "Vacations",
        AbsenceKind::SickLeave => "Sick leave",
        AbsenceKind::DayOff => "Days off",
    }
}
