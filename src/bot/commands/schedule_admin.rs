use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::commands::{split_args, CommandContext};
use crate::database::models::Schedule;
use crate::services::Services;
use crate::utils::datetime::{format_minutes, month_name, parse_month};
use crate::utils::feedback::ProgressTracker;
use crate::utils::markdown::{bold, escape_markdown};

fn schedule_line(schedule: &Schedule) -> String {
    format!(
        "#{} {} {}: {} days x {} min = {}",
        schedule.id,
        month_name(schedule.month),
        schedule.year,
        schedule.work_days,
        schedule.minutes_per_day,
        format_minutes(schedule.total_minutes)
    )
}

/// Parses `<key> DAYS MINUTES` where the key is parsed by `key`.
fn parse_body<K>(
    args: &str,
    key: impl Fn(&str) -> anyhow::Result<K>,
) -> anyhow::Result<(K, i64, i64)> {
    match split_args(args)[..] {
        [raw_key, days, minutes] => {
            let key = key(raw_key)?;
            let days = days
                .parse()
                .map_err(|_| anyhow::anyhow!("Work days must be a number, got '{}'", days))?;
            let minutes = minutes
                .parse()
                .map_err(|_| anyhow::anyhow!("Minutes per day must be a number, got '{}'", minutes))?;
            Ok((key, days, minutes))
        }
        _ => Err(anyhow::anyhow!("Expected three arguments")),
    }
}

fn parse_id(raw: &str) -> anyhow::Result<i64> {
    raw.trim()
        .trim_start_matches('#')
        .parse()
        .map_err(|_| anyhow::anyhow!("Schedule ID must be a number, got '{}'", raw.trim()))
}

pub async fn handle_schedules(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "schedules");
    ctx.started(Some(&args));

    if ctx.admin(services).await?.is_none() {
        return Ok(());
    }

    let result = if args.trim().is_empty() {
        services.schedules.list_all().await
    } else {
        match args.trim().parse::<i32>() {
            Ok(year) => services.schedules.list_by_year(year).await,
            Err(_) => {
                return ctx
                    .invalid(&args, "Year must be a number", "Use /schedules or /schedules 2026")
                    .await
            }
        }
    };

    let schedules = match result {
        Ok(schedules) => schedules,
        Err(e) => return ctx.fail(&e).await,
    };

    if schedules.is_empty() {
        ctx.feedback
            .info("No schedules yet. Use /generate yyyy or /setschedule mm.yyyy DAYS MINUTES.")
            .await?;
        return Ok(());
    }

    let mut text = format!("📅 {}\n\n", bold("Work schedules"));
    for schedule in &schedules {
        text.push_str(&escape_markdown(&schedule_line(schedule)));
        text.push('\n');
    }

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    ctx.succeeded(Some(&format!("{} schedules", schedules.len())));
    Ok(())
}

pub async fn handle_set_schedule(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "setschedule");
    ctx.started(Some(&args));

    let Some(grant) = ctx.admin(services).await? else {
        return Ok(());
    };
    let ((year, month), days, minutes) = match parse_body(&args, parse_month) {
        Ok(parsed) => parsed,
        Err(e) => {
            return ctx
                .invalid(&args, &e.to_string(), "Use /setschedule mm.yyyy DAYS MINUTES, e.g. /setschedule 03.2026 21 520")
                .await
        }
    };

    match services.schedules.create(&grant, year, month, days, minutes).await {
        Ok(schedule) => {
            ctx.feedback
                .success(&format!("Schedule created:\n{}", schedule_line(&schedule)))
                .await?;
            ctx.succeeded(Some(&format!("schedule {}", schedule.id)));
        }
        Err(e) => ctx.fail(&e).await?,
    }
    Ok(())
}

pub async fn handle_edit_schedule(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "editschedule");
    ctx.started(Some(&args));

    let Some(grant) = ctx.admin(services).await? else {
        return Ok(());
    };
    let (id, days, minutes) = match parse_body(&args, parse_id) {
        Ok(parsed) => parsed,
        Err(e) => {
            return ctx
                .invalid(&args, &e.to_string(), "Use /editschedule ID DAYS MINUTES; IDs are listed by /schedules")
                .await
        }
    };

    match services.schedules.update(&grant, id, days, minutes).await {
        Ok(schedule) => {
            ctx.feedback
                .success(&format!(
                    "Schedule updated:\n{}\nStatistics will follow shortly.",
                    schedule_line(&schedule)
                ))
                .await?;
            ctx.succeeded(Some(&format!("schedule {}", schedule.id)));
        }
        Err(e) => ctx.fail(&e).await?,
    }
    Ok(())
}

pub async fn handle_delete_schedule(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "deleteschedule");
    ctx.started(Some(&args));

    let Some(grant) = ctx.admin(services).await? else {
        return Ok(());
    };
    let id = match parse_id(&args) {
        Ok(id) => id,
        Err(e) => {
            return ctx
                .invalid(&args, &e.to_string(), "Use /deleteschedule ID; IDs are listed by /schedules")
                .await
        }
    };

    match services.schedules.delete(&grant, id).await {
        Ok(schedule) => {
            ctx.feedback
                .success(&format!(
                    "Schedule for {} {} deleted.",
                    month_name(schedule.month),
                    schedule.year
                ))
                .await?;
            ctx.succeeded(Some(&format!("schedule {}", schedule.id)));
        }
        Err(e) => ctx.fail(&e).await?,
    }
    Ok(())
}

pub async fn handle_generate(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "generate");
    ctx.started(Some(&args));

    let Some(grant) = ctx.admin(services).await? else {
        return Ok(());
    };

    let tokens = split_args(&args);
    let year = tokens.first().and_then(|raw| raw.parse::<i32>().ok());
    let minutes = match tokens.get(1) {
        Some(raw) => raw.parse::<i64>().ok(),
        None => Some(services.settings.default_minutes_per_day),
    };
    let (Some(year), Some(minutes), true) = (year, minutes, tokens.len() <= 2) else {
        return ctx
            .invalid(&args, "Expected a year and optional minutes per day", "Use /generate 2026 or /generate 2026 480")
            .await;
    };

    match services.schedules.generate_for_year(&grant, year, minutes).await {
        Ok(report) => {
            ctx.feedback
                .success(&format!(
                    "Schedules for {}: {} created, {} updated, {} unchanged.",
                    year, report.created, report.updated, report.unchanged
                ))
                .await?;
            ctx.succeeded(Some(&format!("year {}", year)));
        }
        Err(e) => ctx.fail(&e).await?,
    }
    Ok(())
}

pub async fn handle_reload_calendar(
    bot: Bot,
    msg: Message,
    calendar_path: &str,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "reloadcalendar");
    ctx.started(Some(calendar_path));

    let Some(grant) = ctx.admin(services).await? else {
        return Ok(());
    };

    let mut progress = ProgressTracker::new(ctx.feedback.clone(), 3);
    progress.start("Loading production calendar...").await?;

    let stored = match services.calendar.load_from_feed(&grant, calendar_path).await {
        Ok(stored) => stored,
        Err(e) => {
            progress.error("Calendar could not be loaded").await?;
            return ctx.fail(&e).await;
        }
    };
    progress
        .next_step(&format!("Loaded {} non-working days, reconciling schedules...", stored))
        .await?;

    let changed = match services.schedules.reconcile_all_from_calendar(&grant).await {
        Ok(changed) => changed,
        Err(e) => {
            progress.error("Schedules could not be reconciled").await?;
            return ctx.fail(&e).await;
        }
    };
    progress.next_step("Schedules reconciled").await?;

    progress
        .complete(&format!(
            "Calendar reloaded: {} non-working days, {} schedules updated.",
            stored, changed
        ))
        .await?;
    ctx.succeeded(Some(&format!("{} dates, {} schedules changed", stored, changed)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_set_schedule_body() {
        let ((year, month), days, minutes) = parse_body("03.2026 21 520", parse_month).unwrap();
        assert_eq!((year, month, days, minutes), (2026, 3, 21, 520));
    }

    #[test]
    fn test_parse_edit_schedule_body() {
        assert_eq!(parse_body("#7 20 480", parse_id).unwrap(), (7, 20, 480));
        assert!(parse_body("7 twenty 480", parse_id).is_err());
        assert!(parse_body("7 20", parse_id).is_err());
        assert!(parse_body("x 20 480", parse_id).is_err());
    }

    #[test]
    fn test_schedule_line() {
        let stamp = chrono::NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let schedule = Schedule {
            id: 3,
            year: 2026,
            month: 1,
            work_days: 15,
            minutes_per_day: 520,
            total_minutes: 7800,
            created_at: stamp,
            updated_at: stamp,
        };
        assert_eq!(
            schedule_line(&schedule),
            "#3 January 2026: 15 days x 520 min = 130h"
        );
    }
}
