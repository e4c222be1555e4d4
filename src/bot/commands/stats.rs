use chrono::Datelike;
use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::commands::CommandContext;
use crate::database::models::{MonthlyStat, SessionKind, SessionStatus, WorkSession};
use crate::services::monthly_stat::completion_percentage;
use crate::services::Services;
use crate::utils::datetime::{format_minutes, month_name, parse_month};
use crate::utils::markdown::{bold, escape_markdown};

pub async fn handle_stats(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "stats");
    ctx.started(Some(&args));

    let Some(caller) = ctx.caller(services).await? else {
        return Ok(());
    };

    let (year, month) = if args.trim().is_empty() {
        let today = services.clock.today();
        (today.year(), today.month())
    } else {
        match parse_month(&args) {
            Ok(key) => key,
            Err(e) => {
                return ctx
                    .invalid(&args, &e.to_string(), "Use /stats or /stats mm.yyyy, e.g. /stats 02.2026")
                    .await
            }
        }
    };

    let stat = match services.stats.get(caller.user_id, year, month).await {
        Ok(Some(stat)) => stat,
        Ok(None) => {
            ctx.feedback
                .info(&format!(
                    "No statistics for {} {} yet.",
                    month_name(month),
                    year
                ))
                .await?;
            return Ok(());
        }
        Err(e) => return ctx.fail(&e).await,
    };

    let sessions = match services.sessions.month_sessions(caller.user_id, year, month).await {
        Ok(sessions) => sessions,
        Err(e) => return ctx.fail(&e).await,
    };

    let text = render_stat(&stat, &sessions);
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;

    ctx.succeeded(Some(&format!("{}-{:02}", year, month)));
    Ok(())
}

fn render_stat(stat: &MonthlyStat, sessions: &[WorkSession]) -> String {
    let mut text = format!(
        "📊 {}\n\n",
        bold(&format!("{} {}", month_name(stat.month), stat.year))
    );

    let mut lines = vec![
        format!(
            "Planned: {} days, {}",
            stat.planned_days,
            format_minutes(stat.planned_minutes)
        ),
        format!(
            "Worked: {} days, {}",
            stat.worked_days,
            format_minutes(stat.worked_minutes)
        ),
    ];
    if stat.overtime_minutes > 0 {
        lines.push(format!("Overtime: {}", format_minutes(stat.overtime_minutes)));
    }
    if stat.deficit_minutes > 0 {
        lines.push(format!("Deficit: {}", format_minutes(stat.deficit_minutes)));
    }
    lines.push(format!("Completion: {:.1}%", completion_percentage(stat)));

    let in_progress = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Active)
        .count();
    if in_progress > 0 {
        lines.push(format!("Open sessions: {}", in_progress));
    }
    for kind in [SessionKind::Vacation, SessionKind::SickLeave, SessionKind::DayOff] {
        let days = sessions.iter().filter(|s| s.session_kind == kind).count();
        if days > 0 {
            lines.push(format!("{}: {} days", kind.label(), days));
        }
    }

    text.push_str(&escape_markdown(&lines.join("\n")));
    text
}
