use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::commands::{absence, admin, attendance, profile, schedule_admin, stats, Command};
use crate::services::Services;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    services: Services,
    calendar_path: Arc<str>,
) -> ResponseResult<()> {
    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Start => {
            bot.send_message(
                msg.chat.id,
                "🕘 Welcome to Work Schedule Bot!\n\nRegister with /register FirstName [LastName], then use /in and /out to track your day.\nUse /help to see all commands.",
            )
            .await?;
        }
        Command::Register { args } => profile::handle_register(bot, msg, args, &services).await?,
        Command::Profile => profile::handle_profile(bot, msg, &services).await?,
        Command::In { args } => attendance::handle_clock_in(bot, msg, args, &services).await?,
        Command::Out { args } => attendance::handle_clock_out(bot, msg, args, &services).await?,
        Command::Today => attendance::handle_today(bot, msg, &services).await?,
        Command::History => attendance::handle_history(bot, msg, &services).await?,
        Command::Stats { args } => stats::handle_stats(bot, msg, args, &services).await?,
        Command::Vacation { args } => absence::handle_vacation(bot, msg, args, &services).await?,
        Command::Sick { args } => absence::handle_sick(bot, msg, args, &services).await?,
        Command::DayOff { args } => absence::handle_day_off(bot, msg, args, &services).await?,
        Command::Absences => absence::handle_absences(bot, msg, &services).await?,
        Command::CancelAbsence { args } => {
            absence::handle_cancel_absence(bot, msg, args, &services).await?
        }
        Command::Schedules { args } => {
            schedule_admin::handle_schedules(bot, msg, args, &services).await?
        }
        Command::SetSchedule { args } => {
            schedule_admin::handle_set_schedule(bot, msg, args, &services).await?
        }
        Command::EditSchedule { args } => {
            schedule_admin::handle_edit_schedule(bot, msg, args, &services).await?
        }
        Command::DeleteSchedule { args } => {
            schedule_admin::handle_delete_schedule(bot, msg, args, &services).await?
        }
        Command::Generate { args } => {
            schedule_admin::handle_generate(bot, msg, args, &services).await?
        }
        Command::ReloadCalendar => {
            schedule_admin::handle_reload_calendar(bot, msg, &calendar_path, &services).await?
        }
        Command::Promote { args } => admin::handle_promote(bot, msg, args, &services).await?,
        Command::Demote { args } => admin::handle_demote(bot, msg, args, &services).await?,
        Command::Users => admin::handle_users(bot, msg, &services).await?,
    }
    Ok(())
}
