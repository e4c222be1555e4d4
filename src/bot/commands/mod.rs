pub mod absence;
pub mod admin;
pub mod attendance;
pub mod profile;
pub mod schedule_admin;
pub mod stats;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::error::EngineError;
use crate::services::user::{AdminGrant, Caller};
use crate::services::Services;
use crate::utils::feedback::CommandFeedback;
use crate::utils::logging::{
    log_command_error, log_command_start, log_command_success, log_validation_error,
};

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Work Schedule Bot commands:")]
pub enum Command {
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Create your profile: /register FirstName [LastName]")]
    Register { args: String },
    #[command(description = "Show your profile")]
    Profile,
    #[command(description = "Clock in: /in [dd.mm.yyyy] [hh:mm]")]
    In { args: String },
    #[command(description = "Clock out: /out [dd.mm.yyyy] [hh:mm]")]
    Out { args: String },
    #[command(description = "Show today's session")]
    Today,
    #[command(description = "Show your recent sessions")]
    History,
    #[command(description = "Monthly statistics: /stats [mm.yyyy]")]
    Stats { args: String },
    #[command(description = "Book a vacation: /vacation dd.mm.yyyy dd.mm.yyyy")]
    Vacation { args: String },
    #[command(description = "Report sick leave: /sick dd.mm.yyyy [dd.mm.yyyy]")]
    Sick { args: String },
    #[command(description = "Take a day off: /dayoff [dd.mm.yyyy]")]
    DayOff { args: String },
    #[command(description = "List your absences")]
    Absences,
    #[command(description = "Cancel an absence: /cancelabsence ID")]
    CancelAbsence { args: String },
    #[command(description = "Admin: list schedules: /schedules [yyyy]")]
    Schedules { args: String },
    #[command(description = "Admin: create a schedule: /setschedule mm.yyyy DAYS MINUTES")]
    SetSchedule { args: String },
    #[command(description = "Admin: edit a schedule: /editschedule ID DAYS MINUTES")]
    EditSchedule { args: String },
    #[command(description = "Admin: delete a schedule: /deleteschedule ID")]
    DeleteSchedule { args: String },
    #[command(description = "Admin: generate a year of schedules: /generate yyyy [MINUTES]")]
    Generate { args: String },
    #[command(description = "Admin: reload the production calendar")]
    ReloadCalendar,
    #[command(description = "Admin: grant admin rights: /promote CHAT_ID")]
    Promote { args: String },
    #[command(description = "Admin: revoke admin rights: /demote CHAT_ID")]
    Demote { args: String },
    #[command(description = "Admin: list registered users")]
    Users,
}

/// Logging and reply helpers for one incoming command.
pub struct CommandContext {
    pub command: &'static str,
    pub user: String,
    pub chat_id: i64,
    pub feedback: CommandFeedback,
}

impl CommandContext {
    pub fn new(bot: &Bot, msg: &Message, command: &'static str) -> Self {
        let user = msg
            .from()
            .map(|u| u.username.clone().unwrap_or_else(|| u.first_name.clone()))
            .unwrap_or_else(|| "unknown".to_string());

        Self::from_parts(bot, msg.chat.id, user, command)
    }

    /// Context for interactions that do not arrive as a command message, e.g. callbacks.
    pub fn from_parts(bot: &Bot, chat_id: ChatId, user: String, command: &'static str) -> Self {
        Self {
            command,
            user,
            chat_id: chat_id.0,
            feedback: CommandFeedback::new(bot.clone(), chat_id),
        }
    }

    pub fn started(&self, details: Option<&str>) {
        log_command_start(self.command, &self.user, self.chat_id, details);
    }

    pub fn succeeded(&self, details: Option<&str>) {
        log_command_success(self.command, &self.user, self.chat_id, details);
    }

    /// Logs an engine failure and tells the user what went wrong.
    pub async fn fail(&self, err: &EngineError) -> ResponseResult<()> {
        log_command_error(self.command, &self.user, self.chat_id, err);
        self.feedback.engine_error(err).await?;
        Ok(())
    }

    /// Rejects malformed arguments before anything reaches the engine.
    pub async fn invalid(&self, value: &str, error: &str, suggestion: &str) -> ResponseResult<()> {
        log_validation_error(self.command, value, error, &self.user, self.chat_id);
        self.feedback.validation_error(error, suggestion).await?;
        Ok(())
    }

    /// Registered caller of this chat; replies with a hint and yields `None` otherwise.
    pub async fn caller(&self, services: &Services) -> ResponseResult<Option<Caller>> {
        match services.users.caller_for_chat(self.chat_id).await {
            Ok(caller) => Ok(Some(caller)),
            Err(e) => {
                self.fail(&e).await?;
                Ok(None)
            }
        }
    }

    /// Like [`CommandContext::caller`], but also demands the admin capability.
    pub async fn admin(&self, services: &Services) -> ResponseResult<Option<AdminGrant>> {
        let Some(caller) = self.caller(services).await? else {
            return Ok(None);
        };
        match caller.admin() {
            Ok(grant) => Ok(Some(grant)),
            Err(e) => {
                self.fail(&e).await?;
                Ok(None)
            }
        }
    }
}

/// Splits command arguments into whitespace-separated tokens.
pub fn split_args(args: &str) -> Vec<&str> {
    args.split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands_with_arguments() {
        let cmd = Command::parse("/in 10.02.2026 09:00", "worktimebot").unwrap();
        assert_eq!(
            cmd,
            Command::In {
                args: "10.02.2026 09:00".to_string()
            }
        );

        let cmd = Command::parse("/out", "worktimebot").unwrap();
        assert_eq!(cmd, Command::Out { args: String::new() });

        let cmd = Command::parse("/dayoff 13.03.2026", "worktimebot").unwrap();
        assert_eq!(
            cmd,
            Command::DayOff {
                args: "13.03.2026".to_string()
            }
        );
    }

    #[test]
    fn test_parse_lowercase_admin_commands() {
        assert_eq!(
            Command::parse("/reloadcalendar", "worktimebot").unwrap(),
            Command::ReloadCalendar
        );
        assert_eq!(
            Command::parse("/setschedule 03.2026 21 520", "worktimebot").unwrap(),
            Command::SetSchedule {
                args: "03.2026 21 520".to_string()
            }
        );
        assert!(Command::parse("/unknown", "worktimebot").is_err());
    }

    #[test]
    fn test_split_args() {
        assert_eq!(split_args("  01.07.2026   14.07.2026 "), vec!["01.07.2026", "14.07.2026"]);
        assert!(split_args("").is_empty());
    }
}
