use chrono::NaiveDateTime;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};

use crate::error::{EngineError, ErrorKind};
use crate::utils::datetime::{format_date, format_datetime};
use crate::utils::markdown::escape_markdown;

/// Callback data prefix of the holiday clock-out confirmation.
pub const HOLIDAY_CONFIRM_PREFIX: &str = "holiday_confirm:";
/// Callback data of the holiday clock-out cancel button.
pub const HOLIDAY_CANCEL: &str = "holiday_cancel";
const CALLBACK_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Feedback types for different command outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackType {
    Success,
    Warning,
    Error,
    Info,
    Processing,
}

impl FeedbackType {
    fn emoji(&self) -> &'static str {
        match self {
            FeedbackType::Success => "✅",
            FeedbackType::Warning => "⚠️",
            FeedbackType::Error => "❌",
            FeedbackType::Info => "ℹ️",
            FeedbackType::Processing => "⏳",
        }
    }
}

/// User-facing text for an engine error, with the feedback type to render it as.
/// `ConfirmationRequired` is normally intercepted by the caller before it gets here.
pub fn describe_engine_error(err: &EngineError) -> (FeedbackType, String) {
    match (err.kind(), err) {
        (_, EngineError::NoActiveSession) => (
            FeedbackType::Warning,
            "You have no open work session. Use /in to clock in first.".to_string(),
        ),
        (_, EngineError::NotFound { entity: "user", .. }) => (
            FeedbackType::Info,
            "You are not registered yet. Use /register FirstName [LastName].".to_string(),
        ),
        (_, EngineError::NonWorkingDay(date)) => (
            FeedbackType::Warning,
            format!("{} is a non-working day, clock-in is not allowed.", format_date(date)),
        ),
        (_, EngineError::DateOccupied(date)) => (
            FeedbackType::Warning,
            format!("{} already has a work or absence record.", format_date(date)),
        ),
        (ErrorKind::Validation, _) => (FeedbackType::Error, err.to_string()),
        (ErrorKind::Conflict, _) => (FeedbackType::Warning, err.to_string()),
        (ErrorKind::NotFound, _) => (FeedbackType::Warning, err.to_string()),
        (ErrorKind::Forbidden, _) => (
            FeedbackType::Error,
            "This command is available to administrators only.".to_string(),
        ),
        (ErrorKind::ConfirmationRequired, _) => (FeedbackType::Warning, err.to_string()),
        (ErrorKind::Storage, _) => (
            FeedbackType::Error,
            "Something went wrong on our side. Please try again later.".to_string(),
        ),
    }
}

/// Callback payload that retries a clock-out at `time` with confirmation.
pub fn holiday_confirm_data(time: &NaiveDateTime) -> String {
    format!("{}{}", HOLIDAY_CONFIRM_PREFIX, time.format(CALLBACK_TIME_FORMAT))
}

/// Inverse of [`holiday_confirm_data`].
pub fn parse_holiday_confirm_data(data: &str) -> Option<NaiveDateTime> {
    let raw = data.strip_prefix(HOLIDAY_CONFIRM_PREFIX)?;
    NaiveDateTime::parse_from_str(raw, CALLBACK_TIME_FORMAT).ok()
}

/// Centralized feedback system for bot commands
#[derive(Clone)]
pub struct CommandFeedback {
    bot: Bot,
    chat_id: ChatId,
}

impl CommandFeedback {
    pub fn new(bot: Bot, chat_id: ChatId) -> Self {
        Self { bot, chat_id }
    }

    /// Send immediate feedback message
    pub async fn send(&self, feedback_type: FeedbackType, message: &str) -> ResponseResult<Message> {
        let formatted_message = format!("{} {}", feedback_type.emoji(), escape_markdown(message));

        self.bot
            .send_message(self.chat_id, formatted_message)
            .parse_mode(ParseMode::MarkdownV2)
            .await
    }

    /// Send a processing message that can be updated later
    pub async fn send_processing(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Processing, message).await
    }

    /// Update an existing message with new feedback
    pub async fn update_message(
        &self,
        message_id: MessageId,
        feedback_type: FeedbackType,
        message: &str,
    ) -> ResponseResult<Message> {
        let formatted_message = format!("{} {}", feedback_type.emoji(), escape_markdown(message));

        self.bot
            .edit_message_text(self.chat_id, message_id, formatted_message)
            .parse_mode(ParseMode::MarkdownV2)
            .await
    }

    pub async fn success(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Success, message).await
    }

    pub async fn error(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Error, message).await
    }

    pub async fn warning(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Warning, message).await
    }

    pub async fn info(&self, message: &str) -> ResponseResult<Message> {
        self.send(FeedbackType::Info, message).await
    }

    /// Send validation error with helpful suggestion
    pub async fn validation_error(&self, error: &str, suggestion: &str) -> ResponseResult<Message> {
        let message = format!("{error}\n\n💡 Suggestion: {suggestion}");
        self.send(FeedbackType::Error, &message).await
    }

    /// Renders an engine error the way the user should see it.
    pub async fn engine_error(&self, err: &EngineError) -> ResponseResult<Message> {
        let (feedback_type, message) = describe_engine_error(err);
        self.send(feedback_type, &message).await
    }

    /// Asks whether a clock-out on a non-working day should go through.
    pub async fn ask_holiday_confirmation(&self, time: &NaiveDateTime) -> ResponseResult<Message> {
        let keyboard = InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::callback("✅ Confirm", holiday_confirm_data(time)),
            InlineKeyboardButton::callback("❌ Cancel", HOLIDAY_CANCEL),
        ]]);
        let message = format!(
            "{} is a non-working day. Clock out at {} anyway?",
            format_date(&time.date()),
            format_datetime(time)
        );

        self.bot
            .send_message(
                self.chat_id,
                format!("{} {}", FeedbackType::Warning.emoji(), escape_markdown(&message)),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .reply_markup(keyboard)
            .await
    }
}

/// Progress tracker for multi-step operations
pub struct ProgressTracker {
    feedback: CommandFeedback,
    message_id: Option<MessageId>,
    total_steps: u32,
    current_step: u32,
}

impl ProgressTracker {
    pub fn new(feedback: CommandFeedback, total_steps: u32) -> Self {
        Self {
            feedback,
            message_id: None,
            total_steps,
            current_step: 0,
        }
    }

    pub async fn start(&mut self, initial_message: &str) -> ResponseResult<()> {
        let progress_message = format!("{} (1/{})", initial_message, self.total_steps);
        let message = self.feedback.send_processing(&progress_message).await?;
        self.message_id = Some(message.id);
        self.current_step = 1;
        Ok(())
    }

    pub async fn next_step(&mut self, step_message: &str) -> ResponseResult<()> {
        if let Some(message_id) = self.message_id {
            self.current_step += 1;
            let progress_message =
                format!("{} ({}/{})", step_message, self.current_step, self.total_steps);
            self.feedback
                .update_message(message_id, FeedbackType::Processing, &progress_message)
                .await?;
        }
        Ok(())
    }

    pub async fn complete(&mut self, completion_message: &str) -> ResponseResult<()> {
        if let Some(message_id) = self.message_id {
            self.feedback
                .update_message(message_id, FeedbackType::Success, completion_message)
                .await?;
        }
        Ok(())
    }

    pub async fn error(&mut self, error_message: &str) -> ResponseResult<()> {
        if let Some(message_id) = self.message_id {
            self.feedback
                .update_message(message_id, FeedbackType::Error, error_message)
                .await?;
        }
        Ok(())
    }
}
