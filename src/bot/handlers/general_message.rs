use teloxide::prelude::*;

use crate::utils::feedback::CommandFeedback;

pub async fn handle_general_message(bot: Bot, msg: Message) -> ResponseResult<()> {
    let feedback = CommandFeedback::new(bot, msg.chat.id);

    if let Some(text) = msg.text() {
        let lowered = text.to_lowercase();
        // Check if it looks like a malformed command
        if let Some(command) = text.split_whitespace().next().filter(|t| t.starts_with('/')) {
            let error_msg = format!("Unknown command: {}", command);
            let suggestion = "Use /help to see all available commands, or check your command syntax.";
            feedback.validation_error(&error_msg, suggestion).await?;
        } else if lowered.contains("vacation") || lowered.contains("sick") {
            let suggestion = "Booking an absence? Try:\n• /vacation 01.07.2026 14.07.2026\n• /sick 03.02.2026\n• /dayoff";
            feedback.info(suggestion).await?;
        } else if lowered.contains("help") {
            feedback
                .info("Use /help to see all available commands and examples!")
                .await?;
        }
        // For other messages, we don't respond to avoid spam
    }

    Ok(())
}
