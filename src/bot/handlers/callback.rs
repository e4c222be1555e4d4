use teloxide::prelude::*;

use crate::bot::commands::attendance::finish_clock_out;
use crate::bot::commands::CommandContext;
use crate::services::Services;
use crate::utils::feedback::{parse_holiday_confirm_data, HOLIDAY_CANCEL, HOLIDAY_CONFIRM_PREFIX};

pub async fn callback_handler(bot: Bot, q: CallbackQuery, services: Services) -> ResponseResult<()> {
    let user_id = q.from.id.0;
    let username = q
        .from
        .username
        .clone()
        .unwrap_or_else(|| q.from.first_name.clone());

    let Some(data) = q.data.clone() else {
        bot.answer_callback_query(q.id)
            .text("Invalid callback data format")
            .await?;
        return Ok(());
    };

    tracing::info!(
        "Callback received: '{}' from user {} ({})",
        data,
        username,
        user_id
    );

    // Callbacks only come from buttons under our own messages
    let Some(message) = q.message.clone() else {
        bot.answer_callback_query(q.id)
            .text("This button has expired")
            .await?;
        return Ok(());
    };

    if data == HOLIDAY_CANCEL {
        bot.answer_callback_query(q.id).text("Clock-out cancelled").await?;
        bot.edit_message_text(message.chat.id, message.id, "❌ Clock-out cancelled.")
            .await?;
        return Ok(());
    }

    if data.starts_with(HOLIDAY_CONFIRM_PREFIX) {
        let Some(time) = parse_holiday_confirm_data(&data) else {
            bot.answer_callback_query(q.id)
                .text("Invalid confirmation data")
                .await?;
            return Ok(());
        };

        bot.answer_callback_query(q.id).text("Confirmed").await?;
        if let Err(e) = bot
            .edit_message_reply_markup(message.chat.id, message.id)
            .await
        {
            tracing::warn!("Failed to remove confirmation keyboard: {}", e);
        }

        let ctx = CommandContext::from_parts(&bot, message.chat.id, username, "out");
        ctx.started(Some("holiday confirmed"));
        let Some(caller) = ctx.caller(&services).await? else {
            return Ok(());
        };
        return finish_clock_out(&ctx, &services, caller.user_id, time, true).await;
    }

    bot.answer_callback_query(q.id)
        .text("Unknown action")
        .await?;
    Ok(())
}
