use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::commands::{split_args, CommandContext};
use crate::database::models::Role;
use crate::services::Services;
use crate::utils::datetime::format_datetime;
use crate::utils::markdown::{bold, escape_markdown};

pub async fn handle_register(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "register");
    ctx.started(Some(&args));

    let tokens = split_args(&args);
    let Some((first_name, rest)) = tokens.split_first() else {
        return ctx
            .invalid(
                &args,
                "First name is required",
                "Use /register FirstName [LastName], e.g. /register Anna Petrova",
            )
            .await;
    };
    let last_name = rest.join(" ");
    let username = msg.from().and_then(|u| u.username.clone());

    match services
        .users
        .register(
            ctx.chat_id,
            username.as_deref(),
            first_name,
            Some(last_name.as_str()),
        )
        .await
    {
        Ok(user) => {
            ctx.feedback
                .success(&format!(
                    "Welcome, {}! Your profile is ready.\n\nUse /in to clock in and /help to see all commands.",
                    user.display_name()
                ))
                .await?;
            ctx.succeeded(Some(&format!("user {}", user.id)));
        }
        Err(e) => ctx.fail(&e).await?,
    }

    Ok(())
}

pub async fn handle_profile(bot: Bot, msg: Message, services: &Services) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "profile");
    ctx.started(None);

    let user = match services.users.find_by_chat_id(ctx.chat_id).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            ctx.feedback
                .info("You are not registered yet. Use /register FirstName [LastName].")
                .await?;
            return Ok(());
        }
        Err(e) => return ctx.fail(&e).await,
    };

    let role = match user.role {
        Role::Admin => "administrator",
        Role::Client => "employee",
    };

    let mut text = format!("👤 {}\n\n", bold(&user.display_name()));
    if let Some(username) = &user.username {
        text.push_str(&escape_markdown(&format!("Username: @{}\n", username)));
    }
    text.push_str(&escape_markdown(&format!(
        "Role: {}\nChat ID: {}\nRegistered: {}",
        role,
        user.chat_id,
        format_datetime(&user.created_at)
    )));

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    ctx.succeeded(None);
    Ok(())
}
