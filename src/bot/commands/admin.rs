use teloxide::prelude::*;
use teloxide::types::ParseMode;

use crate::bot::commands::CommandContext;
use crate::database::models::{Role, User};
use crate::services::Services;
use crate::utils::markdown::{bold, escape_markdown};

pub async fn handle_promote(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    change_role(bot, msg, args, services, Role::Admin).await
}

pub async fn handle_demote(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
) -> ResponseResult<()> {
    change_role(bot, msg, args, services, Role::Client).await
}

async fn change_role(
    bot: Bot,
    msg: Message,
    args: String,
    services: &Services,
    role: Role,
) -> ResponseResult<()> {
    let command = match role {
        Role::Admin => "promote",
        Role::Client => "demote",
    };
    let ctx = CommandContext::new(&bot, &msg, command);
    ctx.started(Some(&args));

    let Some(grant) = ctx.admin(services).await? else {
        return Ok(());
    };
    let chat_id: i64 = match args.trim().parse() {
        Ok(chat_id) => chat_id,
        Err(_) => {
            return ctx
                .invalid(
                    &args,
                    "Chat ID must be a number",
                    "Look the chat ID up with /users",
                )
                .await
        }
    };
    if role == Role::Client && chat_id == ctx.chat_id {
        ctx.feedback
            .warning("You cannot revoke your own administrator rights.")
            .await?;
        return Ok(());
    }

    match services.users.set_role(&grant, chat_id, role).await {
        Ok(user) => {
            let message = match role {
                Role::Admin => format!("{} is now an administrator.", user.display_name()),
                Role::Client => format!("{} is no longer an administrator.", user.display_name()),
            };
            ctx.feedback.success(&message).await?;
            ctx.succeeded(Some(&format!("chat {}", chat_id)));
        }
        Err(e) => ctx.fail(&e).await?,
    }
    Ok(())
}

pub async fn handle_users(bot: Bot, msg: Message, services: &Services) -> ResponseResult<()> {
    let ctx = CommandContext::new(&bot, &msg, "users");
    ctx.started(None);

    let Some(grant) = ctx.admin(services).await? else {
        return Ok(());
    };

    let users = match services.users.list_users(&grant).await {
        Ok(users) => users,
        Err(e) => return ctx.fail(&e).await,
    };

    let mut text = format!("👥 {}\n\n", bold(&format!("Users ({})", users.len())));
    for user in &users {
        text.push_str(&escape_markdown(&user_line(user)));
        text.push('\n');
    }

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    ctx.succeeded(Some(&format!("{} users", users.len())));
    Ok(())
}

fn user_line(user: &User) -> String {
    let badge = if user.is_admin() { "👑 " } else { "" };
    match &user.username {
        Some(username) => format!("{}{} (@{}), chat {}", badge, user.display_name(), username, user.chat_id),
        None => format!("{}{}, chat {}", badge, user.display_name(), user.chat_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_line() {
        let mut user = User {
            id: 1,
            chat_id: 42,
            username: Some("anna".to_string()),
            first_name: "Anna".to_string(),
            last_name: Some("Petrova".to_string()),
            role: Role::Admin,
            created_at: chrono::NaiveDate::from_ymd_opt(2026, 1, 12)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        };
        assert_eq!(user_line(&user), "👑 Anna Petrova (@anna), chat 42");

        user.role = Role::Client;
        user.username = None;
        assert_eq!(user_line(&user), "Anna Petrova, chat 42");
    }
}
