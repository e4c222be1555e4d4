pub mod callback;
pub mod general_message;
pub mod message;

use std::sync::Arc;
use teloxide::{dispatching::UpdateHandler, prelude::*};

use crate::bot::commands::Command;
use crate::services::Services;

pub struct BotHandler {
    pub services: Services,
    pub calendar_path: Arc<str>,
}

impl BotHandler {
    pub fn new(services: Services, calendar_path: String) -> Self {
        Self {
            services,
            calendar_path: calendar_path.into(),
        }
    }

    pub fn schema(&self) -> UpdateHandler<teloxide::RequestError> {
        use teloxide::dispatching::UpdateFilterExt;

        let services = self.services.clone();
        let calendar_path = self.calendar_path.clone();
        let services_callback = self.services.clone();

        dptree::entry()
            .branch(
                Update::filter_message()
                    .filter_command::<Command>()
                    .endpoint(move |bot: Bot, msg: Message, cmd: Command| {
                        let services = services.clone();
                        let calendar_path = calendar_path.clone();
                        async move {
                            message::command_handler(bot, msg, cmd, services, calendar_path).await
                        }
                    }),
            )
            .branch(
                Update::filter_message().endpoint(|bot: Bot, msg: Message| async move {
                    general_message::handle_general_message(bot, msg).await
                }),
            )
            .branch(Update::filter_callback_query().endpoint(
                move |bot: Bot, q: CallbackQuery| {
                    let services = services_callback.clone();
                    async move { callback::callback_handler(bot, q, services).await }
                },
            ))
    }
}
