use std::fmt::Debug;
use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::update_listeners::UpdateListener;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::platform::telegram::{TelegramBot, TelegramOutbox};
use crate::platform::{IncomingMessage, Outbox};
use crate::router;

/// Consume the update stream until it closes or Ctrl-C is pressed.
/// Every update goes through one queue, so messages are handled one at a
/// time in arrival order.
pub async fn start<L>(bot: TelegramBot, listener: L, config: Arc<Config>)
where
    L: UpdateListener + Send,
    L::Err: Debug,
{
    info!("Bot is dispatching updates...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![config])
        .distribution_function(single_queue)
        .default_handler(|upd| async move {
            debug!("Ignoring update {:?} without a message", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("relay"))
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("update listener"),
        )
        .await;

    info!("Dispatcher stopped");
}

fn single_queue(_: &Update) -> Option<()> {
    Some(())
}

async fn handle_message(
    bot: TelegramBot,
    msg: Message,
    config: Arc<Config>,
) -> ResponseResult<()> {
    let incoming = IncomingMessage::from_telegram(&msg);
    dispatch(&TelegramOutbox::new(bot), &incoming, &config).await;
    Ok(())
}

/// Route one message and make exactly one outbound request.
/// Delivery failures are logged and otherwise dropped.
pub async fn dispatch<O: Outbox>(outbox: &O, msg: &IncomingMessage, config: &Config) {
    let action = router::route(msg, config);
    debug!(
        "Message {} in chat {}: {}",
        msg.message_id.0,
        msg.chat_id.0,
        action.kind()
    );

    if let Err(e) = outbox.deliver(&action).await {
        warn!(
            "Failed to deliver {} for message {} in chat {}: {}",
            action.kind(),
            msg.message_id.0,
            msg.chat_id.0,
            e
        );
    }
}
