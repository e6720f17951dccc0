use std::{sync::Arc, time::Duration};

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, UpdateKind},
    },
    tokio::task::JoinHandle,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
};

use {courier_config::CourierConfig, courier_store::ConfigStore};

use crate::{
    Error, Result, access::TelegramAdmins, commands::bot_commands, handlers,
    outbound::TelegramOutbound, state::BotContext,
};

/// Backoff after a failed `getUpdates`.
const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Connect to Telegram and start polling in a background task.
///
/// The task runs until `cancel` fires. It ends with an error when another
/// instance is already polling with the same token.
pub async fn start_polling(
    config: &CourierConfig,
    store: Arc<ConfigStore>,
    cancel: CancellationToken,
) -> Result<JoinHandle<Result<()>>> {
    let token = config.telegram.require_token()?;
    let poll_timeout = config.telegram.poll_timeout_secs;

    // Client timeout must outlast the long poll so the HTTP client doesn't
    // abort the request before Telegram responds.
    let client = teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(poll_timeout) + 15))
        .build()
        .map_err(|e| Error::message(format!("failed to build HTTP client: {e}")))?;
    let bot = Bot::with_client(token.expose_secret(), client);

    let me = bot.get_me().await?;
    let bot_username = me.username.clone();

    // Delete any existing webhook so long polling works.
    bot.delete_webhook().send().await?;

    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        warn!("failed to register bot commands: {e}");
    }

    info!(username = ?bot_username, "telegram bot connected (webhook cleared)");

    let ctx = Arc::new(BotContext::new(
        bot_username,
        config,
        store,
        Arc::new(TelegramOutbound::new(bot.clone())),
        Arc::new(TelegramAdmins::new(bot.clone())),
    ));

    Ok(tokio::spawn(poll_loop(bot, ctx, poll_timeout, cancel)))
}

async fn poll_loop(
    bot: Bot,
    ctx: Arc<BotContext>,
    poll_timeout: u32,
    cancel: CancellationToken,
) -> Result<()> {
    info!("starting telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let request = bot
            .get_updates()
            .offset(offset)
            .timeout(poll_timeout)
            .allowed_updates(vec![AllowedUpdate::Message, AllowedUpdate::ChannelPost]);

        let result = tokio::select! {
            () = cancel.cancelled() => {
                info!("telegram polling stopped");
                return Ok(());
            },
            result = request.send() => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    match update.kind {
                        UpdateKind::Message(msg) | UpdateKind::ChannelPost(msg) => {
                            debug!(chat_id = msg.chat.id.0, "received telegram message");
                            let ctx = Arc::clone(&ctx);
                            tokio::spawn(async move {
                                handlers::handle_message(&ctx, msg).await;
                            });
                        },
                        other => {
                            debug!("ignoring unexpected update: {other:?}");
                        },
                    }
                }
            },
            Err(e) => {
                // Another bot instance is running with the same token.
                if matches!(&e, RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) {
                    warn!("telegram polling disabled: another instance is already running with this token");
                    cancel.cancel();
                    return Err(Error::message(
                        "another bot instance is already polling with this token",
                    ));
                }

                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => {},
                    () = tokio::time::sleep(RETRY_DELAY) => {},
                }
            },
        }
    }
}
