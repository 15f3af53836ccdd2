use std::time::Duration;

use {
    secrecy::ExposeSecret,
    teloxide::{
        ApiError, RequestError,
        prelude::*,
        types::{AllowedUpdate, UpdateKind},
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, warn},
};

use chatbridge_channels::{Error, EventSender, Result};

use crate::{
    config::TelegramAccountConfig,
    handlers,
    state::{Connection, SharedState},
};

/// Pause after a failed `getUpdates` before polling again.
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Margin the HTTP client timeout keeps above the long-polling timeout.
const CLIENT_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

/// HTTP client whose timeout outlasts the long-polling timeout, so the
/// client doesn't abort the request before Telegram responds.
fn build_client(poll_timeout_secs: u32) -> reqwest::Result<reqwest::Client> {
    teloxide::net::default_reqwest_settings()
        .timeout(Duration::from_secs(u64::from(poll_timeout_secs)) + CLIENT_TIMEOUT_MARGIN)
        .build()
}

/// Connect the bot and start polling.
///
/// Spawns a background task that pushes inbound messages onto `events` until
/// the returned `CancellationToken` is cancelled.
pub async fn start_polling(
    config: &TelegramAccountConfig,
    state: SharedState,
    events: EventSender,
) -> Result<CancellationToken> {
    let client = build_client(config.poll_timeout_secs)
        .map_err(|e| Error::external("build telegram http client", e))?;
    let bot = Bot::with_client(config.token.expose_secret(), client);

    // Verify credentials and get bot identity.
    let me = bot
        .get_me()
        .await
        .map_err(|e| Error::external("telegram getMe", e))?;

    // Delete any existing webhook so long polling works.
    bot.delete_webhook()
        .send()
        .await
        .map_err(|e| Error::external("telegram deleteWebhook", e))?;

    info!(
        username = ?me.username,
        bot_id = me.id.0,
        "telegram bot connected (webhook cleared)"
    );

    let cancel = CancellationToken::new();
    let previous = state.connect(Connection {
        bot: bot.clone(),
        bot_id: me.id,
        username: me.username.clone(),
        cancel: cancel.clone(),
    });
    if let Some(previous) = previous {
        previous.cancel.cancel();
    }

    tokio::spawn(poll_updates(
        bot,
        config.poll_timeout_secs,
        state,
        events,
        cancel.clone(),
    ));

    Ok(cancel)
}

async fn poll_updates(
    bot: Bot,
    poll_timeout_secs: u32,
    state: SharedState,
    events: EventSender,
    cancel: CancellationToken,
) {
    info!(poll_timeout_secs, "starting telegram polling loop");
    let mut offset: i32 = 0;

    loop {
        let request = bot
            .get_updates()
            .offset(offset)
            .timeout(poll_timeout_secs)
            .allowed_updates(vec![AllowedUpdate::Message])
            .send();
        let result = tokio::select! {
            () = cancel.cancelled() => break,
            result = request => result,
        };

        match result {
            Ok(updates) => {
                debug!(count = updates.len(), "got telegram updates");
                for update in updates {
                    offset = update.id.as_offset();
                    match update.kind {
                        UpdateKind::Message(msg) => {
                            if let Err(e) = handlers::handle_message(&msg, &state, &events).await
                            {
                                error!(error = %e, "stopping telegram polling");
                                cancel.cancel();
                                break;
                            }
                        },
                        other => {
                            debug!("ignoring non-message update: {other:?}");
                        },
                    }
                }
                if cancel.is_cancelled() {
                    break;
                }
            },
            Err(RequestError::Api(ApiError::TerminatedByOtherGetUpdates)) => {
                warn!("telegram bot disabled: another instance is already running with this token");
                cancel.cancel();
                break;
            },
            Err(e) => {
                warn!(error = %e, "telegram getUpdates failed");
                tokio::select! {
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(POLL_ERROR_BACKOFF) => {},
                }
            },
        }
    }

    info!("telegram polling stopped");
}
