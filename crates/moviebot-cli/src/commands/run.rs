use crate::output::Output;
use crate::telegram::{Poller, PollerOptions, TelegramClient};
use color_eyre::eyre::Context;
use color_eyre::Result;
use moviebot_core::{Dispatcher, DispatcherOptions, SessionStore, SqliteWatchlistStore};
use moviebot_sources::TmdbClient;
use std::sync::Arc;
use tracing::info;

pub async fn run_bot(output: &Output) -> Result<()> {
    let (_, settings) = super::load_settings()?;

    // Both secrets are checked before the first update is accepted
    let tmdb_api_key = settings.require_tmdb_api_key()?.to_string();
    let bot_token = settings.require_bot_token()?.to_string();

    let store = SqliteWatchlistStore::open(&settings.db_path)
        .with_context(|| format!("Failed to open watchlist database at {}", settings.db_path.display()))?;
    info!(operation = "store_opened", path = %settings.db_path.display(), "Watchlist store ready");

    let bot = &settings.config.bot;
    let metadata = TmdbClient::new(tmdb_api_key, &settings.config.tmdb);
    let dispatcher = Dispatcher::new(
        Arc::new(metadata),
        Arc::new(store),
        Arc::new(SessionStore::new()),
        DispatcherOptions {
            default_region: bot.default_region.clone(),
            results_limit: bot.results_limit,
        },
    );

    let client = TelegramClient::new(&bot_token, bot.poll_timeout_secs);
    let me = client.get_me().await.context("Bot token was rejected by the Bot API")?;
    client
        .delete_webhook(false)
        .await
        .context("Failed to clear webhook before polling")?;

    let username = me.username.unwrap_or_else(|| me.id.to_string());
    info!(
        operation = "bot_started",
        bot = %username,
        default_region = %bot.default_region,
        "Bot started"
    );
    output.success(format!("Bot @{} is running (Ctrl-C to stop)", username));

    let poller = Poller::new(
        client,
        Arc::new(dispatcher),
        PollerOptions {
            poll_timeout_secs: bot.poll_timeout_secs,
            max_concurrent_updates: bot.max_concurrent_updates,
        },
    );
    poller.run().await;

    output.info("Bot stopped");
    Ok(())
}
