use crate::telegram::api::{self, Update};
use crate::telegram::client::TelegramClient;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use moviebot_core::{Dispatcher, EventKind};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

pub struct PollerOptions {
    pub poll_timeout_secs: u64,
    pub max_concurrent_updates: usize,
}

/// Long-polling loop feeding Bot API updates into the dispatcher
pub struct Poller {
    client: TelegramClient,
    dispatcher: Arc<Dispatcher>,
    options: PollerOptions,
}

/// Offset that acknowledges every update in `updates`
fn next_offset(current: i64, updates: &[Update]) -> i64 {
    updates
        .iter()
        .map(|u| u.update_id + 1)
        .max()
        .map_or(current, |next| next.max(current))
}

impl Poller {
    pub fn new(client: TelegramClient, dispatcher: Arc<Dispatcher>, options: PollerOptions) -> Self {
        Self {
            client,
            dispatcher,
            options,
        }
    }

    /// Poll until Ctrl-C. Poll failures are logged and retried after a pause.
    pub async fn run(&self) {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        })
        .await;
    }

    /// Poll until `shutdown` resolves. It is watched while polling and during the error
    /// back-off, and checked after each batch.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut offset = 0;
        info!(
            operation = "poller_started",
            poll_timeout_secs = self.options.poll_timeout_secs,
            max_concurrent_updates = self.options.max_concurrent_updates,
            "Polling for updates"
        );

        loop {
            let updates = tokio::select! {
                _ = &mut shutdown => break,
                result = self.client.get_updates(offset, self.options.poll_timeout_secs) => result,
            };

            let updates = match updates {
                Ok(updates) => updates,
                Err(e) => {
                    error!(operation = "poll_error", error = %e, "getUpdates failed");
                    tokio::select! {
                        _ = &mut shutdown => break,
                        _ = tokio::time::sleep(POLL_ERROR_BACKOFF) => continue,
                    }
                }
            };

            if updates.is_empty() {
                continue;
            }
            offset = next_offset(offset, &updates);
            debug!(count = updates.len(), offset = offset, "Received updates");

            // The offset already acknowledges this batch, so it runs to completion
            stream::iter(updates.iter())
                .for_each_concurrent(self.options.max_concurrent_updates.max(1), |update| {
                    self.process_update(update)
                })
                .await;
            if shutdown.as_mut().now_or_never().is_some() {
                break;
            }
        }

        info!(
            operation = "poller_stopped",
            active_users = self.dispatcher.sessions().active_users(),
            "Shutdown requested"
        );
    }

    async fn process_update(&self, update: &Update) {
        if let Some(query) = &update.callback_query {
            // Stops the client-side spinner even when the payload is ignored
            if let Err(e) = self.client.answer_callback_query(&query.id).await {
                warn!(update_id = update.update_id, error = %e, "answerCallbackQuery failed");
            }
        }

        let Some(event) = api::to_inbound(update) else {
            debug!(update_id = update.update_id, "Skipping unsupported update");
            return;
        };

        if !matches!(event.kind, EventKind::Callback(_)) {
            if let Err(e) = self.client.send_chat_action(event.chat_id, "typing").await {
                debug!(chat_id = event.chat_id, error = %e, "sendChatAction failed");
            }
        }

        let replies = self.dispatcher.handle(&event).await;
        for reply in &replies {
            if let Err(e) = self.client.send_reply(event.chat_id, reply).await {
                error!(
                    operation = "send_reply",
                    chat_id = event.chat_id,
                    user_id = event.user_id,
                    error = %e,
                    "Failed to deliver reply"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moviebot_config::TmdbConfig;
    use moviebot_core::{DispatcherOptions, SessionStore, SqliteWatchlistStore};
    use moviebot_sources::TmdbClient;
    use std::time::Instant;

    fn offline_poller() -> Poller {
        let dispatcher = Dispatcher::new(
            Arc::new(TmdbClient::new("test-key".to_string(), &TmdbConfig::default())),
            Arc::new(SqliteWatchlistStore::open_in_memory().unwrap()),
            Arc::new(SessionStore::new()),
            DispatcherOptions::default(),
        );
        // Port 9 on localhost refuses connections, so every poll fails fast
        let client = TelegramClient::with_base_url("http://127.0.0.1:9", "123:abc", 1);
        Poller::new(
            client,
            Arc::new(dispatcher),
            PollerOptions {
                poll_timeout_secs: 1,
                max_concurrent_updates: 2,
            },
        )
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_error_backoff() {
        let poller = offline_poller();
        let started = Instant::now();

        let stopped = tokio::time::timeout(
            Duration::from_secs(3),
            poller.run_until(tokio::time::sleep(Duration::from_millis(300))),
        )
        .await;

        assert!(stopped.is_ok(), "poller kept running after shutdown");
        assert!(started.elapsed() < POLL_ERROR_BACKOFF);
    }

    fn updates(ids: &[i64]) -> Vec<Update> {
        ids.iter()
            .map(|id| serde_json::from_value(serde_json::json!({ "update_id": id })).unwrap())
            .collect()
    }

    #[test]
    fn test_next_offset_acknowledges_highest_update() {
        assert_eq!(next_offset(0, &updates(&[7, 9, 8])), 10);
    }

    #[test]
    fn test_next_offset_never_goes_backwards() {
        assert_eq!(next_offset(20, &updates(&[3])), 20);
        assert_eq!(next_offset(20, &[]), 20);
    }
}
