use crate::telegram::api::{self, ApiResponse, Update, User};
use moviebot_core::Reply;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const API_BASE_URL: &str = "https://api.telegram.org";

/// Headroom on top of the long-poll timeout before the HTTP request gives up
const POLL_GRACE_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Thin Bot API client over HTTPS JSON calls
#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str, poll_timeout_secs: u64) -> Self {
        Self::with_base_url(API_BASE_URL, token, poll_timeout_secs)
    }

    pub fn with_base_url(api_base: &str, token: &str, poll_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .user_agent(concat!("moviebot/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(poll_timeout_secs + POLL_GRACE_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        }
    }

    async fn call<T>(&self, method: &str, body: &Value) -> Result<T, TelegramError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let response: ApiResponse<T> = self.client.post(&url).json(body).send().await?.json().await?;

        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => {
                let code = response.error_code.unwrap_or_default();
                let description = response
                    .description
                    .unwrap_or_else(|| "no description".to_string());
                warn!(method = method, code = code, description = %description, "Bot API call rejected");
                Err(TelegramError::Api { code, description })
            }
        }
    }

    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &json!({})).await
    }

    /// Polling and webhooks are exclusive; clear any webhook left behind
    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<bool, TelegramError> {
        self.call("deleteWebhook", &json!({ "drop_pending_updates": drop_pending_updates }))
            .await
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, TelegramError> {
        let body = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "callback_query"],
        });
        self.call("getUpdates", &body).await
    }

    pub async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<(), TelegramError> {
        let (method, body) = api::outbound_request(chat_id, reply);
        debug!(method = method, chat_id = chat_id, "Sending reply");
        let _: Value = self.call(method, &body).await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, callback_query_id: &str) -> Result<(), TelegramError> {
        let _: bool = self
            .call("answerCallbackQuery", &json!({ "callback_query_id": callback_query_id }))
            .await?;
        Ok(())
    }

    pub async fn send_chat_action(&self, chat_id: i64, action: &str) -> Result<(), TelegramError> {
        let _: bool = self
            .call("sendChatAction", &json!({ "chat_id": chat_id, "action": action }))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_is_part_of_base_url() {
        let client = TelegramClient::with_base_url("http://localhost:8081/", "123:abc", 30);
        assert_eq!(client.base_url, "http://localhost:8081/bot123:abc");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_http_error() {
        let client = TelegramClient::with_base_url("http://127.0.0.1:9", "123:abc", 1);
        let err = client.get_me().await.unwrap_err();
        assert!(matches!(err, TelegramError::Http(_) | TelegramError::Api { .. }));
    }
}
