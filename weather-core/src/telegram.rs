//! Telegram Bot API transport: long polling for updates, sending the report
//! text and photo back out.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::model::WeatherReport;
use crate::report::Reporter;

const TELEGRAM_API_URL: &str = "https://api.telegram.org";
/// Long-poll timeout passed to getUpdates.
const POLL_TIMEOUT_SECS: u64 = 30;
/// Pause before retrying after a failed getUpdates call.
const POLL_RETRY_SECS: u64 = 5;

/// The delivery seam: the pipeline only ever needs these two calls.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()>;
    async fn send_photo(&self, chat_id: &str, photo_url: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone)]
pub struct TelegramBot {
    token: String,
    http: Client,
    base_url: String,
}

impl TelegramBot {
    pub fn new(token: String) -> Self {
        Self::with_base_url(token, TELEGRAM_API_URL.to_string())
    }

    /// Same as [`TelegramBot::new`] but against a custom endpoint. Used by tests.
    pub fn with_base_url(token: String, base_url: String) -> Self {
        Self { token, http: Client::new(), base_url }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &serde_json::Value,
    ) -> Result<T> {
        let res = self.http.post(self.method_url(method)).json(params).send().await?;

        let status = res.status();
        let body: ApiResponse<T> = res
            .json()
            .await
            .map_err(|_| Error::Delivery(format!("unreadable response from {method}")))?;

        if !status.is_success() || !body.ok {
            let description = body
                .description
                .unwrap_or_else(|| format!("{method} failed with status {status}"));
            return Err(Error::Delivery(description));
        }

        body.result.ok_or_else(|| Error::Delivery(format!("{method} returned no result")))
    }

    /// Fetch updates after `offset`, long-polling for up to
    /// [`POLL_TIMEOUT_SECS`] when none are pending.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": POLL_TIMEOUT_SECS,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }
}

#[async_trait]
impl Messenger for TelegramBot {
    async fn send_text(&self, chat_id: &str, text: &str) -> Result<()> {
        let _: serde_json::Value =
            self.call("sendMessage", &json!({ "chat_id": chat_id, "text": text })).await?;
        Ok(())
    }

    async fn send_photo(&self, chat_id: &str, photo_url: &str) -> Result<()> {
        // Photos are always passed by URL, never raw bytes.
        let _: serde_json::Value =
            self.call("sendPhoto", &json!({ "chat_id": chat_id, "photo": photo_url })).await?;
        Ok(())
    }
}

/// Send one report: text first, then the photo. Stops at the first failure,
/// so a failed message never leaves an orphaned photo behind.
pub async fn deliver(
    messenger: &dyn Messenger,
    chat_id: &str,
    report: &WeatherReport,
) -> Result<()> {
    messenger.send_text(chat_id, &report.info).await?;
    messenger.send_photo(chat_id, &report.photo).await?;
    Ok(())
}

/// Long-polling update loop. Each incoming text message is treated as a place
/// name; updates are handled to completion, one at a time. Delivery failures
/// are logged and the loop keeps going.
pub async fn run_bot(bot: &TelegramBot, reporter: &Reporter) -> Result<()> {
    tracing::info!("starting Telegram long-polling loop");

    let mut offset = 0i64;
    loop {
        let updates = match bot.get_updates(offset).await {
            Ok(updates) => updates,
            Err(err) => {
                tracing::warn!(error = %err, "getUpdates failed, retrying");
                tokio::time::sleep(Duration::from_secs(POLL_RETRY_SECS)).await;
                continue;
            }
        };

        for update in updates {
            offset = offset.max(update.update_id + 1);

            let Some(message) = update.message else { continue };
            let Some(text) = message.text else { continue };

            let chat_id = message.chat.id.to_string();
            tracing::info!(%chat_id, place = %text, "handling update");

            let report = reporter.build_report(text.trim()).await;
            if let Err(err) = deliver(bot, &chat_id, &report).await {
                tracing::error!(%chat_id, error = %err, "delivery failed");
            }
        }
    }
}
