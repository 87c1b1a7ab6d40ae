//! Telegram chat transport

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

use inventory_bot_core::dto::reply::Reply;
use inventory_bot_core::services::transport::ChatTransport;
use shared_error::AppError;

pub struct TelegramTransport {
    http: Client,
    base_url: String,
    token: String,
}

impl TelegramTransport {
    pub fn new(token: impl Into<String>) -> Result<Self, AppError> {
        Self::with_base_url("https://api.telegram.org", token)
    }

    pub fn with_base_url(
        base_url: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send(&self, chat_id: i64, reply: Reply) -> Result<(), AppError> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.token);

        let mut body = json!({
            "chat_id": chat_id,
            "text": reply.text,
        });
        if !reply.buttons.is_empty() {
            let keyboard: Vec<Vec<serde_json::Value>> = reply
                .buttons
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| {
                            json!({ "text": button.label, "callback_data": button.callback })
                        })
                        .collect()
                })
                .collect();
            body["reply_markup"] = json!({ "inline_keyboard": keyboard });
        }

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("sendMessage failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalService(format!(
                "sendMessage returned {}: {}",
                status, detail
            )));
        }
        Ok(())
    }
}
