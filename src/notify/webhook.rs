// src/notify/webhook.rs
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{DispatchError, Notifier, NOTIFICATION_TITLE};
use crate::record::TournamentRecord;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebhookFlavor {
    #[default]
    Slack,
    Discord,
}

/// Incoming-webhook channel (Slack `text`, Discord `content`).
#[derive(Clone)]
pub struct WebhookNotifier {
    url: String,
    flavor: WebhookFlavor,
    client: Client,
    timeout: Duration,
    max_retries: u8,
}

impl WebhookNotifier {
    pub fn new(url: String, flavor: WebhookFlavor) -> Self {
        Self {
            url,
            flavor,
            client: Client::new(),
            timeout: Duration::from_secs(5),
            max_retries: 3,
        }
    }

    fn payload(&self, record: &TournamentRecord) -> serde_json::Value {
        let mut text = format!("*{NOTIFICATION_TITLE}*\n{}", record.headline());
        if let Some(url) = &record.url {
            text.push_str(&format!("\n{url}"));
        }
        match self.flavor {
            WebhookFlavor::Slack => serde_json::json!({ "text": text }),
            WebhookFlavor::Discord => serde_json::json!({ "content": text.replace('*', "**") }),
        }
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn notify(&self, record: &TournamentRecord) -> Result<(), DispatchError> {
        let payload = self.payload(record);

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&self.url)
                .timeout(self.timeout)
                .json(&payload)
                .send()
                .await
                .and_then(|rsp| rsp.error_for_status());

            match res {
                Ok(_) => return Ok(()),
                Err(e) if attempt < self.max_retries => {
                    tracing::debug!(target: "notify", attempt, error = %e, "webhook retry");
                    tokio::time::sleep(Duration::from_millis(500u64 << (attempt - 1))).await;
                }
                Err(e) => {
                    return Err(DispatchError::Delivery {
                        channel: "webhook",
                        reason: e.to_string(),
                    })
                }
            }
        }
    }
}
