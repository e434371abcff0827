// src/notify/mod.rs
//! Notification channels and the multiplexer that fans new tournaments out
//! to them. A failing channel never stops the others.

pub mod desktop;
pub mod email;
pub mod webhook;

use std::time::Duration;

use thiserror::Error;

use crate::record::{IdentityKey, TournamentRecord};

pub use desktop::DesktopNotifier;
pub use email::{EmailConfig, EmailNotifier};
pub use webhook::{WebhookFlavor, WebhookNotifier};

pub const NOTIFICATION_TITLE: &str = "Nouveau tournoi 4PADEL";
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{channel} is misconfigured: {reason}")]
    Config { channel: &'static str, reason: String },

    #[error("{channel} delivery failed: {reason}")]
    Delivery { channel: &'static str, reason: String },

    #[error("{channel} timed out after {timeout:?}")]
    Timeout { channel: &'static str, timeout: Duration },
}

/// One failed delivery. `key` is `None` for per-run digests.
#[derive(Debug)]
pub struct DispatchFailure {
    pub channel: &'static str,
    pub key: Option<IdentityKey>,
    pub error: DispatchError,
}

#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn notify(&self, record: &TournamentRecord) -> Result<(), DispatchError>;

    /// Channels that send one message per run instead of one per record.
    fn prefers_digest(&self) -> bool {
        false
    }

    async fn notify_digest(&self, records: &[TournamentRecord]) -> Result<(), DispatchError> {
        for r in records {
            self.notify(r).await?;
        }
        Ok(())
    }
}

/// Logs instead of delivering. Used for dry runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, record: &TournamentRecord) -> Result<(), DispatchError> {
        tracing::info!(target: "notify", tier = %record.tier, "{}", record.headline());
        Ok(())
    }
}

pub struct NotifierMux {
    channels: Vec<Box<dyn Notifier>>,
    timeout: Duration,
}

impl Default for NotifierMux {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl NotifierMux {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self {
            channels,
            timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn push(&mut self, channel: Box<dyn Notifier>) {
        self.channels.push(channel);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_names(&self) -> Vec<&'static str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    /// Deliver `records` on every channel, in order. Each call is bounded by
    /// the mux timeout; failures are logged and returned, never raised.
    pub async fn dispatch(&self, records: &[TournamentRecord]) -> Vec<DispatchFailure> {
        let mut failures = Vec::new();
        if records.is_empty() {
            return failures;
        }

        for ch in &self.channels {
            let channel = ch.name();
            if ch.prefers_digest() {
                let res = bounded(channel, self.timeout, ch.notify_digest(records)).await;
                if let Err(error) = res {
                    tracing::warn!(target: "notify", channel, error = %error, "digest failed");
                    failures.push(DispatchFailure {
                        channel,
                        key: None,
                        error,
                    });
                }
                continue;
            }

            for record in records {
                if let Err(error) = bounded(channel, self.timeout, ch.notify(record)).await {
                    tracing::warn!(
                        target: "notify",
                        channel,
                        key = %record.key,
                        error = %error,
                        "notification failed"
                    );
                    failures.push(DispatchFailure {
                        channel,
                        key: Some(record.key.clone()),
                        error,
                    });
                }
            }
        }
        failures
    }
}

async fn bounded<F>(channel: &'static str, timeout: Duration, fut: F) -> Result<(), DispatchError>
where
    F: std::future::Future<Output = Result<(), DispatchError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(res) => res,
        Err(_) => Err(DispatchError::Timeout { channel, timeout }),
    }
}
