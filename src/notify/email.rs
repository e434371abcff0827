// src/notify/email.rs
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};
use serde::{Deserialize, Serialize};

use super::{DispatchError, Notifier};
use crate::record::TournamentRecord;

pub const DEFAULT_EMAIL_CONFIG_PATH: &str = ".padel_email.json";
const DEFAULT_GREETING: &str = "Hey padelistos !";

/// `587` or `"587"`; hand-edited configs use both.
fn port_number_or_string<'de, D>(de: D) -> Result<u16, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(de)? {
        Port::Number(n) => Ok(n),
        Port::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("smtp_port \"{s}\" is not a port number"))),
    }
}

fn default_true() -> bool {
    true
}

/// Either `"a@x, b@y"` or `["a@x", "b@y"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    pub fn addresses(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            Recipients::One(s) => s.split(',').collect(),
            Recipients::Many(v) => v.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    #[serde(deserialize_with = "port_number_or_string")]
    pub smtp_port: u16,
    pub smtp_user: String,
    /// "ENV" means: read from SMTP_PASS.
    pub smtp_password: String,
    pub from_email: String,
    pub to_email: Recipients,
    /// Implicit TLS (usually port 465).
    #[serde(default)]
    pub use_ssl: bool,
    /// STARTTLS upgrade; ignored when `use_ssl` is set.
    #[serde(default = "default_true")]
    pub use_tls: bool,
    #[serde(default)]
    pub greeting: Option<String>,
}

impl EmailConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading email config {}", path.display()))?;
        let mut cfg: EmailConfig = serde_json::from_str(&data)
            .with_context(|| format!("parsing email config {}", path.display()))?;

        if cfg.smtp_password.trim().eq_ignore_ascii_case("env") {
            cfg.smtp_password = std::env::var("SMTP_PASS")
                .map_err(|_| anyhow!("smtp_password is \"ENV\" but SMTP_PASS is not set"))?;
        }
        if cfg.smtp_host.trim().is_empty() {
            bail!("smtp_host is empty");
        }
        if cfg.to_email.addresses().is_empty() {
            bail!("to_email has no recipients");
        }
        Ok(cfg)
    }

    pub fn greeting(&self) -> &str {
        self.greeting
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .unwrap_or(DEFAULT_GREETING)
    }
}

/// Subject and body for a single new tournament.
pub fn compose_single(greeting: &str, record: &TournamentRecord, page_url: &str) -> (String, String) {
    let subject = format!("Nouveau tournoi 4PADEL: {} {}", record.tier, record.nom);
    let body = format!("{greeting}\n\n{}\n\nPage: {page_url}", record.headline());
    (subject, body)
}

/// One digest per run: evening tournaments first, then all new ones.
pub fn compose_digest(
    greeting: &str,
    records: &[TournamentRecord],
    tiers_label: &str,
    page_url: &str,
) -> (String, String) {
    let subject = format!(
        "{} nouveau(x) tournoi(x) 4PADEL ({tiers_label})",
        records.len()
    );

    let section = |lines: Vec<String>| -> Vec<String> {
        if lines.is_empty() {
            vec!["(aucun)".to_string()]
        } else {
            lines.into_iter().map(|l| format!("- {l}")).collect()
        }
    };
    let evening = records
        .iter()
        .filter(|r| r.is_evening())
        .map(TournamentRecord::headline)
        .collect();
    let all = records.iter().map(TournamentRecord::headline).collect();

    let mut out = vec![greeting.to_string(), String::new(), "Tournois en soirée:".into()];
    out.extend(section(evening));
    out.push(String::new());
    out.push("Tous les nouveaux:".into());
    out.extend(section(all));
    out.push(String::new());
    out.push(format!("Page: {page_url}"));
    (subject, out.join("\n"))
}

pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
    greeting: String,
    page_url: String,
    tiers_label: String,
    batch: bool,
}

impl EmailNotifier {
    pub fn from_config(cfg: &EmailConfig, page_url: &str, tiers_label: &str, batch: bool) -> Result<Self> {
        let host = cfg.smtp_host.trim();
        let builder = if cfg.use_ssl {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host).context("invalid smtp_host")?
        } else if cfg.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).context("invalid smtp_host")?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };
        let mailer = builder
            .port(cfg.smtp_port)
            .credentials(Credentials::new(
                cfg.smtp_user.clone(),
                cfg.smtp_password.clone(),
            ))
            .build();

        let from = cfg.from_email.parse().context("invalid from_email")?;
        let to = cfg
            .to_email
            .addresses()
            .iter()
            .map(|a| a.parse::<Mailbox>().with_context(|| format!("invalid recipient {a}")))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            mailer,
            from,
            to,
            greeting: cfg.greeting().to_string(),
            page_url: page_url.to_string(),
            tiers_label: tiers_label.to_string(),
            batch,
        })
    }

    async fn send(&self, subject: String, body: String) -> Result<(), DispatchError> {
        let mut builder = Message::builder().from(self.from.clone());
        for to in &self.to {
            builder = builder.to(to.clone());
        }
        let msg = builder
            .subject(subject.clone())
            .header(header::ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| DispatchError::Config {
                channel: "email",
                reason: e.to_string(),
            })?;

        self.mailer
            .send(msg)
            .await
            .map_err(|e| DispatchError::Delivery {
                channel: "email",
                reason: e.to_string(),
            })?;
        tracing::info!(target: "notify", %subject, "email sent");
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    fn name(&self) -> &'static str {
        "email"
    }

    async fn notify(&self, record: &TournamentRecord) -> Result<(), DispatchError> {
        let (subject, body) = compose_single(&self.greeting, record, &self.page_url);
        self.send(subject, body).await
    }

    fn prefers_digest(&self) -> bool {
        self.batch
    }

    async fn notify_digest(&self, records: &[TournamentRecord]) -> Result<(), DispatchError> {
        let (subject, body) = compose_digest(&self.greeting, records, &self.tiers_label, &self.page_url);
        self.send(subject, body).await
    }
}
