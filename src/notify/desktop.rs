// src/notify/desktop.rs
use std::process::Stdio;

use tokio::process::Command;

use super::{DispatchError, Notifier, NOTIFICATION_TITLE};
use crate::record::TournamentRecord;

/// Native desktop notification: `osascript` on macOS, `notify-send` elsewhere.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    title: String,
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self {
            title: NOTIFICATION_TITLE.to_string(),
        }
    }
}

impl DesktopNotifier {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    fn command(&self, message: &str) -> Command {
        if cfg!(target_os = "macos") {
            let script = format!(
                "display notification \"{}\" with title \"{}\"",
                applescript_escape(message),
                applescript_escape(&self.title)
            );
            let mut cmd = Command::new("osascript");
            cmd.arg("-e").arg(script);
            cmd
        } else {
            let mut cmd = Command::new("notify-send");
            cmd.arg("--app-name=padel-watch").arg(&self.title).arg(message);
            cmd
        }
    }
}

/// Quote-safe text for an AppleScript string literal.
pub(crate) fn applescript_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

#[async_trait::async_trait]
impl Notifier for DesktopNotifier {
    fn name(&self) -> &'static str {
        "desktop"
    }

    async fn notify(&self, record: &TournamentRecord) -> Result<(), DispatchError> {
        let output = self
            .command(&record.headline())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DispatchError::Delivery {
                channel: "desktop",
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(DispatchError::Delivery {
                channel: "desktop",
                reason: format!(
                    "{} {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(())
    }
}
