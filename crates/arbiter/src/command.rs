//! Media provider backed by an external command.
//!
//! The command prints one line:
//!
//! ```text
//! state|title|artist|position|duration|artwork
//! ```
//!
//! `state` is `playing`, `paused` or `stopped`. Everything after the title
//! is optional. Empty output or `stopped` means nothing is loaded.

use crate::provider::MediaProvider;
use crate::snapshot::{MediaSnapshot, ProviderResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// How to launch a command provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// Label reported as the snapshot's source.
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Runs a command and parses its now-playing line.
#[derive(Debug, Clone)]
pub struct CommandProvider {
    spec: CommandSpec,
}

impl CommandProvider {
    pub fn new(spec: CommandSpec) -> Self {
        Self { spec }
    }

    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.spec.program);
        cmd.args(&self.spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // Dropping the future on timeout or cancel kills the child.
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl MediaProvider for CommandProvider {
    fn name(&self) -> &str {
        &self.spec.name
    }

    async fn attempt(&self, cancel: &CancellationToken) -> ProviderResult {
        let mut cmd = self.build_command();
        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return ProviderResult::Failed("cancelled".to_string()),
            output = cmd.output() => output,
        };

        let output = match output {
            Ok(output) => output,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return ProviderResult::Failed(format!("command not found: {}", self.spec.program));
            }
            Err(e) => return ProviderResult::Failed(e.to_string()),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return ProviderResult::Failed(reason);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_line(&self.spec.name, &stdout)
    }
}

/// Parse the first non-empty line of command output.
pub fn parse_line(source: &str, stdout: &str) -> ProviderResult {
    let Some(line) = stdout.lines().map(str::trim).find(|l| !l.is_empty()) else {
        return ProviderResult::Empty;
    };

    let mut fields = line.split('|').map(str::trim);
    let is_playing = match fields.next().map(str::to_ascii_lowercase).as_deref() {
        Some("playing") => true,
        Some("paused") => false,
        Some("stopped") => return ProviderResult::Empty,
        Some(other) => return ProviderResult::Failed(format!("unknown state: {other}")),
        None => return ProviderResult::Empty,
    };

    let title = match fields.next() {
        Some(title) if !title.is_empty() => title,
        _ => return ProviderResult::Empty,
    };

    let mut snapshot = MediaSnapshot::new(source, title, is_playing);

    if let Some(artist) = fields.next().filter(|a| !a.is_empty()) {
        snapshot = snapshot.with_artist(artist);
    }

    let position = fields.next().and_then(|p| p.parse::<f64>().ok());
    let duration = fields.next().and_then(|d| d.parse::<f64>().ok());
    if let (Some(position), Some(duration)) = (position, duration) {
        snapshot = snapshot.with_progress(position, duration);
    }

    if let Some(artwork) = fields.next().filter(|a| !a.is_empty()) {
        snapshot = snapshot.with_artwork(artwork);
    }

    ProviderResult::Success(snapshot)
}
