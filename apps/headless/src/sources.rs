//! Weather and calendar signals backed by external commands that print
//! JSON on stdout.

use async_trait::async_trait;
use perch_arbiter::CommandSpec;
use perch_refresh::{
    CalendarEntry, FetchError, FetchResult, SignalFetcher, SignalKind, SignalValue, WeatherReport,
};
use std::process::Stdio;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Runs a command and decodes its stdout as the value for one signal.
pub struct JsonCommandFetcher {
    kind: SignalKind,
    spec: CommandSpec,
}

impl JsonCommandFetcher {
    pub fn weather(spec: CommandSpec) -> Self {
        Self {
            kind: SignalKind::Weather,
            spec,
        }
    }

    pub fn calendar(spec: CommandSpec) -> Self {
        Self {
            kind: SignalKind::Calendar,
            spec,
        }
    }
}

#[async_trait]
impl SignalFetcher for JsonCommandFetcher {
    async fn fetch(&self, cancel: CancellationToken) -> FetchResult<SignalValue> {
        let mut cmd = Command::new(&self.spec.program);
        cmd.args(&self.spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            output = cmd.output() => output,
        };
        let output = output.map_err(|e| FetchError::failed(format!("{}: {e}", self.spec.name)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(FetchError::failed(format!(
                "{} exited with {}: {stderr}",
                self.spec.name, output.status
            )));
        }

        parse_value(self.kind, &String::from_utf8_lossy(&output.stdout))
    }
}

/// Decode command output for `kind`.
pub fn parse_value(kind: SignalKind, stdout: &str) -> FetchResult<SignalValue> {
    let stdout = stdout.trim();
    let decoded = match kind {
        SignalKind::Weather => {
            serde_json::from_str::<WeatherReport>(stdout).map(SignalValue::Weather)
        }
        SignalKind::Calendar => {
            serde_json::from_str::<Vec<CalendarEntry>>(stdout).map(SignalValue::Calendar)
        }
        other => return Err(FetchError::failed(format!("{other} is not command-backed"))),
    };
    decoded.map_err(|e| FetchError::failed(format!("invalid {kind} output: {e}")))
}
