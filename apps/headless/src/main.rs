//! Headless host for the panel runtime.
//!
//! Runs the full decision loop against a simulated display. Panel commands
//! and published snapshots go to the log; stdin drives the pointer:
//!
//! ```text
//! enter | leave | drag | release | countdown | cancel | refresh <signal> | quit
//! ```
//!
//! Usage: `perch-headless [config.json]`

mod config;
mod host;
mod sources;

use config::HeadlessConfig;
use host::{LoggingPanelController, SimulatedScreen};
use perch_arbiter::{CommandProvider, SourceArbiter, DEFAULT_FALLBACK_TIMEOUT};
use perch_events::TracingEventBus;
use perch_metrics::{
    NetworkFetcher, StatsFetcher, SysinfoReader, TcpLatencyProbe, DEFAULT_PROBE_TIMEOUT,
};
use perch_refresh::SignalKind;
use perch_runtime::{init_tracing, PanelRuntimeBuilder, Result, RuntimeHandle};
use sources::JsonCommandFetcher;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostCommand {
    Enter,
    Leave,
    Drag,
    Release,
    StartCountdown,
    CancelCountdown,
    Refresh(SignalKind),
    Quit,
}

fn parse_command(line: &str) -> Option<HostCommand> {
    let mut words = line.split_whitespace();
    let command = match words.next()? {
        "enter" => HostCommand::Enter,
        "leave" => HostCommand::Leave,
        "drag" => HostCommand::Drag,
        "release" => HostCommand::Release,
        "countdown" => HostCommand::StartCountdown,
        "cancel" => HostCommand::CancelCountdown,
        "refresh" => {
            let name = words.next()?;
            let kind = SignalKind::ALL.into_iter().find(|k| k.label() == name)?;
            HostCommand::Refresh(kind)
        }
        "quit" | "exit" => HostCommand::Quit,
        _ => return None,
    };
    Some(command)
}

fn build_arbiter(config: &HeadlessConfig) -> SourceArbiter {
    let mut arbiter = SourceArbiter::new();
    for spec in &config.media_sources {
        arbiter = arbiter.with_provider(Arc::new(CommandProvider::new(spec.clone())));
    }
    if let Some(spec) = &config.fallback_media {
        arbiter = arbiter.with_fallback(
            Arc::new(CommandProvider::new(spec.clone())),
            DEFAULT_FALLBACK_TIMEOUT,
        );
    }
    arbiter
}

fn spawn_runtime(config: &HeadlessConfig, screen: Arc<SimulatedScreen>) -> RuntimeHandle {
    let reader = Arc::new(SysinfoReader::new());

    let mut network = NetworkFetcher::new(reader.clone());
    if let Some(addr) = &config.probe_addr {
        network = network.with_probe(Arc::new(TcpLatencyProbe::new(
            addr.clone(),
            DEFAULT_PROBE_TIMEOUT,
        )));
    }

    let mut builder = PanelRuntimeBuilder::new(screen, Arc::new(LoggingPanelController))
        .with_config(config.panel.clone())
        .with_event_bus(Arc::new(TracingEventBus))
        .with_media(build_arbiter(config))
        .with_fetcher(SignalKind::Stats, Arc::new(StatsFetcher::new(reader)))
        .with_fetcher(SignalKind::Network, Arc::new(network));

    if let Some(spec) = &config.weather_command {
        builder = builder.with_fetcher(
            SignalKind::Weather,
            Arc::new(JsonCommandFetcher::weather(spec.clone())),
        );
    }
    if let Some(spec) = &config.calendar_command {
        builder = builder.with_fetcher(
            SignalKind::Calendar,
            Arc::new(JsonCommandFetcher::calendar(spec.clone())),
        );
    }

    builder.spawn()
}

fn apply(command: HostCommand, screen: &SimulatedScreen, handle: &RuntimeHandle) -> Result<()> {
    match command {
        HostCommand::Enter => screen.set_pointer(screen.zone_point(), false),
        HostCommand::Leave => screen.set_pointer(screen.away_point(), false),
        HostCommand::Drag => screen.set_pointer(screen.away_point(), true),
        HostCommand::Release => screen.set_pointer(screen.away_point(), false),
        HostCommand::StartCountdown => handle.start_countdown()?,
        HostCommand::CancelCountdown => handle.cancel_countdown()?,
        HostCommand::Refresh(kind) => handle.force_refresh(kind)?,
        HostCommand::Quit => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let path = std::env::args().nth(1).map(PathBuf::from);
    let config = HeadlessConfig::load(path.as_deref())?;
    tracing::info!(config = ?path, "starting headless panel");

    let screen = Arc::new(SimulatedScreen::new(&config.display));
    let handle = spawn_runtime(&config, screen.clone());

    let mut snapshots = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                match serde_json::to_string(&*snapshot) {
                    Ok(json) => tracing::info!(snapshot = %json, "published"),
                    Err(e) => tracing::warn!(error = %e, "failed to encode snapshot"),
                }
            }
            line = lines.next_line(), if stdin_open => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        stdin_open = false;
                        continue;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "stdin closed");
                        stdin_open = false;
                        continue;
                    }
                };
                match parse_command(&line) {
                    Some(HostCommand::Quit) => break,
                    Some(command) => apply(command, &screen, &handle)?,
                    None if line.trim().is_empty() => {}
                    None => tracing::warn!(input = %line.trim(), "unknown command"),
                }
            }
        }
    }

    handle.shutdown().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use perch_arbiter::CommandSpec;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("enter"), Some(HostCommand::Enter));
        assert_eq!(parse_command("  leave "), Some(HostCommand::Leave));
        assert_eq!(
            parse_command("refresh weather"),
            Some(HostCommand::Refresh(SignalKind::Weather))
        );
        assert_eq!(parse_command("refresh"), None);
        assert_eq!(parse_command("refresh tides"), None);
        assert_eq!(parse_command("dance"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_build_arbiter_keeps_source_order() {
        let spec = |name: &str| CommandSpec {
            name: name.to_string(),
            program: "true".to_string(),
            args: Vec::new(),
        };
        let config = HeadlessConfig {
            media_sources: vec![spec("Music"), spec("Browser")],
            fallback_media: Some(spec("System")),
            ..Default::default()
        };
        let arbiter = build_arbiter(&config);
        let names: Vec<_> = arbiter.providers().iter().map(|p| p.name().to_string()).collect();
        assert_eq!(names, vec!["Music", "Browser"]);
    }
}
