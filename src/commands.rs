use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use crate::cli::{
    Cli, Command, IdentityArgs, LaunchArgs, SettingsCommand, VersionSelector, VersionsArgs,
};
use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::events::{ChannelSink, LauncherEvent};
use crate::core::state::AppState;
use crate::core::version::GameVersion;

/// Execute one parsed command line.
pub async fn execute(cli: Cli) -> LauncherResult<()> {
    let config = LauncherConfig::load(cli.data_dir.clone());
    let (sink, rx) = ChannelSink::new();
    let printer = spawn_event_printer(rx);

    let state = AppState::new(config, Arc::new(sink))?;
    let branch = state.branch(cli.branch.as_deref());
    let result = match cli.command {
        Command::Versions(args) => list_versions(&state, &branch, args).await,
        Command::Launch(args) => launch(&state, &branch, args).await,
        Command::Identity(args) => print_identity(&state, args),
        Command::Settings(cmd) => settings(&state, cmd),
    };

    // Dropping the state closes the event channel and lets the printer finish.
    drop(state);
    let _ = printer.await;
    result
}

async fn list_versions(state: &AppState, branch: &str, args: VersionsArgs) -> LauncherResult<()> {
    let versions = state.launcher.available_versions(branch).await;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }
    for version in &versions {
        if version.is_latest {
            println!("{} ({})", version.name, version.version);
        } else {
            println!("{}", version.name);
        }
    }
    Ok(())
}

async fn launch(state: &AppState, branch: &str, args: LaunchArgs) -> LauncherResult<()> {
    let player = match args.name.or_else(|| state.last_player()) {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => {
            return Err(LauncherError::Other(
                "No player name given; pass --name".into(),
            ))
        }
    };
    state.remember_player(&player);

    let versions = state.launcher.available_versions(branch).await;
    let version = select_version(&versions, args.version)?;
    info!("Launching {} as {}", version.name, player);

    let pid = state.launcher.launch(&player, &version).await?;
    println!("{pid}");
    Ok(())
}

fn print_identity(state: &AppState, args: IdentityArgs) -> LauncherResult<()> {
    println!("{}", state.launcher.identities().resolve(&args.player));
    Ok(())
}

fn settings(state: &AppState, cmd: SettingsCommand) -> LauncherResult<()> {
    match cmd {
        SettingsCommand::Get { key } => {
            let value = state.settings.get(&key, Value::Null);
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        SettingsCommand::Set { key, value } => {
            state.settings.set(&key, parse_setting_value(&value));
        }
    }
    Ok(())
}

/// Pick the requested entry out of a discovered list.
pub fn select_version(
    versions: &[GameVersion],
    selector: VersionSelector,
) -> LauncherResult<GameVersion> {
    let found = match selector {
        VersionSelector::Latest => versions
            .iter()
            .find(|v| v.is_latest)
            .or_else(|| versions.iter().max_by_key(|v| v.version)),
        VersionSelector::Number(n) => versions.iter().find(|v| !v.is_latest && v.version == n),
    };
    found.cloned().ok_or_else(|| match selector {
        VersionSelector::Latest => LauncherError::Other("No versions available".into()),
        VersionSelector::Number(n) => {
            LauncherError::Other(format!("Version {n} is not available on this branch"))
        }
    })
}

fn parse_setting_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Statuses as lines on stderr, progress as an in-place percentage.
fn spawn_event_printer(mut rx: mpsc::UnboundedReceiver<LauncherEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut last_percent: Option<u32> = None;
        while let Some(event) = rx.recv().await {
            match event {
                LauncherEvent::Status { status } => {
                    if last_percent.take().is_some() {
                        eprintln!();
                    }
                    eprintln!("{status}");
                }
                LauncherEvent::Progress { percent } => {
                    let percent = percent.round() as u32;
                    if last_percent != Some(percent) {
                        eprint!("\r{percent:>3}%");
                        last_percent = Some(percent);
                    }
                }
            }
        }
        if last_percent.is_some() {
            eprintln!();
        }
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::core::version::build_version_list;

    #[test]
    fn latest_selects_flagged_entry() {
        let versions = build_version_list("release", 4);
        let chosen = select_version(&versions, VersionSelector::Latest).unwrap();
        assert!(chosen.is_latest);
        assert_eq!(chosen.version, 4);
    }

    #[test]
    fn numbered_selection_skips_latest_alias() {
        let versions = build_version_list("release", 4);
        let chosen = select_version(&versions, VersionSelector::Number(4)).unwrap();
        assert!(!chosen.is_latest);
        assert_eq!(chosen.name, "Version 4");
        assert!(select_version(&versions, VersionSelector::Number(9)).is_err());
    }

    #[test]
    fn fallback_list_serves_latest_only() {
        let versions = build_version_list("release", 0);
        assert_eq!(
            select_version(&versions, VersionSelector::Latest).unwrap(),
            GameVersion::latest(1, "release")
        );
        assert!(select_version(&versions, VersionSelector::Number(1)).is_err());
    }

    #[test]
    fn setting_values_accept_json_or_text() {
        assert_eq!(parse_setting_value("true"), json!(true));
        assert_eq!(parse_setting_value("{\"a\":1}"), json!({ "a": 1 }));
        assert_eq!(parse_setting_value("EN"), json!("EN"));
    }
}
