// ─── Command Line ───

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "tale-launcher", version, about = "Install, update and launch the game")]
pub struct Cli {
    /// Root under which the launcher and game directories live.
    #[arg(long, global = true, env = "TALE_LAUNCHER_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Release branch; defaults to the configured branch.
    #[arg(long, global = true, env = "TALE_LAUNCHER_BRANCH")]
    pub branch: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the versions available on the branch.
    Versions(VersionsArgs),
    /// Install or update if needed, then start the game.
    Launch(LaunchArgs),
    /// Print the offline identity for a player name.
    Identity(IdentityArgs),
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Debug, Args)]
pub struct VersionsArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct LaunchArgs {
    /// Player name; defaults to the last one used.
    #[arg(long)]
    pub name: Option<String>,
    /// Version number or `latest`.
    #[arg(long, default_value = "latest")]
    pub version: VersionSelector,
}

#[derive(Debug, Args)]
pub struct IdentityArgs {
    pub player: String,
}

#[derive(Debug, Subcommand)]
pub enum SettingsCommand {
    Get { key: String },
    /// `value` is parsed as JSON, falling back to a plain string.
    Set { key: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSelector {
    Latest,
    Number(u32),
}

impl FromStr for VersionSelector {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        if raw.eq_ignore_ascii_case("latest") {
            return Ok(VersionSelector::Latest);
        }
        match raw.parse::<u32>() {
            Ok(n) if n > 0 => Ok(VersionSelector::Number(n)),
            _ => Err(format!("expected a version number or `latest`, got `{raw}`")),
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn version_selector_parsing() {
        assert_eq!("latest".parse(), Ok(VersionSelector::Latest));
        assert_eq!("LATEST".parse(), Ok(VersionSelector::Latest));
        assert_eq!("12".parse(), Ok(VersionSelector::Number(12)));
        assert!("0".parse::<VersionSelector>().is_err());
        assert!("v3".parse::<VersionSelector>().is_err());
    }

    #[test]
    fn launch_defaults_to_latest() {
        let cli = Cli::try_parse_from(["tale-launcher", "launch", "--name", "Steve"]).unwrap();
        match cli.command {
            Command::Launch(args) => {
                assert_eq!(args.name.as_deref(), Some("Steve"));
                assert_eq!(args.version, VersionSelector::Latest);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "tale-launcher",
            "versions",
            "--json",
            "--branch",
            "beta",
            "--data-dir",
            "/tmp/tale",
        ])
        .unwrap();
        assert_eq!(cli.branch.as_deref(), Some("beta"));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/tale")));
        assert!(matches!(cli.command, Command::Versions(VersionsArgs { json: true })));
    }
}
