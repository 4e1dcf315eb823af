use std::path::PathBuf;
use std::time::Duration;

use bridge_protocol::BuildProfile;
use clap::{Parser, Subcommand};

use crate::routes::Action;

#[derive(Parser, Debug)]
#[command(
    name = "bridge-panel",
    version,
    about = "Status and lifecycle control for the bridge integration"
)]
pub struct Args {
    #[arg(long, default_value = "config/bridge-panel.toml")]
    pub config: PathBuf,
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub service: Option<String>,
    #[arg(long, default_value_t = false)]
    pub log_to_stderr: bool,
    #[arg(long)]
    pub log_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the panel once and print it.
    Status,
    /// Run one lifecycle or sync action (install, enable, disable,
    /// uninstall, sync, rescan, rebuild, export).
    Action {
        #[arg(value_parser = parse_action)]
        name: Action,
    },
    /// Request an artifact build.
    Build {
        #[arg(long, value_parser = parse_profile)]
        profile: BuildProfile,
    },
    /// Refresh on an interval until interrupted.
    Watch {
        #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
        interval: Duration,
    },
}

fn parse_action(value: &str) -> Result<Action, String> {
    value.parse::<Action>().map_err(|err| err.to_string())
}

fn parse_profile(value: &str) -> Result<BuildProfile, String> {
    value.parse::<BuildProfile>().map_err(|err| err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_subcommand() {
        let args = Args::try_parse_from(["bridge-panel", "action", "uninstall"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Action {
                name: Action::Uninstall
            }
        ));
        assert_eq!(args.config, PathBuf::from("config/bridge-panel.toml"));
    }

    #[test]
    fn rejects_unknown_action() {
        assert!(Args::try_parse_from(["bridge-panel", "action", "build"]).is_err());
    }

    #[test]
    fn parses_build_profile_and_overrides() {
        let args = Args::try_parse_from([
            "bridge-panel",
            "--base-url",
            "http://127.0.0.1:9000",
            "build",
            "--profile",
            "alpine-core+sonic",
        ])
        .unwrap();
        assert_eq!(args.base_url.as_deref(), Some("http://127.0.0.1:9000"));
        assert!(matches!(
            args.command,
            Command::Build {
                profile: BuildProfile::AlpineCoreSonic
            }
        ));
    }

    #[test]
    fn watch_interval_uses_humantime() {
        let args = Args::try_parse_from(["bridge-panel", "watch", "--interval", "1m"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Watch { interval } if interval == Duration::from_secs(60)
        ));
    }
}
