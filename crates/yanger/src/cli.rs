//! Clap derive structures for the `yanger` and `yanger-iw` binaries.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

const MODELS: &str = "Models:
  ietf-interfaces       interfaces, addresses and type-specific state (-p <ifname>)
  ietf-routing          IPv4/IPv6 RIBs from frr
  ietf-ospf             OSPFv2 areas, interfaces, neighbors and local RIB
  ietf-rip              RIP interfaces, neighbors and learned routes
  ietf-bfd-ip-sh        single-hop BFD sessions
  ietf-hardware         board, VPD, USB, sensors, wifi radios and GPS receivers
  ietf-system           hostname, users, clock, platform, software, DNS, resources
  ietf-ntp              chrony clock state, associations and server counters
  ieee802-dot1ab-lldp   LLDP neighbors per port
  infix-containers      podman containers
  infix-dhcp-server     dnsmasq leases and packet counters
  infix-firewall        firewalld zones, policies and services";

// ── yanger ───────────────────────────────────────────────────────────

/// yanger -- operational state as YANG-modeled JSON
#[derive(Debug, Parser)]
#[command(
    name = "yanger",
    version,
    about = "Collect the operational state of this device as YANG-modeled JSON",
    after_help = MODELS,
    arg_required_else_help = true
)]
pub struct Cli {
    /// YANG module to collect, e.g. ietf-interfaces
    #[arg(value_name = "MODEL", required_unless_present = "show_config")]
    pub model: Option<String>,

    /// Model-specific parameter (e.g. interface name)
    #[arg(short = 'p', long = "param", value_name = "PARAM")]
    pub param: Option<String>,

    #[command(flatten)]
    pub global: GlobalOpts,

    /// Also write every command output and file read into DIR (replayable with -t)
    #[arg(long, value_name = "DIR", conflicts_with = "test_dir")]
    pub capture: Option<PathBuf>,

    /// Print single-line JSON
    #[arg(long)]
    pub compact: bool,

    /// Print the effective settings as TOML and exit
    #[arg(long)]
    pub show_config: bool,
}

// ── Shared options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Replay from a recorded-input directory instead of the live system
    #[arg(short = 't', long = "test", value_name = "DIR")]
    pub test_dir: Option<PathBuf>,

    /// Settings file
    #[arg(long, value_name = "FILE", env = "YANGER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

// ── yanger-iw ────────────────────────────────────────────────────────

/// yanger-iw -- wireless PHY and interface state as JSON
#[derive(Debug, Parser)]
#[command(
    name = "yanger-iw",
    version,
    about = "Structured JSON view of iw output",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct IwCli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: IwCommand,
}

#[derive(Debug, Subcommand)]
pub enum IwCommand {
    /// List PHY names
    List,
    /// Map PHY index to interface names
    Dev,
    /// Detail of a PHY or an interface
    Info {
        /// PHY (phy0, radio0) or interface name
        device: String,
    },
    /// Stations associated with an AP interface
    Station { ifname: String },
    /// Channel survey of an interface
    Survey { ifname: String },
    /// Station-mode link state of an interface
    Link { ifname: String },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn definitions_are_consistent() {
        Cli::command().debug_assert();
        IwCli::command().debug_assert();
    }

    #[test]
    fn parses_model_and_flags() {
        let cli =
            Cli::try_parse_from(["yanger", "ietf-interfaces", "-p", "e1", "-t", "/tmp/rec", "-vv"])
                .unwrap();
        assert_eq!(cli.model.as_deref(), Some("ietf-interfaces"));
        assert_eq!(cli.param.as_deref(), Some("e1"));
        assert_eq!(cli.global.test_dir, Some(PathBuf::from("/tmp/rec")));
        assert_eq!(cli.global.verbose, 2);
    }

    #[test]
    fn capture_conflicts_with_replay() {
        assert!(Cli::try_parse_from(["yanger", "ietf-ntp", "-t", "a", "--capture", "b"]).is_err());
    }

    #[test]
    fn show_config_needs_no_model() {
        assert!(Cli::try_parse_from(["yanger", "--show-config"]).is_ok());
    }
}
