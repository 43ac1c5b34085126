//! Command handlers behind the two binaries.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use yanger_config::Settings;
use yanger_core::iw::Iw;
use yanger_core::{Context, Model};
use yanger_host::{CaptureHost, Host, LiveHost, ReplayHost};

use crate::cli::{Cli, GlobalOpts, IwCli, IwCommand};
use crate::error::CliError;
use crate::logging;
use crate::output::{print_output, render};

/// Load settings and install logging for a run.
fn prepare(global: &GlobalOpts) -> Result<Settings, CliError> {
    let settings = yanger_config::load(global.config.as_deref())?;
    logging::init(global.verbose, &settings.log, global.test_dir.is_some());
    Ok(settings)
}

/// Run `f` against the host selected by the command line.
fn with_host<T>(
    global: &GlobalOpts,
    settings: &Settings,
    capture: Option<&Path>,
    f: impl FnOnce(&dyn Host) -> T,
) -> Result<T, CliError> {
    if let Some(dir) = &global.test_dir {
        if !dir.is_dir() {
            return Err(CliError::TestDir {
                path: dir.display().to_string(),
            });
        }
        debug!(dir = %dir.display(), "replaying recorded input");
        return Ok(f(&ReplayHost::new(dir)));
    }

    let live = LiveHost::new(settings.host_timeouts())?;
    match capture {
        Some(dir) => {
            debug!(dir = %dir.display(), "capturing live input");
            Ok(f(&CaptureHost::new(live, dir)))
        }
        None => Ok(f(&live)),
    }
}

// ── yanger ───────────────────────────────────────────────────────────

pub fn collect(cli: &Cli) -> Result<(), CliError> {
    let settings = prepare(&cli.global)?;
    if cli.show_config {
        return print_output(settings.to_toml()?.trim_end());
    }

    let name = cli.model.as_deref().unwrap_or_default();
    let model = Model::from_name(name).map_err(|err| {
        warn!(model = %name, "unsupported model");
        CliError::from(err)
    })?;

    let libexec = settings.paths.libexec.clone();
    let value = with_host(&cli.global, &settings, cli.capture.as_deref(), |host| {
        let ctx = Context::new(host).with_libexec(libexec);
        yanger_core::collect(&ctx, model, cli.param.as_deref())
    })??;

    print_output(&render(&value, cli.compact)?)
}

// ── yanger-iw ────────────────────────────────────────────────────────

/// Result of one `iw` query as JSON.
pub fn iw_query(host: &dyn Host, command: &IwCommand) -> Result<Value, CliError> {
    let iw = Iw::new(host);
    let value = match command {
        IwCommand::List => serde_json::to_value(iw.list())?,
        IwCommand::Dev => serde_json::to_value(iw.devices())?,
        IwCommand::Info { device } if iw.is_phy(device) => serde_json::to_value(iw.phy(device))?,
        IwCommand::Info { device } => serde_json::to_value(iw.iface(device))?,
        IwCommand::Station { ifname } => serde_json::to_value(iw.stations(ifname))?,
        IwCommand::Survey { ifname } => serde_json::to_value(iw.survey(ifname))?,
        IwCommand::Link { ifname } => serde_json::to_value(iw.link(ifname))?,
    };
    Ok(value)
}

pub fn iw(cli: &IwCli) -> Result<(), CliError> {
    let settings = prepare(&cli.global)?;
    let value = with_host(&cli.global, &settings, None, |host| iw_query(host, &cli.command))??;
    print_output(&render(&value, false)?)
}
