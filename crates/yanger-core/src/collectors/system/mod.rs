//! `ietf-system` configuration echo and operational state.
//!
//! `ietf-system:system` carries what the device reports about itself
//! (hostname, users with a usable password, timezone). The
//! `ietf-system:system-state` tree carries platform, clock, software, NTP
//! source summary, DNS resolver and resource usage.

pub mod dns;
pub mod software;

use chrono::Duration;
use serde::Serialize;
use tracing::debug;

use crate::collectors::ntp;
use crate::common::number::{float, key_value, key_values, leading_int};
use crate::common::time::{since, yang_date};
use crate::context::Context;
use crate::yang::Decimal;

use self::dns::Resolver;
use self::software::Software;

const ZONEINFO: [&str; 3] = [
    "/usr/share/zoneinfo/posix/",
    "/usr/share/zoneinfo/right/",
    "/usr/share/zoneinfo/",
];

// ── ietf-system:system ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Authentication {
    pub user: Vec<User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Timezone {
    #[serde(rename = "timezone-name")]
    Name(String),
    #[serde(rename = "timezone-utc-offset")]
    UtcOffset(i32),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SystemConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication: Option<Authentication>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock: Option<Timezone>,
}

// ── ietf-system:system-state ────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Platform {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub machine: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Clock {
    pub current_datetime: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_datetime: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NtpSource {
    pub address: String,
    pub mode: &'static str,
    pub state: &'static str,
    pub stratum: u8,
    pub poll: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NtpSources {
    pub source: Vec<NtpSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NtpSummary {
    pub sources: NtpSources,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Memory {
    pub total: u64,
    pub free: u64,
    pub available: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LoadAverage {
    #[serde(rename = "load-1min")]
    pub load_1min: Decimal,
    #[serde(rename = "load-5min")]
    pub load_5min: Decimal,
    #[serde(rename = "load-15min")]
    pub load_15min: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Filesystem {
    pub mount_point: String,
    pub size: u64,
    pub used: u64,
    pub available: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResourceUsage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<Memory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub load_average: Option<LoadAverage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filesystem: Vec<Filesystem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<Platform>,
    pub clock: Clock,
    #[serde(rename = "infix-system:software", skip_serializing_if = "Option::is_none")]
    pub software: Option<Software>,
    #[serde(rename = "infix-system:ntp", skip_serializing_if = "Option::is_none")]
    pub ntp: Option<NtpSummary>,
    #[serde(rename = "infix-system:dns-resolver", skip_serializing_if = "Option::is_none")]
    pub dns_resolver: Option<Resolver>,
    #[serde(rename = "infix-system:resource-usage", skip_serializing_if = "Option::is_none")]
    pub resource_usage: Option<ResourceUsage>,
}

/// Collector output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct System {
    #[serde(rename = "ietf-system:system", skip_serializing_if = "Option::is_none")]
    pub system: Option<SystemConfig>,
    #[serde(rename = "ietf-system:system-state")]
    pub state: SystemState,
}

// ── Sources ─────────────────────────────────────────────────────────

/// Users whose shadow entry holds a usable password hash.
pub fn users(shadow: &str) -> Vec<User> {
    shadow
        .lines()
        .filter_map(|line| {
            let mut fields = line.split(':');
            let name = fields.next()?.trim();
            let hash = fields.next()?;
            if name.is_empty() || hash.is_empty() || hash.starts_with(['0', '*', '!']) {
                return None;
            }
            Some(User {
                name: name.to_owned(),
                password: hash.to_owned(),
            })
        })
        .collect()
}

/// Timezone of a resolved `/etc/localtime` target.
pub fn timezone(target: &str) -> Option<Timezone> {
    let zone = ZONEINFO
        .iter()
        .find_map(|prefix| target.strip_prefix(prefix))
        .unwrap_or(target);
    if zone.is_empty() {
        return None;
    }
    if zone == "Etc/UTC" {
        return Some(Timezone::UtcOffset(0));
    }
    if let Some(offset) = zone.strip_prefix("Etc/GMT") {
        // POSIX sign: Etc/GMT+5 is five hours behind UTC.
        if let Some(hours) = leading_int(offset).and_then(|h| i32::try_from(h).ok()) {
            return Some(Timezone::UtcOffset(-hours));
        }
    }
    Some(Timezone::Name(zone.to_owned()))
}

pub fn platform(os_release: &str) -> Platform {
    let pairs = key_values(os_release);
    let get = |key: &str| key_value(&pairs, key).map(str::to_owned);
    Platform {
        os_name: get("NAME"),
        os_version: get("VERSION_ID"),
        os_release: get("BUILD_ID"),
        machine: get("ARCHITECTURE"),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn clock(ctx: &Context<'_>) -> Clock {
    let now = ctx.now();
    let uptime = ctx
        .host()
        .read("/proc/uptime")
        .and_then(|text| text.split_whitespace().next().and_then(float))
        .filter(|secs| secs.is_finite() && *secs >= 0.0);
    Clock {
        current_datetime: yang_date(&now),
        boot_datetime: uptime
            .and_then(|secs| Duration::try_seconds(secs.trunc() as i64))
            .and_then(|elapsed| since(&now, elapsed)),
    }
}

fn ntp_summary(ctx: &Context<'_>) -> Option<NtpSummary> {
    let source: Vec<NtpSource> = ntp::sources(ctx)
        .iter()
        .map(|s| NtpSource {
            address: s.address.clone(),
            mode: s.mode_name(),
            state: s.state_name(),
            stratum: s.stratum,
            poll: s.poll,
        })
        .collect();
    (!source.is_empty()).then_some(NtpSummary {
        sources: NtpSources { source },
    })
}

/// Memory figures from `/proc/meminfo`, in KiB.
pub fn memory(meminfo: &str) -> Option<Memory> {
    let field = |key: &str| {
        meminfo.lines().find_map(|line| {
            let rest = line.strip_prefix(key)?.strip_prefix(':')?;
            u64::try_from(leading_int(rest)?).ok()
        })
    };
    Some(Memory {
        total: field("MemTotal")?,
        free: field("MemFree")?,
        available: field("MemAvailable")?,
    })
}

pub fn load_average(loadavg: &str) -> Option<LoadAverage> {
    let mut fields = loadavg.split_whitespace().map(float);
    Some(LoadAverage {
        load_1min: Decimal::new(fields.next()??, 2),
        load_5min: Decimal::new(fields.next()??, 2),
        load_15min: Decimal::new(fields.next()??, 2),
    })
}

/// Rows of `df -kP` for real filesystems, sizes in KiB.
pub fn filesystems(df: &str) -> Vec<Filesystem> {
    df.lines()
        .skip(1)
        .filter_map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let [source, size, used, available, _capacity, mount, ..] = fields.as_slice() else {
                return None;
            };
            if matches!(*source, "tmpfs" | "devtmpfs" | "none" | "overlay") {
                return None;
            }
            Some(Filesystem {
                mount_point: (*mount).to_owned(),
                size: size.parse().ok()?,
                used: used.parse().ok()?,
                available: available.parse().ok()?,
            })
        })
        .collect()
}

fn resource_usage(ctx: &Context<'_>) -> Option<ResourceUsage> {
    let host = ctx.host();
    let usage = ResourceUsage {
        memory: host.read("/proc/meminfo").as_deref().and_then(memory),
        load_average: host.read("/proc/loadavg").as_deref().and_then(load_average),
        filesystem: filesystems(&host.run(&["df", "-kP"]).unwrap_or_default()),
    };
    (usage != ResourceUsage::default()).then_some(usage)
}

fn system_config(ctx: &Context<'_>) -> Option<SystemConfig> {
    let host = ctx.host();
    let hostname = host
        .run(&["hostname"])
        .ok()
        .map(|h| h.trim().to_owned())
        .filter(|h| !h.is_empty());
    let user = users(&host.run(&["getent", "shadow"]).unwrap_or_default());
    let zone = host
        .run(&["realpath", "/etc/localtime"])
        .ok()
        .map(|target| target.trim().to_owned());

    let config = SystemConfig {
        hostname,
        authentication: (!user.is_empty()).then_some(Authentication { user }),
        clock: zone.as_deref().and_then(timezone),
    };
    if config.hostname.is_none() && config.authentication.is_none() && config.clock.is_none() {
        debug!("no system identity available");
        return None;
    }
    Some(config)
}

/// System identity and state.
pub fn operational(ctx: &Context<'_>) -> System {
    let dns = dns::resolver(ctx);
    System {
        system: system_config(ctx),
        state: SystemState {
            platform: ctx
                .host()
                .read("/etc/os-release")
                .map(|text| platform(&text))
                .filter(|p| p != &Platform::default()),
            clock: clock(ctx),
            software: software::software(ctx),
            ntp: ntp_summary(ctx),
            dns_resolver: (!dns.is_empty()).then_some(dns),
            resource_usage: resource_usage(ctx),
        },
    }
}
