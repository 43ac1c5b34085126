//! `ietf-ntp` operational state from chronyd.
//!
//! Every source is a `chronyc -c` CSV report: `tracking` for the clock
//! state, `sources` and `sourcestats` for associations, `serverstats` for
//! counters. The listening port comes from `ss`.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::common::number::float;
use crate::context::Context;
use crate::yang::Decimal;

const NOMINAL_FREQ: f64 = 1_000_000_000.0;

// ── chronyc CSV ─────────────────────────────────────────────────────

fn csv_rows(text: &str) -> Vec<Vec<String>> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.split(',').map(|f| f.trim().to_owned()).collect())
        .collect()
}

fn chronyc(ctx: &Context<'_>, report: &str) -> Vec<Vec<String>> {
    let text = ctx.host().run(&["chronyc", "-c", report]).unwrap_or_default();
    csv_rows(&text)
}

/// One line of `chronyc -c sources`.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub mode: char,
    pub state: char,
    pub address: String,
    pub stratum: u8,
    pub poll: i32,
    pub reach: u32,
    pub last_rx: Option<u64>,
    pub offset: f64,
    pub error: f64,
}

impl Source {
    fn from_row(row: &[String]) -> Option<Self> {
        let [mode, state, address, stratum, poll, reach, last_rx, offset, _measured, error, ..] =
            row
        else {
            return None;
        };
        Some(Self {
            mode: mode.chars().next()?,
            state: state.chars().next()?,
            address: address.clone(),
            stratum: stratum.parse().ok()?,
            poll: poll.parse().ok()?,
            reach: u32::from_str_radix(reach, 8).unwrap_or(0),
            last_rx: last_rx.parse().ok(),
            offset: float(offset).unwrap_or(0.0),
            error: float(error).unwrap_or(0.0),
        })
    }

    /// Mode indicator as a summary word.
    pub fn mode_name(&self) -> &'static str {
        match self.mode {
            '=' => "peer",
            '#' => "local-clock",
            _ => "server",
        }
    }

    /// State indicator as a summary word.
    pub fn state_name(&self) -> &'static str {
        match self.state {
            '*' => "selected",
            '+' => "candidate",
            '-' => "outlier",
            'x' => "falseticker",
            '~' => "unstable",
            _ => "unusable",
        }
    }
}

/// Parsed `chronyc -c sources`; malformed lines are skipped.
pub fn sources(ctx: &Context<'_>) -> Vec<Source> {
    chronyc(ctx, "sources")
        .iter()
        .filter_map(|row| {
            let source = Source::from_row(row);
            if source.is_none() {
                debug!(?row, "skipping malformed chronyc source");
            }
            source
        })
        .collect()
}

/// `chronyc -c tracking`.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracking {
    pub refid: String,
    pub reference: String,
    pub stratum: u8,
    pub ref_time: f64,
    pub system_offset: f64,
    pub last_offset: f64,
    pub rms_offset: f64,
    pub frequency_ppm: f64,
    pub residual_freq_ppm: f64,
    pub skew_ppm: f64,
    pub root_delay: f64,
    pub root_dispersion: f64,
    pub update_interval: f64,
    pub leap_status: String,
}

impl Tracking {
    fn from_row(row: &[String]) -> Option<Self> {
        let [
            refid,
            reference,
            stratum,
            ref_time,
            system_offset,
            last_offset,
            rms_offset,
            frequency,
            residual,
            skew,
            root_delay,
            root_dispersion,
            update_interval,
            leap,
            ..,
        ] = row
        else {
            return None;
        };
        let num = |field: &String| float(field).unwrap_or(0.0);
        Some(Self {
            refid: refid.clone(),
            reference: reference.clone(),
            stratum: stratum.parse().ok()?,
            ref_time: num(ref_time),
            system_offset: num(system_offset),
            last_offset: num(last_offset),
            rms_offset: num(rms_offset),
            frequency_ppm: num(frequency),
            residual_freq_ppm: num(residual),
            skew_ppm: num(skew),
            root_delay: num(root_delay),
            root_dispersion: num(root_dispersion),
            update_interval: num(update_interval),
            leap_status: leap.clone(),
        })
    }
}

/// Reference id of the clock: dotted octets of the hex id for a network
/// reference, otherwise its name padded or cut to four characters.
pub fn clock_refid(refid: &str, reference: &str) -> String {
    if reference.parse::<IpAddr>().is_ok() {
        if let Ok(id) = u32::from_str_radix(refid, 16) {
            let [a, b, c, d] = id.to_be_bytes();
            return format!("{a}.{b}.{c}.{d}");
        }
    }
    let name = if reference.is_empty() { refid } else { reference };
    format!("{name:<4.4}")
}

/// Seconds as milliseconds with three fraction digits.
fn millis(seconds: f64) -> Decimal {
    Decimal::new(seconds * 1000.0, 3)
}

/// Epoch seconds with a fraction as a UTC timestamp with microseconds.
#[allow(clippy::cast_possible_truncation)]
pub fn reference_time(epoch: f64) -> Option<String> {
    let micros = (epoch * 1_000_000.0).round();
    if !micros.is_finite() {
        return None;
    }
    let instant = DateTime::<Utc>::from_timestamp_micros(micros as i64)?;
    Some(instant.format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string())
}

// ── Output ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SystemStatus {
    pub clock_state: &'static str,
    pub clock_stratum: u8,
    pub clock_refid: String,
    pub nominal_freq: Decimal,
    pub actual_freq: Decimal,
    pub clock_precision: i32,
    pub clock_offset: Decimal,
    pub root_delay: Decimal,
    pub root_dispersion: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_time: Option<String>,
    pub sync_state: &'static str,
    #[serde(rename = "infix-ntp:last-offset")]
    pub last_offset: Decimal,
    #[serde(rename = "infix-ntp:rms-offset")]
    pub rms_offset: Decimal,
    #[serde(rename = "infix-ntp:residual-freq")]
    pub residual_freq: Decimal,
    #[serde(rename = "infix-ntp:skew")]
    pub skew: Decimal,
    #[serde(rename = "infix-ntp:update-interval")]
    pub update_interval: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClockState {
    pub system_status: SystemStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Association {
    pub address: String,
    pub local_mode: &'static str,
    pub isconfigured: bool,
    pub stratum: u8,
    pub reach: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub now: Option<u64>,
    pub poll: i32,
    pub offset: Decimal,
    pub delay: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispersion: Option<Decimal>,
    #[serde(rename = "infix-ntp:prefer", skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Associations {
    pub association: Vec<Association>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RefclockMaster {
    pub master_stratum: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Statistics {
    pub packet_received: u64,
    pub packet_dropped: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NtpState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refclock_master: Option<RefclockMaster>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clock_state: Option<ClockState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associations: Option<Associations>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ntp_statistics: Option<Statistics>,
}

/// Collector output; `{}` when chronyd reports nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ntp {
    #[serde(rename = "ietf-ntp:ntp", skip_serializing_if = "Option::is_none")]
    pub ntp: Option<NtpState>,
}

// ── Assembly ────────────────────────────────────────────────────────

/// Clock state; the returned stratum is the one published.
pub fn clock_state(tracking: &Tracking) -> (u8, SystemStatus) {
    let unsynchronized = tracking.stratum == 0;
    let stratum = if unsynchronized { 16 } else { tracking.stratum };
    let never_set = stratum == 16 || tracking.leap_status == "Not synchronised";

    let status = SystemStatus {
        clock_state: if unsynchronized {
            "ietf-ntp:unsynchronized"
        } else {
            "ietf-ntp:synchronized"
        },
        clock_stratum: stratum,
        clock_refid: clock_refid(&tracking.refid, &tracking.reference),
        nominal_freq: Decimal::new(NOMINAL_FREQ, 4),
        actual_freq: Decimal::new(NOMINAL_FREQ * (1.0 + tracking.frequency_ppm / 1e6), 4),
        clock_precision: -20,
        clock_offset: millis(tracking.system_offset),
        root_delay: millis(tracking.root_delay),
        root_dispersion: millis(tracking.root_dispersion),
        reference_time: (tracking.ref_time > 0.0)
            .then(|| reference_time(tracking.ref_time))
            .flatten(),
        sync_state: if never_set {
            "ietf-ntp:clock-never-set"
        } else {
            "ietf-ntp:clock-synchronized"
        },
        last_offset: Decimal::new(tracking.last_offset, 9),
        rms_offset: Decimal::new(tracking.rms_offset, 9),
        residual_freq: Decimal::new(tracking.residual_freq_ppm, 3),
        skew: Decimal::new(tracking.skew_ppm, 3),
        update_interval: Decimal::new(tracking.update_interval, 1),
    };
    (stratum, status)
}

fn association(source: &Source, stats: &[Vec<String>]) -> Option<Association> {
    if source.mode == '#' || !(1..=16).contains(&source.stratum) {
        return None;
    }
    let dispersion = stats
        .iter()
        .find(|row| row.first() == Some(&source.address))
        .and_then(|row| float(row.get(7)?))
        .map(millis);
    Some(Association {
        address: source.address.clone(),
        local_mode: if source.mode == '=' {
            "ietf-ntp:active"
        } else {
            "ietf-ntp:client"
        },
        isconfigured: true,
        stratum: source.stratum,
        reach: source.reach,
        now: source.last_rx,
        poll: source.poll,
        offset: millis(source.offset),
        delay: millis(source.error),
        dispersion,
        selected: source.state == '*',
    })
}

/// UDP port chronyd serves on, ignoring loopback bindings.
pub fn server_port(ss: &str) -> Option<u16> {
    ss.lines()
        .filter(|line| line.contains("chronyd"))
        .filter_map(|line| line.split_whitespace().nth(3))
        .filter(|local| !local.starts_with("127.") && !local.starts_with("[::1]"))
        .find_map(|local| local.rsplit(':').next()?.parse().ok())
}

fn statistics(rows: &[Vec<String>]) -> Option<Statistics> {
    let row = rows.first()?;
    Some(Statistics {
        packet_received: row.first()?.parse().ok()?,
        packet_dropped: row.get(1)?.parse().ok()?,
    })
}

/// NTP client and server state.
pub fn operational(ctx: &Context<'_>) -> Ntp {
    let tracking = chronyc(ctx, "tracking")
        .first()
        .and_then(|row| Tracking::from_row(row));
    let stats = chronyc(ctx, "sourcestats");
    let association: Vec<Association> = sources(ctx)
        .iter()
        .filter_map(|source| association(source, &stats))
        .collect();

    if tracking.is_none() && association.is_empty() {
        return Ntp::default();
    }

    let clock = tracking.as_ref().map(clock_state);
    let ss = ctx.host().run(&["ss", "-ulnp"]).unwrap_or_default();

    Ntp {
        ntp: Some(NtpState {
            refclock_master: clock.as_ref().map(|(stratum, _)| RefclockMaster {
                master_stratum: *stratum,
            }),
            port: server_port(&ss),
            clock_state: clock.map(|(_, system_status)| ClockState { system_status }),
            associations: (!association.is_empty()).then_some(Associations { association }),
            ntp_statistics: statistics(&chronyc(ctx, "serverstats")),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::testutil::Recording;

    use super::*;

    const TRACKING: &str = "A29FC87B,162.159.200.123,3,1672574400.250000,-0.000012345,0.000004321,0.000020000,-12.500,0.010,0.045,0.001234,0.000567,64.5,Normal\n";
    const SOURCES: &str = "\
^,*,162.159.200.123,2,6,377,34,0.000012,0.000013,0.000150
^,+,10.0.0.1,3,6,17,12,-0.001500,-0.001400,0.002000
#,*,GPS,0,4,377,3,0.000001,0.000001,0.000010
^,?,192.0.2.9,0,6,0,-,0.0,0.0,0.0
";
    const SOURCESTATS: &str = "162.159.200.123,10,6,520,0.001,0.020,0.000003,0.000042\n";

    #[test]
    fn synchronized_clock_and_associations() {
        let rec = Recording::new()
            .run(&["chronyc", "-c", "tracking"], TRACKING)
            .run(&["chronyc", "-c", "sources"], SOURCES)
            .run(&["chronyc", "-c", "sourcestats"], SOURCESTATS)
            .run(&["chronyc", "-c", "serverstats"], "120,3,10,0,0\n")
            .run(
                &["ss", "-ulnp"],
                "State Recv-Q Send-Q Local Address:Port Peer Address:Port Process\n\
                 UNCONN 0 0 127.0.0.1:323 0.0.0.0:* users:((\"chronyd\",pid=9,fd=5))\n\
                 UNCONN 0 0 0.0.0.0:123 0.0.0.0:* users:((\"chronyd\",pid=9,fd=7))\n",
            );
        let host = rec.host();
        let ctx = Context::new(&host);

        let value = serde_json::to_value(operational(&ctx)).unwrap();
        let ntp = &value["ietf-ntp:ntp"];
        assert_eq!(ntp["port"], json!(123));
        assert_eq!(ntp["refclock-master"], json!({"master-stratum": 3}));
        assert_eq!(ntp["ntp-statistics"], json!({"packet-received": 120, "packet-dropped": 3}));

        let status = &ntp["clock-state"]["system-status"];
        assert_eq!(status["clock-state"], json!("ietf-ntp:synchronized"));
        assert_eq!(status["clock-refid"], json!("162.159.200.123"));
        assert_eq!(status["nominal-freq"], json!("1000000000.0000"));
        assert_eq!(status["actual-freq"], json!("999987500.0000"));
        assert_eq!(status["clock-offset"], json!("-0.012"));
        assert_eq!(status["root-delay"], json!("1.234"));
        assert_eq!(status["reference-time"], json!("2023-01-01T12:00:00.250000+00:00"));
        assert_eq!(status["sync-state"], json!("ietf-ntp:clock-synchronized"));

        let associations = ntp["associations"]["association"].as_array().unwrap();
        assert_eq!(associations.len(), 2);
        assert_eq!(
            associations[0],
            json!({
                "address": "162.159.200.123",
                "local-mode": "ietf-ntp:client",
                "isconfigured": true,
                "stratum": 2,
                "reach": 255,
                "now": 34,
                "poll": 6,
                "offset": "0.012",
                "delay": "0.150",
                "dispersion": "0.042",
                "infix-ntp:prefer": true
            })
        );
        assert_eq!(associations[1]["offset"], json!("-1.500"));
        assert_eq!(associations[1]["reach"], json!(15));
        assert!(associations[1].get("dispersion").is_none());
    }

    #[test]
    fn stratum_zero_is_unsynchronized() {
        let rec = Recording::new().run(
            &["chronyc", "-c", "tracking"],
            "00000000,,0,0.000000000,0.000000000,0.000000000,0.000000000,0.000,0.000,0.000,0.000000000,0.000000000,0.0,Not synchronised\n",
        );
        let host = rec.host();
        let ctx = Context::new(&host);

        let value = serde_json::to_value(operational(&ctx)).unwrap();
        let status = &value["ietf-ntp:ntp"]["clock-state"]["system-status"];
        assert_eq!(status["clock-stratum"], json!(16));
        assert_eq!(status["clock-state"], json!("ietf-ntp:unsynchronized"));
        assert_eq!(status["sync-state"], json!("ietf-ntp:clock-never-set"));
        assert!(status.get("reference-time").is_none());
        assert_eq!(value["ietf-ntp:ntp"]["refclock-master"]["master-stratum"], json!(16));
    }

    #[test]
    fn refids() {
        assert_eq!(clock_refid("C0A80101", "192.168.1.1"), "192.168.1.1");
        assert_eq!(clock_refid("47505300", "GPS"), "GPS ");
        assert_eq!(clock_refid("50505331", "PPS1X"), "PPS1");
    }

    #[test]
    fn summary_words() {
        let rows = csv_rows(SOURCES);
        let gps = Source::from_row(&rows[2]).unwrap();
        assert_eq!(gps.mode_name(), "local-clock");
        assert_eq!(gps.state_name(), "selected");
        let unusable = Source::from_row(&rows[3]).unwrap();
        assert_eq!(unusable.mode_name(), "server");
        assert_eq!(unusable.state_name(), "unusable");
        assert_eq!(unusable.last_rx, None);
    }

    #[test]
    fn reference_time_carries_rounding_into_seconds() {
        assert_eq!(
            reference_time(1_700_000_000.999_999_8).as_deref(),
            Some("2023-11-14T22:13:21.000000+00:00")
        );
        assert_eq!(
            reference_time(1_672_574_400.25).as_deref(),
            Some("2023-01-01T12:00:00.250000+00:00")
        );
        assert_eq!(reference_time(f64::NAN), None);
        assert_eq!(reference_time(f64::MAX), None);
    }

    #[test]
    fn no_chronyd_is_empty_object() {
        let rec = Recording::new();
        let host = rec.host();
        let ctx = Context::new(&host);
        assert_eq!(serde_json::to_value(operational(&ctx)).unwrap(), json!({}));
    }
}
