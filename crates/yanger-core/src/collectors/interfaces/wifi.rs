// ── WiFi interface state ──
//
// Access-point mode lists associated stations from `iw`; station mode
// reports the association and scan results from `wpa_cli`.

use serde::Serialize;

use crate::common::number::{key_value, key_values, leading_int, mac};
use crate::context::Context;
use crate::iw::{Iw, channel};
use crate::yang::Counter64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApStation {
    pub mac_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_packets: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_packets: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_bytes: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_bytes: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_speed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_speed: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stations {
    pub station: Vec<ApStation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessPoint {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    pub stations: Stations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScanResult {
    pub bssid: String,
    pub ssid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,
    pub encryption: Vec<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StationMode {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal_strength: Option<i32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scan_results: Vec<ScanResult>,
}

/// `infix-interfaces:wifi`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Wifi {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_point: Option<AccessPoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<StationMode>,
}

/// Security suites advertised in a `wpa_cli` flags column.
pub fn encryption(flags: &str) -> Vec<&'static str> {
    let mut found = Vec::new();
    if flags.contains("SAE") {
        found.push("WPA3-Personal");
    }
    if flags.contains("WPA2-PSK") || flags.contains("RSN-PSK") {
        found.push("WPA2-Personal");
    }
    if flags.contains("WPA-PSK") {
        found.push("WPA-Personal");
    }
    if flags.contains("EAP") {
        found.push("WPA2-Enterprise");
    }
    if flags.contains("WEP") {
        found.push("WEP");
    }
    if found.is_empty() {
        found.push("Open");
    }
    found
}

/// Rows of `wpa_cli scan_result` (tab separated, one header line).
pub fn scan_results(text: &str) -> Vec<ScanResult> {
    text.lines()
        .filter(|line| !line.starts_with("bssid"))
        .filter_map(|line| {
            let mut cols = line.split('\t');
            let bssid = cols.next()?.trim();
            if bssid.is_empty() {
                return None;
            }
            let freq = cols.next().and_then(|f| f.trim().parse::<u32>().ok());
            let signal = cols.next().and_then(leading_int).and_then(|s| i32::try_from(s).ok());
            let flags = cols.next().unwrap_or_default();
            let ssid = cols.next().unwrap_or_default();
            Some(ScanResult {
                bssid: mac(bssid),
                ssid: ssid.to_owned(),
                signal_strength: signal,
                channel: freq.and_then(channel::channel),
                encryption: encryption(flags),
            })
        })
        .collect()
}

fn access_point(iw: &Iw<'_>, ifname: &str) -> AccessPoint {
    let station = iw
        .stations(ifname)
        .into_iter()
        .map(|s| ApStation {
            mac_address: s.mac,
            signal_strength: s.signal,
            connected_time: s.connected_time,
            inactive_time: s.inactive_time,
            rx_packets: s.rx_packets,
            tx_packets: s.tx_packets,
            rx_bytes: s.rx_bytes,
            tx_bytes: s.tx_bytes,
            rx_speed: s.rx_speed,
            tx_speed: s.tx_speed,
        })
        .collect();
    AccessPoint {
        ssid: iw.iface(ifname).ssid,
        stations: Stations { station },
    }
}

fn station_mode(ctx: &Context<'_>, ifname: &str) -> Option<StationMode> {
    let host = ctx.host();
    let status = key_values(&host.run(&["wpa_cli", "-i", ifname, "status"]).ok()?);
    let poll = key_values(
        &host
            .run(&["wpa_cli", "-i", ifname, "signal_poll"])
            .unwrap_or_default(),
    );
    let scan = host
        .run(&["wpa_cli", "-i", ifname, "scan_result"])
        .unwrap_or_default();

    let connected = key_value(&status, "wpa_state") == Some("COMPLETED");
    Some(StationMode {
        ssid: connected
            .then(|| key_value(&status, "ssid"))
            .flatten()
            .map(str::to_owned),
        signal_strength: connected
            .then(|| key_value(&poll, "RSSI"))
            .flatten()
            .and_then(leading_int)
            .and_then(|s| i32::try_from(s).ok()),
        scan_results: scan_results(&scan),
    })
}

/// WiFi subtree of `ifname`.
pub fn wifi(ctx: &Context<'_>, ifname: &str) -> Option<Wifi> {
    let iw = Iw::new(ctx.host());
    let mode = iw.iface(ifname).kind;

    if mode.as_deref() == Some("AP") {
        return Some(Wifi {
            access_point: Some(access_point(&iw, ifname)),
            station: None,
        });
    }

    let station = station_mode(ctx, ifname)?;
    Some(Wifi {
        access_point: None,
        station: Some(station),
    })
}
