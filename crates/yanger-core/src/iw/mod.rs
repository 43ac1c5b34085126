//! Structured view of wireless PHY and interface state.
//!
//! Wraps the `iw` tool: every query runs one `iw` command through the
//! [`Host`] and parses its text output into serializable records. Used by
//! the hardware and interface collectors and by the `yanger-iw` binary.

pub mod channel;
pub mod parse;

use std::collections::BTreeMap;

use serde::Serialize;

use yanger_host::Host;

use crate::yang::Counter64;

// ── Records ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Band {
    pub band: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub frequencies: Vec<u32>,
    #[serde(rename = "ht_capable")]
    pub ht: bool,
    #[serde(rename = "vht_capable")]
    pub vht: bool,
    #[serde(rename = "he_capable")]
    pub he: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Limit {
    pub types: Vec<String>,
    pub max: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Combination {
    pub limits: Vec<Limit>,
    pub total: u32,
    pub channels: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhyInfo {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiphy_index: Option<u32>,
    pub bands: Vec<Band>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_txpower: Option<i32>,
    pub interface_combinations: Vec<Combination>,
    pub num_virtual_interfaces: usize,
}

impl PhyInfo {
    /// Highest AP count allowed by any interface combination.
    pub fn max_ap(&self) -> u32 {
        self.max_of("AP")
    }

    /// Highest count allowed for interface type `kind` by any combination.
    pub fn max_of(&self, kind: &str) -> u32 {
        self.interface_combinations
            .iter()
            .flat_map(|combo| &combo.limits)
            .filter(|limit| limit.types.iter().any(|t| t == kind))
            .map(|limit| limit.max)
            .max()
            .unwrap_or(0)
    }

    /// All enabled frequencies, band by band.
    pub fn frequencies(&self) -> impl Iterator<Item = u32> + '_ {
        self.bands.iter().flat_map(|band| band.frequencies.iter().copied())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IfaceInfo {
    pub ifname: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiphy: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txpower: Option<i32>,
}

/// A station associated with an AP interface. Speeds are in 100 kbit/s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Station {
    pub mac: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_bytes: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_bytes: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_packets: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_packets: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_speed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_speed: Option<u32>,
}

/// One channel of a survey dump. Times are in milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SurveyEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    pub in_use: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmit_time: Option<u64>,
}

/// Station-mode association state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkInfo {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bssid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_speed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rx_speed: Option<u32>,
}

// ── Queries ─────────────────────────────────────────────────────────

/// `iw` queries through a host. A failing command yields an empty result.
pub struct Iw<'h> {
    host: &'h dyn Host,
}

impl<'h> Iw<'h> {
    pub fn new(host: &'h dyn Host) -> Self {
        Self { host }
    }

    fn iw(&self, args: &[&str]) -> String {
        let mut argv = vec!["iw"];
        argv.extend_from_slice(args);
        self.host.run(&argv).unwrap_or_default()
    }

    /// PHY names.
    pub fn list(&self) -> Vec<String> {
        parse::phy_list(&self.iw(&["list"]))
    }

    /// PHY index → interface names.
    pub fn devices(&self) -> BTreeMap<u32, Vec<String>> {
        parse::devices(&self.iw(&["dev"]))
    }

    /// PHY detail including driver, manufacturer and virtual interface count.
    pub fn phy(&self, phy: &str) -> PhyInfo {
        let mut info = parse::phy_info(phy, &self.iw(&["phy", phy, "info"]));

        let driver = self
            .host
            .run(&["readlink", "-f", &format!("/sys/class/ieee80211/{phy}/device/driver")])
            .ok()
            .and_then(|target| target.trim().rsplit('/').next().map(str::to_owned))
            .filter(|name| !name.is_empty());
        info.manufacturer = driver
            .as_deref()
            .and_then(channel::manufacturer)
            .map(str::to_owned);
        info.driver = driver;

        let index = info
            .wiphy_index
            .or_else(|| phy.trim_start_matches(char::is_alphabetic).parse().ok());
        info.num_virtual_interfaces = index
            .and_then(|i| self.devices().remove(&i))
            .as_ref()
            .map_or(0, Vec::len);
        info
    }

    /// Interfaces belonging to PHY `phy`.
    pub fn interfaces_of(&self, phy: &PhyInfo) -> Vec<String> {
        let index = phy
            .wiphy_index
            .or_else(|| phy.name.trim_start_matches(char::is_alphabetic).parse().ok());
        index
            .and_then(|i| self.devices().remove(&i))
            .unwrap_or_default()
    }

    pub fn iface(&self, ifname: &str) -> IfaceInfo {
        parse::iface_info(ifname, &self.iw(&["dev", ifname, "info"]))
    }

    pub fn stations(&self, ifname: &str) -> Vec<Station> {
        parse::stations(&self.iw(&["dev", ifname, "station", "dump"]))
    }

    pub fn survey(&self, ifname: &str) -> Vec<SurveyEntry> {
        parse::survey(&self.iw(&["dev", ifname, "survey", "dump"]))
    }

    pub fn link(&self, ifname: &str) -> LinkInfo {
        parse::link(&self.iw(&["dev", ifname, "link"]))
    }

    /// Whether `name` is a PHY (as opposed to an interface).
    pub fn is_phy(&self, name: &str) -> bool {
        self.list().iter().any(|phy| phy == name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::testutil::Recording;

    use super::*;

    #[test]
    fn phy_detail_with_driver_and_interfaces() {
        let rec = Recording::new()
            .run(&["iw", "list"], "Wiphy phy0\n")
            .run(
                &["iw", "phy", "phy0", "info"],
                "Wiphy phy0\n\twiphy index: 0\n\tBand 1:\n\t\tFrequencies:\n\t\t\t* 2412 MHz [1] (20.0 dBm)\n",
            )
            .run(
                &["readlink", "-f", "/sys/class/ieee80211/phy0/device/driver"],
                "/sys/bus/pci/drivers/mt7915e\n",
            )
            .run(&["iw", "dev"], "phy#0\n\tInterface wlan0\n\tInterface wlan1\n");
        let host = rec.host();
        let iw = Iw::new(&host);

        assert!(iw.is_phy("phy0"));
        assert!(!iw.is_phy("wlan0"));

        let info = iw.phy("phy0");
        assert_eq!(info.driver.as_deref(), Some("mt7915e"));
        assert_eq!(info.manufacturer.as_deref(), Some("MediaTek Inc."));
        assert_eq!(info.num_virtual_interfaces, 2);
        assert_eq!(iw.interfaces_of(&info), vec!["wlan0", "wlan1"]);

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["bands"][0]["name"], json!("2.4GHz"));
        assert_eq!(value["max_txpower"], json!(20));
    }

    #[test]
    fn missing_iw_yields_empty_views() {
        let rec = Recording::new();
        let host = rec.host();
        let iw = Iw::new(&host);

        assert!(iw.list().is_empty());
        assert!(iw.devices().is_empty());
        assert!(iw.stations("wlan0").is_empty());
        assert!(!iw.link("wlan0").connected);
    }
}
