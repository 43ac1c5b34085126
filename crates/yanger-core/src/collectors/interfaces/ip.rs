// ── iproute2 sources ──
//
// `ip -j` / `bridge -j` records and the per-run snapshot that reads each
// of them at most once.

use std::cell::OnceCell;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::tree::parse_list;
use crate::context::Context;

// ── ip link ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Link {
    pub ifname: String,
    pub ifindex: u32,
    pub link_type: String,
    pub flags: Vec<String>,
    pub operstate: String,
    pub mtu: Option<u32>,
    pub address: Option<String>,
    pub group: Option<String>,
    pub ifalias: Option<String>,
    pub master: Option<String>,
    pub link: Option<String>,
    pub link_netnsid: Option<i64>,
    pub stats64: Option<Stats64>,
    pub linkinfo: Option<LinkInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Stats64 {
    pub rx: Counters,
    pub tx: Counters,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Counters {
    pub bytes: u64,
    pub packets: u64,
    pub errors: u64,
    pub dropped: u64,
    pub multicast: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LinkInfo {
    pub info_kind: Option<String>,
    pub info_data: Value,
    pub info_slave_kind: Option<String>,
    pub info_slave_data: Value,
}

impl Link {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    pub fn kind(&self) -> Option<&str> {
        self.linkinfo.as_ref()?.info_kind.as_deref()
    }

    pub fn slave_kind(&self) -> Option<&str> {
        self.linkinfo.as_ref()?.info_slave_kind.as_deref()
    }

    pub fn info_data(&self) -> Option<&Value> {
        self.linkinfo.as_ref().map(|info| &info.info_data)
    }

    pub fn slave_data(&self) -> Option<&Value> {
        self.linkinfo.as_ref().map(|info| &info.info_slave_data)
    }

    pub fn is_internal(&self) -> bool {
        self.group.as_deref() == Some("internal")
    }

    /// YANG `admin-status`.
    pub fn admin_status(&self) -> &'static str {
        if self.has_flag("UP") { "up" } else { "down" }
    }

    /// YANG `oper-status`.
    pub fn oper_status(&self) -> &'static str {
        match self.operstate.as_str() {
            "UP" => "up",
            "DOWN" => "down",
            "LOWERLAYERDOWN" => "lower-layer-down",
            "DORMANT" => "dormant",
            "NOTPRESENT" => "not-present",
            "TESTING" => "testing",
            _ if self.has_flag("UP") && self.has_flag("LOWER_UP") => "up",
            _ => "unknown",
        }
    }
}

// ── ip addr ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddrEntry {
    pub ifname: String,
    pub addr_info: Vec<AddrInfo>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddrInfo {
    pub family: String,
    pub local: Option<String>,
    pub prefixlen: Option<u8>,
    pub protocol: Option<String>,
    #[serde(rename = "stable-privacy")]
    pub stable_privacy: Option<bool>,
}

impl AddrInfo {
    /// YANG address `origin` for the kernel protocol tag.
    pub fn origin(&self) -> &'static str {
        match self.protocol.as_deref() {
            Some("kernel_ll" | "kernel_ra") if self.stable_privacy == Some(true) => "random",
            Some("kernel_ll" | "kernel_ra") => "link-layer",
            Some("static") => "static",
            Some("dhcp") => "dhcp",
            Some("random") => "random",
            _ => "other",
        }
    }
}

/// One `ietf-ip` address entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Address {
    pub ip: String,
    pub prefix_length: u8,
    pub origin: &'static str,
}

/// `ietf-ip:ipv4` / `ietf-ip:ipv6` container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IpFamily {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
}

impl IpFamily {
    pub fn is_empty(&self) -> bool {
        self.mtu.is_none() && self.address.is_empty()
    }
}

/// Addresses of `family` (`inet`/`inet6`) in `entry`.
pub fn addresses(entry: Option<&AddrEntry>, family: &str) -> Vec<Address> {
    entry
        .map(|entry| entry.addr_info.as_slice())
        .unwrap_or_default()
        .iter()
        .filter(|info| info.family == family)
        .filter_map(|info| {
            Some(Address {
                ip: info.local.clone()?,
                prefix_length: info.prefixlen?,
                origin: info.origin(),
            })
        })
        .collect()
}

// ── bridge ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BridgeVlanEntry {
    pub ifname: String,
    pub vlans: Vec<BridgeVlan>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BridgeVlan {
    pub vlan: u16,
    #[serde(rename = "vlanEnd")]
    pub vlan_end: Option<u16>,
    pub flags: Vec<String>,
}

impl BridgeVlan {
    pub fn vids(&self) -> impl Iterator<Item = u16> {
        self.vlan..=self.vlan_end.unwrap_or(self.vlan)
    }

    pub fn is_pvid(&self) -> bool {
        self.flags.iter().any(|f| f == "PVID")
    }

    pub fn is_untagged(&self) -> bool {
        self.flags.iter().any(|f| f == "Egress Untagged")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BridgeLink {
    pub ifname: String,
    pub master: Option<String>,
    pub state: Option<String>,
}

// ── Snapshot ────────────────────────────────────────────────────────

/// Interface sources for one collector run, each read at most once.
pub struct Snapshot<'a, 'h> {
    ctx: &'a Context<'h>,
    links: OnceCell<Vec<Link>>,
    addrs: OnceCell<Vec<AddrEntry>>,
    bridge_vlans: OnceCell<Vec<BridgeVlanEntry>>,
    bridge_links: OnceCell<Vec<BridgeLink>>,
}

impl<'a, 'h> Snapshot<'a, 'h> {
    pub fn new(ctx: &'a Context<'h>) -> Self {
        Self {
            ctx,
            links: OnceCell::new(),
            addrs: OnceCell::new(),
            bridge_vlans: OnceCell::new(),
            bridge_links: OnceCell::new(),
        }
    }

    pub fn ctx(&self) -> &'a Context<'h> {
        self.ctx
    }

    fn list<T: DeserializeOwned>(&self, argv: &[&str]) -> Vec<T> {
        parse_list(self.ctx.host().run_json(argv).unwrap_or_default())
    }

    pub fn links(&self) -> &[Link] {
        self.links
            .get_or_init(|| self.list(&["ip", "-s", "-d", "-j", "link", "show"]))
    }

    pub fn link(&self, ifname: &str) -> Option<&Link> {
        self.links().iter().find(|link| link.ifname == ifname)
    }

    pub fn addrs(&self) -> &[AddrEntry] {
        self.addrs
            .get_or_init(|| self.list(&["ip", "-j", "addr", "show"]))
    }

    pub fn addr(&self, ifname: &str) -> Option<&AddrEntry> {
        self.addrs().iter().find(|entry| entry.ifname == ifname)
    }

    pub fn bridge_vlans(&self) -> &[BridgeVlanEntry] {
        self.bridge_vlans
            .get_or_init(|| self.list(&["bridge", "-j", "vlan", "show"]))
    }

    pub fn vlans_of(&self, ifname: &str) -> &[BridgeVlan] {
        self.bridge_vlans()
            .iter()
            .find(|entry| entry.ifname == ifname)
            .map_or(&[][..], |entry| entry.vlans.as_slice())
    }

    pub fn bridge_links(&self) -> &[BridgeLink] {
        self.bridge_links
            .get_or_init(|| self.list(&["bridge", "-j", "link", "show"]))
    }

    /// Ports enslaved to `bridge`, in link order.
    pub fn ports_of(&self, bridge: &str) -> Vec<&Link> {
        self.links()
            .iter()
            .filter(|link| link.master.as_deref() == Some(bridge))
            .filter(|link| link.slave_kind() == Some("bridge"))
            .collect()
    }

    /// IPv6 MTU of `ifname` from procfs.
    pub fn ipv6_mtu(&self, ifname: &str) -> Option<u32> {
        self.ctx
            .host()
            .read(&format!("/proc/sys/net/ipv6/conf/{ifname}/mtu"))?
            .parse()
            .ok()
    }
}
