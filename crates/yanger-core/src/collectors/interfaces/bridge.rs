// ── Bridge and bridge-port subtrees ──

use std::cell::OnceCell;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::common::tree::lookup_i64;

use super::ip::{Link, Snapshot};
use super::stp::{self, BridgeStp, PortStp};

// ── mctl ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Mctl {
    pub multicast_queriers: Vec<Querier>,
    pub multicast_groups: Vec<Group>,
    pub fast_leave_ports: Vec<String>,
    pub multicast_router_ports: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Querier {
    pub interface: String,
    pub vid: Option<u16>,
    pub querier: Option<String>,
    pub interval: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Group {
    pub bridge: String,
    pub vid: Option<u16>,
    pub group: String,
    pub ports: Vec<String>,
}

/// Lazily read multicast state, shared by every bridge of one run.
#[derive(Default)]
pub struct Multicast {
    state: OnceCell<Mctl>,
}

impl Multicast {
    fn get(&self, snapshot: &Snapshot<'_, '_>) -> &Mctl {
        self.state.get_or_init(|| {
            snapshot
                .ctx()
                .host()
                .run_json(&["mctl", "-p", "show", "igmp", "json"])
                .ok()
                .and_then(|value| serde_json::from_value(value).ok())
                .unwrap_or_default()
        })
    }
}

// ── Output ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct MulticastSettings {
    pub snooping: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub querier: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_interval: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterPort {
    pub port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub group: String,
    pub ports: Vec<FilterPort>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Filters {
    pub multicast_filter: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VlanEntry {
    pub vid: u16,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub untagged: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tagged: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multicast: Option<MulticastSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multicast_filters: Option<Filters>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vlans {
    pub vlan: Vec<VlanEntry>,
}

/// `infix-interfaces:bridge`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Bridge {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vlans: Option<Vlans>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multicast: Option<MulticastSettings>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multicast_filters: Option<Filters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stp: Option<BridgeStp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortMulticast {
    pub fast_leave: bool,
    pub router: &'static str,
}

/// `infix-interfaces:bridge-port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgePort {
    pub bridge: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pvid: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stp_state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multicast: Option<PortMulticast>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stp: Option<PortStp>,
}

// ── Assembly ────────────────────────────────────────────────────────

fn settings(link: &Link, mctl: &Mctl, vid: Option<u16>) -> MulticastSettings {
    let data = link.info_data();
    let snooping = data.and_then(|d| lookup_i64(d, &["mcast_snooping"])) == Some(1);
    let querier = data
        .and_then(|d| lookup_i64(d, &["mcast_querier"]))
        .map(|q| if q == 1 { "auto" } else { "off" });
    let query_interval = mctl
        .multicast_queriers
        .iter()
        .find(|q| q.interface == link.ifname && q.vid.unwrap_or(0) == vid.unwrap_or(0))
        .and_then(|q| q.interval);

    MulticastSettings {
        snooping,
        querier,
        query_interval,
    }
}

fn filters(bridge: &str, mctl: &Mctl, vid: Option<u16>) -> Option<Filters> {
    let multicast_filter: Vec<Filter> = mctl
        .multicast_groups
        .iter()
        .filter(|g| g.bridge == bridge && g.vid.unwrap_or(0) == vid.unwrap_or(0))
        .map(|g| Filter {
            group: g.group.clone(),
            ports: g
                .ports
                .iter()
                .map(|port| FilterPort { port: port.clone() })
                .collect(),
        })
        .collect();
    (!multicast_filter.is_empty()).then_some(Filters { multicast_filter })
}

fn vlan_filtering(link: &Link) -> bool {
    link.info_data()
        .and_then(|d| lookup_i64(d, &["vlan_filtering"]))
        == Some(1)
}

/// Bridge subtree. A non-filtering bridge carries multicast state at the
/// top level and never a `vlans` list.
pub fn bridge(snapshot: &Snapshot<'_, '_>, multicast: &Multicast, link: &Link) -> Bridge {
    let mctl = multicast.get(snapshot);
    let stp = stp::bridge_stp(snapshot.ctx(), &link.ifname);

    if !vlan_filtering(link) {
        return Bridge {
            vlans: None,
            multicast: Some(settings(link, mctl, None)),
            multicast_filters: filters(&link.ifname, mctl, None),
            stp,
        };
    }

    let vids: BTreeSet<u16> = snapshot
        .vlans_of(&link.ifname)
        .iter()
        .flat_map(|vlan| vlan.vids())
        .collect();
    let ports = snapshot.ports_of(&link.ifname);

    let vlan = vids
        .into_iter()
        .map(|vid| {
            let mut untagged = Vec::new();
            let mut tagged = Vec::new();
            for port in &ports {
                let member = snapshot
                    .vlans_of(&port.ifname)
                    .iter()
                    .find(|v| v.vids().any(|id| id == vid));
                match member {
                    Some(v) if v.is_untagged() => untagged.push(port.ifname.clone()),
                    Some(_) => tagged.push(port.ifname.clone()),
                    None => {}
                }
            }
            VlanEntry {
                vid,
                untagged,
                tagged,
                multicast: Some(settings(link, mctl, Some(vid))),
                multicast_filters: filters(&link.ifname, mctl, Some(vid)),
            }
        })
        .collect();

    Bridge {
        vlans: Some(Vlans { vlan }),
        multicast: None,
        multicast_filters: None,
        stp,
    }
}

/// Bridge-port subtree for a port enslaved to a bridge.
pub fn bridge_port(snapshot: &Snapshot<'_, '_>, multicast: &Multicast, link: &Link) -> Option<BridgePort> {
    if link.slave_kind() != Some("bridge") {
        return None;
    }
    let bridge = link.master.clone()?;
    let mctl = multicast.get(snapshot);

    let pvid = snapshot
        .vlans_of(&link.ifname)
        .iter()
        .find(|v| v.is_pvid())
        .map(|v| v.vlan);
    let stp_state = snapshot
        .bridge_links()
        .iter()
        .find(|b| b.ifname == link.ifname)
        .and_then(|b| b.state.as_deref())
        .and_then(stp::state);

    let fast_leave = mctl.fast_leave_ports.iter().any(|p| *p == link.ifname);
    let router = if mctl.multicast_router_ports.iter().any(|p| *p == link.ifname) {
        "permanent"
    } else {
        "auto"
    };

    Some(BridgePort {
        stp: stp::port_stp(snapshot.ctx(), &bridge, &link.ifname),
        bridge,
        pvid,
        stp_state,
        multicast: Some(PortMulticast { fast_leave, router }),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::context::Context;
    use crate::testutil::Recording;

    use super::*;

    fn recording() -> Recording {
        Recording::new()
            .run(
                &["ip", "-s", "-d", "-j", "link", "show"],
                &json!([
                    {"ifname": "br0", "ifindex": 3, "link_type": "ether",
                     "linkinfo": {"info_kind": "bridge",
                                  "info_data": {"vlan_filtering": 1, "mcast_snooping": 1, "mcast_querier": 0}}},
                    {"ifname": "e1", "ifindex": 4, "link_type": "ether", "master": "br0",
                     "linkinfo": {"info_slave_kind": "bridge", "info_slave_data": {}}},
                    {"ifname": "e2", "ifindex": 5, "link_type": "ether", "master": "br0",
                     "linkinfo": {"info_slave_kind": "bridge", "info_slave_data": {}}},
                    {"ifname": "br1", "ifindex": 6, "link_type": "ether",
                     "linkinfo": {"info_kind": "bridge", "info_data": {"vlan_filtering": 0, "mcast_snooping": 1}}}
                ])
                .to_string(),
            )
            .run(
                &["bridge", "-j", "vlan", "show"],
                &json!([
                    {"ifname": "br0", "vlans": [{"vlan": 1, "flags": ["PVID", "Egress Untagged"]}, {"vlan": 10}]},
                    {"ifname": "e1", "vlans": [{"vlan": 1, "flags": ["PVID", "Egress Untagged"]}]},
                    {"ifname": "e2", "vlans": [{"vlan": 1, "flags": ["Egress Untagged"]},
                                               {"vlan": 10, "flags": ["PVID"]}]}
                ])
                .to_string(),
            )
            .run(
                &["bridge", "-j", "link", "show"],
                r#"[{"ifname": "e1", "master": "br0", "state": "forwarding"},
                    {"ifname": "e2", "master": "br0", "state": "blocking"}]"#,
            )
            .run(
                &["mctl", "-p", "show", "igmp", "json"],
                &json!({
                    "multicast-queriers": [{"interface": "br0", "vid": 1, "querier": "10.0.0.1", "interval": 125}],
                    "multicast-groups": [
                        {"bridge": "br0", "vid": 1, "group": "224.1.1.1", "ports": ["e1"]},
                        {"bridge": "br1", "group": "239.0.0.1", "ports": ["e5"]}
                    ],
                    "fast-leave-ports": ["e2"],
                    "multicast-router-ports": []
                })
                .to_string(),
            )
    }

    #[test]
    fn vlan_membership_and_multicast() {
        let rec = recording();
        let host = rec.host();
        let ctx = Context::new(&host);
        let snapshot = Snapshot::new(&ctx);
        let multicast = Multicast::default();

        let br0 = snapshot.link("br0").unwrap();
        let value = serde_json::to_value(bridge(&snapshot, &multicast, br0)).unwrap();
        assert_eq!(
            value,
            json!({
                "vlans": {"vlan": [
                    {"vid": 1, "untagged": ["e1", "e2"],
                     "multicast": {"snooping": true, "querier": "off", "query-interval": 125},
                     "multicast-filters": {"multicast-filter": [{"group": "224.1.1.1", "ports": [{"port": "e1"}]}]}},
                    {"vid": 10, "tagged": ["e2"],
                     "multicast": {"snooping": true, "querier": "off"}}
                ]}
            })
        );
    }

    #[test]
    fn non_filtering_bridge_has_no_vlans() {
        let rec = recording();
        let host = rec.host();
        let ctx = Context::new(&host);
        let snapshot = Snapshot::new(&ctx);
        let multicast = Multicast::default();

        let br1 = snapshot.link("br1").unwrap();
        let value = serde_json::to_value(bridge(&snapshot, &multicast, br1)).unwrap();
        assert_eq!(value.get("vlans"), None);
        assert_eq!(value["multicast"], json!({"snooping": true}));
        assert_eq!(
            value["multicast-filters"]["multicast-filter"][0]["group"],
            json!("239.0.0.1")
        );
    }

    #[test]
    fn port_state() {
        let rec = recording();
        let host = rec.host();
        let ctx = Context::new(&host);
        let snapshot = Snapshot::new(&ctx);
        let multicast = Multicast::default();

        let e2 = snapshot.link("e2").unwrap();
        let value = serde_json::to_value(bridge_port(&snapshot, &multicast, e2).unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "bridge": "br0",
                "pvid": 10,
                "stp-state": "blocking",
                "multicast": {"fast-leave": true, "router": "auto"}
            })
        );
        assert!(bridge_port(&snapshot, &multicast, snapshot.link("br0").unwrap()).is_none());
    }
}
