// ── Link aggregation: bond master and member ports ──

use serde::Serialize;
use serde_json::Value;

use crate::common::tree::{lookup, lookup_i64, lookup_str};

use super::ip::Link;

/// LACP port state bits, least significant first.
const PORT_STATE_BITS: [&str; 8] = [
    "activity",
    "timeout",
    "aggregation",
    "synchronization",
    "collecting",
    "distributing",
    "defaulted",
    "expired",
];

/// Render an LACP port state byte as a YANG `bits` value.
pub fn port_state(bits: i64) -> String {
    PORT_STATE_BITS
        .iter()
        .enumerate()
        .filter(|(i, _)| bits & (1 << i) != 0)
        .map(|(_, name)| *name)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Kernel `xmit_hash_policy` as the YANG hash enum.
pub fn hash_policy(policy: &str) -> Option<&'static str> {
    match policy {
        "layer2" => Some("layer2"),
        "layer2+3" => Some("layer2-3"),
        "layer3+4" => Some("layer3-4"),
        "encap2+3" => Some("encap2-3"),
        "encap3+4" => Some("encap3-4"),
        "vlan+srcmac" => Some("vlan-srcmac"),
        _ => None,
    }
}

fn mode(mode: &str) -> Option<&'static str> {
    match mode {
        "balance-xor" => Some("static"),
        "802.3ad" => Some("lacp"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Debounce {
    pub up: i64,
    pub down: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkMonitor {
    pub interval: i64,
    pub debounce: Debounce,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Lacp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregator_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_key: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_key: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_mac: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_priority: Option<i64>,
}

/// `infix-interfaces:lag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Lag {
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_monitor: Option<LinkMonitor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lacp: Option<Lacp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortLacp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregator_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor_state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_state: Option<String>,
}

/// `infix-interfaces:lag-port`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LagPort {
    pub lag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link_failures: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lacp: Option<PortLacp>,
}

/// Bond master subtree; `None` for modes without a YANG counterpart.
pub fn lag(link: &Link) -> Option<Lag> {
    if link.kind() != Some("bond") {
        return None;
    }
    let data = link.info_data().unwrap_or(&Value::Null);
    let mode = lookup_str(data, &["mode"]).and_then(mode)?;

    let link_monitor = lookup_i64(data, &["miimon"]).map(|interval| LinkMonitor {
        interval,
        debounce: Debounce {
            up: lookup_i64(data, &["updelay"]).unwrap_or(0),
            down: lookup_i64(data, &["downdelay"]).unwrap_or(0),
        },
    });

    let lacp = (mode == "lacp").then(|| Lacp {
        mode: lookup(data, &["ad_lacp_active"]).map(|active| {
            if active.as_str() == Some("off") || active.as_i64() == Some(0) {
                "passive"
            } else {
                "active"
            }
        }),
        rate: lookup_str(data, &["ad_lacp_rate"]).map(|rate| {
            if rate == "fast" { "fast" } else { "slow" }
        }),
        aggregator_id: lookup_i64(data, &["ad_info", "aggregator"]),
        actor_key: lookup_i64(data, &["ad_info", "actor_key"]),
        partner_key: lookup_i64(data, &["ad_info", "partner_key"]),
        partner_mac: lookup_str(data, &["ad_info", "partner_mac"]).map(str::to_owned),
        system_priority: lookup_i64(data, &["ad_actor_sys_prio"]),
    });

    Some(Lag {
        mode,
        hash: lookup_str(data, &["xmit_hash_policy"]).and_then(hash_policy),
        link_monitor,
        lacp,
    })
}

/// Bond member subtree.
pub fn lag_port(link: &Link) -> Option<LagPort> {
    if link.slave_kind() != Some("bond") {
        return None;
    }
    let lag = link.master.clone()?;
    let data = link.slave_data().unwrap_or(&Value::Null);

    let state = lookup_str(data, &["state"]).and_then(|s| match s {
        "ACTIVE" => Some("active"),
        "BACKUP" => Some("backup"),
        _ => None,
    });
    let lacp = PortLacp {
        aggregator_id: lookup_i64(data, &["ad_aggregator_id"]),
        actor_state: lookup_i64(data, &["ad_actor_oper_port_state"]).map(port_state),
        partner_state: lookup_i64(data, &["ad_partner_oper_port_state"]).map(port_state),
    };
    let has_lacp =
        lacp.aggregator_id.is_some() || lacp.actor_state.is_some() || lacp.partner_state.is_some();

    Some(LagPort {
        lag,
        state,
        link_failures: lookup_i64(data, &["link_failure_count"]),
        lacp: has_lacp.then_some(lacp),
    })
}
