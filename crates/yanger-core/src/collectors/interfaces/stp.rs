// ── Spanning tree state from mstpctl ──

use serde::Serialize;
use serde_json::Value;

use crate::common::time::seconds_ago;
use crate::common::tree::{first_item, lookup_i64, lookup_str};
use crate::context::Context;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgeId {
    pub priority: u32,
    pub system_id: u32,
    pub address: String,
}

/// Decode an mstpctl bridge id, `8.000.02:00:00:00:00:01`.
pub fn bridge_id(text: &str) -> Option<BridgeId> {
    let mut parts = text.splitn(3, '.');
    let priority = u32::from_str_radix(parts.next()?, 16).ok()?;
    let system_id = u32::from_str_radix(parts.next()?, 16).ok()?;
    let address = parts.next()?.to_ascii_lowercase();
    Some(BridgeId {
        priority: priority * 4096,
        system_id,
        address,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortId {
    pub priority: u32,
    pub port_id: u32,
}

/// Decode an mstpctl port id, `8.001`.
pub fn port_id(text: &str) -> Option<PortId> {
    let (priority, port) = text.split_once('.')?;
    Some(PortId {
        priority: u32::from_str_radix(priority, 16).ok()? * 16,
        port_id: u32::from_str_radix(port, 16).ok()?,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TopologyChange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    pub in_progress: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgeCist {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge_id: Option<BridgeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_id: Option<BridgeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root_port: Option<String>,
    pub topology_change: TopologyChange,
}

/// Bridge-level `stp` container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgeStp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub force_protocol: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hello_time: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_delay: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmit_hold_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_hops: Option<i64>,
    pub cist: BridgeCist,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Designated {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge_id: Option<BridgeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_id: Option<PortId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortCist {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_id: Option<PortId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_path_cost: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub designated: Option<Designated>,
}

/// Port-level `stp` container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PortStp {
    pub edge: bool,
    pub cist: PortCist,
}

fn yes(value: &Value, key: &str) -> bool {
    lookup_str(value, &[key]) == Some("yes")
}

fn protocol(text: &str) -> Option<&'static str> {
    match text {
        "stp" => Some("stp"),
        "rstp" => Some("rstp"),
        "mstp" => Some("mstp"),
        _ => None,
    }
}

/// Port role, YANG enum name.
pub fn role(text: &str) -> Option<&'static str> {
    match text.to_ascii_lowercase().as_str() {
        "root" => Some("root"),
        "designated" => Some("designated"),
        "alternate" => Some("alternate"),
        "backup" => Some("backup"),
        "master" => Some("master"),
        "disabled" => Some("disabled"),
        _ => None,
    }
}

/// Port STP/bridge forwarding state, YANG enum name.
pub fn state(text: &str) -> Option<&'static str> {
    match text.to_ascii_lowercase().as_str() {
        "disabled" => Some("disabled"),
        "listening" => Some("listening"),
        "learning" => Some("learning"),
        "forwarding" => Some("forwarding"),
        "blocking" | "discarding" => Some("blocking"),
        _ => None,
    }
}

fn mstpctl(ctx: &Context<'_>, args: &[&str]) -> Option<Value> {
    let mut argv = vec!["mstpctl", "-f", "json"];
    argv.extend_from_slice(args);
    let value = first_item(ctx.host().run_json(&argv).ok()?);
    value.is_object().then_some(value)
}

/// Bridge STP state, `None` when mstpd does not manage `bridge`.
pub fn bridge_stp(ctx: &Context<'_>, bridge: &str) -> Option<BridgeStp> {
    let info = mstpctl(ctx, &["showbridge", bridge])?;
    if lookup_str(&info, &["enabled"]) == Some("no") {
        return None;
    }
    let tree = mstpctl(ctx, &["showtree", bridge, "0"]).unwrap_or_else(|| info.clone());

    let pick = |key: &str| lookup_str(&tree, &[key]).or_else(|| lookup_str(&info, &[key]));
    let since = lookup_i64(&tree, &["time-since-topology-change"])
        .or_else(|| lookup_i64(&info, &["time-since-topology-change"]));

    Some(BridgeStp {
        force_protocol: lookup_str(&info, &["force-protocol-version"]).and_then(protocol),
        hello_time: lookup_i64(&info, &["hello-time"]),
        forward_delay: lookup_i64(&info, &["forward-delay"]),
        max_age: lookup_i64(&info, &["max-age"]),
        transmit_hold_count: lookup_i64(&info, &["tx-hold-count"]),
        max_hops: lookup_i64(&info, &["max-hops"]),
        cist: BridgeCist {
            bridge_id: pick("bridge-id").and_then(bridge_id),
            root_id: pick("designated-root").and_then(bridge_id),
            root_port: pick("root-port")
                .filter(|port| !port.is_empty())
                .map(str::to_owned),
            topology_change: TopologyChange {
                count: lookup_i64(&tree, &["topology-change-count"])
                    .or_else(|| lookup_i64(&info, &["topology-change-count"])),
                in_progress: yes(&tree, "topology-change") || yes(&info, "topology-change"),
                port: pick("topology-change-port")
                    .filter(|port| !port.is_empty() && *port != "None")
                    .map(str::to_owned),
                time: since.and_then(|secs| seconds_ago(&ctx.now(), secs)),
            },
        },
    })
}

/// Port STP state from `showportdetail`.
pub fn port_stp(ctx: &Context<'_>, bridge: &str, port: &str) -> Option<PortStp> {
    let detail = mstpctl(ctx, &["showportdetail", bridge, port])?;
    Some(PortStp {
        edge: yes(&detail, "oper-edge-port"),
        cist: PortCist {
            port_id: lookup_str(&detail, &["port-id"]).and_then(port_id),
            role: lookup_str(&detail, &["role"]).and_then(role),
            state: lookup_str(&detail, &["state"]).and_then(state),
            external_path_cost: lookup_i64(&detail, &["external-port-cost"]),
            designated: Some(Designated {
                bridge_id: lookup_str(&detail, &["designated-bridge"]).and_then(bridge_id),
                port_id: lookup_str(&detail, &["designated-port"]).and_then(port_id),
            })
            .filter(|d| d.bridge_id.is_some() || d.port_id.is_some()),
        },
    })
}
