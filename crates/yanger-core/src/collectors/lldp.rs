//! `ieee802-dot1ab-lldp` neighbor table from lldpd.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::common::number::is_mac;
use crate::common::tree::{lookup_str, lookup_u64};
use crate::context::Context;

static AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s*days?,\s*(\d+):(\d{2}):(\d{2})$").expect("Invalid lldp age regex")
});

const ZERO_MAC: &str = "00-00-00-00-00-00";

/// lldpd ID subtype as the `ieee802-dot1ab-types` identity.
pub fn subtype(kind: &str) -> Option<&'static str> {
    match kind {
        "component" => Some("chassis-component"),
        "ifalias" => Some("interface-alias"),
        "port" => Some("port-component"),
        "mac" => Some("mac-address"),
        "ip" => Some("network-address"),
        "ifname" => Some("interface-name"),
        "local" => Some("local"),
        _ => None,
    }
}

/// lldpd neighbor age `N day(s), HH:MM:SS` in seconds.
pub fn time_mark(age: &str) -> Option<u64> {
    let caps = AGE.captures(age.trim())?;
    let field = |i: usize| caps.get(i)?.as_str().parse::<u64>().ok();
    Some(field(1)? * 86_400 + field(2)? * 3600 + field(3)? * 60 + field(4)?)
}

// ── Output ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RemoteSystem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_mark: Option<u64>,
    pub remote_index: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis_id_subtype: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chassis_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_id_subtype: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_desc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Port {
    pub name: String,
    pub dest_mac_address: String,
    pub remote_systems_data: Vec<RemoteSystem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LldpState {
    pub port: Vec<Port>,
}

/// Collector output; `{}` without neighbors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Lldp {
    #[serde(rename = "ieee802-dot1ab-lldp:lldp", skip_serializing_if = "Option::is_none")]
    pub lldp: Option<LldpState>,
}

// ── lldpcli JSON ────────────────────────────────────────────────────

/// `(name, body)` pairs of a keyed lldpd list: either an array of
/// single-key objects or one object holding every key.
fn keyed(value: &Value) -> Vec<(&str, &Value)> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_object)
            .flat_map(|obj| obj.iter().map(|(k, v)| (k.as_str(), v)))
            .collect(),
        Value::Object(obj) => obj.iter().map(|(k, v)| (k.as_str(), v)).collect(),
        _ => Vec::new(),
    }
}

/// Chassis name and body; lldpd keys the chassis by its system name.
fn chassis(value: &Value) -> (Option<&str>, Option<&Value>) {
    if value.get("id").is_some() {
        return (lookup_str(value, &["name"]), Some(value));
    }
    keyed(value)
        .into_iter()
        .next()
        .map_or((None, None), |(name, body)| (Some(name), Some(body)))
}

fn owned(value: Option<&Value>, path: &[&str]) -> Option<String> {
    value.and_then(|v| lookup_str(v, path)).map(str::to_owned)
}

fn remote(neighbor: &Value, fallback_index: u64) -> RemoteSystem {
    let (name, body) = neighbor
        .get("chassis")
        .map_or((None, None), chassis);
    let port = neighbor.get("port");
    RemoteSystem {
        time_mark: lookup_str(neighbor, &["age"]).and_then(time_mark),
        remote_index: lookup_u64(neighbor, &["rid"]).unwrap_or(fallback_index),
        chassis_id_subtype: body
            .and_then(|b| lookup_str(b, &["id", "type"]))
            .and_then(subtype),
        chassis_id: owned(body, &["id", "value"]),
        port_id_subtype: port
            .and_then(|p| lookup_str(p, &["id", "type"]))
            .and_then(subtype),
        port_id: owned(port, &["id", "value"]),
        port_desc: owned(port, &["descr"]),
        system_name: name.map(str::to_owned),
        system_description: owned(body, &["descr"]),
    }
}

fn dest_mac(remote: &RemoteSystem) -> String {
    [&remote.chassis_id, &remote.port_id]
        .into_iter()
        .flatten()
        .find(|id| is_mac(id))
        .map_or_else(|| ZERO_MAC.to_owned(), |id| id.to_ascii_lowercase().replace(':', "-"))
}

/// Ports with their remote systems, in lldpd order.
pub fn ports(neighbors: &Value) -> Vec<Port> {
    let interfaces = neighbors
        .get("lldp")
        .and_then(|lldp| lldp.get("interface"))
        .map(keyed)
        .unwrap_or_default();

    let mut ports: Vec<Port> = Vec::new();
    for (index, (ifname, neighbor)) in interfaces.into_iter().enumerate() {
        let system = remote(neighbor, u64::try_from(index + 1).unwrap_or(u64::MAX));
        if let Some(port) = ports.iter_mut().find(|p| p.name == ifname) {
            port.remote_systems_data.push(system);
        } else {
            ports.push(Port {
                name: ifname.to_owned(),
                dest_mac_address: dest_mac(&system),
                remote_systems_data: vec![system],
            });
        }
    }
    ports
}

/// LLDP neighbors per local port.
pub fn operational(ctx: &Context<'_>) -> Lldp {
    let neighbors = ctx
        .host()
        .run_json(&["lldpcli", "show", "neighbors", "-f", "json"])
        .unwrap_or_default();
    let port = ports(&neighbors);
    Lldp {
        lldp: (!port.is_empty()).then_some(LldpState { port }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::testutil::Recording;

    use super::*;

    const NEIGHBORS: &str = r#"{"lldp": {"interface": [
        {"e1": {"via": "LLDP", "rid": "1", "age": "0 day, 00:01:23",
                "chassis": {"switch-b": {"id": {"type": "mac", "value": "00:11:22:AA:BB:CC"},
                                         "descr": "Infix OS"}},
                "port": {"id": {"type": "ifname", "value": "e7"}, "descr": "uplink"}}},
        {"e2": {"via": "LLDP", "rid": "2", "age": "2 days, 01:00:00",
                "chassis": {"id": {"type": "ip", "value": "10.0.0.9"}},
                "port": {"id": {"type": "mac", "value": "02:00:00:00:00:09"}}}},
        {"e2": {"via": "LLDP", "rid": "3", "age": "0 day, 00:00:05",
                "chassis": {"id": {"type": "local", "value": "box"}},
                "port": {"id": {"type": "local", "value": "1"}}}}
    ]}}"#;

    #[test]
    fn neighbors_grouped_by_port() {
        let rec = Recording::new().run(&["lldpcli", "show", "neighbors", "-f", "json"], NEIGHBORS);
        let host = rec.host();
        let ctx = Context::new(&host);

        let value = serde_json::to_value(operational(&ctx)).unwrap();
        let ports = value["ieee802-dot1ab-lldp:lldp"]["port"].as_array().unwrap();
        assert_eq!(ports.len(), 2);
        assert_eq!(
            ports[0],
            json!({
                "name": "e1",
                "dest-mac-address": "00-11-22-aa-bb-cc",
                "remote-systems-data": [{
                    "time-mark": 83,
                    "remote-index": 1,
                    "chassis-id-subtype": "mac-address",
                    "chassis-id": "00:11:22:AA:BB:CC",
                    "port-id-subtype": "interface-name",
                    "port-id": "e7",
                    "port-desc": "uplink",
                    "system-name": "switch-b",
                    "system-description": "Infix OS"
                }]
            })
        );
        assert_eq!(ports[1]["dest-mac-address"], json!("02-00-00-00-00-09"));
        assert_eq!(ports[1]["remote-systems-data"][0]["time-mark"], json!(176_400));
        assert_eq!(ports[1]["remote-systems-data"][0]["chassis-id-subtype"], json!("network-address"));
        assert_eq!(ports[1]["remote-systems-data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn single_interface_object_and_zero_mac() {
        let neighbors = json!({"lldp": {"interface": {"e3": {
            "rid": "4", "chassis": {"id": {"type": "local", "value": "x"}},
            "port": {"id": {"type": "ifalias", "value": "y"}}
        }}}});
        let ports = ports(&neighbors);
        assert_eq!(ports[0].dest_mac_address, ZERO_MAC);
        assert_eq!(ports[0].remote_systems_data[0].port_id_subtype, Some("interface-alias"));
    }

    #[test]
    fn no_neighbors() {
        let rec = Recording::new().run(&["lldpcli", "show", "neighbors", "-f", "json"], r#"{"lldp": {}}"#);
        let host = rec.host();
        let ctx = Context::new(&host);
        assert_eq!(serde_json::to_value(operational(&ctx)).unwrap(), json!({}));
    }
}
