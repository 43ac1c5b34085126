// ── OSPFv2 (ietf-ospf) ──
//
// Areas, interfaces and neighbors come from the `ospf-status` helper,
// which nests frr's interface and neighbor views into `show ip ospf
// json`. Without the helper the same shape is merged here from the three
// vtysh commands. The local RIB is `show ip ospf route json`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::common::tree::{lookup, parse_list};
use crate::context::Context;

use super::{Protocol, Routing};

// ── frr records ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrrNeighbor {
    pub neighbor_ip: Option<String>,
    pub iface_address: Option<String>,
    pub nbr_state: Option<String>,
    pub nbr_priority: Option<u32>,
    pub router_dead_interval_timer_due_msec: Option<u64>,
    pub dead_time_msecs: Option<u64>,
    pub router_designated_id: Option<String>,
    pub router_designated_backup_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrrInterface {
    pub name: String,
    pub network_type: Option<String>,
    pub state: Option<String>,
    pub cost: Option<u32>,
    pub priority: Option<u32>,
    pub timer_msecs: Option<u32>,
    pub timer_dead_secs: Option<u32>,
    pub timer_retransmit_secs: Option<u32>,
    pub transmit_delay_secs: Option<u32>,
    pub timer_passive_iface: bool,
    pub dr_id: Option<String>,
    pub dr_address: Option<String>,
    pub bdr_id: Option<String>,
    pub bdr_address: Option<String>,
    pub neighbors: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrrArea {
    pub nssa: bool,
    pub stub_no_summary: Option<bool>,
    pub stub_shortcut: Option<bool>,
    pub interfaces: Vec<Value>,
}

impl FrrArea {
    fn area_type(&self) -> &'static str {
        if self.nssa {
            "ietf-ospf:nssa-area"
        } else if self.stub_no_summary.is_some() || self.stub_shortcut.is_some() {
            "ietf-ospf:stub-area"
        } else {
            "ietf-ospf:normal-area"
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrrRouteNexthop {
    pub ip: Option<String>,
    pub via: Option<String>,
    pub directly_attached_to: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrrOspfRoute {
    pub route_type: String,
    pub cost: Option<u32>,
    pub nexthops: Vec<FrrRouteNexthop>,
}

// ── Enumerations ────────────────────────────────────────────────────

pub fn interface_type(network_type: &str) -> Option<&'static str> {
    match network_type {
        "POINTOPOINT" => Some("point-to-point"),
        "BROADCAST" => Some("broadcast"),
        "NBMA" => Some("non-broadcast"),
        "POINTOMULTIPOINT" => Some("point-to-multipoint"),
        _ => None,
    }
}

pub fn interface_state(state: &str) -> Option<&'static str> {
    match state {
        "DependUpon" | "Down" => Some("down"),
        "Waiting" => Some("waiting"),
        "Loopback" => Some("loopback"),
        "Point-To-Point" => Some("point-to-point"),
        "DROther" => Some("dr-other"),
        "Backup" => Some("bdr"),
        "DR" => Some("dr"),
        _ => None,
    }
}

/// Neighbor state from frr's `nbrState` (`Full/DR`, `2-Way/DROther`, ...).
pub fn neighbor_state(nbr_state: &str) -> String {
    let state = nbr_state.split('/').next().unwrap_or_default();
    match state {
        "TwoWay" => "2-way".to_owned(),
        "Deleted" | "DependUpon" => "down".to_owned(),
        other => other.to_lowercase(),
    }
}

pub fn route_type(frr: &str) -> Option<&'static str> {
    match frr.trim() {
        "N" => Some("intra-area"),
        "N IA" => Some("inter-area"),
        "N E1" => Some("external-1"),
        "N E2" => Some("external-2"),
        _ => None,
    }
}

// ── Output ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Neighbor {
    pub neighbor_router_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_timer: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dr_router_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bdr_router_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Neighbors {
    pub neighbor: Vec<Neighbor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Interface {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<&'static str>,
    pub passive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hello_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dead_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retransmit_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmit_delay: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dr_router_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dr_ip_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bdr_router_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bdr_ip_addr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbors: Option<Neighbors>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interfaces {
    pub interface: Vec<Interface>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Area {
    pub area_id: String,
    pub area_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Interfaces>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Areas {
    pub area: Vec<Area>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RouteNextHop {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing_interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hop: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RouteNextHops {
    pub next_hop: Vec<RouteNextHop>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct LocalRoute {
    pub prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hops: Option<RouteNextHops>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<u32>,
    pub route_type: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalRib {
    pub route: Vec<LocalRoute>,
}

/// `ietf-ospf:ospf` container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Ospf {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub router_id: Option<String>,
    pub address_family: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub areas: Option<Areas>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_rib: Option<LocalRib>,
}

// ── Sources ─────────────────────────────────────────────────────────

fn vtysh(ctx: &Context<'_>, command: &str) -> Value {
    ctx.host()
        .run_json(&["vtysh", "-c", command])
        .unwrap_or_default()
}

/// Nest interfaces into their areas and neighbors into their interfaces,
/// the way `ospf-status` does.
pub fn merge(mut ospf: Value, interfaces: &Value, neighbors: &Value) -> Value {
    let mut by_iface: BTreeMap<String, Vec<Value>> = BTreeMap::new();
    if let Some(routers) = lookup(neighbors, &["neighbors"]).and_then(Value::as_object) {
        for (router_id, entries) in routers {
            for entry in entries.as_array().map_or(&[][..], Vec::as_slice) {
                let mut entry = entry.clone();
                let Some(fields) = entry.as_object_mut() else {
                    continue;
                };
                fields
                    .entry("neighborIp")
                    .or_insert_with(|| Value::String(router_id.clone()));
                let ifname = fields
                    .get("ifaceName")
                    .and_then(Value::as_str)
                    .and_then(|name| name.split(':').next())
                    .unwrap_or_default()
                    .to_owned();
                by_iface.entry(ifname).or_default().push(entry);
            }
        }
    }

    let Some(areas) = ospf
        .as_object_mut()
        .and_then(|root| root.get_mut("areas"))
        .and_then(Value::as_object_mut)
    else {
        return ospf;
    };
    if let Some(ifaces) = lookup(interfaces, &["interfaces"]).and_then(Value::as_object) {
        for (name, iface) in ifaces {
            let area_id = iface
                .get("area")
                .and_then(Value::as_str)
                .and_then(|area| area.split_whitespace().next())
                .unwrap_or_default();
            let Some(area) = areas.get_mut(area_id).and_then(Value::as_object_mut) else {
                debug!(%name, %area_id, "interface in unknown area");
                continue;
            };

            let mut iface = iface.as_object().cloned().unwrap_or_default();
            iface.insert("name".to_owned(), Value::String(name.clone()));
            iface.insert(
                "neighbors".to_owned(),
                Value::Array(by_iface.remove(name).unwrap_or_default()),
            );
            let list = area
                .entry("interfaces")
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(list) = list {
                list.push(Value::Object(iface));
            }
        }
    }
    ospf
}

fn status(ctx: &Context<'_>) -> Value {
    let helper = ctx.helper("ospf-status");
    if let Ok(status) = ctx.host().run_json(&[helper.as_str()]) {
        if status.get("areas").is_some() {
            return status;
        }
    }
    debug!("ospf-status unavailable, asking vtysh");
    let ospf = vtysh(ctx, "show ip ospf json");
    if ospf.get("areas").is_none() {
        return Value::Null;
    }
    merge(
        ospf,
        &vtysh(ctx, "show ip ospf interface json"),
        &vtysh(ctx, "show ip ospf neighbor detail json"),
    )
}

// ── Mapping ─────────────────────────────────────────────────────────

fn neighbor(frr: FrrNeighbor) -> Option<Neighbor> {
    let dead_msec = frr
        .router_dead_interval_timer_due_msec
        .or(frr.dead_time_msecs);
    Some(Neighbor {
        neighbor_router_id: frr.neighbor_ip?,
        address: frr.iface_address,
        state: frr.nbr_state.as_deref().map(neighbor_state),
        priority: frr.nbr_priority,
        dead_timer: dead_msec.map(|msec| msec / 1000),
        dr_router_id: frr.router_designated_id,
        bdr_router_id: frr.router_designated_backup_id,
    })
}

fn interface(frr: FrrInterface) -> Interface {
    let neighbor: Vec<Neighbor> = parse_list::<FrrNeighbor>(Value::Array(frr.neighbors))
        .into_iter()
        .filter_map(neighbor)
        .collect();
    Interface {
        name: frr.name,
        interface_type: frr.network_type.as_deref().and_then(interface_type),
        state: frr.state.as_deref().and_then(interface_state),
        passive: frr.timer_passive_iface,
        cost: frr.cost,
        priority: frr.priority,
        hello_interval: frr.timer_msecs.map(|msec| msec / 1000),
        dead_interval: frr.timer_dead_secs,
        retransmit_interval: frr.timer_retransmit_secs,
        transmit_delay: frr.transmit_delay_secs,
        dr_router_id: frr.dr_id,
        dr_ip_addr: frr.dr_address,
        bdr_router_id: frr.bdr_id,
        bdr_ip_addr: frr.bdr_address,
        neighbors: (!neighbor.is_empty()).then_some(Neighbors { neighbor }),
    }
}

fn area(area_id: &str, value: Value) -> Area {
    let frr: FrrArea = serde_json::from_value(value).unwrap_or_default();
    let area_type = frr.area_type();
    let interface: Vec<Interface> = parse_list::<FrrInterface>(Value::Array(frr.interfaces))
        .into_iter()
        .map(interface)
        .collect();
    Area {
        area_id: area_id.to_owned(),
        area_type,
        interfaces: (!interface.is_empty()).then_some(Interfaces { interface }),
    }
}

/// OSPF local RIB from `show ip ospf route json`; router entries are skipped.
pub fn local_rib(routes: Value) -> Option<LocalRib> {
    let Value::Object(prefixes) = routes else {
        return None;
    };
    let route: Vec<LocalRoute> = prefixes
        .into_iter()
        .filter_map(|(prefix, value)| {
            let frr: FrrOspfRoute = serde_json::from_value(value).ok()?;
            let route_type = route_type(&frr.route_type)?;
            let next_hop: Vec<RouteNextHop> = frr
                .nexthops
                .into_iter()
                .map(|hop| RouteNextHop {
                    outgoing_interface: hop.via.or(hop.directly_attached_to),
                    next_hop: hop.ip.filter(|ip| !ip.trim().is_empty()),
                })
                .collect();
            Some(LocalRoute {
                prefix,
                next_hops: (!next_hop.is_empty()).then_some(RouteNextHops { next_hop }),
                metric: frr.cost,
                route_type,
            })
        })
        .collect();
    (!route.is_empty()).then_some(LocalRib { route })
}

/// OSPFv2 instance state.
pub fn operational(ctx: &Context<'_>) -> Routing {
    let Value::Object(mut status) = status(ctx) else {
        return Routing::default();
    };
    let router_id = status
        .get("routerId")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let areas = match status.remove("areas") {
        Some(Value::Object(areas)) => areas,
        _ => Map::new(),
    };

    let area: Vec<Area> = areas
        .into_iter()
        .map(|(area_id, value)| area(&area_id, value))
        .collect();

    let ospf = Ospf {
        router_id,
        address_family: "ipv4",
        areas: (!area.is_empty()).then_some(Areas { area }),
        local_rib: local_rib(vtysh(ctx, "show ip ospf route json")),
    };
    Routing::protocol("ietf-ospf:ospfv2", "default", Protocol::Ospf(ospf))
}
