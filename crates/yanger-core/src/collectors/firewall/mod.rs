//! `infix-firewall` state from firewalld.
//!
//! Only active zones are published (a zone is active when it has
//! interfaces or sources). Policies come with their rich-rule filters and
//! are followed by the implicit `default-drop` policy. Services are the
//! ones referenced by active zones.

pub mod busctl;
pub mod rich_rule;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::common::tree::as_i64;
use crate::context::Context;

use self::busctl::{FirewallD, MAIN, POLICIES, POLICY, ZONE, strings};
use self::rich_rule::Filter;

const IMMUTABLE: &str = "(immutable)";

// ── Output ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Port {
    pub lower: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<u16>,
    pub proto: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardTo {
    pub addr: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortForward {
    pub lower: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<u16>,
    pub proto: String,
    pub to: ForwardTo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Zone {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub action: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interface: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub network: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub port: Vec<Port>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub port_forward: Vec<PortForward>,
    pub immutable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Custom {
    pub filter: Vec<Filter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Policy {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub action: &'static str,
    pub priority: i64,
    pub ingress: Vec<String>,
    pub egress: Vec<String>,
    pub masquerade: bool,
    pub immutable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<Custom>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Service {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub port: Vec<Port>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FirewallState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<String>,
    pub lockdown: bool,
    pub zone: Vec<Zone>,
    pub policy: Vec<Policy>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub service: Vec<Service>,
}

/// Collector output; `{}` when firewalld is not running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Firewall {
    #[serde(rename = "infix-firewall:firewall", skip_serializing_if = "Option::is_none")]
    pub firewall: Option<FirewallState>,
}

// ── Translation ─────────────────────────────────────────────────────

pub fn zone_action(target: &str) -> &'static str {
    match target {
        "%%REJECT%%" | "REJECT" => "reject",
        "DROP" => "drop",
        _ => "accept",
    }
}

pub fn policy_action(target: &str) -> &'static str {
    match target {
        "ACCEPT" => "accept",
        "DROP" => "drop",
        "%%REJECT%%" | "REJECT" => "reject",
        _ => "continue",
    }
}

/// `lower[-upper]` port text.
pub fn port_range(text: &str) -> Option<(u16, Option<u16>)> {
    match text.split_once('-') {
        Some((lower, upper)) => Some((lower.trim().parse().ok()?, upper.trim().parse().ok())),
        None => Some((text.trim().parse().ok()?, None)),
    }
}

/// `a(ss)` port tuples `[port, proto]`.
pub fn ports(value: Option<&Value>) -> Vec<Port> {
    tuples(value)
        .filter_map(|tuple| {
            let (lower, upper) = port_range(tuple.first()?.as_str()?)?;
            Some(Port {
                lower,
                upper,
                proto: tuple.get(1)?.as_str()?.to_owned(),
            })
        })
        .collect()
}

/// `a(ssss)` forward tuples `[port, proto, to-port, to-addr]`.
pub fn forwards(value: Option<&Value>) -> Vec<PortForward> {
    tuples(value)
        .filter_map(|tuple| {
            let (lower, upper) = port_range(tuple.first()?.as_str()?)?;
            let to_port = tuple
                .get(2)
                .and_then(Value::as_str)
                .and_then(|p| port_range(p).map(|(port, _)| port))
                .unwrap_or(lower);
            Some(PortForward {
                lower,
                upper,
                proto: tuple.get(1)?.as_str()?.to_owned(),
                to: ForwardTo {
                    addr: tuple.get(3)?.as_str()?.to_owned(),
                    port: to_port,
                },
            })
        })
        .collect()
}

fn tuples(value: Option<&Value>) -> impl Iterator<Item = &Vec<Value>> {
    value
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice)
        .iter()
        .filter_map(Value::as_array)
}

fn text(settings: &Map<String, Value>, key: &str) -> Option<String> {
    settings
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

fn list(settings: &Map<String, Value>, key: &str) -> Vec<String> {
    settings.get(key).map(strings).unwrap_or_default()
}

fn immutable(settings: &Map<String, Value>) -> bool {
    text(settings, "short").is_some_and(|short| short.contains(IMMUTABLE))
}

// ── Zones ───────────────────────────────────────────────────────────

/// Active zones and their bindings, sorted by name.
fn active_zones(fw: &FirewallD<'_>) -> Vec<(String, Vec<String>, Vec<String>)> {
    let Some(Value::Object(active)) = fw.call(ZONE, "getActiveZones", &[]) else {
        return Vec::new();
    };
    let mut zones: Vec<_> = active
        .into_iter()
        .map(|(name, binding)| {
            let interfaces = binding.get("interfaces").map(strings).unwrap_or_default();
            let sources = binding.get("sources").map(strings).unwrap_or_default();
            (name, interfaces, sources)
        })
        .filter(|(_, interfaces, sources)| !interfaces.is_empty() || !sources.is_empty())
        .collect();
    zones.sort_by(|a, b| a.0.cmp(&b.0));
    zones
}

pub fn zone(name: String, interface: Vec<String>, network: Vec<String>, settings: &Map<String, Value>) -> Zone {
    Zone {
        description: text(settings, "description"),
        action: zone_action(settings.get("target").and_then(Value::as_str).unwrap_or("default")),
        interface,
        network,
        service: list(settings, "services"),
        port: ports(settings.get("ports")),
        port_forward: forwards(settings.get("forward_ports")),
        immutable: immutable(settings),
        name,
    }
}

// ── Policies ────────────────────────────────────────────────────────

pub fn policy(name: String, settings: &Map<String, Value>) -> Policy {
    let rules = list(settings, "rich_rules");
    let filter = rich_rule::filters(&rules);
    Policy {
        description: text(settings, "description"),
        action: policy_action(settings.get("target").and_then(Value::as_str).unwrap_or("CONTINUE")),
        priority: settings.get("priority").and_then(as_i64).unwrap_or(-1),
        ingress: list(settings, "ingress_zones"),
        egress: list(settings, "egress_zones"),
        masquerade: settings
            .get("masquerade")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        immutable: immutable(settings),
        custom: (!filter.is_empty()).then_some(Custom { filter }),
        name,
    }
}

/// The drop-everything policy firewalld applies after all others.
pub fn default_drop() -> Policy {
    Policy {
        name: "default-drop".to_owned(),
        description: Some("Drop all traffic not matched by another policy".to_owned()),
        action: "drop",
        priority: 32767,
        ingress: vec!["ANY".to_owned()],
        egress: vec!["ANY".to_owned()],
        masquerade: false,
        immutable: true,
        custom: None,
    }
}

fn policies(fw: &FirewallD<'_>) -> Vec<Policy> {
    let mut names = fw.strings(POLICY, "getPolicies", &[]);
    names.sort();
    let mut out: Vec<Policy> = names
        .into_iter()
        .map(|name| {
            let settings = fw.settings(POLICY, "getPolicySettings", &name);
            policy(name, &settings)
        })
        .collect();
    out.sort_by_key(|p| p.priority);
    out.push(default_drop());
    out
}

// ── Services ────────────────────────────────────────────────────────

fn services(fw: &FirewallD<'_>, zones: &[Zone]) -> Vec<Service> {
    let mut names: Vec<&str> = zones
        .iter()
        .flat_map(|z| z.service.iter().map(String::as_str))
        .collect();
    names.sort_unstable();
    names.dedup();
    names
        .into_iter()
        .map(|name| {
            let settings = fw.settings(MAIN, "getServiceSettings2", name);
            Service {
                name: name.to_owned(),
                description: text(&settings, "description"),
                port: ports(settings.get("ports")),
            }
        })
        .collect()
}

/// Firewall zones, policies and services.
pub fn operational(ctx: &Context<'_>) -> Firewall {
    let fw = FirewallD::new(ctx.host());
    let Some(default) = fw.string(ZONE, "getDefaultZone", &[]).or_else(|| fw.string(MAIN, "getDefaultZone", &[]))
    else {
        debug!("firewalld not reachable");
        return Firewall::default();
    };

    let zone: Vec<Zone> = active_zones(&fw)
        .into_iter()
        .map(|(name, interfaces, sources)| {
            let settings = fw.settings(ZONE, "getZoneSettings2", &name);
            self::zone(name, interfaces, sources, &settings)
        })
        .collect();
    let service = services(&fw, &zone);

    Firewall {
        firewall: Some(FirewallState {
            default: Some(default),
            logging: fw.string(MAIN, "getLogDenied", &[]),
            lockdown: fw
                .call(POLICIES, "queryLockdown", &[])
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            policy: policies(&fw),
            zone,
            service,
        }),
    }
}
