// ── RIPv2 (ietf-rip) ──
//
// frr has no JSON form of `show ip rip status`, so the text is parsed
// line by line: timers and defaults, then the interface table and the
// "Routing Information Sources" table. Learned routes come from
// `show ip route rip json`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::common::time::frr_timestamp;
use crate::context::Context;

use super::{Protocol, Routing, frr_routes};

static UPDATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Sending updates every (\d+) seconds").expect("Invalid rip status regex")
});
static TIMEOUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Timeout after (\d+) seconds, garbage collect after (\d+) seconds")
        .expect("Invalid rip status regex")
});
static METRIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Default redistribution metric is (\d+)").expect("Invalid rip status regex")
});
static DISTANCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Distance: \(default is (\d+)\)").expect("Invalid rip status regex")
});
static INTERFACE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\S+)\s+(1 2|1|2)\s+(1 2|1|2)(?:\s+\S+)?$").expect("Invalid rip status regex")
});
static SOURCE_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+\.\d+\.\d+\.\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s+(\S+)$")
        .expect("Invalid rip status regex")
});

// ── Parsed status ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusInterface {
    pub name: String,
    pub send: String,
    pub receive: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSource {
    pub address: String,
    pub bad_packets: u32,
    pub bad_routes: u32,
    pub distance: u32,
    pub last_update: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub update_interval: Option<u32>,
    pub invalid_interval: Option<u32>,
    pub flush_interval: Option<u32>,
    pub default_metric: Option<u32>,
    pub distance: Option<u32>,
    pub interfaces: Vec<StatusInterface>,
    pub sources: Vec<StatusSource>,
}

impl Status {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Header,
    Interfaces,
    Sources,
}

fn capture(re: &Regex, line: &str, group: usize) -> Option<u32> {
    re.captures(line)?.get(group)?.as_str().parse().ok()
}

/// RIP version column (`1`, `2` or `1 2`) as the YANG enum.
pub fn version(text: &str) -> String {
    text.trim().replace(' ', "-")
}

/// Parse `show ip rip status`.
pub fn parse_status(text: &str) -> Status {
    let mut status = Status::default();
    let mut section = Section::Header;

    for raw in text.lines() {
        let line = raw.trim();
        if line.starts_with("Interface") && line.contains("Send") {
            section = Section::Interfaces;
            continue;
        }
        if line.starts_with("Gateway") {
            section = Section::Sources;
            continue;
        }

        match section {
            Section::Interfaces => {
                if let Some(caps) = INTERFACE_ROW.captures(line) {
                    status.interfaces.push(StatusInterface {
                        name: caps[1].to_owned(),
                        send: version(&caps[2]),
                        receive: version(&caps[3]),
                    });
                    continue;
                }
                section = Section::Header;
            }
            Section::Sources => {
                if let Some(caps) = SOURCE_ROW.captures(line) {
                    status.sources.push(StatusSource {
                        address: caps[1].to_owned(),
                        bad_packets: caps[2].parse().unwrap_or_default(),
                        bad_routes: caps[3].parse().unwrap_or_default(),
                        distance: caps[4].parse().unwrap_or_default(),
                        last_update: caps[5].to_owned(),
                    });
                    continue;
                }
                section = Section::Header;
            }
            Section::Header => {}
        }

        if let Some(update) = capture(&UPDATE, line, 1) {
            status.update_interval = Some(update);
        }
        if let Some(invalid) = capture(&TIMEOUT, line, 1) {
            status.invalid_interval = Some(invalid);
            status.flush_interval = capture(&TIMEOUT, line, 2);
        }
        if let Some(metric) = capture(&METRIC, line, 1) {
            status.default_metric = Some(metric);
        }
        if let Some(distance) = capture(&DISTANCE, line, 1) {
            status.distance = Some(distance);
        }
    }
    status
}

// ── Output ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Timers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_interval: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flush_interval: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Interface {
    pub interface: String,
    pub oper_status: &'static str,
    pub send_version: String,
    pub receive_version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interfaces {
    pub interface: Vec<Interface>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Neighbor {
    pub ipv4_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
    pub bad_packets_rcvd: u32,
    pub bad_routes_rcvd: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Neighbors {
    pub neighbor: Vec<Neighbor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Route {
    pub ipv4_prefix: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hop: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Routes {
    pub route: Vec<Route>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ipv4 {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub neighbors: Option<Neighbors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<Routes>,
}

/// `ietf-rip:rip` container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Rip {
    pub timers: Timers,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_metric: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Interfaces>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<Ipv4>,
}

fn routes(ctx: &Context<'_>) -> Vec<Route> {
    let value = ctx
        .host()
        .run_json(&["vtysh", "-c", "show ip route rip json"])
        .unwrap_or_default();
    frr_routes(value)
        .into_iter()
        .map(|frr| {
            let first = frr.nexthops.first();
            Route {
                ipv4_prefix: frr.prefix.clone(),
                next_hop: first.and_then(|hop| hop.ip.clone()),
                interface: first.and_then(|hop| hop.interface_name.clone()),
                metric: frr.metric,
            }
        })
        .collect()
}

/// RIPv2 instance state; `{}` when ripd does not answer.
pub fn operational(ctx: &Context<'_>) -> Routing {
    let text = ctx
        .host()
        .run(&["vtysh", "-c", "show ip rip status"])
        .unwrap_or_default();
    let status = parse_status(&text);
    if status.is_empty() {
        return Routing::default();
    }

    let now = ctx.now();
    let interface: Vec<Interface> = status
        .interfaces
        .into_iter()
        .map(|iface| Interface {
            interface: iface.name,
            oper_status: "up",
            send_version: iface.send,
            receive_version: iface.receive,
        })
        .collect();
    let neighbor: Vec<Neighbor> = status
        .sources
        .into_iter()
        .map(|source| Neighbor {
            last_update: frr_timestamp(&now, &source.last_update),
            ipv4_address: source.address,
            bad_packets_rcvd: source.bad_packets,
            bad_routes_rcvd: source.bad_routes,
        })
        .collect();
    let route = routes(ctx);

    let ipv4 = (!neighbor.is_empty() || !route.is_empty()).then(|| Ipv4 {
        neighbors: (!neighbor.is_empty()).then_some(Neighbors { neighbor }),
        routes: (!route.is_empty()).then_some(Routes { route }),
    });
    let rip = Rip {
        timers: Timers {
            update_interval: status.update_interval,
            invalid_interval: status.invalid_interval,
            flush_interval: status.flush_interval,
        },
        default_metric: status.default_metric,
        distance: status.distance,
        interfaces: (!interface.is_empty()).then_some(Interfaces { interface }),
        ipv4,
    };
    Routing::protocol("ietf-rip:ripv2", "default", Protocol::Rip(rip))
}
