//! `ietf-routing` operational state.
//!
//! The RIB collector lives here together with the `ietf-routing:routing`
//! envelope shared by the control-plane protocol collectors in
//! [`ospf`], [`rip`] and [`bfd`].

pub mod bfd;
pub mod ospf;
pub mod rip;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::common::time::frr_timestamp;
use crate::context::Context;
use crate::yang::Presence;

// ── Envelope ────────────────────────────────────────────────────────

/// One `control-plane-protocol` body, keyed by its module-qualified name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Protocol {
    #[serde(rename = "ietf-ospf:ospf")]
    Ospf(ospf::Ospf),
    #[serde(rename = "ietf-rip:rip")]
    Rip(rip::Rip),
    #[serde(rename = "ietf-bfd:bfd")]
    Bfd(bfd::Bfd),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControlPlaneProtocol {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: String,
    #[serde(flatten)]
    pub body: Protocol,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ControlPlaneProtocols {
    pub control_plane_protocol: Vec<ControlPlaneProtocol>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RoutingTree {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub control_plane_protocols: Option<ControlPlaneProtocols>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ribs: Option<Ribs>,
}

/// Collector output for every routing model; `{}` when nothing is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Routing {
    #[serde(rename = "ietf-routing:routing", skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingTree>,
}

impl Routing {
    /// Wrap a single control-plane protocol instance.
    pub fn protocol(kind: &'static str, name: &str, body: Protocol) -> Self {
        Self {
            routing: Some(RoutingTree {
                control_plane_protocols: Some(ControlPlaneProtocols {
                    control_plane_protocol: vec![ControlPlaneProtocol {
                        kind,
                        name: name.to_owned(),
                        body,
                    }],
                }),
                ribs: None,
            }),
        }
    }
}

// ── frr routes ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrrNexthop {
    pub ip: Option<String>,
    pub interface_name: Option<String>,
    pub fib: bool,
    pub blackhole: bool,
    pub reject: bool,
    pub unreachable: bool,
    pub admin_prohibited: bool,
}

impl FrrNexthop {
    /// `special-next-hop` value, for nexthops without address or interface.
    pub fn special(&self) -> Option<&'static str> {
        if self.admin_prohibited {
            Some("prohibit")
        } else if self.reject || self.unreachable {
            Some("unreachable")
        } else if self.blackhole {
            Some("blackhole")
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FrrRoute {
    pub prefix: String,
    pub protocol: String,
    pub selected: bool,
    pub installed: Option<bool>,
    pub distance: Option<u32>,
    pub metric: Option<u32>,
    pub uptime: Option<String>,
    pub interface_name: Option<String>,
    pub ip: Option<String>,
    pub blackhole: bool,
    pub reject: bool,
    pub unreachable: bool,
    pub admin_prohibited: bool,
    pub nexthops: Vec<FrrNexthop>,
}

impl FrrRoute {
    /// Route-level next-hop fields, used when frr lists no `nexthops`.
    fn scalar_hop(&self) -> FrrNexthop {
        FrrNexthop {
            ip: self.ip.clone().filter(|ip| !ip.is_empty()),
            interface_name: self.interface_name.clone(),
            fib: false,
            blackhole: self.blackhole,
            reject: self.reject,
            unreachable: self.unreachable,
            admin_prohibited: self.admin_prohibited,
        }
    }

    /// Installed in the kernel; frr leaves the flag out on older releases,
    /// in which case selection implies installation.
    pub fn is_installed(&self) -> bool {
        self.installed.unwrap_or(self.selected)
    }
}

/// Flatten `show ip[v6] route json` (`{prefix: [route, ...]}`) into routes,
/// skipping malformed entries.
pub fn frr_routes(value: Value) -> Vec<FrrRoute> {
    let Value::Object(prefixes) = value else {
        return Vec::new();
    };
    let mut routes = Vec::new();
    for (prefix, entries) in prefixes {
        let Value::Array(entries) = entries else {
            continue;
        };
        for entry in entries {
            match serde_json::from_value::<FrrRoute>(entry) {
                Ok(mut route) => {
                    if route.prefix.is_empty() {
                        route.prefix.clone_from(&prefix);
                    }
                    routes.push(route);
                }
                Err(err) => debug!(%prefix, error = %err, "skipping malformed route"),
            }
        }
    }
    routes
}

/// `source-protocol` identity for an frr protocol name.
pub fn source_protocol(protocol: &str) -> &'static str {
    match protocol {
        "connected" => "direct",
        "static" => "static",
        "ospf" => "ietf-ospf:ospfv2",
        "ospf6" => "ietf-ospf:ospfv3",
        "rip" => "ietf-rip:ripv2",
        _ => "infix-routing:kernel",
    }
}

// ── RIB output ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Afi {
    Ipv4,
    Ipv6,
}

impl Afi {
    pub fn name(self) -> &'static str {
        match self {
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
        }
    }

    fn show_routes(self) -> &'static str {
        match self {
            Self::Ipv4 => "show ip route json",
            Self::Ipv6 => "show ipv6 route json",
        }
    }
}

/// One entry of a `next-hop-list`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NextHop {
    #[serde(rename = "ietf-ipv4-unicast-routing:address", skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(rename = "ietf-ipv6-unicast-routing:address", skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing_interface: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_next_hop: Option<&'static str>,
    #[serde(rename = "infix-routing:installed", skip_serializing_if = "Option::is_none")]
    pub installed: Option<Presence>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NextHopList {
    pub next_hop: Vec<NextHop>,
}

/// Route `next-hop` container: a list, or a single next hop given by
/// address, outgoing interface or special value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NextHopChoice {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outgoing_interface: Option<String>,
    #[serde(
        rename = "ietf-ipv4-unicast-routing:next-hop-address",
        skip_serializing_if = "Option::is_none"
    )]
    pub ipv4_address: Option<String>,
    #[serde(
        rename = "ietf-ipv6-unicast-routing:next-hop-address",
        skip_serializing_if = "Option::is_none"
    )]
    pub ipv6_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_next_hop: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hop_list: Option<NextHopList>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Route {
    #[serde(
        rename = "ietf-ipv4-unicast-routing:destination-prefix",
        skip_serializing_if = "Option::is_none"
    )]
    pub ipv4_prefix: Option<String>,
    #[serde(
        rename = "ietf-ipv6-unicast-routing:destination-prefix",
        skip_serializing_if = "Option::is_none"
    )]
    pub ipv6_prefix: Option<String>,
    pub source_protocol: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_preference: Option<u32>,
    #[serde(rename = "ietf-ospf:metric", skip_serializing_if = "Option::is_none")]
    pub ospf_metric: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<Presence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_hop: Option<NextHopChoice>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Routes {
    pub route: Vec<Route>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Rib {
    pub name: &'static str,
    pub address_family: &'static str,
    pub routes: Routes,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Ribs {
    pub rib: Vec<Rib>,
}

fn next_hop(afi: Afi, installed: bool, hop: &FrrNexthop) -> NextHop {
    let address = hop.ip.clone().filter(|ip| !ip.is_empty());
    let mut out = NextHop {
        installed: Presence::when(installed && hop.fib),
        ..NextHop::default()
    };
    if address.is_some() {
        match afi {
            Afi::Ipv4 => out.ipv4_address = address,
            Afi::Ipv6 => out.ipv6_address = address,
        }
    } else if hop.interface_name.is_some() {
        out.outgoing_interface.clone_from(&hop.interface_name);
    } else {
        out.special_next_hop = Some(hop.special().unwrap_or("unreachable"));
    }
    out
}

/// Scalar `next-hop` of a route without a nexthop list. Address and
/// interface may both be set; a special value only stands alone.
fn simple_next_hop(afi: Afi, hop: &FrrNexthop) -> Option<NextHopChoice> {
    let mut out = NextHopChoice {
        outgoing_interface: hop.interface_name.clone(),
        ..NextHopChoice::default()
    };
    match afi {
        Afi::Ipv4 => out.ipv4_address.clone_from(&hop.ip),
        Afi::Ipv6 => out.ipv6_address.clone_from(&hop.ip),
    }
    if hop.ip.is_none() && hop.interface_name.is_none() {
        out.special_next_hop = Some(hop.special()?);
    }
    Some(out)
}

/// Map one frr route to a RIB entry.
pub fn route(ctx: &Context<'_>, afi: Afi, frr: &FrrRoute) -> Route {
    let installed = frr.is_installed();
    let next_hop = if frr.nexthops.is_empty() {
        simple_next_hop(afi, &frr.scalar_hop())
    } else {
        Some(NextHopChoice {
            next_hop_list: Some(NextHopList {
                next_hop: frr
                    .nexthops
                    .iter()
                    .map(|hop| next_hop(afi, installed, hop))
                    .collect(),
            }),
            ..NextHopChoice::default()
        })
    };

    let is_ospf = matches!(frr.protocol.as_str(), "ospf" | "ospf6");
    let prefix = Some(frr.prefix.clone());
    Route {
        ipv4_prefix: prefix.clone().filter(|_| afi == Afi::Ipv4),
        ipv6_prefix: prefix.filter(|_| afi == Afi::Ipv6),
        source_protocol: source_protocol(&frr.protocol),
        route_preference: frr.distance,
        ospf_metric: frr.metric.filter(|_| is_ospf),
        last_updated: frr
            .uptime
            .as_deref()
            .and_then(|uptime| frr_timestamp(&ctx.now(), uptime)),
        active: Presence::when(frr.selected && next_hop.is_some()),
        next_hop,
    }
}

fn rib(ctx: &Context<'_>, afi: Afi) -> Option<Rib> {
    let value = ctx
        .host()
        .run_json(&["vtysh", "-c", afi.show_routes()])
        .unwrap_or_default();
    let route: Vec<Route> = frr_routes(value)
        .iter()
        .map(|frr| route(ctx, afi, frr))
        .collect();
    (!route.is_empty()).then_some(Rib {
        name: afi.name(),
        address_family: afi.name(),
        routes: Routes { route },
    })
}

/// Kernel RIBs as seen by frr, one per address family.
pub fn operational(ctx: &Context<'_>) -> Routing {
    let rib: Vec<Rib> = [Afi::Ipv4, Afi::Ipv6]
        .into_iter()
        .filter_map(|afi| rib(ctx, afi))
        .collect();
    if rib.is_empty() {
        return Routing::default();
    }
    Routing {
        routing: Some(RoutingTree {
            control_plane_protocols: None,
            ribs: Some(Ribs { rib }),
        }),
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
    fn ospf_route_with_installed_nexthop() {
        let rec = Recording::new().run(
            &["vtysh", "-c", "show ip route json"],
            r#"{"10.0.0.0/24":[{"protocol":"ospf","distance":110,"metric":20,"selected":true,
                "nexthops":[{"ip":"192.168.1.1","fib":true}],"uptime":"00:01:30"}]}"#,
        );
        let host = rec.host();
        let ctx = Context::new(&host);

        let value = serde_json::to_value(operational(&ctx)).unwrap();
        assert_eq!(
            value,
            json!({"ietf-routing:routing": {"ribs": {"rib": [{
                "name": "ipv4",
                "address-family": "ipv4",
                "routes": {"route": [{
                    "ietf-ipv4-unicast-routing:destination-prefix": "10.0.0.0/24",
                    "source-protocol": "ietf-ospf:ospfv2",
                    "route-preference": 110,
                    "ietf-ospf:metric": 20,
                    "last-updated": "2023-01-01T11:58:30+00:00",
                    "active": [null],
                    "next-hop": {"next-hop-list": {"next-hop": [{
                        "ietf-ipv4-unicast-routing:address": "192.168.1.1",
                        "infix-routing:installed": [null]
                    }]}}
                }]}
            }]}}})
        );
    }

    #[test]
    fn ipv6_connected_and_blackhole() {
        let rec = Recording::new().run(
            &["vtysh", "-c", "show ipv6 route json"],
            r#"{"2001:db8::/64":[{"prefix":"2001:db8::/64","protocol":"connected","distance":0,
                  "metric":0,"selected":true,"installed":true,
                  "nexthops":[{"directlyConnected":true,"interfaceName":"e1","fib":true}]}],
                "2001:db8:1::/48":[{"protocol":"static","distance":1,"selected":false,
                  "nexthops":[{"blackhole":true}]}]}"#,
        );
        let host = rec.host();
        let ctx = Context::new(&host);

        let value = serde_json::to_value(operational(&ctx)).unwrap();
        let rib = &value["ietf-routing:routing"]["ribs"]["rib"][0];
        assert_eq!(rib["name"], json!("ipv6"));

        let routes = rib["routes"]["route"].as_array().unwrap();
        let by_prefix = |prefix: &str| {
            routes
                .iter()
                .find(|r| r["ietf-ipv6-unicast-routing:destination-prefix"] == json!(prefix))
                .unwrap()
        };
        assert_eq!(
            by_prefix("2001:db8::/64"),
            &json!({
                "ietf-ipv6-unicast-routing:destination-prefix": "2001:db8::/64",
                "source-protocol": "direct",
                "route-preference": 0,
                "active": [null],
                "next-hop": {"next-hop-list": {"next-hop": [{
                    "outgoing-interface": "e1",
                    "infix-routing:installed": [null]
                }]}}
            })
        );
        assert_eq!(
            by_prefix("2001:db8:1::/48"),
            &json!({
                "ietf-ipv6-unicast-routing:destination-prefix": "2001:db8:1::/48",
                "source-protocol": "static",
                "route-preference": 1,
                "next-hop": {"next-hop-list": {"next-hop": [{"special-next-hop": "blackhole"}]}}
            })
        );
    }

    #[test]
    fn active_requires_a_next_hop() {
        let rec = Recording::new().run(
            &["vtysh", "-c", "show ip route json"],
            r#"{"0.0.0.0/0":[{"protocol":"kernel","selected":true,"nexthops":[]}]}"#,
        );
        let host = rec.host();
        let ctx = Context::new(&host);

        let value = serde_json::to_value(operational(&ctx)).unwrap();
        let route = &value["ietf-routing:routing"]["ribs"]["rib"][0]["routes"]["route"][0];
        assert_eq!(route["source-protocol"], json!("infix-routing:kernel"));
        assert!(route.get("active").is_none());
        assert!(route.get("next-hop").is_none());
    }

    #[test]
    fn scalar_next_hop_forms() {
        let rec = Recording::new().run(
            &["vtysh", "-c", "show ip route json"],
            r#"{"10.1.0.0/16":[{"protocol":"static","distance":1,"selected":true,"ip":"10.0.0.254"}],
                "10.2.0.0/16":[{"protocol":"static","distance":1,"selected":true,"blackhole":true}],
                "10.3.0.0/16":[{"protocol":"static","distance":1,"selected":true,"reject":true}],
                "10.4.0.0/16":[{"protocol":"static","distance":1,"selected":true,"adminProhibited":true}],
                "10.5.0.0/16":[{"protocol":"kernel","selected":true,"interfaceName":"e2"}]}"#,
        );
        let host = rec.host();
        let ctx = Context::new(&host);

        let value = serde_json::to_value(operational(&ctx)).unwrap();
        let routes = value["ietf-routing:routing"]["ribs"]["rib"][0]["routes"]["route"]
            .as_array()
            .unwrap();
        let next_hop = |prefix: &str| {
            let route = routes
                .iter()
                .find(|r| r["ietf-ipv4-unicast-routing:destination-prefix"] == json!(prefix))
                .unwrap();
            assert_eq!(route["active"], json!([null]), "{prefix} not active");
            route["next-hop"].clone()
        };

        assert_eq!(
            next_hop("10.1.0.0/16"),
            json!({"ietf-ipv4-unicast-routing:next-hop-address": "10.0.0.254"})
        );
        assert_eq!(next_hop("10.2.0.0/16"), json!({"special-next-hop": "blackhole"}));
        assert_eq!(next_hop("10.3.0.0/16"), json!({"special-next-hop": "unreachable"}));
        assert_eq!(next_hop("10.4.0.0/16"), json!({"special-next-hop": "prohibit"}));
        assert_eq!(next_hop("10.5.0.0/16"), json!({"outgoing-interface": "e2"}));
    }

    #[test]
    fn scalar_ipv6_address() {
        let frr = FrrRoute {
            prefix: "2001:db8:2::/48".into(),
            protocol: "static".into(),
            selected: true,
            ip: Some("fe80::1".into()),
            interface_name: Some("e1".into()),
            ..FrrRoute::default()
        };
        let rec = Recording::new();
        let host = rec.host();
        let ctx = Context::new(&host);

        let value = serde_json::to_value(route(&ctx, Afi::Ipv6, &frr)).unwrap();
        assert_eq!(
            value["next-hop"],
            json!({"outgoing-interface": "e1", "ietf-ipv6-unicast-routing:next-hop-address": "fe80::1"})
        );
    }

    #[test]
    fn protocol_table() {
        assert_eq!(source_protocol("rip"), "ietf-rip:ripv2");
        assert_eq!(source_protocol("ospf6"), "ietf-ospf:ospfv3");
        assert_eq!(source_protocol("bgp"), "infix-routing:kernel");
    }

    #[test]
    fn no_frr_means_empty_object() {
        let rec = Recording::new();
        let host = rec.host();
        let ctx = Context::new(&host);
        assert_eq!(serde_json::to_value(operational(&ctx)).unwrap(), json!({}));
    }
}
