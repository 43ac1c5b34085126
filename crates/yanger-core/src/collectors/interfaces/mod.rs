//! `ietf-interfaces` operational state.
//!
//! One entry per non-internal kernel link, enriched with a type-specific
//! subtree, plus a synthetic entry for every interface handed over to a
//! container.

pub mod bridge;
pub mod container;
pub mod ethernet;
pub mod ip;
pub mod kind;
pub mod lag;
pub mod stp;
pub mod tunnel;
pub mod wifi;

use serde::Serialize;
use tracing::debug;

use crate::common::names::compress_interfaces;
use crate::context::Context;
use crate::yang::Counter64;

use self::bridge::{Bridge, BridgePort, Multicast};
use self::container::{ContainerNetwork, Owned};
use self::ethernet::Ethernet;
use self::ip::{IpFamily, Link, Snapshot, addresses};
use self::kind::IfType;
use self::lag::{Lag, LagPort};
use self::tunnel::{Gre, Veth, Vlan, Vxlan};
use self::wifi::Wifi;

// ── Output ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Statistics {
    pub in_octets: Counter64,
    pub out_octets: Counter64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Interface {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oper_status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phys_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
    #[serde(rename = "ietf-ip:ipv4", skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<IpFamily>,
    #[serde(rename = "ietf-ip:ipv6", skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<IpFamily>,
    #[serde(
        rename = "ieee802-ethernet-interface:ethernet",
        skip_serializing_if = "Option::is_none"
    )]
    pub ethernet: Option<Ethernet>,
    #[serde(rename = "infix-interfaces:bridge", skip_serializing_if = "Option::is_none")]
    pub bridge: Option<Bridge>,
    #[serde(rename = "infix-interfaces:bridge-port", skip_serializing_if = "Option::is_none")]
    pub bridge_port: Option<BridgePort>,
    #[serde(rename = "infix-interfaces:lag", skip_serializing_if = "Option::is_none")]
    pub lag: Option<Lag>,
    #[serde(rename = "infix-interfaces:lag-port", skip_serializing_if = "Option::is_none")]
    pub lag_port: Option<LagPort>,
    #[serde(rename = "infix-interfaces:vlan", skip_serializing_if = "Option::is_none")]
    pub vlan: Option<Vlan>,
    #[serde(rename = "infix-interfaces:gre", skip_serializing_if = "Option::is_none")]
    pub gre: Option<Gre>,
    #[serde(rename = "infix-interfaces:vxlan", skip_serializing_if = "Option::is_none")]
    pub vxlan: Option<Vxlan>,
    #[serde(rename = "infix-interfaces:veth", skip_serializing_if = "Option::is_none")]
    pub veth: Option<Veth>,
    #[serde(rename = "infix-interfaces:wifi", skip_serializing_if = "Option::is_none")]
    pub wifi: Option<Wifi>,
    #[serde(
        rename = "infix-interfaces:container-network",
        skip_serializing_if = "Option::is_none"
    )]
    pub container_network: Option<ContainerNetwork>,
}

impl Interface {
    fn new(name: &str, kind: IfType) -> Self {
        Self {
            name: name.to_owned(),
            kind: kind.identity(),
            description: None,
            if_index: None,
            admin_status: None,
            oper_status: None,
            phys_address: None,
            statistics: None,
            ipv4: None,
            ipv6: None,
            ethernet: None,
            bridge: None,
            bridge_port: None,
            lag: None,
            lag_port: None,
            vlan: None,
            gre: None,
            vxlan: None,
            veth: None,
            wifi: None,
            container_network: None,
        }
    }

    /// Fill the leaves every link carries.
    fn with_link(mut self, link: &Link) -> Self {
        self.if_index = Some(link.ifindex);
        self.admin_status = Some(link.admin_status());
        self.oper_status = Some(link.oper_status());
        self.phys_address = link.address.clone().filter(|a| !a.is_empty());
        self.statistics = link.stats64.as_ref().map(|stats| Statistics {
            in_octets: Counter64(stats.rx.bytes),
            out_octets: Counter64(stats.tx.bytes),
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterfaceList {
    pub interface: Vec<Interface>,
}

/// Collector output; `{}` when nothing is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Interfaces {
    #[serde(
        rename = "ietf-interfaces:interfaces",
        skip_serializing_if = "Option::is_none"
    )]
    pub interfaces: Option<InterfaceList>,
}

// ── Collection ──────────────────────────────────────────────────────

fn interface(snapshot: &Snapshot<'_, '_>, multicast: &Multicast, link: &Link) -> Interface {
    let ctx = snapshot.ctx();
    let kind = IfType::of(link, ctx.host());
    let mut iface = Interface::new(&link.ifname, kind).with_link(link);

    iface.description = link.ifalias.clone().filter(|a| !a.is_empty());

    let addr = snapshot.addr(&link.ifname);
    let ipv4 = IpFamily {
        mtu: link.mtu,
        address: addresses(addr, "inet"),
    };
    let ipv6 = IpFamily {
        mtu: snapshot.ipv6_mtu(&link.ifname),
        address: addresses(addr, "inet6"),
    };
    iface.ipv4 = (!ipv4.is_empty()).then_some(ipv4);
    iface.ipv6 = (!ipv6.is_empty()).then_some(ipv6);

    match kind {
        IfType::Ethernet => iface.ethernet = ethernet::ethernet(ctx, &link.ifname),
        IfType::Bridge => iface.bridge = Some(bridge::bridge(snapshot, multicast, link)),
        IfType::Lag => iface.lag = lag::lag(link),
        IfType::Vlan => iface.vlan = tunnel::vlan(link),
        IfType::Gre | IfType::Gretap => iface.gre = tunnel::gre(link),
        IfType::Vxlan => iface.vxlan = tunnel::vxlan(link),
        IfType::Veth => iface.veth = tunnel::veth(link),
        IfType::Wifi => iface.wifi = wifi::wifi(ctx, &link.ifname),
        IfType::Loopback | IfType::Etherlike | IfType::Dummy | IfType::Other => {}
    }

    iface.bridge_port = bridge::bridge_port(snapshot, multicast, link);
    iface.lag_port = lag::lag_port(link);
    iface
}

fn container_interface(owned: Owned) -> Interface {
    let mut iface = Interface::new(&owned.name, IfType::Other);
    if let Some(link) = &owned.link {
        iface = iface.with_link(link);
    }
    iface.container_network = Some(ContainerNetwork {
        containers: owned.containers,
    });
    iface
}

/// Interface state, for every interface or only `ifname`.
pub fn operational(ctx: &Context<'_>, ifname: Option<&str>) -> Interfaces {
    let snapshot = Snapshot::new(ctx);
    let multicast = Multicast::default();
    let wanted = |name: &str| ifname.is_none_or(|only| only == name);

    let mut list: Vec<Interface> = snapshot
        .links()
        .iter()
        .filter(|link| !link.is_internal() && wanted(&link.ifname))
        .map(|link| interface(&snapshot, &multicast, link))
        .collect();

    let present: Vec<&str> = snapshot.links().iter().map(|l| l.ifname.as_str()).collect();
    if ifname.is_none_or(|only| !present.contains(&only)) {
        list.extend(
            container::owned(ctx, &present)
                .into_iter()
                .filter(|owned| wanted(&owned.name))
                .map(container_interface),
        );
    }

    let names: Vec<&str> = list.iter().map(|iface| iface.name.as_str()).collect();
    debug!(interfaces = %compress_interfaces(names.as_slice()), "collected");

    Interfaces {
        interfaces: (!list.is_empty()).then_some(InterfaceList { interface: list }),
    }
}
