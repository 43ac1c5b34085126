// ── Stacked and tunnel interfaces: vlan, gre/gretap, vxlan, veth ──

use serde::Serialize;
use serde_json::Value;

use crate::common::tree::{lookup_i64, lookup_str};

use super::ip::Link;

/// `infix-interfaces:vlan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Vlan {
    pub tag_type: &'static str,
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_layer_if: Option<String>,
}

/// `infix-interfaces:gre`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Gre {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
}

/// `infix-interfaces:vxlan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vxlan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vni: Option<i64>,
}

/// `infix-interfaces:veth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Veth {
    pub peer: String,
}

fn tag_type(protocol: &str) -> &'static str {
    match protocol {
        "802.1Q" => "ieee802-dot1q-types:c-vlan",
        "802.1ad" => "ieee802-dot1q-types:s-vlan",
        _ => "other",
    }
}

/// First present string among `keys` in `data`.
fn any_of(data: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| lookup_str(data, &[*key]))
        .map(str::to_owned)
}

pub fn vlan(link: &Link) -> Option<Vlan> {
    if link.kind() != Some("vlan") {
        return None;
    }
    let data = link.info_data()?;
    Some(Vlan {
        tag_type: tag_type(lookup_str(data, &["protocol"]).unwrap_or("802.1Q")),
        id: lookup_i64(data, &["id"])?,
        lower_layer_if: link.link.clone(),
    })
}

pub fn gre(link: &Link) -> Option<Gre> {
    if !matches!(link.kind(), Some("gre" | "ip6gre" | "gretap" | "ip6gretap")) {
        return None;
    }
    let data = link.info_data()?;
    Some(Gre {
        local: any_of(data, &["local", "local6"]),
        remote: any_of(data, &["remote", "remote6"]),
    })
}

pub fn vxlan(link: &Link) -> Option<Vxlan> {
    if link.kind() != Some("vxlan") {
        return None;
    }
    let data = link.info_data()?;
    Some(Vxlan {
        local: any_of(data, &["local", "local6"]),
        remote: any_of(data, &["remote", "remote6", "group", "group6"]),
        vni: lookup_i64(data, &["id"]),
    })
}

pub fn veth(link: &Link) -> Option<Veth> {
    if link.kind() != Some("veth") {
        return None;
    }
    Some(Veth {
        peer: link.link.clone()?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn link(value: Value) -> Link {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn vlan_subtree() {
        let l = link(json!({"ifname": "e1.10", "link": "e1",
            "linkinfo": {"info_kind": "vlan", "info_data": {"protocol": "802.1ad", "id": 10}}}));
        assert_eq!(
            serde_json::to_value(vlan(&l).unwrap()).unwrap(),
            json!({"tag-type": "ieee802-dot1q-types:s-vlan", "id": 10, "lower-layer-if": "e1"})
        );

        let cross_ns = link(json!({"ifname": "vlan20", "link_netnsid": 0,
            "linkinfo": {"info_kind": "vlan", "info_data": {"protocol": "802.1Q", "id": 20}}}));
        assert_eq!(
            serde_json::to_value(vlan(&cross_ns).unwrap()).unwrap(),
            json!({"tag-type": "ieee802-dot1q-types:c-vlan", "id": 20})
        );
    }

    #[test]
    fn tunnels_and_veth() {
        let g = link(json!({"ifname": "gre1",
            "linkinfo": {"info_kind": "ip6gretap", "info_data": {"local": "2001:db8::1", "remote": "2001:db8::2"}}}));
        assert_eq!(
            serde_json::to_value(gre(&g).unwrap()).unwrap(),
            json!({"local": "2001:db8::1", "remote": "2001:db8::2"})
        );

        let v = link(json!({"ifname": "vx100",
            "linkinfo": {"info_kind": "vxlan", "info_data": {"id": 100, "local": "10.0.0.1", "group": "239.1.1.1"}}}));
        assert_eq!(
            serde_json::to_value(vxlan(&v).unwrap()).unwrap(),
            json!({"local": "10.0.0.1", "remote": "239.1.1.1", "vni": 100})
        );

        let pair = link(json!({"ifname": "veth0a", "link": "veth0b", "linkinfo": {"info_kind": "veth"}}));
        assert_eq!(veth(&pair).unwrap().peer, "veth0b");
        assert!(veth(&g).is_none());
    }
}
