// ── Interface type classification ──

use strum::Display;

use yanger_host::Host;

use super::ip::Link;

/// `infix-if-type` identity of an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum IfType {
    Loopback,
    Ethernet,
    Etherlike,
    Veth,
    Bridge,
    Lag,
    Vlan,
    Gre,
    Gretap,
    Vxlan,
    Dummy,
    Wifi,
    Other,
}

impl IfType {
    /// Module-qualified identity, e.g. `infix-if-type:bridge`.
    pub fn identity(self) -> String {
        format!("infix-if-type:{self}")
    }

    /// Classify `link`. Wireless detection consults
    /// `/sys/class/net/<if>/wireless`.
    pub fn of(link: &Link, host: &dyn Host) -> Self {
        if link.link_type == "loopback" {
            return Self::Loopback;
        }

        match link.kind() {
            Some("bridge") => Self::Bridge,
            Some("bond") => Self::Lag,
            Some("vlan") => Self::Vlan,
            Some("veth") => Self::Veth,
            Some("gre" | "ip6gre") => Self::Gre,
            Some("gretap" | "ip6gretap") => Self::Gretap,
            Some("vxlan") => Self::Vxlan,
            Some("dummy") => Self::Dummy,
            Some("dsa") => Self::Ethernet,
            Some(_) if link.link_type == "ether" => Self::Etherlike,
            Some(_) => Self::Other,
            None if link.link_type != "ether" => Self::Other,
            None if host.exists(&format!("/sys/class/net/{}/wireless", link.ifname)) => Self::Wifi,
            None => Self::Ethernet,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use crate::testutil::Recording;

    use super::*;

    fn classify(host: &dyn Host, value: serde_json::Value) -> IfType {
        let link: Link = serde_json::from_value(value).unwrap();
        IfType::of(&link, host)
    }

    #[test]
    fn decision_cascade() {
        let rec = Recording::new().file("/sys/class/net/wifi0/wireless/.present", "");
        let host = rec.host();

        assert_eq!(classify(&host, json!({"ifname": "lo", "link_type": "loopback"})), IfType::Loopback);
        assert_eq!(classify(&host, json!({"ifname": "e1", "link_type": "ether"})), IfType::Ethernet);
        assert_eq!(classify(&host, json!({"ifname": "wifi0", "link_type": "ether"})), IfType::Wifi);
        assert_eq!(
            classify(&host, json!({"ifname": "lan1", "link_type": "ether", "linkinfo": {"info_kind": "dsa"}})),
            IfType::Ethernet
        );
        assert_eq!(
            classify(&host, json!({"ifname": "br0", "link_type": "ether", "linkinfo": {"info_kind": "bridge"}})),
            IfType::Bridge
        );
        assert_eq!(
            classify(&host, json!({"ifname": "lag0", "link_type": "ether", "linkinfo": {"info_kind": "bond"}})),
            IfType::Lag
        );
        assert_eq!(
            classify(&host, json!({"ifname": "mv0", "link_type": "ether", "linkinfo": {"info_kind": "macvlan"}})),
            IfType::Etherlike
        );
        assert_eq!(
            classify(&host, json!({"ifname": "wg0", "link_type": "none", "linkinfo": {"info_kind": "wireguard"}})),
            IfType::Other
        );
        assert_eq!(classify(&host, json!({"ifname": "sit0", "link_type": "sit"})), IfType::Other);
    }

    #[test]
    fn identities() {
        assert_eq!(IfType::Gretap.identity(), "infix-if-type:gretap");
        assert_eq!(IfType::Loopback.identity(), "infix-if-type:loopback");
    }
}
