// ── Interfaces handed over to containers ──
//
// A host interface given to a container lives in the container's network
// namespace, where its `ifalias` keeps the published name.

use serde::{Deserialize, Serialize};

use crate::common::tree::parse_list;
use crate::context::Context;

use super::ip::Link;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PodmanEntry {
    #[serde(rename = "Names")]
    pub names: Vec<String>,
    #[serde(rename = "Networks")]
    pub networks: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct Netns {
    name: String,
}

/// `infix-interfaces:container-network`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerNetwork {
    pub containers: Vec<String>,
}

/// An interface owned by one or more containers, with whatever link
/// state its namespace exposes.
pub struct Owned {
    pub name: String,
    pub containers: Vec<String>,
    pub link: Option<Link>,
}

/// Interfaces named as networks by any container, excluding `skip`.
pub fn owned(ctx: &Context<'_>, skip: &[&str]) -> Vec<Owned> {
    let host = ctx.host();
    let containers: Vec<PodmanEntry> =
        parse_list(host.run_json(&["podman", "ps", "-a", "--format=json"]).unwrap_or_default());
    if containers.is_empty() {
        return Vec::new();
    }

    let mut owned: Vec<Owned> = Vec::new();
    for entry in &containers {
        let Some(container) = entry.names.first() else {
            continue;
        };
        for network in &entry.networks {
            if network == "host" || skip.contains(&network.as_str()) {
                continue;
            }
            match owned.iter_mut().find(|o| o.name == *network) {
                Some(found) => found.containers.push(container.clone()),
                None => owned.push(Owned {
                    name: network.clone(),
                    containers: vec![container.clone()],
                    link: None,
                }),
            }
        }
    }
    if owned.is_empty() {
        return owned;
    }

    let namespaces: Vec<Netns> =
        parse_list(host.run_json(&["ip", "-j", "netns", "list"]).unwrap_or_default());
    for ns in namespaces {
        let links: Vec<Link> = parse_list(
            host.run_json(&["ip", "netns", "exec", &ns.name, "ip", "-s", "-d", "-j", "link", "show"])
                .unwrap_or_default(),
        );
        for link in links {
            let Some(alias) = link.ifalias.as_deref() else {
                continue;
            };
            if let Some(entry) = owned.iter_mut().find(|o| o.name == alias && o.link.is_none()) {
                entry.link = Some(link);
            }
        }
    }

    owned.sort_by(|a, b| a.name.cmp(&b.name));
    owned
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::testutil::Recording;

    use super::*;

    #[test]
    fn matches_namespace_links_by_alias() {
        let rec = Recording::new()
            .run(
                &["podman", "ps", "-a", "--format=json"],
                r#"[{"Names": ["web"], "Networks": ["e5", "host"]},
                    {"Names": ["db"], "Networks": ["e5", "e1"]},
                    {"Names": ["ntp"], "Networks": ["veth0c"]}]"#,
            )
            .run(&["ip", "-j", "netns", "list"], r#"[{"name": "netns-aaaa", "id": 0}]"#)
            .run(
                &["ip", "netns", "exec", "netns-aaaa", "ip", "-s", "-d", "-j", "link", "show"],
                r#"[{"ifname": "lo", "ifindex": 1, "link_type": "loopback"},
                    {"ifname": "eth0", "ifindex": 7, "ifalias": "e5", "operstate": "UP",
                     "address": "02:00:00:00:00:05"}]"#,
            );
        let host = rec.host();
        let ctx = Context::new(&host);

        let owned = owned(&ctx, &["e1"]);
        let names: Vec<&str> = owned.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["e5", "veth0c"]);
        assert_eq!(owned[0].containers, vec!["web", "db"]);
        assert_eq!(owned[0].link.as_ref().unwrap().ifindex, 7);
        assert!(owned[1].link.is_none());
    }

    #[test]
    fn no_podman_means_nothing() {
        let rec = Recording::new();
        let host = rec.host();
        let ctx = Context::new(&host);
        assert!(owned(&ctx, &[]).is_empty());
    }
}
