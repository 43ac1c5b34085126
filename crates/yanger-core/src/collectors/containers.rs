//! `infix-containers` state from podman.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::common::tree::{first_item, parse_list};
use crate::context::Context;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PodmanContainer {
    #[serde(rename = "Names")]
    pub names: Vec<String>,
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Image")]
    pub image: Option<String>,
    #[serde(rename = "ImageID")]
    pub image_id: Option<String>,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Status")]
    pub status: Option<String>,
    #[serde(rename = "Command")]
    pub command: Option<Vec<String>>,
}

// ── Output ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetInterface {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Network {
    Host { host: bool },
    Bridged {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        interface: Vec<NetInterface>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        publish: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Container {
    pub name: String,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Network>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerList {
    pub container: Vec<Container>,
}

/// Collector output; `{}` without containers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Containers {
    #[serde(rename = "infix-containers:containers", skip_serializing_if = "Option::is_none")]
    pub containers: Option<ContainerList>,
}

// ── podman inspect ──────────────────────────────────────────────────

/// Published ports as `[host_ip:]host_port->container_port/proto`.
pub fn publish(ports: &Value) -> Vec<String> {
    let Some(ports) = ports.as_object() else {
        return Vec::new();
    };
    let mut out = Vec::new();
    for (inner, bindings) in ports {
        let Some(bindings) = bindings.as_array() else {
            continue;
        };
        for binding in bindings {
            let Some(host_port) = binding.get("HostPort").and_then(Value::as_str) else {
                continue;
            };
            let host_ip = binding
                .get("HostIp")
                .and_then(Value::as_str)
                .filter(|ip| !ip.is_empty());
            out.push(match host_ip {
                Some(ip) => format!("{ip}:{host_port}->{inner}"),
                None => format!("{host_port}->{inner}"),
            });
        }
    }
    out
}

/// Network of one container from its `podman inspect` record.
pub fn network(inspect: &Value, running: bool) -> Option<Network> {
    let settings = inspect.get("NetworkSettings")?;
    let networks = settings
        .get("Networks")
        .and_then(Value::as_object)
        .map(|nets| nets.keys().cloned().collect::<Vec<_>>())
        .unwrap_or_default();
    if networks.iter().any(|n| n == "host") {
        return Some(Network::Host { host: true });
    }
    let publish = if running {
        settings.get("Ports").map(publish).unwrap_or_default()
    } else {
        Vec::new()
    };
    Some(Network::Bridged {
        interface: networks.into_iter().map(|name| NetInterface { name }).collect(),
        publish,
    })
}

fn container(ctx: &Context<'_>, entry: PodmanContainer) -> Option<Container> {
    let name = entry.names.into_iter().next()?;
    let running = entry.state == "running";
    let inspect = first_item(
        ctx.host()
            .run_json(&["podman", "inspect", &name])
            .unwrap_or_default(),
    );
    if inspect.is_null() {
        debug!(%name, "no inspect data");
    }
    Some(Container {
        network: network(&inspect, running),
        id: entry.id,
        image: entry.image,
        image_id: entry.image_id,
        running,
        status: entry.status,
        command: entry.command.map(|argv| argv.join(" ")),
        name,
    })
}

/// Every container known to podman, running or not.
pub fn operational(ctx: &Context<'_>) -> Containers {
    let entries: Vec<PodmanContainer> = parse_list(
        ctx.host()
            .run_json(&["podman", "ps", "-a", "--format=json"])
            .unwrap_or_default(),
    );
    let container: Vec<Container> = entries
        .into_iter()
        .filter_map(|entry| container(ctx, entry))
        .collect();
    Containers {
        containers: (!container.is_empty()).then_some(ContainerList { container }),
    }
}
