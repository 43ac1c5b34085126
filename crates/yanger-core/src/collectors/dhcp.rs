//! `infix-dhcp-server` leases and per-interface packet counters.
//!
//! Leases come from dnsmasq's per-interface lease files, counters from the
//! `dhcp-server-status` helper.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::number::mac;
use crate::common::time::epoch_date;
use crate::context::Context;

const LEASE_DIR: &str = "/var/run";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Lease {
    pub address: String,
    pub phys_address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

/// Packet counters as reported by the status helper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Counters {
    pub offers: u64,
    pub acks: u64,
    pub naks: u64,
    pub declines: u64,
    pub discovers: u64,
    pub requests: u64,
    pub releases: u64,
    pub informs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerInterface {
    pub name: String,
    pub host_count: usize,
    pub leases: Leases,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Counters>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leases {
    pub lease: Vec<Lease>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DhcpServer {
    pub interface: Vec<ServerInterface>,
}

/// Collector output; `{}` when dnsmasq serves nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dhcp {
    #[serde(rename = "infix-dhcp-server:dhcp-server", skip_serializing_if = "Option::is_none")]
    pub dhcp_server: Option<DhcpServer>,
}

fn optional(field: Option<&str>) -> Option<String> {
    field.filter(|f| *f != "*" && !f.is_empty()).map(str::to_owned)
}

/// Leases of one dnsmasq lease file: `epoch mac ip hostname clientid`.
pub fn leases(text: &str) -> Vec<Lease> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let expiry = fields.next()?;
            let phys = fields.next()?;
            let address = fields.next()?;
            Some(Lease {
                address: address.to_owned(),
                phys_address: mac(phys),
                hostname: optional(fields.next()),
                client_id: optional(fields.next()),
                // Zero means an infinite lease.
                expires: expiry
                    .parse::<i64>()
                    .ok()
                    .filter(|epoch| *epoch > 0)
                    .and_then(epoch_date),
            })
        })
        .collect()
}

/// Interfaces with a `dnsmasq-<if>.leases` file, sorted.
fn served(ctx: &Context<'_>) -> Vec<String> {
    ctx.list_dir(LEASE_DIR)
        .into_iter()
        .filter_map(|entry| {
            entry
                .strip_prefix("dnsmasq-")?
                .strip_suffix(".leases")
                .map(str::to_owned)
        })
        .collect()
}

/// Leases and counters of every served interface.
pub fn operational(ctx: &Context<'_>) -> Dhcp {
    let helper = ctx.helper("dhcp-server-status");
    let stats = ctx
        .host()
        .run_json(&[helper.as_str()])
        .unwrap_or_default();

    let interface: Vec<ServerInterface> = served(ctx)
        .into_iter()
        .map(|name| {
            let text = ctx
                .host()
                .read(&format!("{LEASE_DIR}/dnsmasq-{name}.leases"))
                .unwrap_or_default();
            let lease = leases(&text);
            let statistics = stats
                .get(&name)
                .cloned()
                .and_then(|v| match serde_json::from_value::<Counters>(v) {
                    Ok(counters) => Some(counters),
                    Err(err) => {
                        debug!(%name, error = %err, "malformed dhcp counters");
                        None
                    }
                });
            ServerInterface {
                name,
                host_count: lease.len(),
                leases: Leases { lease },
                statistics,
            }
        })
        .collect();

    Dhcp {
        dhcp_server: (!interface.is_empty()).then_some(DhcpServer { interface }),
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
    fn leases_and_counters() {
        let rec = Recording::new()
            .run(&["ls", "/var/run"], "dnsmasq-e1.leases\ndnsmasq.pid\nutmp\n")
            .file(
                "/var/run/dnsmasq-e1.leases",
                "1672578000 02:00:00:AA:BB:01 192.168.1.10 laptop 01:02:00:00:aa:bb:01\n\
                 0 02:00:00:aa:bb:02 192.168.1.11 * *\n",
            )
            .run(
                &["/usr/libexec/statd/dhcp-server-status"],
                r#"{"e1": {"offers": 3, "acks": 2, "discovers": 3, "requests": 2}}"#,
            );
        let host = rec.host();
        let ctx = Context::new(&host);

        assert_eq!(
            serde_json::to_value(operational(&ctx)).unwrap(),
            json!({"infix-dhcp-server:dhcp-server": {"interface": [{
                "name": "e1",
                "host-count": 2,
                "leases": {"lease": [
                    {"address": "192.168.1.10", "phys-address": "02:00:00:aa:bb:01",
                     "hostname": "laptop", "client-id": "01:02:00:00:aa:bb:01",
                     "expires": "2023-01-01T13:00:00+00:00"},
                    {"address": "192.168.1.11", "phys-address": "02:00:00:aa:bb:02"}
                ]},
                "statistics": {"offers": 3, "acks": 2, "naks": 0, "declines": 0,
                               "discovers": 3, "requests": 2, "releases": 0, "informs": 0}
            }]}})
        );
    }

    #[test]
    fn nothing_served() {
        let rec = Recording::new();
        let host = rec.host();
        let ctx = Context::new(&host);
        assert_eq!(serde_json::to_value(operational(&ctx)).unwrap(), json!({}));
    }
}
