// ── BFD single-hop sessions (ietf-bfd-ip-sh) ──

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::tree::parse_list;
use crate::context::Context;

use super::{Protocol, Routing};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct FrrPeer {
    pub multihop: bool,
    pub peer: String,
    pub local: Option<String>,
    pub interface: Option<String>,
    pub id: Option<u32>,
    pub remote_id: Option<u32>,
    pub status: String,
    pub diagnostic: Option<String>,
    pub remote_diagnostic: Option<String>,
    pub receive_interval: Option<u32>,
    pub transmit_interval: Option<u32>,
    pub detect_multiplier: Option<u32>,
    pub remote_detect_multiplier: Option<u32>,
}

/// Session state as the `ietf-bfd-types` state enum.
pub fn state(status: &str) -> Option<&'static str> {
    match status {
        "up" => Some("up"),
        "down" => Some("down"),
        "init" => Some("init"),
        "adminDown" | "shutdown" => Some("adminDown"),
        _ => None,
    }
}

/// frr diagnostic text as the `ietf-bfd-types` diagnostic enum.
pub fn diagnostic(text: &str) -> Option<&'static str> {
    match text {
        "ok" => Some("none"),
        "control detection time expired" => Some("control-expiry"),
        "echo function failed" => Some("echo-failed"),
        "neighbor signaled session down" => Some("neighbor-down"),
        "forwarding plane reset" => Some("forwarding-reset"),
        "path down" => Some("path-down"),
        "concatenated path down" => Some("concatenated-path-down"),
        "administratively down" => Some("admin-down"),
        "reverse concatenated path down" => Some("reverse-concatenated-path-down"),
        _ => None,
    }
}

fn micros(msec: Option<u32>) -> Option<u64> {
    msec.map(|ms| u64::from(ms) * 1000)
}

// ── Output ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SessionRunning {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_state: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_diagnostic: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_diagnostic: Option<&'static str>,
    pub detection_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negotiated_tx_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negotiated_rx_interval: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Session {
    pub interface: String,
    pub dest_addr: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_addr: Option<String>,
    pub path_type: &'static str,
    pub ip_encapsulation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_discriminator: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_discriminator: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_multiplier: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_multiplier: Option<u32>,
    pub session_running: SessionRunning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Sessions {
    pub session: Vec<Session>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IpSh {
    pub sessions: Sessions,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Summary {
    pub number_of_sessions: u32,
    pub number_of_sessions_up: u32,
    pub number_of_sessions_down: u32,
    pub number_of_sessions_admin_down: u32,
}

/// `ietf-bfd:bfd` container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bfd {
    pub summary: Summary,
    #[serde(rename = "ietf-bfd-ip-sh:ip-sh")]
    pub ip_sh: IpSh,
}

fn session(peer: FrrPeer) -> Option<Session> {
    let Some(interface) = peer.interface else {
        debug!(peer = %peer.peer, "single-hop peer without interface");
        return None;
    };
    let detection_time = match (peer.detect_multiplier, peer.receive_interval) {
        (Some(mult), Some(rx)) => Some(u64::from(mult) * u64::from(rx) * 1000),
        _ => None,
    };
    Some(Session {
        interface,
        dest_addr: peer.peer,
        source_addr: peer.local,
        path_type: "ietf-bfd-types:path-ip-sh",
        ip_encapsulation: true,
        local_discriminator: peer.id,
        remote_discriminator: peer.remote_id,
        local_multiplier: peer.detect_multiplier,
        remote_multiplier: peer.remote_detect_multiplier,
        session_running: SessionRunning {
            local_state: state(&peer.status),
            local_diagnostic: peer.diagnostic.as_deref().and_then(diagnostic),
            remote_diagnostic: peer.remote_diagnostic.as_deref().and_then(diagnostic),
            detection_mode: "async-without-echo",
            negotiated_tx_interval: micros(peer.transmit_interval),
            negotiated_rx_interval: micros(peer.receive_interval),
            detection_time,
        },
    })
}

fn summary(sessions: &[Session]) -> Summary {
    let count = |wanted: &str| {
        let n = sessions
            .iter()
            .filter(|s| s.session_running.local_state == Some(wanted))
            .count();
        u32::try_from(n).unwrap_or(u32::MAX)
    };
    Summary {
        number_of_sessions: u32::try_from(sessions.len()).unwrap_or(u32::MAX),
        number_of_sessions_up: count("up"),
        number_of_sessions_down: count("down"),
        number_of_sessions_admin_down: count("adminDown"),
    }
}

/// BFD single-hop session state.
pub fn operational(ctx: &Context<'_>) -> Routing {
    let peers: Vec<FrrPeer> = parse_list(
        ctx.host()
            .run_json(&["vtysh", "-c", "show bfd peers json"])
            .unwrap_or_default(),
    );
    let session: Vec<Session> = peers
        .into_iter()
        .filter(|peer| !peer.multihop)
        .filter_map(session)
        .collect();
    if session.is_empty() {
        return Routing::default();
    }

    let bfd = Bfd {
        summary: summary(&session),
        ip_sh: IpSh {
            sessions: Sessions { session },
        },
    };
    Routing::protocol("ietf-bfd-types:bfdv1", "bfd", Protocol::Bfd(bfd))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::testutil::Recording;

    use super::*;

    #[test]
    fn single_hop_sessions() {
        let rec = Recording::new().run(
            &["vtysh", "-c", "show bfd peers json"],
            r#"[
                {"multihop": false, "peer": "10.0.0.2", "local": "10.0.0.1", "interface": "e1",
                 "id": 1, "remote-id": 7, "status": "up", "diagnostic": "ok",
                 "remote-diagnostic": "ok", "receive-interval": 300, "transmit-interval": 300,
                 "detect-multiplier": 3, "remote-detect-multiplier": 3},
                {"multihop": false, "peer": "10.0.1.2", "interface": "e2", "status": "down",
                 "diagnostic": "control detection time expired"},
                {"multihop": true, "peer": "192.0.2.1", "status": "up"}
            ]"#,
        );
        let host = rec.host();
        let ctx = Context::new(&host);

        let value = serde_json::to_value(operational(&ctx)).unwrap();
        let protocol = &value["ietf-routing:routing"]["control-plane-protocols"]["control-plane-protocol"][0];
        assert_eq!(protocol["type"], json!("ietf-bfd-types:bfdv1"));

        let bfd = &protocol["ietf-bfd:bfd"];
        assert_eq!(
            bfd["summary"],
            json!({"number-of-sessions": 2, "number-of-sessions-up": 1,
                   "number-of-sessions-down": 1, "number-of-sessions-admin-down": 0})
        );
        let sessions = bfd["ietf-bfd-ip-sh:ip-sh"]["sessions"]["session"].as_array().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(
            sessions[0],
            json!({
                "interface": "e1",
                "dest-addr": "10.0.0.2",
                "source-addr": "10.0.0.1",
                "path-type": "ietf-bfd-types:path-ip-sh",
                "ip-encapsulation": true,
                "local-discriminator": 1,
                "remote-discriminator": 7,
                "local-multiplier": 3,
                "remote-multiplier": 3,
                "session-running": {
                    "local-state": "up",
                    "local-diagnostic": "none",
                    "remote-diagnostic": "none",
                    "detection-mode": "async-without-echo",
                    "negotiated-tx-interval": 300_000,
                    "negotiated-rx-interval": 300_000,
                    "detection-time": 900_000
                }
            })
        );
        assert_eq!(
            sessions[1]["session-running"]["local-diagnostic"],
            json!("control-expiry")
        );
    }

    #[test]
    fn states() {
        assert_eq!(state("adminDown"), Some("adminDown"));
        assert_eq!(state("shutdown"), Some("adminDown"));
        assert_eq!(state("bogus"), None);
    }
}
