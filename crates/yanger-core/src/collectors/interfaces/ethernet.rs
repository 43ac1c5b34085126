// ── Ethernet: ethtool link settings and MAC/RMON counters ──

use serde::Serialize;
use serde_json::Value;

use crate::common::tree::{first_item, lookup, lookup_u64};
use crate::context::Context;
use crate::yang::{Counter64, Decimal};

/// `ieee802-ethernet-interface:ethernet`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Ethernet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_negotiation: Option<AutoNegotiation>,
    /// Gb/s.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplex: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<Statistics>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutoNegotiation {
    pub enable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub frame: FrameStatistics,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FrameStatistics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_frames: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_multicast_frames: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_broadcast_frames: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_frames: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_multicast_frames: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_broadcast_frames: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_error_fcs_frames: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_error_mac_internal_frames: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_total_frames: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_error_undersize_frames: Option<Counter64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_error_oversize_frames: Option<Counter64>,
    #[serde(
        rename = "infix-ethernet-interface:out-good-octets",
        skip_serializing_if = "Option::is_none"
    )]
    pub out_good_octets: Option<Counter64>,
    #[serde(
        rename = "infix-ethernet-interface:in-good-octets",
        skip_serializing_if = "Option::is_none"
    )]
    pub in_good_octets: Option<Counter64>,
}

impl FrameStatistics {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Sum of the counters present at `paths`; `None` when none is present.
fn sum(stats: &Value, paths: &[&[&str]]) -> Option<Counter64> {
    paths
        .iter()
        .filter_map(|path| lookup_u64(stats, path))
        .reduce(u64::saturating_add)
        .map(Counter64)
}

/// Map one `ethtool --json -S <if> --all-groups` record to frame counters.
pub fn frame_statistics(stats: &Value) -> FrameStatistics {
    let mac = |key: &str| lookup_u64(stats, &["eth-mac", key]).map(Counter64);

    FrameStatistics {
        out_frames: mac("FramesTransmittedOK"),
        out_multicast_frames: mac("MulticastFramesXmittedOK"),
        out_broadcast_frames: mac("BroadcastFramesXmittedOK"),
        in_frames: mac("FramesReceivedOK"),
        in_multicast_frames: mac("MulticastFramesReceivedOK"),
        in_broadcast_frames: mac("BroadcastFramesReceivedOK"),
        in_error_fcs_frames: mac("FrameCheckSequenceErrors"),
        in_error_mac_internal_frames: mac("FramesLostDueToIntMACRcvError"),
        in_total_frames: sum(
            stats,
            &[
                &["eth-mac", "FramesReceivedOK"],
                &["eth-mac", "FrameCheckSequenceErrors"],
                &["eth-mac", "FramesLostDueToIntMACRcvError"],
                &["eth-mac", "AlignmentErrors"],
                &["rmon", "etherStatsOversizePkts"],
                &["rmon", "etherStatsJabbers"],
            ],
        ),
        in_error_undersize_frames: lookup_u64(stats, &["rmon", "undersize_pkts"]).map(Counter64),
        in_error_oversize_frames: sum(
            stats,
            &[&["rmon", "etherStatsJabbers"], &["rmon", "etherStatsOversizePkts"]],
        ),
        out_good_octets: mac("OctetsTransmittedOK"),
        in_good_octets: mac("OctetsReceivedOK"),
    }
}

/// Speed (Mb/s), duplex and autoneg from one `ethtool --json <if>` record.
#[allow(clippy::cast_precision_loss)]
fn link_settings(settings: &Value, ethernet: &mut Ethernet) {
    ethernet.auto_negotiation = lookup(settings, &["auto-negotiation"])
        .and_then(Value::as_bool)
        .map(|enable| AutoNegotiation { enable });

    ethernet.speed = lookup(settings, &["speed"])
        .and_then(Value::as_u64)
        .filter(|&mbps| mbps > 0 && mbps < u64::from(u32::MAX))
        .map(|mbps| Decimal::new(mbps as f64 / 1000.0, 3));

    ethernet.duplex = lookup(settings, &["duplex"])
        .and_then(Value::as_str)
        .map(|duplex| match duplex.to_ascii_lowercase().as_str() {
            "full" => "full",
            "half" => "half",
            _ => "unknown",
        });
}

/// Ethernet subtree for `ifname`, `None` when ethtool has nothing.
pub fn ethernet(ctx: &Context<'_>, ifname: &str) -> Option<Ethernet> {
    let host = ctx.host();
    let mut ethernet = Ethernet::default();

    let settings = first_item(host.run_json(&["ethtool", "--json", ifname]).unwrap_or_default());
    link_settings(&settings, &mut ethernet);

    let stats = first_item(
        host.run_json(&["ethtool", "--json", "-S", ifname, "--all-groups"])
            .unwrap_or_default(),
    );
    let frame = frame_statistics(&stats);
    if !frame.is_empty() {
        ethernet.statistics = Some(Statistics { frame });
    }

    (ethernet != Ethernet::default()).then_some(ethernet)
}
