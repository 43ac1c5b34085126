// ── GPS receivers ──

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::Context;
use crate::yang::Decimal;

const STATUS: &str = "/run/gps-status.json";

/// Cached receiver status, one entry per resolved device path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GpsStatus {
    pub driver: Option<String>,
    pub activated: Option<String>,
    pub mode: Option<i64>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub alt: Option<f64>,
    #[serde(rename = "nSat")]
    pub satellites_visible: Option<u32>,
    #[serde(rename = "uSat")]
    pub satellites_used: Option<u32>,
}

/// `infix-hardware:gps-receiver` container.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct GpsReceiver {
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated: Option<String>,
    pub fix_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satellites_visible: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satellites_used: Option<u32>,
    pub pps_available: bool,
}

pub fn fix_mode(mode: Option<i64>) -> &'static str {
    match mode {
        Some(2) => "2d",
        Some(3) => "3d",
        _ => "none",
    }
}

fn receiver(device: String, status: GpsStatus, pps_available: bool) -> GpsReceiver {
    GpsReceiver {
        device,
        driver: status.driver,
        activated: status.activated,
        fix_mode: fix_mode(status.mode),
        latitude: status.lat.map(|v| Decimal::new(v, 6)),
        longitude: status.lon.map(|v| Decimal::new(v, 6)),
        altitude: status.alt.map(|v| Decimal::new(v, 1)),
        satellites_visible: status.satellites_visible,
        satellites_used: status.satellites_used,
        pps_available,
    }
}

/// One `infix-hardware:gps` component per `/dev/gpsN` link.
pub fn receivers(ctx: &Context<'_>) -> Vec<super::Component> {
    let host = ctx.host();
    let mut cache: Option<Value> = None;
    let mut out = Vec::new();

    for index in 0..4 {
        let link = format!("/dev/gps{index}");
        if !host.exists(&link) {
            continue;
        }
        let device = ctx.resolve(&link).unwrap_or_else(|| link.clone());
        let statuses = cache.get_or_insert_with(|| host.read_json(STATUS).unwrap_or_default());
        let status = statuses
            .get(&device)
            .cloned()
            .and_then(|v| serde_json::from_value::<GpsStatus>(v).ok())
            .unwrap_or_default();
        let pps = host.exists(&format!("/dev/pps{index}"));

        let mut component = super::Component::new(format!("gps{index}"), "infix-hardware:gps");
        component.gps_receiver = Some(receiver(device, status, pps));
        out.push(component);
    }
    out
}
