//! `ietf-hardware` operational state.
//!
//! A flat `component` list: the mainboard and its VPD blocks from
//! `/run/system.json`, USB ports, hwmon and thermal-zone sensors, WiFi
//! radios and GPS receivers. Multi-sensor hwmon devices get a parent
//! `module` component that their sensors point at.

pub mod gps;
pub mod hwmon;
pub mod wifi;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::common::time::vpd_date;
use crate::common::tree::{lookup_array, lookup_str};
use crate::context::Context;

use self::gps::GpsReceiver;
use self::wifi::WifiRadio;

// ── Component model ─────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct State {
    pub admin_state: &'static str,
    pub oper_state: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SensorData {
    pub value: i64,
    pub value_type: &'static str,
    pub value_scale: &'static str,
    pub value_precision: u8,
    pub value_timestamp: String,
    pub oper_status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Component {
    pub name: String,
    pub class: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mfg_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_num: Option<String>,
    #[serde(rename = "infix-hardware:phys-address", skip_serializing_if = "Option::is_none")]
    pub phys_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<State>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sensor_data: Option<SensorData>,
    #[serde(rename = "infix-hardware:vpd-data", skip_serializing_if = "Option::is_none")]
    pub vpd_data: Option<Value>,
    #[serde(rename = "infix-hardware:wifi-radio", skip_serializing_if = "Option::is_none")]
    pub wifi_radio: Option<WifiRadio>,
    #[serde(rename = "infix-hardware:gps-receiver", skip_serializing_if = "Option::is_none")]
    pub gps_receiver: Option<GpsReceiver>,
}

impl Component {
    pub fn new(name: impl Into<String>, class: &'static str) -> Self {
        Self {
            name: name.into(),
            class,
            parent: None,
            description: None,
            mfg_name: None,
            model_name: None,
            serial_num: None,
            phys_address: None,
            state: None,
            sensor_data: None,
            vpd_data: None,
            wifi_radio: None,
            gps_receiver: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentList {
    pub component: Vec<Component>,
}

/// Collector output; `{}` when nothing is known.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hardware {
    #[serde(rename = "ietf-hardware:hardware", skip_serializing_if = "Option::is_none")]
    pub hardware: Option<ComponentList>,
}

// ── /run/system.json ────────────────────────────────────────────────

fn owned(system: &Value, key: &str) -> Option<String> {
    lookup_str(system, &[key]).map(str::to_owned)
}

fn mainboard(system: &Value) -> Option<Component> {
    if !system.is_object() {
        return None;
    }
    let mut board = Component::new("mainboard", "iana-hardware:chassis");
    board.mfg_name = owned(system, "vendor");
    board.description = owned(system, "product-name");
    board.model_name = owned(system, "part-number");
    board.serial_num = owned(system, "serial-number");
    board.phys_address = owned(system, "mac-address");
    board.state = Some(State {
        admin_state: "unknown",
        oper_state: "enabled",
    });
    Some(board)
}

/// VPD data block with the manufacture date as a YANG timestamp and
/// vendor extensions as keyed entries.
pub fn vpd_data(data: &Map<String, Value>) -> Value {
    let mut out = Map::new();
    for (key, value) in data {
        match key.as_str() {
            "manufacture-date" => {
                if let Some(date) = value.as_str().and_then(vpd_date) {
                    out.insert(key.clone(), Value::String(date));
                }
            }
            "vendor-extension" => {
                let extensions: Vec<Value> = value
                    .as_array()
                    .map_or(&[][..], Vec::as_slice)
                    .iter()
                    .filter_map(|ext| {
                        let pair = ext.as_array()?;
                        Some(json!({
                            "iana-enterprise-number": pair.first()?,
                            "extension-data": pair.get(1)?,
                        }))
                    })
                    .collect();
                out.insert(key.clone(), Value::Array(extensions));
            }
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }
    Value::Object(out)
}

fn vpds(system: &Value) -> Vec<Component> {
    let Some(blocks) = system.get("vpd").and_then(Value::as_object) else {
        return Vec::new();
    };
    blocks
        .iter()
        .filter_map(|(name, block)| {
            let data = block.get("data")?.as_object()?;
            let mut vpd = Component::new(name.clone(), "infix-hardware:vpd");
            vpd.vpd_data = Some(vpd_data(data));
            Some(vpd)
        })
        .collect()
}

fn usb_ports(ctx: &Context<'_>, system: &Value) -> Vec<Component> {
    lookup_array(system, &["usb-ports"])
        .iter()
        .filter_map(|port| {
            let name = lookup_str(port, &["name"])?;
            let path = lookup_str(port, &["path"])?;
            let Some(authorized) = ctx.host().read(&format!("{path}/authorized_default")) else {
                debug!(%name, %path, "usb port not present");
                return None;
            };
            let unlocked = authorized == "1";
            let mut usb = Component::new(name, "infix-hardware:usb");
            usb.state = Some(State {
                admin_state: if unlocked { "unlocked" } else { "locked" },
                oper_state: if unlocked { "enabled" } else { "disabled" },
            });
            Some(usb)
        })
        .collect()
}

/// Every hardware component of the device.
pub fn operational(ctx: &Context<'_>) -> Hardware {
    let system = ctx
        .host()
        .read_json("/run/system.json")
        .unwrap_or_default();

    let mut component: Vec<Component> = Vec::new();
    component.extend(mainboard(&system));
    component.extend(vpds(&system));
    component.extend(usb_ports(ctx, &system));

    let sensors = hwmon::components(ctx);
    let taken: Vec<String> = sensors.iter().map(|c| c.name.clone()).collect();
    component.extend(sensors);
    component.extend(hwmon::thermal_zones(ctx, &taken));

    component.extend(wifi::radios(ctx));
    component.extend(gps::receivers(ctx));

    Hardware {
        hardware: (!component.is_empty()).then_some(ComponentList { component }),
    }
}
