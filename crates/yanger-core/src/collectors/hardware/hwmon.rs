// ── hwmon and thermal-zone sensors ──

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::common::names::sensor_name;
use crate::common::time::yang_date;
use crate::context::Context;

use super::{Component, SensorData};

const HWMON: &str = "/sys/class/hwmon";
const THERMAL: &str = "/sys/class/thermal";

static INPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(temp|fan|in|curr|power)(\d+)_input$").expect("Invalid hwmon input regex")
});

static PWM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^pwm(\d+)$").expect("Invalid hwmon pwm regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Kind {
    Temp,
    Fan,
    Pwm,
    Voltage,
    Current,
    Power,
}

impl Kind {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "temp" => Some(Self::Temp),
            "fan" => Some(Self::Fan),
            "in" => Some(Self::Voltage),
            "curr" => Some(Self::Current),
            "power" => Some(Self::Power),
            _ => None,
        }
    }

    /// sysfs file prefix.
    fn prefix(self) -> &'static str {
        match self {
            Self::Temp => "temp",
            Self::Fan => "fan",
            Self::Pwm => "pwm",
            Self::Voltage => "in",
            Self::Current => "curr",
            Self::Power => "power",
        }
    }

    /// Name suffix of a child sensor.
    pub fn label(self) -> &'static str {
        match self {
            Self::Temp => "temp",
            Self::Fan => "fan",
            Self::Pwm => "pwm",
            Self::Voltage => "voltage",
            Self::Current => "current",
            Self::Power => "power",
        }
    }

    pub fn value_type(self) -> &'static str {
        match self {
            Self::Temp => "celsius",
            Self::Fan => "rpm",
            Self::Pwm => "other",
            Self::Voltage => "volts-DC",
            Self::Current => "amperes",
            Self::Power => "watts",
        }
    }

    pub fn value_scale(self) -> &'static str {
        match self {
            Self::Fan => "units",
            Self::Power => "micro",
            Self::Temp | Self::Pwm | Self::Voltage | Self::Current => "milli",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub kind: Kind,
    pub index: u32,
    pub value: i64,
    pub label: Option<String>,
}

fn read_int(ctx: &Context<'_>, path: &str) -> Option<i64> {
    ctx.host().read(path)?.parse().ok()
}

/// Sensor readings found in one hwmon directory, ordered by kind then index.
pub fn readings(ctx: &Context<'_>, dir: &str) -> Vec<Reading> {
    let files = ctx.list_dir(dir);
    let mut found = Vec::new();

    for file in &files {
        let (kind, index) = if let Some(caps) = INPUT.captures(file) {
            let Some(kind) = Kind::from_prefix(&caps[1]) else {
                continue;
            };
            (kind, caps[2].to_owned())
        } else if let Some(caps) = PWM.captures(file) {
            // A fan with a tachometer reports rpm already.
            if files.iter().any(|f| *f == format!("fan{}_input", &caps[1])) {
                continue;
            }
            (Kind::Pwm, caps[1].to_owned())
        } else {
            continue;
        };

        let Some(raw) = read_int(ctx, &format!("{dir}/{file}")) else {
            debug!(%dir, %file, "unreadable sensor");
            continue;
        };
        let value = if kind == Kind::Pwm { raw * 100_000 / 255 } else { raw };
        let label = ctx
            .host()
            .read(&format!("{dir}/{}{index}_label", kind.prefix()))
            .filter(|label| !label.is_empty());

        found.push(Reading {
            kind,
            index: index.parse().unwrap_or_default(),
            value,
            label,
        });
    }

    found.sort_by_key(|r| (r.kind, r.index));
    found
}

fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn sensor(ctx: &Context<'_>, name: String, reading: &Reading) -> Component {
    let mut component = Component::new(name, "iana-hardware:sensor");
    component.description.clone_from(&reading.label);
    component.sensor_data = Some(SensorData {
        value: reading.value,
        value_type: reading.kind.value_type(),
        value_scale: reading.kind.value_scale(),
        value_precision: 0,
        value_timestamp: yang_date(&ctx.now()),
        oper_status: "ok",
    });
    component
}

/// Components for one sensor device named `base`.
pub fn device(ctx: &Context<'_>, base: &str, readings: &[Reading]) -> Vec<Component> {
    match readings {
        [] => Vec::new(),
        [only] => vec![sensor(ctx, base.to_owned(), only)],
        _ => {
            let mut out = vec![Component::new(base, "iana-hardware:module")];
            for reading in readings {
                let name = if let Some(label) = &reading.label {
                    format!("{base}-{}", normalize_label(label))
                } else {
                    let repeated = readings.iter().filter(|r| r.kind == reading.kind).count() > 1;
                    if repeated {
                        format!("{base}-{}{}", reading.kind.label(), reading.index)
                    } else {
                        format!("{base}-{}", reading.kind.label())
                    }
                };
                let mut child = sensor(ctx, name, reading);
                child.parent = Some(base.to_owned());
                out.push(child);
            }
            out
        }
    }
}

/// `base`, or `base-N` with the lowest `N >= 2` not in `used`.
fn unique_base(base: &str, used: &BTreeSet<String>) -> String {
    if !used.contains(base) {
        return base.to_owned();
    }
    let mut n = 2;
    loop {
        let name = format!("{base}-{n}");
        if !used.contains(&name) {
            return name;
        }
        n += 1;
    }
}

/// Sensors of every `/sys/class/hwmon/hwmon*` device. Devices whose
/// normalized names collide keep apart by a numeric suffix.
pub fn components(ctx: &Context<'_>) -> Vec<Component> {
    let mut out: Vec<Component> = Vec::new();
    let mut used = BTreeSet::new();
    for entry in ctx.list_dir(HWMON) {
        if !entry.starts_with("hwmon") {
            continue;
        }
        let dir = format!("{HWMON}/{entry}");
        let Some(raw) = ctx
            .host()
            .read(&format!("{dir}/device/name"))
            .or_else(|| ctx.host().read(&format!("{dir}/name")))
        else {
            debug!(%dir, "hwmon device without name");
            continue;
        };
        let found = readings(ctx, &dir);
        if found.is_empty() {
            continue;
        }
        let name = sensor_name(&raw);
        let base = unique_base(&name, &used);
        if base != name {
            debug!(%dir, %base, "renamed duplicate hwmon device");
        }
        let sensors = device(ctx, &base, &found);
        used.extend(sensors.iter().map(|c| c.name.clone()));
        out.extend(sensors);
    }
    out
}

/// Thermal zones whose normalized name is not already in `taken`.
pub fn thermal_zones(ctx: &Context<'_>, taken: &[String]) -> Vec<Component> {
    let mut out = Vec::new();
    for entry in ctx.list_dir(THERMAL) {
        if !entry.starts_with("thermal_zone") {
            continue;
        }
        let dir = format!("{THERMAL}/{entry}");
        let Some(kind) = ctx.host().read(&format!("{dir}/type")) else {
            continue;
        };
        let name = sensor_name(&kind);
        if taken.contains(&name) || out.iter().any(|c: &Component| c.name == name) {
            debug!(%name, "thermal zone duplicates a hwmon sensor");
            continue;
        }
        let Some(value) = read_int(ctx, &format!("{dir}/temp")) else {
            continue;
        };
        let reading = Reading {
            kind: Kind::Temp,
            index: 0,
            value,
            label: None,
        };
        out.push(sensor(ctx, name, &reading));
    }
    out
}
