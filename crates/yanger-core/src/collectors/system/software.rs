// ── RAUC software state and boot order ──

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::common::number::{key_value, key_values};
use crate::common::time::{parse_yang_date, yang_date};
use crate::common::tree::{lookup, lookup_str, lookup_u64};
use crate::context::Context;

const GRUBENV: &str = "/mnt/aux/grub/grubenv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Bundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatible: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stamp {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Slot {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bootname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle: Option<Bundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installed: Option<Stamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated: Option<Stamp>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Progress {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Output of `rauc-installation-status`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Installer {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<Progress>,
    #[serde(alias = "last_error", skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Software {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compatible: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booted: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub boot_order: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installer: Option<Installer>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub slot: Vec<Slot>,
}

fn owned(value: &Value, path: &[&str]) -> Option<String> {
    lookup_str(value, path).map(str::to_owned)
}

/// RAUC timestamp with an explicit `+HH:MM` offset; unparsable text is
/// passed through.
fn datetime(text: &str) -> String {
    parse_yang_date(text).map_or_else(|| text.to_owned(), |instant| yang_date(&instant))
}

fn stamp(status: &Value, key: &str) -> Option<Stamp> {
    let node = lookup(status, &[key])?;
    Some(Stamp {
        datetime: lookup_str(node, &["timestamp"]).map(datetime),
        count: lookup_u64(node, &["count"]),
    })
}

fn slot(name: &str, info: &Value) -> Slot {
    let status = info.get("slot_status").cloned().unwrap_or_default();
    let bundle = lookup(&status, &["bundle"]).map(|b| Bundle {
        compatible: owned(b, &["compatible"]),
        version: owned(b, &["version"]),
    });
    Slot {
        name: name.to_owned(),
        bootname: owned(info, &["bootname"]),
        class: owned(info, &["class"]),
        state: owned(info, &["state"]),
        bundle,
        size: lookup_u64(&status, &["checksum", "size"]).map(|n| n.to_string()),
        sha256: owned(&status, &["checksum", "sha256"]),
        installed: stamp(&status, "installed"),
        activated: stamp(&status, "activated"),
    }
}

/// Slots of `rauc status --detailed`: a list of single-key objects.
fn slots(rauc: &Value) -> Vec<Slot> {
    rauc.get("slots")
        .and_then(Value::as_array)
        .map_or(&[][..], Vec::as_slice)
        .iter()
        .filter_map(Value::as_object)
        .flat_map(Map::iter)
        .map(|(name, info)| slot(name, info))
        .collect()
}

/// Boot order from U-Boot, or from GRUB's environment block.
pub fn boot_order(ctx: &Context<'_>) -> Vec<String> {
    let host = ctx.host();
    let text = host
        .run(&["fw_printenv", "BOOT_ORDER"])
        .ok()
        .and_then(|out| key_value(&key_values(&out), "BOOT_ORDER").map(str::to_owned))
        .or_else(|| {
            let out = host.run(&["grub-editenv", GRUBENV, "list"]).ok()?;
            key_value(&key_values(&out), "ORDER").map(str::to_owned)
        })
        .unwrap_or_default();
    text.split_whitespace().map(str::to_owned).collect()
}

/// `infix-system:software`, or `None` when RAUC is not available.
pub fn software(ctx: &Context<'_>) -> Option<Software> {
    let rauc = ctx
        .host()
        .run_json(&["rauc", "status", "--detailed", "--output-format=json"])
        .ok()?;
    let installer = ctx
        .host()
        .run_json(&["rauc-installation-status"])
        .ok()
        .and_then(|v| serde_json::from_value::<Installer>(v).ok());

    Some(Software {
        compatible: owned(&rauc, &["compatible"]),
        variant: owned(&rauc, &["variant"]).filter(|v| !v.is_empty()),
        booted: owned(&rauc, &["booted"]),
        boot_order: boot_order(ctx),
        installer,
        slot: slots(&rauc),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::testutil::Recording;

    use super::*;

    const RAUC: &str = r#"{
        "compatible": "infix-x86_64", "variant": "", "booted": "primary",
        "slots": [
            {"rootfs.0": {"class": "rootfs", "bootname": "primary", "state": "booted",
              "slot_status": {"bundle": {"compatible": "infix-x86_64", "version": "v25.01"},
                              "checksum": {"sha256": "abc", "size": 123456},
                              "installed": {"timestamp": "2024-01-01T00:00:00Z", "count": 2},
                              "activated": {"timestamp": "2024-01-01T00:01:00Z", "count": 2}}}},
            {"rootfs.1": {"class": "rootfs", "bootname": "secondary", "state": "inactive"}}
        ]
    }"#;

    #[test]
    fn slots_installer_and_uboot_order() {
        let rec = Recording::new()
            .run(&["rauc", "status", "--detailed", "--output-format=json"], RAUC)
            .run(
                &["rauc-installation-status"],
                r#"{"operation": "idle", "progress": {"percentage": 100, "message": "done"}}"#,
            )
            .run(&["fw_printenv", "BOOT_ORDER"], "BOOT_ORDER=primary secondary net\n");
        let host = rec.host();
        let ctx = Context::new(&host);

        let sw = software(&ctx).unwrap();
        assert_eq!(sw.boot_order, ["primary", "secondary", "net"]);
        assert_eq!(sw.variant, None);
        assert_eq!(sw.slot.len(), 2);
        assert_eq!(
            serde_json::to_value(&sw.slot[0]).unwrap(),
            json!({
                "name": "rootfs.0",
                "bootname": "primary",
                "class": "rootfs",
                "state": "booted",
                "bundle": {"compatible": "infix-x86_64", "version": "v25.01"},
                "size": "123456",
                "sha256": "abc",
                "installed": {"datetime": "2024-01-01T00:00:00+00:00", "count": 2},
                "activated": {"datetime": "2024-01-01T00:01:00+00:00", "count": 2}
            })
        );
        assert_eq!(
            serde_json::to_value(&sw.installer).unwrap(),
            json!({"operation": "idle", "progress": {"percentage": 100, "message": "done"}})
        );
    }

    #[test]
    fn stamps_get_explicit_offsets() {
        assert_eq!(datetime("2024-05-02T10:00:00Z"), "2024-05-02T10:00:00+00:00");
        assert_eq!(datetime("2024-05-02T10:00:00.5+02:00"), "2024-05-02T10:00:00+02:00");
        assert_eq!(datetime("yesterday"), "yesterday");
    }

    #[test]
    fn grub_fallback() {
        let rec = Recording::new().run(
            &["grub-editenv", GRUBENV, "list"],
            "ORDER=secondary primary\nDEBUG=\n",
        );
        let host = rec.host();
        let ctx = Context::new(&host);
        assert_eq!(boot_order(&ctx), ["secondary", "primary"]);
        assert_eq!(software(&ctx), None);
    }
}
