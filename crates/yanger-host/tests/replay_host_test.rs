#![allow(clippy::unwrap_used)]
// Integration tests for `ReplayHost` and `CaptureHost` against a temp tree.

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::json;

use yanger_host::{CaptureHost, Host, HostError, ReplayHost};

// ── Helpers ─────────────────────────────────────────────────────────

fn record(base: &Path, slug: &str, content: &str) {
    let dir = base.join("run");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(slug), content).unwrap();
}

fn file(base: &Path, path: &str, content: &str) {
    let target = base.join("rootfs").join(path.trim_start_matches('/'));
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::write(target, content).unwrap();
}

// ── Replay ──────────────────────────────────────────────────────────

#[test]
fn replays_run_json() {
    let dir = tempfile::tempdir().unwrap();
    record(
        dir.path(),
        "ip_-j_addr_show",
        r#"[{"ifname":"lo","addr_info":[]}]"#,
    );

    let host = ReplayHost::new(dir.path());
    let value = host.run_json(&["ip", "-j", "addr", "show"]).unwrap();
    assert_eq!(value, json!([{"ifname": "lo", "addr_info": []}]));
}

#[test]
fn replays_multiline() {
    let dir = tempfile::tempdir().unwrap();
    record(dir.path(), "hostname", "switch-a\n");

    let host = ReplayHost::new(dir.path());
    assert_eq!(host.run_multiline(&["hostname"]).unwrap(), vec!["switch-a"]);
}

#[test]
fn missing_recording_is_an_expected_error() {
    let dir = tempfile::tempdir().unwrap();
    let host = ReplayHost::new(dir.path());

    let err = host.run(&["chronyc", "-c", "tracking"]).unwrap_err();
    assert!(matches!(
        err,
        HostError::MissingRecording { ref slug } if slug == "chronyc_-c_tracking"
    ));
    assert!(err.is_expected());
    assert_eq!(host.run(&["chronyc"]).unwrap_or_default(), "");
}

#[test]
fn invalid_json_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    record(dir.path(), "podman_ps_-a_--format=json", "not json");

    let host = ReplayHost::new(dir.path());
    let err = host
        .run_json(&["podman", "ps", "-a", "--format=json"])
        .unwrap_err();
    assert!(matches!(err, HostError::Json { .. }));
}

#[test]
fn reads_rootfs_files_trimmed() {
    let dir = tempfile::tempdir().unwrap();
    file(dir.path(), "/proc/uptime", "1234.56 789.00\n");
    file(dir.path(), "/run/system.json", r#"{"vendor": "Acme"}"#);

    let host = ReplayHost::new(dir.path());
    assert_eq!(host.read("/proc/uptime").as_deref(), Some("1234.56 789.00"));
    assert_eq!(host.read("/proc/loadavg"), None);
    assert!(host.exists("/proc/uptime"));
    assert!(!host.exists("/dev/gps0"));
    assert_eq!(
        host.read_json("/run/system.json").unwrap(),
        json!({"vendor": "Acme"})
    );
    assert!(matches!(
        host.read_json("/run/gps-status.json"),
        Err(HostError::NotFound { .. })
    ));
}

#[test]
fn typed_json_helpers() {
    #[derive(serde::Deserialize)]
    struct Entry {
        ifname: String,
    }

    let dir = tempfile::tempdir().unwrap();
    record(dir.path(), "bridge_-j_link", r#"[{"ifname":"e1"}]"#);

    let host = ReplayHost::new(dir.path());
    let dynamic: &dyn Host = &host;
    let entries: Vec<Entry> = dynamic.run_json_as(&["bridge", "-j", "link"]).unwrap();
    assert_eq!(entries[0].ifname, "e1");
}

// ── Capture ─────────────────────────────────────────────────────────

#[test]
fn capture_writes_replayable_tree() {
    let source = tempfile::tempdir().unwrap();
    record(source.path(), "vtysh_-c_show-bfd-peers-json", "[]");
    file(source.path(), "/etc/os-release", "NAME=Infix");

    let target = tempfile::tempdir().unwrap();
    let capture = CaptureHost::new(ReplayHost::new(source.path()), target.path());
    assert_eq!(
        capture.run(&["vtysh", "-c", "show bfd peers json"]).unwrap(),
        "[]"
    );
    assert_eq!(capture.read("/etc/os-release").as_deref(), Some("NAME=Infix"));
    assert!(capture.run(&["mstpctl", "showbridge"]).is_err());

    let replay = ReplayHost::new(target.path());
    assert_eq!(
        replay.run(&["vtysh", "-c", "show bfd peers json"]).unwrap(),
        "[]"
    );
    assert_eq!(replay.read("/etc/os-release").as_deref(), Some("NAME=Infix"));
    assert!(!target.path().join("run/mstpctl_showbridge").exists());
}
