// ── firewalld over D-Bus ──
//
// Calls go through `busctl --json=short` on the host, so bus replies are
// recorded and replayed like any other command output. Replies look like
// `{"type": "a{sv}", "data": [...]}`; variants nest the same shape.

use serde_json::{Map, Value};

use yanger_host::Host;

use crate::common::tree::first_item;

pub const SERVICE: &str = "org.fedoraproject.FirewallD1";
pub const OBJECT: &str = "/org/fedoraproject/FirewallD1";
pub const MAIN: &str = "org.fedoraproject.FirewallD1";
pub const ZONE: &str = "org.fedoraproject.FirewallD1.zone";
pub const POLICY: &str = "org.fedoraproject.FirewallD1.policy";
pub const POLICIES: &str = "org.fedoraproject.FirewallD1.policies";

/// firewalld D-Bus API.
pub struct FirewallD<'h> {
    host: &'h dyn Host,
}

impl<'h> FirewallD<'h> {
    pub fn new(host: &'h dyn Host) -> Self {
        Self { host }
    }

    /// First return value of `interface.method(args)` with variants
    /// unwrapped. `args` is the busctl signature followed by the values.
    pub fn call(&self, interface: &str, method: &str, args: &[&str]) -> Option<Value> {
        let mut argv = vec!["busctl", "--json=short", "call", SERVICE, OBJECT, interface, method];
        argv.extend_from_slice(args);
        let reply = self.host.run_json(&argv).ok()?;
        let data = reply.get("data")?.clone();
        Some(plain(first_item(data)))
    }

    pub fn string(&self, interface: &str, method: &str, args: &[&str]) -> Option<String> {
        self.call(interface, method, args)?.as_str().map(str::to_owned)
    }

    pub fn strings(&self, interface: &str, method: &str, args: &[&str]) -> Vec<String> {
        self.call(interface, method, args)
            .map(|value| strings(&value))
            .unwrap_or_default()
    }

    /// `a{sv}` settings of a named object, e.g. `getZoneSettings2`.
    pub fn settings(&self, interface: &str, method: &str, name: &str) -> Map<String, Value> {
        match self.call(interface, method, &["s", name]) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

fn is_variant(map: &Map<String, Value>) -> bool {
    map.len() == 2 && map.contains_key("type") && map.contains_key("data")
}

/// `value` with every `{"type", "data"}` variant replaced by its data.
pub fn plain(value: Value) -> Value {
    match value {
        Value::Object(mut map) if is_variant(&map) => {
            plain(map.remove("data").unwrap_or_default())
        }
        Value::Object(map) => Value::Object(map.into_iter().map(|(k, v)| (k, plain(v))).collect()),
        Value::Array(items) => Value::Array(items.into_iter().map(plain).collect()),
        other => other,
    }
}

pub fn strings(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map_or(&[][..], Vec::as_slice)
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_owned)
        .collect()
}

/// Argv of a recorded call, for building fixtures.
#[cfg(test)]
pub fn argv<'a>(interface: &'a str, method: &'a str, args: &[&'a str]) -> Vec<&'a str> {
    let mut argv = vec!["busctl", "--json=short", "call", SERVICE, OBJECT, interface, method];
    argv.extend_from_slice(args);
    argv
}
