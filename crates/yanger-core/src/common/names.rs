// ── Name normalization ──

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use yanger_host::Host;

static SENSOR_KIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(phy|sfp|fan|temp|sensor|psu|cpu|gpu|memory|disk)\d*$")
        .expect("Invalid sensor kind regex")
});

/// Normalize a hwmon/thermal device name for publication.
///
/// `cpu_thermal` becomes `cpu`, `f1072004.mdio-mii_sfp2` becomes `sfp2`,
/// `sensor_0` becomes `sensor0`. Normalized names map to themselves.
pub fn sensor_name(raw: &str) -> String {
    let mut name = raw.to_owned();
    loop {
        let next = normalize_once(&name);
        if next == name {
            return name;
        }
        name = next;
    }
}

fn normalize_once(raw: &str) -> String {
    let name = raw
        .strip_suffix("-thermal")
        .or_else(|| raw.strip_suffix("_thermal"))
        .unwrap_or(raw);

    let last = name.rsplit(['-', '_', ':', '.']).next().unwrap_or(name);
    if SENSOR_KIND.is_match(last) {
        return last.to_owned();
    }

    match name.rsplit_once('_') {
        Some((head, tail))
            if !head.is_empty() && !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) =>
        {
            format!("{head}{tail}")
        }
        _ => name.to_owned(),
    }
}

/// Published name of a wireless PHY. `phyN` and `radioN` are accepted;
/// whichever exists under `/sys/class/ieee80211` wins.
pub fn phy_name(host: &dyn Host, raw: &str) -> String {
    let alternate = if let Some(index) = raw.strip_prefix("phy") {
        format!("radio{index}")
    } else if let Some(index) = raw.strip_prefix("radio") {
        format!("phy{index}")
    } else {
        return raw.to_owned();
    };

    if host.exists(&format!("/sys/class/ieee80211/{raw}")) {
        raw.to_owned()
    } else if host.exists(&format!("/sys/class/ieee80211/{alternate}")) {
        alternate
    } else {
        raw.to_owned()
    }
}

/// Compress interface names into runs: `e1, e2, e3, e5` becomes
/// `e1-e3, e5`. Names without an alphabetic prefix and numeric suffix are
/// kept as-is.
pub fn compress_interfaces<S: AsRef<str>>(names: &[S]) -> String {
    let mut groups: BTreeMap<&str, Vec<u64>> = BTreeMap::new();
    let mut opaque: Vec<&str> = Vec::new();

    for name in names {
        let name = name.as_ref();
        match split_numbered(name) {
            Some((prefix, number)) => groups.entry(prefix).or_default().push(number),
            None => opaque.push(name),
        }
    }

    let mut parts = Vec::new();
    for (prefix, mut numbers) in groups {
        numbers.sort_unstable();
        numbers.dedup();

        let mut iter = numbers.into_iter().peekable();
        while let Some(start) = iter.next() {
            let mut end = start;
            while iter.peek() == Some(&(end + 1)) {
                end += 1;
                iter.next();
            }
            if start == end {
                parts.push(format!("{prefix}{start}"));
            } else {
                parts.push(format!("{prefix}{start}-{prefix}{end}"));
            }
        }
    }
    opaque.sort_unstable();
    opaque.dedup();
    parts.extend(opaque.into_iter().map(str::to_owned));
    parts.join(", ")
}

fn split_numbered(name: &str) -> Option<(&str, u64)> {
    let split = name.find(|c: char| c.is_ascii_digit())?;
    let (prefix, digits) = name.split_at(split);
    if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit())
        || (digits.len() > 1 && digits.starts_with('0'))
    {
        return None;
    }
    Some((prefix, digits.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use crate::testutil::Recording;

    use super::*;

    #[test]
    fn sensor_names() {
        assert_eq!(sensor_name("cpu_thermal"), "cpu");
        assert_eq!(sensor_name("cpu-thermal"), "cpu");
        assert_eq!(sensor_name("f1072004.mdio-mii_sfp2"), "sfp2");
        assert_eq!(sensor_name("mdio_bus-phy"), "phy");
        assert_eq!(sensor_name("sensor_0"), "sensor0");
        assert_eq!(sensor_name("tmp102_3"), "tmp1023");
        assert_eq!(sensor_name("nvme"), "nvme");
    }

    #[test]
    fn sensor_normalization_is_idempotent() {
        for raw in [
            "cpu_thermal",
            "f1072004.mdio-mii_sfp2",
            "sensor_0",
            "gpu-thermal",
            "ath10k_hwmon",
            "board_sfp_1",
        ] {
            let once = sensor_name(raw);
            assert_eq!(sensor_name(&once), once, "{raw}");
        }
    }

    #[test]
    fn phy_name_prefers_existing() {
        let rec = Recording::new().file("/sys/class/ieee80211/radio0/index", "0");
        let host = rec.host();

        assert_eq!(phy_name(&host, "phy0"), "radio0");
        assert_eq!(phy_name(&host, "radio0"), "radio0");
        assert_eq!(phy_name(&host, "phy1"), "phy1");
        assert_eq!(phy_name(&host, "wlan0"), "wlan0");
    }

    #[test]
    fn compresses_runs() {
        assert_eq!(
            compress_interfaces(&["e3", "e1", "e2", "e5", "wan", "lag10", "lag11"]),
            "e1-e3, e5, lag10-lag11, wan"
        );
        assert_eq!(compress_interfaces::<&str>(&[]), "");
    }

    #[test]
    fn compression_is_idempotent() {
        let sorted = |text: &str| {
            let mut parts: Vec<String> = text.split(", ").map(str::to_owned).collect();
            parts.sort();
            parts
        };
        let once = compress_interfaces(&["e1", "e2", "e3", "e7", "br0", "e01"]);
        let split: Vec<&str> = once.split(", ").collect();
        assert_eq!(sorted(&compress_interfaces(&split)), sorted(&once));
    }
}
