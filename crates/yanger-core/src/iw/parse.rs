// ── iw text parsers ──
//
// Pure functions from `iw` output to the structured view. Unknown lines
// are ignored; a missing field stays `None`.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::common::number::{leading_int, mac};
use crate::yang::Counter64;

use super::channel::band_name;
use super::{Band, Combination, IfaceInfo, Limit, LinkInfo, PhyInfo, Station, SurveyEntry};

static FREQUENCY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\*\s+(\d+(?:\.\d+)?)\s+MHz(?:\s+\[\d+\])?(.*)$").expect("Invalid frequency regex")
});
static TXPOWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((\d+(?:\.\d+)?) dBm\)").expect("Invalid txpower regex"));
static LIMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\{\s*([^}]*)\}\s*<=\s*(\d+)").expect("Invalid limit regex"));
static TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"total\s*<=\s*(\d+)").expect("Invalid total regex"));
static CHANNELS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#channels\s*<=\s*(\d+)").expect("Invalid channels regex"));
static CHANNEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^channel\s+(\d+)\s+\((\d+(?:\.\d+)?)\s+MHz\)(?:,\s*width:\s*([^,]+))?")
        .expect("Invalid channel regex")
});

/// PHY names from `iw list`.
pub fn phy_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| line.strip_prefix("Wiphy "))
        .map(|name| name.trim().to_owned())
        .collect()
}

/// PHY index → interface names from `iw dev`.
pub fn devices(text: &str) -> BTreeMap<u32, Vec<String>> {
    let mut map: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    let mut current = None;
    for line in text.lines() {
        let line = line.trim();
        if let Some(index) = line.strip_prefix("phy#") {
            current = index.trim().parse().ok();
            if let Some(index) = current {
                map.entry(index).or_default();
            }
        } else if let Some(ifname) = line.strip_prefix("Interface ") {
            if let Some(index) = current {
                map.entry(index).or_default().push(ifname.trim().to_owned());
            }
        }
    }
    map
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Top,
    Band,
    Frequencies,
    Combinations,
    Other,
}

/// PHY detail from `iw phy <phy> info`. Driver and manufacturer are
/// filled in by the caller.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn phy_info(name: &str, text: &str) -> PhyInfo {
    let mut info = PhyInfo {
        name: name.to_owned(),
        ..PhyInfo::default()
    };
    let mut section = Section::Top;
    let mut combo_text = String::new();
    let mut max_power: Option<f64> = None;

    for raw in text.lines() {
        let depth = raw.len() - raw.trim_start_matches('\t').len();
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if depth <= 1 {
            if section == Section::Combinations && !combo_text.is_empty() {
                info.interface_combinations.extend(combinations(&combo_text));
                combo_text.clear();
            }
            section = Section::Other;
            if let Some(index) = line.strip_prefix("wiphy index:") {
                info.wiphy_index = index.trim().parse().ok();
            } else if let Some(band) = line.strip_prefix("Band ") {
                let index = leading_int(band).and_then(|i| u32::try_from(i).ok()).unwrap_or(0);
                info.bands.push(Band {
                    band: index,
                    ..Band::default()
                });
                section = Section::Band;
            } else if line.starts_with("valid interface combinations") {
                section = Section::Combinations;
            }
            continue;
        }

        match section {
            Section::Band | Section::Frequencies => {
                let Some(band) = info.bands.last_mut() else {
                    continue;
                };
                if depth == 2 {
                    section = Section::Band;
                    if line.starts_with("Capabilities:") || line.starts_with("HT ") {
                        band.ht = true;
                    } else if line.starts_with("VHT Capabilities") {
                        band.vht = true;
                    } else if line.starts_with("HE Iftypes") || line.starts_with("HE MAC") {
                        band.he = true;
                    } else if line.starts_with("Frequencies:") {
                        section = Section::Frequencies;
                    }
                } else if section == Section::Frequencies {
                    if let Some(caps) = FREQUENCY.captures(line) {
                        let rest = caps.get(2).map_or("", |m| m.as_str());
                        if rest.contains("disabled") {
                            continue;
                        }
                        let Some(freq) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok())
                        else {
                            continue;
                        };
                        let freq = freq.round() as u32;
                        if band.frequencies.is_empty() {
                            band.name = band_name(freq).map(str::to_owned);
                        }
                        band.frequencies.push(freq);
                        if let Some(power) = TXPOWER
                            .captures(rest)
                            .and_then(|c| c.get(1)?.as_str().parse::<f64>().ok())
                        {
                            max_power = Some(max_power.map_or(power, |m: f64| m.max(power)));
                        }
                    }
                }
            }
            Section::Combinations => {
                if line.starts_with('*') && !combo_text.is_empty() {
                    info.interface_combinations.extend(combinations(&combo_text));
                    combo_text.clear();
                }
                combo_text.push_str(line.trim_start_matches('*'));
                combo_text.push(' ');
            }
            Section::Top | Section::Other => {}
        }
    }
    if !combo_text.is_empty() {
        info.interface_combinations.extend(combinations(&combo_text));
    }

    info.max_txpower = max_power.map(|p| p.round() as i32);
    info
}

fn combinations(text: &str) -> Option<Combination> {
    let limits: Vec<Limit> = LIMIT
        .captures_iter(text)
        .filter_map(|caps| {
            let types = caps
                .get(1)?
                .as_str()
                .split(',')
                .map(|t| t.trim().to_owned())
                .filter(|t| !t.is_empty())
                .collect();
            let max = caps.get(2)?.as_str().parse().ok()?;
            Some(Limit { types, max })
        })
        .collect();
    if limits.is_empty() {
        return None;
    }
    let number = |re: &Regex| -> u32 {
        re.captures(text)
            .and_then(|c| c.get(1)?.as_str().parse().ok())
            .unwrap_or(0)
    };
    Some(Combination {
        limits,
        total: number(&TOTAL),
        channels: number(&CHANNELS),
    })
}

/// Decode `\xHH` escapes in an SSID and drop non-printable characters.
pub fn decode_ssid(raw: &str) -> String {
    let mut bytes = Vec::with_capacity(raw.len());
    let input = raw.as_bytes();
    let mut i = 0;
    while i < input.len() {
        if input[i] == b'\\' && input.get(i + 1) == Some(&b'x') {
            let hex = raw.get(i + 2..i + 4).and_then(|h| u8::from_str_radix(h, 16).ok());
            if let Some(byte) = hex {
                bytes.push(byte);
                i += 4;
                continue;
            }
        }
        bytes.push(input[i]);
        i += 1;
    }
    String::from_utf8_lossy(&bytes)
        .chars()
        .filter(|c| !c.is_control() && *c != char::REPLACEMENT_CHARACTER)
        .collect()
}

/// Interface detail from `iw dev <iface> info`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn iface_info(ifname: &str, text: &str) -> IfaceInfo {
    let mut info = IfaceInfo {
        ifname: ifname.to_owned(),
        ..IfaceInfo::default()
    };
    for line in text.lines().map(str::trim) {
        if let Some(kind) = line.strip_prefix("type ") {
            info.kind = Some(kind.trim().to_owned());
        } else if let Some(addr) = line.strip_prefix("addr ") {
            info.mac = Some(mac(addr));
        } else if let Some(ssid) = line.strip_prefix("ssid ") {
            info.ssid = Some(decode_ssid(ssid));
        } else if let Some(phy) = line.strip_prefix("wiphy ") {
            info.wiphy = phy.trim().parse().ok();
        } else if let Some(power) = line.strip_prefix("txpower ") {
            info.txpower = power
                .split_whitespace()
                .next()
                .and_then(|p| p.parse::<f64>().ok())
                .map(|p| p.round() as i32);
        } else if let Some(caps) = CHANNEL_LINE.captures(line) {
            info.channel = caps.get(1).and_then(|m| m.as_str().parse().ok());
            info.frequency = caps
                .get(2)
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .map(|f| f.round() as u32);
            info.width = caps.get(3).map(|m| m.as_str().trim().to_owned());
        }
    }
    info
}

/// Bitrate line value (`65.0 MBit/s MCS 7`) in 100 kbit/s units.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn bitrate(value: &str) -> Option<u32> {
    let mbps: f64 = value.split_whitespace().next()?.parse().ok()?;
    Some((mbps * 10.0).round() as u32)
}

fn field<'a>(line: &'a str, key: &str) -> Option<&'a str> {
    line.strip_prefix(key)
        .and_then(|rest| rest.strip_prefix(':'))
        .map(str::trim)
}

fn counter(value: &str) -> Option<Counter64> {
    value.split_whitespace().next()?.parse().ok().map(Counter64)
}

/// Stations from `iw dev <iface> station dump`.
pub fn stations(text: &str) -> Vec<Station> {
    let mut stations: Vec<Station> = Vec::new();
    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Station ") {
            let addr = rest.split_whitespace().next().unwrap_or_default();
            stations.push(Station {
                mac: mac(addr),
                ..Station::default()
            });
            continue;
        }
        let Some(station) = stations.last_mut() else {
            continue;
        };
        if let Some(v) = field(line, "signal") {
            station.signal = leading_int(v).and_then(|s| i32::try_from(s).ok());
        } else if let Some(v) = field(line, "connected time") {
            station.connected_time = leading_int(v).and_then(|s| u64::try_from(s).ok());
        } else if let Some(v) = field(line, "inactive time") {
            station.inactive_time = leading_int(v).and_then(|s| u64::try_from(s).ok());
        } else if let Some(v) = field(line, "rx bytes") {
            station.rx_bytes = counter(v);
        } else if let Some(v) = field(line, "tx bytes") {
            station.tx_bytes = counter(v);
        } else if let Some(v) = field(line, "rx packets") {
            station.rx_packets = counter(v);
        } else if let Some(v) = field(line, "tx packets") {
            station.tx_packets = counter(v);
        } else if let Some(v) = field(line, "tx bitrate") {
            station.tx_speed = bitrate(v);
        } else if let Some(v) = field(line, "rx bitrate") {
            station.rx_speed = bitrate(v);
        }
    }
    stations
}

/// Channel survey from `iw dev <iface> survey dump`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn survey(text: &str) -> Vec<SurveyEntry> {
    let mut entries: Vec<SurveyEntry> = Vec::new();
    for line in text.lines().map(str::trim) {
        if line.starts_with("Survey data from") {
            entries.push(SurveyEntry::default());
            continue;
        }
        let Some(entry) = entries.last_mut() else {
            continue;
        };
        let ms = |v: &str| leading_int(v).and_then(|n| u64::try_from(n).ok());
        if let Some(v) = field(line, "frequency") {
            entry.frequency = v
                .split_whitespace()
                .next()
                .and_then(|f| f.parse::<f64>().ok())
                .map(|f| f.round() as u32);
            entry.in_use = v.contains("[in use]");
        } else if let Some(v) = field(line, "noise") {
            entry.noise = leading_int(v).and_then(|n| i32::try_from(n).ok());
        } else if let Some(v) = field(line, "channel active time") {
            entry.active_time = ms(v);
        } else if let Some(v) = field(line, "channel busy time") {
            entry.busy_time = ms(v);
        } else if let Some(v) = field(line, "channel receive time") {
            entry.receive_time = ms(v);
        } else if let Some(v) = field(line, "channel transmit time") {
            entry.transmit_time = ms(v);
        }
    }
    entries.retain(|entry| entry.frequency.is_some());
    entries
}

/// Station-mode link from `iw dev <iface> link`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn link(text: &str) -> LinkInfo {
    let mut info = LinkInfo::default();
    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("Connected to ") {
            info.connected = true;
            info.bssid = rest.split_whitespace().next().map(mac);
        } else if let Some(v) = field(line, "SSID") {
            info.ssid = Some(decode_ssid(v));
        } else if let Some(v) = field(line, "freq") {
            info.frequency = v
                .split_whitespace()
                .next()
                .and_then(|f| f.parse::<f64>().ok())
                .map(|f| f.round() as u32);
        } else if let Some(v) = field(line, "signal") {
            info.signal = leading_int(v).and_then(|s| i32::try_from(s).ok());
        } else if let Some(v) = field(line, "tx bitrate") {
            info.tx_speed = bitrate(v);
        } else if let Some(v) = field(line, "rx bitrate") {
            info.rx_speed = bitrate(v);
        }
    }
    info
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PHY_INFO: &str = "Wiphy phy0
\twiphy index: 0
\tmax # scan SSIDs: 4
\tSupported interface modes:
\t\t * managed
\t\t * AP
\tBand 1:
\t\tCapabilities: 0x1ff
\t\t\tRX LDPC
\t\tHT TX/RX MCS rate indexes supported: 0-15
\t\tHE Iftypes: managed, AP
\t\t\tHE MAC Capabilities (0x000d):
\t\tFrequencies:
\t\t\t* 2412.0 MHz [1] (20.0 dBm)
\t\t\t* 2437 MHz [6] (23.0 dBm)
\t\t\t* 2462 MHz [11] (20.0 dBm)
\t\t\t* 2484 MHz [14] (disabled)
\tBand 2:
\t\tVHT Capabilities (0x339071b2):
\t\tFrequencies:
\t\t\t* 5180 MHz [36] (22.0 dBm)
\tvalid interface combinations:
\t\t * #{ managed } <= 16, #{ AP, mesh point } <= 8,
\t\t   total <= 16, #channels <= 1
\t\t * #{ AP } <= 4,
\t\t   total <= 4, #channels <= 2
\tHT Capability overrides:
\t\t * MCS: ff ff ff ff
";

    #[test]
    fn parses_phy_list_and_devices() {
        assert_eq!(phy_list("Wiphy phy0\n\tfoo\nWiphy radio1\n"), vec!["phy0", "radio1"]);

        let devs = devices("phy#1\n\tInterface wlan1\n\t\ttype AP\nphy#0\n\tInterface wlan0\n\tInterface wlan0-1\n");
        assert_eq!(devs.get(&0).cloned().unwrap_or_default(), vec!["wlan0", "wlan0-1"]);
        assert_eq!(devs.get(&1).cloned().unwrap_or_default(), vec!["wlan1"]);
    }

    #[test]
    fn parses_phy_info() {
        let info = phy_info("phy0", PHY_INFO);
        assert_eq!(info.wiphy_index, Some(0));
        assert_eq!(info.bands.len(), 2);

        let band = &info.bands[0];
        assert_eq!(band.band, 1);
        assert_eq!(band.name.as_deref(), Some("2.4GHz"));
        assert_eq!(band.frequencies, vec![2412, 2437, 2462]);
        assert!(band.ht && band.he && !band.vht);

        let band = &info.bands[1];
        assert_eq!(band.name.as_deref(), Some("5GHz"));
        assert!(band.vht && !band.ht);

        assert_eq!(info.max_txpower, Some(23));
        assert_eq!(info.interface_combinations.len(), 2);
        let first = &info.interface_combinations[0];
        assert_eq!(first.total, 16);
        assert_eq!(first.channels, 1);
        assert_eq!(first.limits[1].types, vec!["AP", "mesh point"]);
        assert_eq!(first.limits[1].max, 8);
        assert_eq!(info.max_ap(), 8);
    }

    #[test]
    fn decodes_ssids() {
        assert_eq!(decode_ssid(r"caf\xc3\xa9"), "café");
        assert_eq!(decode_ssid(r"bad\x01name"), "badname");
        assert_eq!(decode_ssid(r"plain\xZZ"), r"plain\xZZ");
    }

    #[test]
    fn parses_iface_info() {
        let info = iface_info(
            "wlan0",
            "Interface wlan0\n\tifindex 5\n\taddr 02:00:00:AA:BB:CC\n\tssid Guest\\x20Net\n\ttype AP\n\twiphy 0\n\tchannel 6 (2437 MHz), width: 20 MHz, center1: 2437 MHz\n\ttxpower 20.00 dBm\n",
        );
        assert_eq!(info.kind.as_deref(), Some("AP"));
        assert_eq!(info.mac.as_deref(), Some("02:00:00:aa:bb:cc"));
        assert_eq!(info.ssid.as_deref(), Some("Guest Net"));
        assert_eq!(info.channel, Some(6));
        assert_eq!(info.frequency, Some(2437));
        assert_eq!(info.width.as_deref(), Some("20 MHz"));
        assert_eq!(info.txpower, Some(20));
    }

    #[test]
    fn parses_station_dump() {
        let text = "Station 02:00:00:00:01:00 (on wlan0)
\tinactive time:\t1000 ms
\trx bytes:\t18446744073709551615
\trx packets:\t100
\ttx bytes:\t5678
\ttx packets:\t50
\tsignal:  \t-40 [-40, -42] dBm
\ttx bitrate:\t65.0 MBit/s MCS 7
\trx bitrate:\t54.0 MBit/s
\tconnected time:\t120 seconds
Station 02:00:00:00:02:00 (on wlan0)
\tsignal:\t-70 dBm
";
        let list = stations(text);
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].mac, "02:00:00:00:01:00");
        assert_eq!(list[0].signal, Some(-40));
        assert_eq!(list[0].rx_bytes, Some(Counter64(u64::MAX)));
        assert_eq!(list[0].tx_speed, Some(650));
        assert_eq!(list[0].rx_speed, Some(540));
        assert_eq!(list[0].connected_time, Some(120));
        assert_eq!(list[1].signal, Some(-70));
    }

    #[test]
    fn parses_survey_dump() {
        let text = "Survey data from wlan0
\tfrequency:\t\t\t2412 MHz [in use]
\tnoise:\t\t\t\t-95 dBm
\tchannel active time:\t\t1000 ms
\tchannel busy time:\t\t100 ms
\tchannel receive time:\t\t50 ms
\tchannel transmit time:\t\t20 ms
Survey data from wlan0
\tfrequency:\t\t\t2417 MHz
";
        let entries = survey(text);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].in_use);
        assert_eq!(entries[0].noise, Some(-95));
        assert_eq!(entries[0].busy_time, Some(100));
        assert!(!entries[1].in_use);
        assert_eq!(entries[1].active_time, None);
    }

    #[test]
    fn parses_link() {
        let info = link("Connected to 00:11:22:33:44:55 (on wlan0)\n\tSSID: Home\n\tfreq: 5180.0\n\tsignal: -50 dBm\n\trx bitrate: 72.2 MBit/s\n\ttx bitrate: 65.0 MBit/s\n");
        assert!(info.connected);
        assert_eq!(info.bssid.as_deref(), Some("00:11:22:33:44:55"));
        assert_eq!(info.ssid.as_deref(), Some("Home"));
        assert_eq!(info.frequency, Some(5180));
        assert_eq!(info.rx_speed, Some(722));

        assert!(!link("Not connected.\n").connected);
    }
}
