// ── Channel / frequency conversion ──

/// Channel number for a centre frequency in MHz.
pub fn channel(freq: u32) -> Option<u32> {
    match freq {
        2484 => Some(14),
        2412..=2472 => Some((freq - 2407) / 5),
        5170..=5825 => Some((freq - 5000) / 5),
        5955..=7115 => Some((freq - 5950) / 5),
        _ => None,
    }
}

/// Band label for a frequency in MHz.
pub fn band_name(freq: u32) -> Option<&'static str> {
    match freq {
        2400..=2500 => Some("2.4GHz"),
        4900..=5925 => Some("5GHz"),
        5955..=7125 => Some("6GHz"),
        _ => None,
    }
}

const MANUFACTURERS: &[(&[&str], &str)] = &[
    (&["mt", "mediatek"], "MediaTek Inc."),
    (&["rtw", "realtek"], "Realtek Semiconductor Corp."),
    (&["ath", "qca"], "Qualcomm Atheros"),
    (&["iwl", "intel"], "Intel Corporation"),
    (&["brcm", "broadcom"], "Broadcom Inc."),
];

/// Chip vendor inferred from a kernel driver name.
pub fn manufacturer(driver: &str) -> Option<&'static str> {
    let driver = driver.to_ascii_lowercase();
    MANUFACTURERS
        .iter()
        .find(|(needles, _)| needles.iter().any(|needle| driver.contains(needle)))
        .map(|(_, vendor)| *vendor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channels() {
        assert_eq!(channel(2412), Some(1));
        assert_eq!(channel(2437), Some(6));
        assert_eq!(channel(2462), Some(11));
        assert_eq!(channel(2484), Some(14));
        assert_eq!(channel(5180), Some(36));
        assert_eq!(channel(5825), Some(165));
        assert_eq!(channel(5955), Some(1));
        assert_eq!(channel(7115), Some(233));
        assert_eq!(channel(900), None);
    }

    #[test]
    fn band_names() {
        assert_eq!(band_name(2412), Some("2.4GHz"));
        assert_eq!(band_name(5180), Some("5GHz"));
        assert_eq!(band_name(5955), Some("6GHz"));
        assert_eq!(band_name(60480), None);
    }

    #[test]
    fn manufacturers() {
        assert_eq!(manufacturer("mt7915e"), Some("MediaTek Inc."));
        assert_eq!(manufacturer("rtw88_8822ce"), Some("Realtek Semiconductor Corp."));
        assert_eq!(manufacturer("ath10k_pci"), Some("Qualcomm Atheros"));
        assert_eq!(manufacturer("iwlwifi"), Some("Intel Corporation"));
        assert_eq!(manufacturer("brcmfmac"), Some("Broadcom Inc."));
        assert_eq!(manufacturer("mac80211_hwsim"), None);
    }
}
