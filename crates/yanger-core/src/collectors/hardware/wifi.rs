// ── WiFi radios ──

use serde::Serialize;

use crate::common::names::phy_name;
use crate::context::Context;
use crate::iw::channel::channel;
use crate::iw::{Iw, PhyInfo, SurveyEntry};

use super::Component;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RadioBand {
    pub band: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub ht_capable: bool,
    pub vht_capable: bool,
    pub he_capable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaxInterfaces {
    pub ap: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct SurveyChannel {
    pub frequency: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<u32>,
    pub in_use: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub noise: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub busy_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receive_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transmit_time: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Survey {
    pub channel: Vec<SurveyChannel>,
}

/// `infix-hardware:wifi-radio` container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct WifiRadio {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_txpower: Option<i32>,
    pub num_virtual_interfaces: usize,
    pub max_interfaces: MaxInterfaces,
    pub supported_channels: Vec<u32>,
    pub bands: Vec<RadioBand>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub survey: Option<Survey>,
}

fn survey_channel(entry: &SurveyEntry) -> Option<SurveyChannel> {
    let frequency = entry.frequency?;
    Some(SurveyChannel {
        frequency,
        channel: channel(frequency),
        in_use: entry.in_use,
        noise: entry.noise,
        active_time: entry.active_time,
        busy_time: entry.busy_time,
        receive_time: entry.receive_time,
        transmit_time: entry.transmit_time,
    })
}

/// Radio payload for one PHY with the survey of its first interface.
pub fn radio(info: &PhyInfo, survey: &[SurveyEntry]) -> WifiRadio {
    let mut supported_channels: Vec<u32> = info.frequencies().filter_map(channel).collect();
    supported_channels.sort_unstable();
    supported_channels.dedup();

    let bands = info
        .bands
        .iter()
        .map(|band| RadioBand {
            band: band.band.to_string(),
            name: band.name.clone(),
            ht_capable: band.ht,
            vht_capable: band.vht,
            he_capable: band.he,
        })
        .collect();

    let channels: Vec<SurveyChannel> = survey.iter().filter_map(survey_channel).collect();

    WifiRadio {
        driver: info.driver.clone(),
        manufacturer: info.manufacturer.clone(),
        max_txpower: info.max_txpower,
        num_virtual_interfaces: info.num_virtual_interfaces,
        max_interfaces: MaxInterfaces { ap: info.max_ap() },
        supported_channels,
        bands,
        survey: (!channels.is_empty()).then_some(Survey { channel: channels }),
    }
}

/// One `infix-hardware:wifi` component per PHY reported by `iw list`.
pub fn radios(ctx: &Context<'_>) -> Vec<Component> {
    let iw = Iw::new(ctx.host());
    iw.list()
        .iter()
        .map(|phy| {
            let info = iw.phy(phy);
            let survey = iw
                .interfaces_of(&info)
                .first()
                .map(|ifname| iw.survey(ifname))
                .unwrap_or_default();

            let mut component = Component::new(phy_name(ctx.host(), phy), "infix-hardware:wifi");
            component.mfg_name.clone_from(&info.manufacturer);
            component.wifi_radio = Some(radio(&info, &survey));
            component
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::testutil::Recording;

    use super::*;

    const PHY0: &str = "Wiphy phy0
\twiphy index: 0
\tBand 1:
\t\tHT TX/RX MCS rate indexes supported: 0-15
\t\tFrequencies:
\t\t\t* 2412.0 MHz [1] (20.0 dBm)
\t\t\t* 2437.0 MHz [6] (20.0 dBm)
\t\t\t* 2462.0 MHz [11] (20.0 dBm)
\tvalid interface combinations:
\t\t * #{ managed } <= 1, #{ AP } <= 1,
\t\t   total <= 2, #channels <= 1
";

    const SURVEY: &str = "Survey data from wlan0
\tfrequency:\t\t\t2437 MHz [in use]
\tnoise:\t\t\t\t-92 dBm
\tchannel active time:\t\t1000 ms
\tchannel busy time:\t\t250 ms
\tchannel receive time:\t\t200 ms
\tchannel transmit time:\t\t30 ms
Survey data from wlan0
\tfrequency:\t\t\t2462 MHz
";

    #[test]
    fn single_band_radio() {
        let rec = Recording::new()
            .run(&["iw", "list"], PHY0)
            .run(&["iw", "phy", "phy0", "info"], PHY0);
        let host = rec.host();
        let ctx = Context::new(&host);

        let radios = radios(&ctx);
        assert_eq!(radios.len(), 1);
        assert_eq!(radios[0].name, "phy0");
        assert_eq!(radios[0].class, "infix-hardware:wifi");

        let value = serde_json::to_value(&radios[0].wifi_radio).unwrap();
        assert_eq!(value["supported-channels"], json!([1, 6, 11]));
        assert_eq!(value["max-interfaces"], json!({"ap": 1}));
        assert_eq!(value["bands"][0]["name"], json!("2.4GHz"));
        assert_eq!(value["bands"][0]["ht-capable"], json!(true));
        assert_eq!(value["max-txpower"], json!(20));
        assert_eq!(value["num-virtual-interfaces"], json!(0));
        assert!(value.get("survey").is_none());
    }

    #[test]
    fn survey_of_first_interface() {
        let rec = Recording::new()
            .run(&["iw", "list"], PHY0)
            .run(&["iw", "phy", "phy0", "info"], PHY0)
            .run(&["iw", "dev"], "phy#0\n\tInterface wlan0\n\t\ttype AP\n")
            .run(&["iw", "dev", "wlan0", "survey", "dump"], SURVEY)
            .run(
                &["readlink", "-f", "/sys/class/ieee80211/phy0/device/driver"],
                "/sys/bus/pci/drivers/mt7921e\n",
            );
        let host = rec.host();
        let ctx = Context::new(&host);

        let radios = radios(&ctx);
        assert_eq!(radios[0].mfg_name.as_deref(), Some("MediaTek Inc."));

        let radio = radios[0].wifi_radio.as_ref().unwrap();
        assert_eq!(radio.driver.as_deref(), Some("mt7921e"));
        assert_eq!(radio.num_virtual_interfaces, 1);

        let survey = &radio.survey.as_ref().unwrap().channel;
        assert_eq!(survey.len(), 2);
        assert_eq!(
            survey[0],
            SurveyChannel {
                frequency: 2437,
                channel: Some(6),
                in_use: true,
                noise: Some(-92),
                active_time: Some(1000),
                busy_time: Some(250),
                receive_time: Some(200),
                transmit_time: Some(30),
            }
        );
        assert!(!survey[1].in_use);
    }

    #[test]
    fn no_radios() {
        let rec = Recording::new();
        let host = rec.host();
        let ctx = Context::new(&host);
        assert!(radios(&ctx).is_empty());
    }
}
