// ── firewalld rich rules ──
//
// Only the subset policies use for custom filters is understood:
// `rule [priority="N"] [family="ipv4|ipv6"] [icmp-type name="T"] accept|drop|reject`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static PRIORITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bpriority="?(-?\d+)"?"#).expect("Invalid rich rule priority regex")
});
static FAMILY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bfamily="?(ipv4|ipv6)"?"#).expect("Invalid rich rule family regex")
});
static ICMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\bicmp-type\s+name="?([\w-]+)"?"#).expect("Invalid rich rule icmp regex")
});
static ACTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(accept|drop|reject)\b(?:\s+type=\S+)?\s*$").expect("Invalid rich rule action regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Icmp {
    #[serde(rename = "type")]
    pub kind: String,
}

/// One custom filter of a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub name: String,
    pub priority: i32,
    pub family: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icmp: Option<Icmp>,
    pub action: &'static str,
}

/// Filter for `rule`, or `None` when it carries no terminal action.
/// `index` names rules that match no ICMP type.
pub fn parse(rule: &str, index: usize) -> Option<Filter> {
    let rule = rule.trim();
    if !rule.starts_with("rule") {
        return None;
    }
    let action = match ACTION.captures(rule)?.get(1)?.as_str() {
        "accept" => "accept",
        "drop" => "drop",
        _ => "reject",
    };
    let family = match FAMILY.captures(rule).and_then(|c| c.get(1)).map(|m| m.as_str()) {
        Some("ipv4") => "ipv4",
        Some("ipv6") => "ipv6",
        _ => "both",
    };
    let icmp = ICMP
        .captures(rule)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned());
    let priority = PRIORITY
        .captures(rule)
        .and_then(|c| c.get(1)?.as_str().parse().ok())
        .unwrap_or(0);

    Some(Filter {
        name: icmp.clone().unwrap_or_else(|| format!("rule-{index}")),
        priority,
        family,
        icmp: icmp.map(|kind| Icmp { kind }),
        action,
    })
}

/// Filters of every parseable rule, in rule order.
pub fn filters<S: AsRef<str>>(rules: &[S]) -> Vec<Filter> {
    rules
        .iter()
        .enumerate()
        .filter_map(|(index, rule)| parse(rule.as_ref(), index))
        .collect()
}
