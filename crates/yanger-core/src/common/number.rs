// ── Parsing primitives ──

/// Leading integer of `text` (after trimming), e.g. `"42 ms"` → 42.
pub fn leading_int(text: &str) -> Option<i64> {
    let text = text.trim();
    let end = text
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map_or(text.len(), |(i, _)| i);
    text.get(..end)?.parse().ok()
}

/// Parse a float, tolerating surrounding whitespace.
pub fn float(text: &str) -> Option<f64> {
    text.trim().parse().ok()
}

/// Split `key=value` lines (as printed by `wpa_cli` and os-release) into
/// pairs. Double quotes around values are removed.
pub fn key_values(text: &str) -> Vec<(String, String)> {
    text.lines()
        .filter_map(|line| {
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() || key.starts_with('#') {
                return None;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            Some((key.to_owned(), value.to_owned()))
        })
        .collect()
}

/// Value of `key` in `key=value` text.
pub fn key_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Lowercase a MAC address and normalize separators to colons.
pub fn mac(text: &str) -> String {
    text.trim().to_ascii_lowercase().replace('-', ":")
}

/// Whether `text` looks like a 48-bit MAC address.
pub fn is_mac(text: &str) -> bool {
    let parts: Vec<&str> = text.split([':', '-']).collect();
    parts.len() == 6
        && parts
            .iter()
            .all(|p| p.len() == 2 && p.bytes().all(|b| b.is_ascii_hexdigit()))
}
