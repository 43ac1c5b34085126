// ── RFC 7951 value encodings ──
//
// Small newtypes for the JSON encodings YANG imposes on top of plain
// serde: presence/empty leaves as `[null]`, 64-bit counters as decimal
// strings, and decimal64 values with a fixed number of fraction digits.

use std::fmt;

use serde::ser::{Serialize, SerializeSeq, Serializer};

/// YANG `empty` / presence leaf, encoded as `[null]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Presence;

impl Presence {
    /// `Some(Presence)` when `flag` is set, for `skip_serializing_if` fields.
    pub fn when(flag: bool) -> Option<Self> {
        flag.then_some(Self)
    }
}

impl Serialize for Presence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(1))?;
        seq.serialize_element(&())?;
        seq.end()
    }
}

/// `yang:counter64` / `yang:gauge64`, encoded as a decimal string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Counter64(pub u64);

impl Serialize for Counter64 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl From<u64> for Counter64 {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// `decimal64` with a fixed number of fraction digits, encoded as a string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decimal {
    value: f64,
    digits: usize,
}

impl Decimal {
    pub fn new(value: f64, digits: usize) -> Self {
        Self { value, digits }
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&fixed(self.value, self.digits))
    }
}

impl Serialize for Decimal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Format `value` with exactly `digits` fraction digits. Negative zero is
/// printed without its sign.
pub fn fixed(value: f64, digits: usize) -> String {
    let text = format!("{value:.digits$}");
    match text.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_owned(),
        _ => text,
    }
}
