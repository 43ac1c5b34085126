// ── YANG date-and-time helpers ──

use std::sync::LazyLock;

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

const YANG_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

/// Render `instant` as `YYYY-MM-DDTHH:MM:SS+HH:MM`.
pub fn yang_date(instant: &DateTime<FixedOffset>) -> String {
    instant.format(YANG_FORMAT).to_string()
}

/// Parse a timestamp produced by [`yang_date`].
pub fn parse_yang_date(text: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(text).ok()
}

/// `now` minus `seconds`, as a YANG timestamp. `None` when out of range.
pub fn seconds_ago(now: &DateTime<FixedOffset>, seconds: i64) -> Option<String> {
    since(now, Duration::try_seconds(seconds)?)
}

/// `now` minus `elapsed`, as a YANG timestamp. `None` when out of range.
pub fn since(now: &DateTime<FixedOffset>, elapsed: Duration) -> Option<String> {
    now.checked_sub_signed(elapsed).map(|instant| yang_date(&instant))
}

/// Seconds since the epoch as a UTC YANG timestamp.
pub fn epoch_date(epoch: i64) -> Option<String> {
    let instant = Utc.timestamp_opt(epoch, 0).single()?;
    Some(yang_date(&instant.fixed_offset()))
}

static FRR_CLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{2}):(\d{2})$").expect("Invalid uptime regex"));
static FRR_DAYS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)d(\d{2})h(\d{2})m$").expect("Invalid uptime regex"));
static FRR_WEEKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)w(\d)d(\d{2})h$").expect("Invalid uptime regex"));

/// Sum of three uptime fields, each converted by its unit constructor.
/// `None` on parse failure or when the total does not fit a duration.
fn sum_fields(
    caps: &regex::Captures<'_>,
    units: [fn(i64) -> Option<Duration>; 3],
) -> Option<Duration> {
    let mut total = Duration::zero();
    for (i, unit) in units.into_iter().enumerate() {
        let value: i64 = caps.get(i + 1)?.as_str().parse().ok()?;
        total = total.checked_add(&unit(value)?)?;
    }
    Some(total)
}

/// Parse an frr uptime: `HH:MM:SS`, `NdHHhMMm` or `WWwDdHHh`.
pub fn parse_frr_uptime(text: &str) -> Option<Duration> {
    let text = text.trim();
    if let Some(caps) = FRR_CLOCK.captures(text) {
        return sum_fields(
            &caps,
            [Duration::try_hours, Duration::try_minutes, Duration::try_seconds],
        );
    }
    if let Some(caps) = FRR_DAYS.captures(text) {
        return sum_fields(
            &caps,
            [Duration::try_days, Duration::try_hours, Duration::try_minutes],
        );
    }
    if let Some(caps) = FRR_WEEKS.captures(text) {
        return sum_fields(
            &caps,
            [Duration::try_weeks, Duration::try_days, Duration::try_hours],
        );
    }
    None
}

/// frr uptime subtracted from `now`, as a YANG timestamp.
pub fn frr_timestamp(now: &DateTime<FixedOffset>, uptime: &str) -> Option<String> {
    since(now, parse_frr_uptime(uptime)?)
}

/// VPD manufacture date `MM/DD/YYYY HH:MM:SS` (UTC) as a YANG timestamp.
pub fn vpd_date(text: &str) -> Option<String> {
    let naive = NaiveDateTime::parse_from_str(text.trim(), "%m/%d/%Y %H:%M:%S").ok()?;
    Some(yang_date(&naive.and_utc().fixed_offset()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use yanger_host::replay_now;

    use super::*;

    #[test]
    fn formats_with_colon_offset() {
        let now = replay_now();
        assert_eq!(yang_date(&now), "2023-01-01T12:00:00+00:00");

        let cet = FixedOffset::east_opt(3600).unwrap();
        let local = now.with_timezone(&cet);
        assert_eq!(yang_date(&local), "2023-01-01T13:00:00+01:00");
    }

    #[test]
    fn timestamps_round_trip() {
        for text in ["2023-01-01T12:00:00+00:00", "2021-06-30T23:59:59-05:30"] {
            let parsed = parse_yang_date(text).unwrap();
            assert_eq!(yang_date(&parsed), text);
        }
    }

    #[test]
    fn parses_all_frr_uptime_forms() {
        assert_eq!(parse_frr_uptime("00:01:30"), Some(Duration::seconds(90)));
        assert_eq!(
            parse_frr_uptime("2d03h04m"),
            Some(Duration::days(2) + Duration::hours(3) + Duration::minutes(4))
        );
        assert_eq!(
            parse_frr_uptime("01w2d05h"),
            Some(Duration::weeks(1) + Duration::days(2) + Duration::hours(5))
        );
        assert_eq!(parse_frr_uptime("never"), None);
    }

    #[test]
    fn zero_uptime_is_now() {
        let now = replay_now();
        assert_eq!(
            frr_timestamp(&now, "00:00:00").as_deref(),
            Some("2023-01-01T12:00:00+00:00")
        );
        assert_eq!(
            frr_timestamp(&now, "00:01:30").as_deref(),
            Some("2023-01-01T11:58:30+00:00")
        );
        assert_eq!(seconds_ago(&now, 3600).as_deref(), Some("2023-01-01T11:00:00+00:00"));
    }

    #[test]
    fn oversized_uptimes_are_dropped() {
        let now = replay_now();
        assert_eq!(parse_frr_uptime("99999999999999:00:00"), None);
        assert_eq!(parse_frr_uptime("9223372036854775807d00h00m"), None);
        assert_eq!(parse_frr_uptime("99999999999999w0d00h"), None);
        assert_eq!(frr_timestamp(&now, "99999999999999:00:00"), None);
        assert_eq!(seconds_ago(&now, i64::MAX), None);
        // Fits a duration, but not the calendar.
        assert_eq!(frr_timestamp(&now, "999999999999:00:00"), None);
    }

    #[test]
    fn converts_epoch_and_vpd_dates() {
        assert_eq!(
            epoch_date(1_672_574_400).as_deref(),
            Some("2023-01-01T12:00:00+00:00")
        );
        assert_eq!(
            vpd_date("03/15/2022 08:30:00").as_deref(),
            Some("2022-03-15T08:30:00+00:00")
        );
        assert_eq!(vpd_date("garbage"), None);
    }
}
