//! Nanosecond timestamps carried by the `Timestamp` datatype.

use std::fmt;

use serde::Serialize;

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const SECS_PER_DAY: u64 = 86_400;

/// Nanoseconds since 1970-01-01 00:00:00 UTC.
///
/// Renders as `Jan 31, 2014 23:59:59.999.999.999`, splitting the
/// sub-second part into milli, micro and nano groups.
///
/// # Examples
///
/// ```
/// use s7commp::value::Timestamp;
///
/// assert_eq!(Timestamp(0).to_string(), "Jan  1, 1970 00:00:00.000.000.000");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "String")]
pub struct Timestamp(pub u64);

impl From<Timestamp> for String {
    fn from(value: Timestamp) -> Self { value.to_string() }
}

/// Proleptic Gregorian date for a day count since 1970-01-01.
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z % 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        let nanos = rest % 1000;
        rest /= 1000;
        let micros = rest % 1000;
        rest /= 1000;
        let millis = rest % 1000;
        rest /= 1000;

        let (year, month, day) = civil_from_days(rest / SECS_PER_DAY);
        let secs = rest % SECS_PER_DAY;
        let name = usize::try_from(month - 1)
            .ok()
            .and_then(|index| MONTHS.get(index))
            .copied()
            .unwrap_or("???");
        write!(
            f,
            "{name} {day:>2}, {year} {:02}:{:02}:{:02}.{millis:03}.{micros:03}.{nanos:03}",
            secs / 3600,
            secs % 3600 / 60,
            secs % 60,
        )
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::epoch(0, "Jan  1, 1970 00:00:00.000.000.000")]
    #[case::sub_second_groups(1_391_212_799_999_999_999, "Jan 31, 2014 23:59:59.999.999.999")]
    #[case::leap_day(951_782_400_000_000_000, "Feb 29, 2000 00:00:00.000.000.000")]
    #[case::mixed_groups(1_000_123_456_789, "Jan  1, 1970 00:16:40.123.456.789")]
    #[case::end_of_year(1_704_067_199_000_000_000, "Dec 31, 2023 23:59:59.000.000.000")]
    fn renders_calendar_time(#[case] nanos: u64, #[case] expected: &str) {
        assert_eq!(Timestamp(nanos).to_string(), expected);
    }

    #[test]
    fn largest_value_renders() {
        assert!(Timestamp(u64::MAX).to_string().starts_with("Jul 21, 2554"));
    }
}
