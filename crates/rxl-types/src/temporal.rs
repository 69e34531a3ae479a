use std::cmp::Ordering;
use std::fmt;

use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Format used when rendering a fresh timestamp.
const RENDER_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

/// Accepted on parse. `%.f` tolerates a missing fractional part.
const PARSE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Block creation time.
///
/// The persisted string is the source of truth: it feeds the block digest, so
/// a loaded timestamp keeps its exact original text even when that text is
/// not in the canonical render format (e.g. no fractional seconds). The
/// parsed value is kept alongside for ordering. Text that does not parse is
/// still accepted on load; the block then fails verification on its hash
/// rather than the whole document failing to decode.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Timestamp {
    text: String,
    at: Option<NaiveDateTime>,
}

impl Timestamp {
    /// The current local wall-clock time, microsecond precision.
    pub fn now() -> Self {
        Self::from_naive(Local::now().naive_local())
    }

    /// Render a timestamp from an explicit point in time.
    pub fn from_naive(at: NaiveDateTime) -> Self {
        Self {
            text: at.format(RENDER_FORMAT).to_string(),
            at: Some(at),
        }
    }

    /// Parse a timestamp, rejecting text that is not a date and time.
    pub fn parse(text: &str) -> Result<Self, TypeError> {
        let at = NaiveDateTime::parse_from_str(text, PARSE_FORMAT).map_err(|e| {
            TypeError::InvalidTimestamp {
                value: text.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            text: text.to_string(),
            at: Some(at),
        })
    }

    /// Wrap persisted text verbatim, parsing it if possible.
    pub fn from_persisted(text: impl Into<String>) -> Self {
        let text = text.into();
        let at = NaiveDateTime::parse_from_str(&text, PARSE_FORMAT).ok();
        Self { text, at }
    }

    /// The persisted string form.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The parsed point in time, if the text is well formed.
    pub fn as_naive(&self) -> Option<NaiveDateTime> {
        self.at
    }

    pub fn is_well_formed(&self) -> bool {
        self.at.is_some()
    }

    /// `self`, or `floor` if `self` is earlier.
    ///
    /// Used to keep block timestamps non-decreasing when the wall clock steps
    /// backwards.
    pub fn not_before(self, floor: &Timestamp) -> Self {
        if self < *floor {
            floor.clone()
        } else {
            self
        }
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parsed time first, then text. Malformed text sorts before every well
/// formed timestamp, so a clock clamp never copies it forward.
impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.at
            .cmp(&other.at)
            .then_with(|| self.text.cmp(&other.text))
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.text)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from_persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32, micro: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_micro_opt(h, m, s, micro)
            .unwrap()
    }

    #[test]
    fn renders_with_microseconds() {
        let ts = Timestamp::from_naive(at(8, 5, 3, 42));
        assert_eq!(ts.as_str(), "2024-03-09 08:05:03.000042");
    }

    #[test]
    fn parse_preserves_text_without_fraction() {
        let ts = Timestamp::parse("2024-03-09 08:05:03").unwrap();
        assert_eq!(ts.as_str(), "2024-03-09 08:05:03");
        assert_eq!(ts.as_naive(), Some(at(8, 5, 3, 0)));
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = Timestamp::parse("yesterday").unwrap_err();
        assert!(matches!(err, TypeError::InvalidTimestamp { .. }));
    }

    #[test]
    fn ordering_follows_time() {
        let early = Timestamp::from_naive(at(8, 0, 0, 0));
        let late = Timestamp::from_naive(at(9, 0, 0, 0));
        assert!(early < late);
    }

    #[test]
    fn not_before_clamps_backwards_clock() {
        let prev = Timestamp::from_naive(at(9, 0, 0, 0));
        let skewed = Timestamp::from_naive(at(8, 59, 59, 0));
        assert_eq!(skewed.not_before(&prev), prev);

        let later = Timestamp::from_naive(at(9, 0, 1, 0));
        assert_eq!(later.clone().not_before(&prev), later);
    }

    #[test]
    fn serde_roundtrip_keeps_text() {
        let ts = Timestamp::parse("2024-03-09 08:05:03.5").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, "\"2024-03-09 08:05:03.5\"");
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn malformed_persisted_text_still_deserializes() {
        let ts: Timestamp = serde_json::from_str("\"2024-01-01T00:00:00\"").unwrap();
        assert_eq!(ts.as_str(), "2024-01-01T00:00:00");
        assert!(!ts.is_well_formed());
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2024-01-01T00:00:00\"");
    }

    #[test]
    fn malformed_text_sorts_first_and_is_never_a_clamp_floor() {
        let bad = Timestamp::from_persisted("not a time");
        let good = Timestamp::from_naive(at(9, 0, 0, 0));
        assert!(bad < good);
        assert_eq!(good.clone().not_before(&bad), good);
    }
}
