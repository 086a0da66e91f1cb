use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::InputError;
use crate::scoring;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";
const SESSION_ID_FORMAT: &str = "%Y-%m-%d_%H-%M";

/// Shooting distance label such as "18m", compared as an opaque token
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DistanceLabel(String);

impl DistanceLabel {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for DistanceLabel {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            Err(InputError::BlankDistance)
        } else {
            Ok(Self(trimmed.to_string()))
        }
    }
}

impl TryFrom<String> for DistanceLabel {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DistanceLabel> for String {
    fn from(label: DistanceLabel) -> Self {
        label.0
    }
}

impl fmt::Display for DistanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Minute-resolution local time at which a session started
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(NaiveDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Self::from(Local::now().naive_local())
    }

    pub fn days_before(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }

    pub fn minutes_after(&self, minutes: i64) -> Self {
        Self(self.0 + Duration::minutes(minutes))
    }

    pub fn session_id(&self) -> SessionId {
        SessionId(self.0.format(SESSION_ID_FORMAT).to_string())
    }
}

impl From<NaiveDateTime> for Timestamp {
    fn from(value: NaiveDateTime) -> Self {
        // Persisted form has no seconds; drop them so a reload compares equal
        let truncated = value.with_second(0).and_then(|v| v.with_nanosecond(0));
        Self(truncated.unwrap_or(value))
    }
}

impl FromStr for Timestamp {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
            .map(Self::from)
            .map_err(|_| InputError::BadTimestamp(s.to_string()))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(TIMESTAMP_FORMAT))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Session identifier, `YYYY-MM-DD_HH-MM` of the capture start.
/// Lexicographic order is chronological order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.trim().to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Number of arrows shot per volley
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum VolleySize {
    Three,
    #[default]
    Six,
}

impl VolleySize {
    pub fn arrows(self) -> usize {
        match self {
            VolleySize::Three => 3,
            VolleySize::Six => 6,
        }
    }
}

impl TryFrom<u8> for VolleySize {
    type Error = InputError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            3 => Ok(VolleySize::Three),
            6 => Ok(VolleySize::Six),
            other => Err(InputError::InvalidVolleySize(other.to_string())),
        }
    }
}

impl From<VolleySize> for u8 {
    fn from(size: VolleySize) -> Self {
        size.arrows() as u8
    }
}

impl FromStr for VolleySize {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u8>()
            .map_err(|_| InputError::InvalidVolleySize(s.trim().to_string()))
            .and_then(VolleySize::try_from)
    }
}

impl fmt::Display for VolleySize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.arrows())
    }
}

/// One scored arrow. The score is always derived from the coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct Shot {
    x: f64,
    y: f64,
    score: u8,
    pub volley_index: u32,
    pub arrow_index: u32,
    pub session_id: SessionId,
    pub timestamp: Timestamp,
    pub distance: DistanceLabel,
}

impl Shot {
    pub fn new(
        x: f64,
        y: f64,
        volley_index: u32,
        arrow_index: u32,
        session_id: SessionId,
        timestamp: Timestamp,
        distance: DistanceLabel,
    ) -> Self {
        Self {
            x,
            y,
            score: scoring::score(x, y),
            volley_index,
            arrow_index,
            session_id,
            timestamp,
            distance,
        }
    }

    pub fn x(&self) -> f64 {
        self.x
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    pub fn radius(&self) -> f64 {
        scoring::radius(self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> Timestamp {
        Timestamp::from(
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(h, min, 42)
                .unwrap(),
        )
    }

    #[test]
    fn test_distance_label_is_trimmed() {
        let label: DistanceLabel = "  18m \t".parse().unwrap();
        assert_eq!(label.as_str(), "18m");
        assert_eq!(label, "18m".parse().unwrap());
    }

    #[test]
    fn test_blank_distance_rejected() {
        assert_eq!("   ".parse::<DistanceLabel>(), Err(InputError::BlankDistance));
    }

    #[test]
    fn test_numeric_looking_labels_stay_strings() {
        let a: DistanceLabel = "18".parse().unwrap();
        let b: DistanceLabel = "18.0".parse().unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_timestamp_formats() {
        let ts = at(2024, 3, 9, 7, 5);
        assert_eq!(ts.to_string(), "2024-03-09 07:05");
        assert_eq!(ts.session_id().as_str(), "2024-03-09_07-05");
        assert_eq!("2024-03-09 07:05".parse::<Timestamp>().unwrap(), ts);
        assert_eq!("2024-03-09 07:05:59".parse::<Timestamp>().unwrap(), ts);
    }

    #[test]
    fn test_bad_timestamp() {
        assert!("yesterday".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_timestamp_ordering() {
        let early = at(2024, 1, 1, 9, 0);
        let late = at(2024, 1, 2, 8, 0);
        assert!(early < late);
        assert_eq!(late.days_before(1), at(2024, 1, 1, 8, 0));
    }

    #[test]
    fn test_volley_size_entry() {
        assert_eq!("3".parse::<VolleySize>(), Ok(VolleySize::Three));
        assert_eq!(" 6 ".parse::<VolleySize>(), Ok(VolleySize::Six));
        assert!("4".parse::<VolleySize>().is_err());
        assert!("six".parse::<VolleySize>().is_err());
        assert!(VolleySize::try_from(0).is_err());
    }

    #[test]
    fn test_shot_score_is_derived() {
        let ts = at(2024, 3, 9, 7, 5);
        let shot = Shot::new(3.0, 4.0, 1, 1, ts.session_id(), ts, "18m".parse().unwrap());
        assert_eq!(shot.score(), 6);
        assert_eq!(shot.radius(), 5.0);
    }
}
