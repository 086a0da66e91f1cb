use itertools::Itertools;

use crate::shot::{DistanceLabel, SessionId, Shot, Timestamp};

/// Named look-back windows offered by the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum TimeBucket {
    #[strum(serialize = "Last 7 days")]
    Last7Days,
    #[strum(serialize = "Last 15 days")]
    Last15Days,
    #[strum(serialize = "Last month")]
    LastMonth,
    #[strum(serialize = "Last 3 months")]
    Last3Months,
    #[strum(serialize = "Last year")]
    LastYear,
    #[strum(serialize = "All time")]
    AllTime,
}

impl TimeBucket {
    pub const ALL: [TimeBucket; 6] = [
        TimeBucket::Last7Days,
        TimeBucket::Last15Days,
        TimeBucket::LastMonth,
        TimeBucket::Last3Months,
        TimeBucket::LastYear,
        TimeBucket::AllTime,
    ];

    /// Window length in days; `None` for all time
    pub fn days(self) -> Option<i64> {
        match self {
            TimeBucket::Last7Days => Some(7),
            TimeBucket::Last15Days => Some(15),
            TimeBucket::LastMonth => Some(30),
            TimeBucket::Last3Months => Some(90),
            TimeBucket::LastYear => Some(365),
            TimeBucket::AllTime => None,
        }
    }

    /// Earliest timestamp kept. All time reaches one day before the oldest
    /// shot so every record is included.
    pub fn cutoff(self, now: Timestamp, shots: &[&Shot]) -> Option<Timestamp> {
        match self.days() {
            Some(days) => Some(now.days_before(days)),
            None => shots
                .iter()
                .map(|s| s.timestamp)
                .min()
                .map(|oldest| oldest.days_before(1)),
        }
    }
}

/// History filter dimension chosen by the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    TimeRange(TimeBucket),
    Session(SessionId),
}

impl Selector {
    pub fn label(&self) -> String {
        match self {
            Selector::TimeRange(bucket) => bucket.to_string(),
            Selector::Session(id) => id.to_string(),
        }
    }
}

/// Shots recorded at `distance` that match `selector`, in store order.
/// No match is an empty result, never an error.
pub fn filter(
    shots: &[Shot],
    distance: &DistanceLabel,
    selector: &Selector,
    now: Timestamp,
) -> Vec<Shot> {
    let at_distance: Vec<&Shot> = shots.iter().filter(|s| &s.distance == distance).collect();

    match selector {
        Selector::TimeRange(bucket) => match bucket.cutoff(now, &at_distance) {
            Some(cutoff) => at_distance
                .into_iter()
                .filter(|s| s.timestamp >= cutoff)
                .cloned()
                .collect(),
            None => Vec::new(),
        },
        Selector::Session(id) => at_distance
            .into_iter()
            .filter(|s| &s.session_id == id)
            .cloned()
            .collect(),
    }
}

/// Every distance present in the history, sorted
pub fn available_distances(shots: &[Shot]) -> Vec<DistanceLabel> {
    shots
        .iter()
        .map(|s| s.distance.clone())
        .unique()
        .sorted()
        .collect()
}

/// Sessions with at least one shot at `distance`, oldest first
pub fn available_sessions(shots: &[Shot], distance: &DistanceLabel) -> Vec<SessionId> {
    shots
        .iter()
        .filter(|s| &s.distance == distance)
        .map(|s| s.session_id.clone())
        .unique()
        .sorted()
        .collect()
}

pub fn available_time_buckets() -> &'static [TimeBucket] {
    &TimeBucket::ALL
}
