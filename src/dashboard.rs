use tracing::debug;

use crate::query::{self, Selector, TimeBucket};
use crate::shot::{DistanceLabel, Shot, Timestamp};
use crate::stats::{summarize, Stats};

/// Which kind of selector the value menu currently lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum FilterKind {
    #[strum(serialize = "By time range")]
    TimeRange,
    #[strum(serialize = "By session")]
    Session,
}

/// Selection changes coming from the dashboard menus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterChangedEvent {
    Distance(DistanceLabel),
    Kind(FilterKind),
    Selector(Selector),
}

/// Result of one query, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct QueryView {
    pub shots: Vec<Shot>,
    pub stats: Stats,
}

/// Render instructions returned after a selection change
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEffect {
    /// The value menu must be repopulated with these labels
    SelectorDomainChanged(Vec<String>),
    Redraw(QueryView),
    /// Nothing matches: draw an empty target and a "no data" message
    NoData,
}

/// Menu state of the history dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dashboard {
    distance: Option<DistanceLabel>,
    kind: FilterKind,
    selector: Option<Selector>,
}

impl Dashboard {
    /// First distance, last-7-days window
    pub fn new(shots: &[Shot]) -> Self {
        Self {
            distance: query::available_distances(shots).into_iter().next(),
            kind: FilterKind::TimeRange,
            selector: Some(Selector::TimeRange(TimeBucket::Last7Days)),
        }
    }

    pub fn distance(&self) -> Option<&DistanceLabel> {
        self.distance.as_ref()
    }

    pub fn kind(&self) -> FilterKind {
        self.kind
    }

    pub fn selector(&self) -> Option<&Selector> {
        self.selector.as_ref()
    }

    /// Labels for the value menu under the current distance and kind
    pub fn selector_domain(&self, shots: &[Shot]) -> Vec<Selector> {
        match self.kind {
            FilterKind::TimeRange => query::available_time_buckets()
                .iter()
                .map(|b| Selector::TimeRange(*b))
                .collect(),
            FilterKind::Session => match &self.distance {
                Some(distance) => query::available_sessions(shots, distance)
                    .into_iter()
                    .map(Selector::Session)
                    .collect(),
                None => Vec::new(),
            },
        }
    }

    /// Apply one menu change and describe what to redraw
    pub fn apply(
        &mut self,
        event: FilterChangedEvent,
        shots: &[Shot],
        now: Timestamp,
    ) -> Vec<DashboardEffect> {
        debug!(?event, "filter changed");
        let mut effects = Vec::new();

        match event {
            FilterChangedEvent::Distance(distance) => {
                self.distance = Some(distance);
                if self.kind == FilterKind::Session {
                    let domain = self.selector_domain(shots);
                    let still_valid = self
                        .selector
                        .as_ref()
                        .is_some_and(|current| domain.contains(current));
                    if !still_valid {
                        self.selector = domain.first().cloned();
                    }
                    effects.push(DashboardEffect::SelectorDomainChanged(labels(&domain)));
                }
            }
            FilterChangedEvent::Kind(kind) => {
                self.kind = kind;
                let domain = self.selector_domain(shots);
                self.selector = domain.first().cloned();
                effects.push(DashboardEffect::SelectorDomainChanged(labels(&domain)));
            }
            FilterChangedEvent::Selector(selector) => {
                let matches_kind = matches!(
                    (&selector, self.kind),
                    (Selector::TimeRange(_), FilterKind::TimeRange)
                        | (Selector::Session(_), FilterKind::Session)
                );
                if matches_kind {
                    self.selector = Some(selector);
                }
            }
        }

        effects.push(self.render(shots, now));
        effects
    }

    /// Query for the current selection
    pub fn view(&self, shots: &[Shot], now: Timestamp) -> QueryView {
        let filtered = match (&self.distance, &self.selector) {
            (Some(distance), Some(selector)) => query::filter(shots, distance, selector, now),
            _ => Vec::new(),
        };
        let stats = summarize(&filtered);
        QueryView {
            shots: filtered,
            stats,
        }
    }

    pub fn render(&self, shots: &[Shot], now: Timestamp) -> DashboardEffect {
        let view = self.view(shots, now);
        if view.shots.is_empty() {
            DashboardEffect::NoData
        } else {
            DashboardEffect::Redraw(view)
        }
    }

    /// Step to the next (or previous) distance, wrapping around
    pub fn cycle_distance(&self, shots: &[Shot], forward: bool) -> Option<FilterChangedEvent> {
        let domain = query::available_distances(shots);
        let next = cycle(&domain, self.distance.as_ref(), forward)?;
        Some(FilterChangedEvent::Distance(next.clone()))
    }

    /// Step through the value menu, wrapping around
    pub fn cycle_selector(&self, shots: &[Shot], forward: bool) -> Option<FilterChangedEvent> {
        let domain = self.selector_domain(shots);
        let next = cycle(&domain, self.selector.as_ref(), forward)?;
        Some(FilterChangedEvent::Selector(next.clone()))
    }

    pub fn toggle_kind(&self) -> FilterChangedEvent {
        FilterChangedEvent::Kind(match self.kind {
            FilterKind::TimeRange => FilterKind::Session,
            FilterKind::Session => FilterKind::TimeRange,
        })
    }
}

fn labels(domain: &[Selector]) -> Vec<String> {
    domain.iter().map(Selector::label).collect()
}

fn cycle<'a, T: PartialEq>(domain: &'a [T], current: Option<&T>, forward: bool) -> Option<&'a T> {
    if domain.is_empty() {
        return None;
    }
    let len = domain.len();
    let idx = match current.and_then(|c| domain.iter().position(|d| d == c)) {
        Some(i) if forward => (i + 1) % len,
        Some(i) => (i + len - 1) % len,
        None => 0,
    };
    domain.get(idx)
}
