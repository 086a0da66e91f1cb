use tempfile::tempdir;

use quiver::dashboard::{Dashboard, DashboardEffect, FilterChangedEvent, FilterKind};
use quiver::history::{CsvHistory, HistoryStore, SqliteHistory};
use quiver::query::{self, Selector, TimeBucket};
use quiver::session::{CaptureEvent, SessionConfig, SessionRecorder};
use quiver::{DistanceLabel, Shot, Timestamp, VolleySize};

fn record(started: &str, distance: &str, impacts: &[(f64, f64)]) -> Vec<Shot> {
    let config = SessionConfig {
        distance: distance.parse().unwrap(),
        volley_size: VolleySize::Three,
        started_at: started.parse().unwrap(),
    };
    let mut recorder = SessionRecorder::new(config);
    for &(x, y) in impacts {
        if recorder.open_volley().is_empty() && recorder.volleys_closed() > 0 {
            recorder.handle(CaptureEvent::Continue);
        }
        recorder.handle(CaptureEvent::Impact { x, y });
    }
    recorder.handle(CaptureEvent::Finish);
    recorder.into_shots()
}

fn distance(label: &str) -> DistanceLabel {
    label.parse().unwrap()
}

#[test]
fn sessions_append_in_order_and_filter() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.csv");
    let a = record("2024-06-01 09:30", "18m", &[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]);
    let b = record("2024-06-20 17:05", "30m", &[(4.0, 0.0), (0.0, -4.0)]);
    assert_eq!(a.len(), 4);
    assert_eq!(a[3].volley_index, 2);

    let mut store = HistoryStore::load(Box::new(CsvHistory::with_path(&path))).unwrap();
    store.append_session(&a).unwrap();
    store.append_session(&b).unwrap();

    let reloaded = HistoryStore::load(Box::new(CsvHistory::with_path(&path))).unwrap();
    let mut expected = a.clone();
    expected.extend(b.iter().cloned());
    assert_eq!(reloaded.shots(), expected.as_slice());

    let now: Timestamp = "2024-06-25 12:00".parse().unwrap();
    let recent = query::filter(
        reloaded.shots(),
        &distance("18m"),
        &Selector::TimeRange(TimeBucket::Last7Days),
        now,
    );
    assert!(recent.is_empty());

    let month = query::filter(
        reloaded.shots(),
        &distance("18m"),
        &Selector::TimeRange(TimeBucket::LastMonth),
        now,
    );
    assert_eq!(month, a);

    let session = query::filter(
        reloaded.shots(),
        &distance("30m"),
        &Selector::Session("2024-06-20_17-05".into()),
        now,
    );
    assert_eq!(quiver::summarize(&session).total_score, 14);
}

#[test]
fn dashboard_over_sqlite_history() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.db");
    let mut store = HistoryStore::load(Box::new(SqliteHistory::with_path(&path))).unwrap();
    store
        .append_session(&record("2024-06-10 08:00", "18m", &[(0.5, 0.5)]))
        .unwrap();
    store
        .append_session(&record("2024-06-12 08:00", "18m", &[(6.0, 0.0), (0.0, 6.0)]))
        .unwrap();

    let store = HistoryStore::load(Box::new(SqliteHistory::with_path(&path))).unwrap();
    let now: Timestamp = "2024-06-13 08:00".parse().unwrap();
    let mut dash = Dashboard::new(store.shots());

    let effects = dash.apply(FilterChangedEvent::Kind(FilterKind::Session), store.shots(), now);
    assert_eq!(
        effects[0],
        DashboardEffect::SelectorDomainChanged(vec![
            "2024-06-10_08-00".to_string(),
            "2024-06-12_08-00".to_string(),
        ])
    );

    let next = dash.cycle_selector(store.shots(), true).unwrap();
    let effects = dash.apply(next, store.shots(), now);
    match &effects[..] {
        [DashboardEffect::Redraw(view)] => {
            assert_eq!(view.stats.count, 2);
            assert_eq!(view.stats.total_score, 10);
            assert_eq!(view.stats.mean_radial_distance, Some(6.0));
            assert_eq!(view.stats.std_radial_distance, Some(0.0));
        }
        other => panic!("unexpected effects {other:?}"),
    }

    let effects = dash.apply(FilterChangedEvent::Distance(distance("70m")), store.shots(), now);
    assert_eq!(effects.last(), Some(&DashboardEffect::NoData));
}
