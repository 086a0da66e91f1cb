use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tempfile::tempdir;

use quiver::app::{App, AppState, Control, SaveStatus};
use quiver::history::{CsvHistory, HistoryStore};
use quiver::runtime::{AppEvent, Runner, TestEventSource};
use quiver::session::SessionConfig;
use quiver::VolleySize;

fn key(code: KeyCode) -> AppEvent {
    AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

// Drive the app through Runner/TestEventSource until it asks to quit
fn drive(app: &mut App, events: Vec<AppEvent>) -> bool {
    let (tx, rx) = mpsc::channel();
    for event in events {
        tx.send(event).unwrap();
    }
    let runner = Runner::new(TestEventSource::new(rx), Duration::from_millis(5));

    for _ in 0..200u32 {
        match runner.step() {
            AppEvent::Key(key) => {
                if app.on_key(key) == Control::Quit {
                    return true;
                }
            }
            AppEvent::Resize | AppEvent::Tick => {}
        }
    }
    false
}

#[test]
fn headless_capture_flow_saves_session() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("history.csv");
    let store = HistoryStore::load(Box::new(CsvHistory::with_path(&path))).unwrap();
    let mut app = App::capture(
        SessionConfig::new("18m".parse().unwrap(), VolleySize::Three),
        store,
    );

    // volley 1: three arrows at the centre, then continue
    // volley 2: one arrow two units right, then quit
    let mut events = vec![key(KeyCode::Enter); 3];
    events.push(key(KeyCode::Char('y')));
    events.push(key(KeyCode::Tab));
    events.push(key(KeyCode::Right));
    events.push(key(KeyCode::Right));
    events.push(key(KeyCode::Enter));
    events.push(key(KeyCode::Char('q')));

    assert!(drive(&mut app, events), "app should quit");

    assert_eq!(app.state, AppState::Summary);
    let stats = app.session_stats.clone().unwrap();
    assert_eq!(stats.count, 4);
    assert_eq!(stats.total_score, 39);
    assert_matches::assert_matches!(app.save_status, Some(SaveStatus::Saved { arrows: 4, .. }));

    let reloaded = HistoryStore::load(Box::new(CsvHistory::with_path(&path))).unwrap();
    assert_eq!(reloaded.shots().len(), 4);
    assert_eq!(reloaded.shots()[3].volley_index, 2);
}

#[test]
fn headless_summary_opens_dashboard() {
    let dir = tempdir().unwrap();
    let store =
        HistoryStore::load(Box::new(CsvHistory::with_path(dir.path().join("h.csv")))).unwrap();
    let mut app = App::capture(
        SessionConfig::new("25m".parse().unwrap(), VolleySize::Six),
        store,
    );

    let events = vec![
        key(KeyCode::Enter),
        key(KeyCode::Char('f')),
        key(KeyCode::Char('h')),
    ];
    assert!(!drive(&mut app, events));

    assert_eq!(app.state, AppState::Dashboard);
    assert_eq!(app.dashboard.distance().map(|d| d.as_str()), Some("25m"));
    assert_matches::assert_matches!(
        &app.dashboard_view,
        quiver::dashboard::DashboardEffect::Redraw(view) if view.stats.count == 1
    );
}

#[test]
fn headless_ctrl_c_still_saves() {
    let dir = tempdir().unwrap();
    let store =
        HistoryStore::load(Box::new(CsvHistory::with_path(dir.path().join("h.csv")))).unwrap();
    let mut app = App::capture(
        SessionConfig::new("18m".parse().unwrap(), VolleySize::Six),
        store,
    );

    let events = vec![
        key(KeyCode::Enter),
        key(KeyCode::Enter),
        AppEvent::Key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
    ];
    assert!(drive(&mut app, events));
    assert_eq!(app.store.shots().len(), 2);
}
