use std::io::{BufRead, Write};

use anyhow::{bail, Context, Result};

use quiver::capture::CaptureArea;
use quiver::history::HistoryStore;
use quiver::session::{CaptureEffect, RecorderState, RejectReason, SessionConfig, SessionRecorder};
use quiver::{DistanceLabel, VolleySize};

fn read_line(input: &mut impl BufRead) -> Result<Option<String>> {
    let mut line = String::new();
    match input.read_line(&mut line)? {
        0 => Ok(None),
        _ => Ok(Some(line.trim().to_string())),
    }
}

fn prompt(input: &mut impl BufRead, out: &mut impl Write, question: &str) -> Result<String> {
    write!(out, "{question}")?;
    out.flush()?;
    match read_line(input)? {
        Some(line) => Ok(line),
        None => bail!("input closed while waiting for an answer"),
    }
}

/// Ask until a non-blank distance label is given
pub fn prompt_distance(input: &mut impl BufRead, out: &mut impl Write) -> Result<DistanceLabel> {
    loop {
        match prompt(input, out, "Shooting distance (e.g. 18m): ")?.parse() {
            Ok(distance) => return Ok(distance),
            Err(e) => writeln!(out, "{e}")?,
        }
    }
}

/// Ask until the volley size is 3 or 6
pub fn prompt_volley_size(input: &mut impl BufRead, out: &mut impl Write) -> Result<VolleySize> {
    loop {
        match prompt(input, out, "Arrows per volley (3 or 6): ")?.parse() {
            Ok(size) => return Ok(size),
            Err(e) => writeln!(out, "{e}")?,
        }
    }
}

fn report(out: &mut impl Write, effects: &[CaptureEffect]) -> Result<()> {
    for effect in effects {
        match effect {
            CaptureEffect::ShotScored {
                x,
                y,
                score,
                arrow_index,
                ..
            } => writeln!(out, "  Arrow {arrow_index}: ({x:.2}, {y:.2}) → {score} points")?,
            CaptureEffect::VolleyClosed { volley_index, .. } => {
                writeln!(out, "Volley {volley_index} complete.")?
            }
            CaptureEffect::VolleyStarted { volley_index } => writeln!(out, "Volley {volley_index}")?,
            CaptureEffect::SessionFinished(stats) => {
                writeln!(out, "\nSESSION STATISTICS")?;
                for line in stats.lines() {
                    writeln!(out, "{line}")?;
                }
            }
            CaptureEffect::Rejected(RejectReason::NoOpenVolley) => {
                writeln!(out, "No open volley.")?
            }
            CaptureEffect::Rejected(RejectReason::OutsideCaptureArea) => {
                writeln!(out, "Impact outside the capture area.")?
            }
        }
    }
    Ok(())
}

/// Record a session from `x y` lines. `c` closes the open volley, `q` or end
/// of input finishes the session. The session is saved before returning.
pub fn run(
    input: &mut impl BufRead,
    out: &mut impl Write,
    mut session: SessionConfig,
    store: &mut HistoryStore,
) -> Result<()> {
    session.started_at = store.free_session_start(session.started_at);
    let area = CaptureArea::default();
    let mut recorder = SessionRecorder::new(session);

    writeln!(
        out,
        "Session {} at {}: enter impacts as `x y`, `c` closes the volley, `q` finishes.",
        recorder.session_id(),
        recorder.config.distance
    )?;
    writeln!(out, "Volley 1")?;

    loop {
        match recorder.state() {
            RecorderState::AwaitingShot { .. } => {
                write!(out, "> ")?;
                out.flush()?;
                let Some(line) = read_line(input)? else {
                    break;
                };
                let effects = match line.as_str() {
                    "" => continue,
                    "q" => break,
                    "c" => recorder.close_volley().into_iter().collect(),
                    _ => match area.parse_impact(&line) {
                        Ok((x, y)) => recorder.record_impact(x, y),
                        Err(e) => {
                            writeln!(out, "{e}")?;
                            continue;
                        }
                    },
                };
                report(out, &effects)?;
            }
            RecorderState::VolleyComplete { .. } => {
                write!(out, "Continue with another volley? (y/n): ")?;
                out.flush()?;
                match read_line(input)?.as_deref() {
                    Some("y") | Some("Y") | Some("") => {
                        let effects: Vec<CaptureEffect> =
                            recorder.continue_session().into_iter().collect();
                        report(out, &effects)?;
                    }
                    _ => break,
                }
            }
            RecorderState::SessionComplete => break,
        }
    }

    let effects = recorder.finish();
    report(out, &effects)?;

    let shots = recorder.into_shots();
    store
        .append_session(&shots)
        .context("could not save session")?;
    writeln!(out, "Results saved to: {}", store.location().display())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiver::history::{CsvHistory, HistoryBackend};
    use quiver::{HistoryError, Shot};
    use std::io::{self, Cursor};
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn run_session(script: &str, size: VolleySize, store: &mut HistoryStore) -> (Result<()>, String) {
        let mut input = Cursor::new(script.as_bytes().to_vec());
        let mut out = Vec::new();
        let session = SessionConfig::new("18m".parse().unwrap(), size);
        let result = run(&mut input, &mut out, session, store);
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_prompts_reject_then_accept() {
        let mut input = Cursor::new(b"   \n18m\n4\nsix\n3\n".to_vec());
        let mut out = Vec::new();
        let distance = prompt_distance(&mut input, &mut out).unwrap();
        let size = prompt_volley_size(&mut input, &mut out).unwrap();

        assert_eq!(distance.as_str(), "18m");
        assert_eq!(size, VolleySize::Three);
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("must not be blank"));
        assert_eq!(out.matches("volley size must be 3 or 6").count(), 2);
    }

    #[test]
    fn test_prompt_fails_on_closed_input() {
        let mut input = Cursor::new(Vec::new());
        assert!(prompt_distance(&mut input, &mut Vec::new()).is_err());
    }

    #[test]
    fn test_two_volleys_saved() {
        let dir = tempdir().unwrap();
        let mut store =
            HistoryStore::load(Box::new(CsvHistory::with_path(dir.path().join("h.csv")))).unwrap();
        let (result, out) = run_session("0 0\n3 4\n11 0\n9.5 0\ny\n1,1\nq\n", VolleySize::Three, &mut store);

        result.unwrap();
        assert!(out.contains("Arrow 2: (3.00, 4.00) → 6 points"));
        assert!(out.contains("outside the capture area"));
        assert!(out.contains("Volley 1 complete."));
        assert!(out.contains("Volley 2"));
        assert!(out.contains("SESSION STATISTICS"));
        assert!(out.contains("Arrows: 4"));
        assert!(out.contains("Results saved to:"));

        assert_eq!(store.shots().len(), 4);
        assert_eq!(store.shots()[3].volley_index, 2);
        assert_eq!(store.shots()[3].arrow_index, 1);
    }

    #[test]
    fn test_back_to_back_sessions_are_kept_apart() {
        let dir = tempdir().unwrap();
        let mut store =
            HistoryStore::load(Box::new(CsvHistory::with_path(dir.path().join("h.csv")))).unwrap();
        let (first, _) = run_session("0 0\nq\n", VolleySize::Three, &mut store);
        let (second, _) = run_session("1 1\nq\n", VolleySize::Three, &mut store);

        first.unwrap();
        second.unwrap();
        let shots = store.shots();
        assert_eq!(shots.len(), 2);
        assert_ne!(shots[0].session_id, shots[1].session_id);
    }

    #[test]
    fn test_declining_ends_session() {
        let dir = tempdir().unwrap();
        let mut store =
            HistoryStore::load(Box::new(CsvHistory::with_path(dir.path().join("h.csv")))).unwrap();
        let (result, out) = run_session("1 0\nc\nn\n2 0\n", VolleySize::Six, &mut store);

        result.unwrap();
        assert!(out.contains("Volley 1 complete."));
        assert!(!out.contains("Arrow 2"));
        assert_eq!(store.shots().len(), 1);
    }

    #[test]
    fn test_empty_session_reports_no_data() {
        let dir = tempdir().unwrap();
        let mut store =
            HistoryStore::load(Box::new(CsvHistory::with_path(dir.path().join("h.csv")))).unwrap();
        let (result, out) = run_session("", VolleySize::Six, &mut store);

        result.unwrap();
        assert!(out.contains("No arrows found."));
        assert!(store.is_empty());
    }

    struct ReadOnlyHistory(PathBuf);

    impl HistoryBackend for ReadOnlyHistory {
        fn load(&self) -> Result<Vec<Shot>, HistoryError> {
            Ok(Vec::new())
        }

        fn append(&self, _new_shots: &[Shot]) -> Result<Vec<Shot>, HistoryError> {
            Err(HistoryError::Write {
                path: self.0.clone(),
                source: io::Error::from(io::ErrorKind::PermissionDenied),
            })
        }

        fn location(&self) -> &Path {
            &self.0
        }
    }

    #[test]
    fn test_save_failure_is_an_error() {
        let mut store =
            HistoryStore::load(Box::new(ReadOnlyHistory(PathBuf::from("/readonly/h.csv")))).unwrap();
        let (result, out) = run_session("0 0\nq\n", VolleySize::Three, &mut store);

        let err = result.unwrap_err();
        assert!(err.to_string().contains("could not save session"));
        assert!(out.contains("SESSION STATISTICS"));
        assert!(!out.contains("Results saved to:"));
        assert!(store.is_empty());
    }
}
