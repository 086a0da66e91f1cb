pub mod screen;
pub mod target;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use quiver::app::{App, AppState, SaveStatus};
use quiver::dashboard::DashboardEffect;
use quiver::{summarize, Shot, Stats};

use self::target::{square_area, target};

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const SIDE_PANEL_WIDTH: u16 = 44;

pub fn draw(app: &App, f: &mut Frame) {
    screen::current_screen(app.state).render(app, f);
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

/// Target on the left, text panel on the right
fn split(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([Constraint::Min(20), Constraint::Length(SIDE_PANEL_WIDTH)])
        .split(area);
    (chunks[0], chunks[1])
}

fn impacts<'a>(shots: impl IntoIterator<Item = &'a Shot>) -> Vec<(f64, f64)> {
    shots.into_iter().map(|s| (s.x(), s.y())).collect()
}

fn stats_lines(stats: &Stats) -> Vec<Line<'static>> {
    stats.lines().into_iter().map(Line::from).collect()
}

fn panel<'a>(title: &'a str, lines: Vec<Line<'a>>) -> Paragraph<'a> {
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(title))
        .wrap(Wrap { trim: true })
}

pub fn render_capture(app: &App, f: &mut Frame) {
    let (target_area, side) = split(f.area());
    let live = app.live_shots();
    let points = impacts(live.iter().copied());
    let crosshair = (app.state == AppState::Capture).then(|| app.crosshair.position());
    f.render_widget(target("Target", &points, crosshair), square_area(target_area));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // session header
            Constraint::Min(3),    // feedback
            Constraint::Length(7), // live stats
            Constraint::Length(4), // legend
        ])
        .split(side);

    let mut header = Vec::new();
    if let Some(rec) = &app.recorder {
        header.push(Line::from(Span::styled(
            format!("Session {}  |  {}", rec.session_id(), rec.config.distance),
            bold(),
        )));
        header.push(Line::from(format!(
            "Volley {}  |  Arrow {}/{}",
            app.current_volley().unwrap_or_default(),
            rec.open_volley().len(),
            rec.config.volley_size.arrows()
        )));
    }
    let (x, y) = app.crosshair.position();
    header.push(Line::from(format!(
        "Aim ({x:.2}, {y:.2})  step {}",
        app.crosshair.step
    )));
    f.render_widget(panel("Session", header), chunks[0]);

    let feedback = app.feedback.iter().map(|l| Line::from(l.as_str())).collect();
    f.render_widget(panel("Arrows", feedback), chunks[1]);

    f.render_widget(panel("Statistics", stats_lines(&summarize(live))), chunks[2]);

    let legend = match app.state {
        AppState::VolleyPrompt => Paragraph::new(Span::styled(
            "Continue with another volley? (y)es / (n)o / (q)uit",
            Style::default().fg(Color::Yellow).patch(bold()),
        )),
        _ => Paragraph::new(Span::styled(
            "(arrows) aim  (tab) step  (0) centre  (enter) shoot  (c)lose volley  (f)inish  (q)uit",
            italic(),
        )),
    };
    f.render_widget(legend.wrap(Wrap { trim: true }), chunks[3]);
}

pub fn render_summary(app: &App, f: &mut Frame) {
    let (target_area, side) = split(f.area());
    let points = impacts(&app.session_shots);
    f.render_widget(target("Session", &points, None), square_area(target_area));

    let mut lines = vec![
        Line::from(Span::styled("SESSION STATISTICS", bold())),
        Line::from(""),
    ];
    lines.extend(stats_lines(&app.session_stats.clone().unwrap_or_default()));
    lines.push(Line::from(""));
    match &app.save_status {
        Some(SaveStatus::Saved { path, .. }) => lines.push(Line::from(Span::styled(
            format!("Results saved to: {path}"),
            Style::default().fg(Color::Green),
        ))),
        Some(SaveStatus::Failed(e)) => lines.push(Line::from(Span::styled(
            format!("Could not save session: {e}"),
            Style::default().fg(Color::Red).patch(bold()),
        ))),
        None => {}
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("(h)istory / (q)uit", italic())));

    f.render_widget(panel("Summary", lines), side);
}

pub fn render_dashboard(app: &App, f: &mut Frame) {
    let (target_area, side) = split(f.area());
    let points = match &app.dashboard_view {
        DashboardEffect::Redraw(view) => impacts(&view.shots),
        _ => Vec::new(),
    };
    f.render_widget(target("History", &points, None), square_area(target_area));

    let dash = &app.dashboard;
    let mut lines = vec![
        Line::from(format!(
            "Distance: {}",
            dash.distance().map(|d| d.as_str()).unwrap_or("-")
        )),
        Line::from(format!("Filter: {}", dash.kind())),
        Line::from(format!(
            "Value: {}",
            dash.selector().map(|s| s.label()).unwrap_or_else(|| "-".into())
        )),
        Line::from(""),
    ];
    match &app.dashboard_view {
        DashboardEffect::Redraw(view) => lines.extend(stats_lines(&view.stats)),
        _ => lines.push(Line::from(Span::styled(
            "No data for this selection.",
            Style::default().fg(Color::Yellow),
        ))),
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "(d) distance  (tab) filter  (arrows) value  (q)uit",
        italic(),
    )));

    f.render_widget(panel("History", lines), side);
}
