use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Circle, Context, Line},
        Block, Borders,
    },
};

use quiver::scoring::TARGET_RADIUS;

/// Visible world range either side of the centre
pub const BOUNDS: f64 = TARGET_RADIUS + 0.5;

/// Ring colours from the innermost ring outwards, two rings per colour
pub const RING_COLORS: [Color; 10] = [
    Color::Yellow,
    Color::Yellow,
    Color::Red,
    Color::Red,
    Color::Blue,
    Color::Blue,
    Color::DarkGray,
    Color::DarkGray,
    Color::White,
    Color::White,
];

const CROSSHAIR_ARM: f64 = 0.6;

/// Ten scoring rings with the given impacts marked and an optional aiming point
pub fn target<'a>(
    title: &'a str,
    impacts: &'a [(f64, f64)],
    crosshair: Option<(f64, f64)>,
) -> Canvas<'a, impl Fn(&mut Context) + 'a> {
    Canvas::default()
        .block(Block::default().borders(Borders::ALL).title(title))
        .marker(Marker::Braille)
        .x_bounds([-BOUNDS, BOUNDS])
        .y_bounds([-BOUNDS, BOUNDS])
        .paint(move |ctx| {
            for (idx, color) in RING_COLORS.iter().enumerate() {
                ctx.draw(&Circle {
                    x: 0.0,
                    y: 0.0,
                    radius: (idx + 1) as f64,
                    color: *color,
                });
            }
            ctx.layer();

            if let Some((cx, cy)) = crosshair {
                ctx.draw(&Line {
                    x1: cx - CROSSHAIR_ARM,
                    y1: cy,
                    x2: cx + CROSSHAIR_ARM,
                    y2: cy,
                    color: Color::Magenta,
                });
                ctx.draw(&Line {
                    x1: cx,
                    y1: cy - CROSSHAIR_ARM,
                    x2: cx,
                    y2: cy + CROSSHAIR_ARM,
                    color: Color::Magenta,
                });
            }

            let marker = Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD);
            for &(x, y) in impacts {
                ctx.print(x, y, Span::styled("x", marker));
            }
        })
}

/// Largest centred rect that looks square, given cells about twice as tall as wide
pub fn square_area(area: Rect) -> Rect {
    let width = area.width.min(area.height.saturating_mul(2));
    let height = (width / 2).min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
