use crate::error::InputError;
use crate::scoring::TARGET_RADIUS;

/// Square region of the plotted target in which impacts can be captured.
/// Misses inside it are still valid (they score zero).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CaptureArea {
    pub half_extent: f64,
}

impl Default for CaptureArea {
    fn default() -> Self {
        Self {
            half_extent: TARGET_RADIUS,
        }
    }
}

impl CaptureArea {
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x.is_finite() && y.is_finite() && x.abs() <= self.half_extent && y.abs() <= self.half_extent
    }

    pub fn accept(&self, x: f64, y: f64) -> Result<(f64, f64), InputError> {
        if self.contains(x, y) {
            Ok((x, y))
        } else {
            Err(InputError::OutsideCaptureArea { x, y })
        }
    }

    /// Parse `x y` (space or comma separated) and check it lies on the canvas
    pub fn parse_impact(&self, line: &str) -> Result<(f64, f64), InputError> {
        let bad = || InputError::BadCoordinates(line.trim().to_string());
        let mut parts = line
            .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .filter(|p| !p.is_empty());

        let x = parts.next().ok_or_else(bad)?.parse::<f64>().map_err(|_| bad())?;
        let y = parts.next().ok_or_else(bad)?.parse::<f64>().map_err(|_| bad())?;
        if parts.next().is_some() {
            return Err(bad());
        }
        self.accept(x, y)
    }
}

/// Keyboard-driven aiming point on the target, in target units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crosshair {
    pub x: f64,
    pub y: f64,
    pub step: f64,
    area: CaptureArea,
}

impl Crosshair {
    pub fn new(area: CaptureArea) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            step: 0.25,
            area,
        }
    }

    pub fn nudge(&mut self, dx: f64, dy: f64) {
        let limit = self.area.half_extent;
        self.x = (self.x + dx * self.step).clamp(-limit, limit);
        self.y = (self.y + dy * self.step).clamp(-limit, limit);
    }

    /// Toggle between fine and coarse movement
    pub fn toggle_step(&mut self) {
        self.step = if self.step < 1.0 { 1.0 } else { 0.25 };
    }

    pub fn recenter(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl Default for Crosshair {
    fn default() -> Self {
        Self::new(CaptureArea::default())
    }
}
