/// Radius of the outermost scoring ring, in ring widths
pub const TARGET_RADIUS: f64 = 10.0;

/// Euclidean distance of an impact from the target centre
pub fn radius(x: f64, y: f64) -> f64 {
    x.hypot(y)
}

/// Ring value of an impact at `(x, y)`.
///
/// Rings are one unit wide and closed on their outer edge, so an impact
/// exactly on the line between two rings takes the higher value.
pub fn score(x: f64, y: f64) -> u8 {
    let r = radius(x, y);
    if r > TARGET_RADIUS {
        return 0;
    }
    // ceil keeps integer radii inside the inner ring; r == 0 is still the 10 ring
    let ring = r.ceil().max(1.0) as u8;
    11 - ring
}
