use crate::shot::Shot;

/// Summary of a collection of shots.
///
/// Every derived measure is `None` when `count` is zero so callers can show a
/// distinct "no data" state instead of dividing by zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stats {
    pub count: usize,
    pub total_score: u32,
    pub mean_score: Option<f64>,
    pub centroid: Option<(f64, f64)>,
    pub mean_radial_distance: Option<f64>,
    /// Population standard deviation of the radial distances
    pub std_radial_distance: Option<f64>,
}

impl Stats {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Plain labelled lines for the rendering collaborators
    pub fn lines(&self) -> Vec<String> {
        match (
            self.mean_score,
            self.centroid,
            self.mean_radial_distance,
            self.std_radial_distance,
        ) {
            (Some(mean), Some((cx, cy)), Some(dist), Some(sd)) => vec![
                format!("Arrows: {}", self.count),
                format!("Total score: {}  |  Mean: {mean:.2}", self.total_score),
                format!("Centroid: ({cx:.2}, {cy:.2})"),
                format!("Mean distance from centre: {dist:.2}"),
                format!("Std. deviation: {sd:.2}"),
            ],
            _ => vec![String::from("No arrows found.")],
        }
    }
}

/// Summarize any subset of shots, live session or history query alike
pub fn summarize<'a, I>(shots: I) -> Stats
where
    I: IntoIterator<Item = &'a Shot>,
{
    let mut count = 0usize;
    let mut total_score = 0u32;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut radii = Vec::new();

    for shot in shots {
        count += 1;
        total_score += u32::from(shot.score());
        sum_x += shot.x();
        sum_y += shot.y();
        radii.push(shot.radius());
    }

    if count == 0 {
        return Stats::default();
    }

    let n = count as f64;
    Stats {
        count,
        total_score,
        mean_score: Some(f64::from(total_score) / n),
        centroid: Some((sum_x / n, sum_y / n)),
        mean_radial_distance: mean(&radii),
        std_radial_distance: population_std_dev(&radii),
    }
}

fn mean(data: &[f64]) -> Option<f64> {
    match data.len() {
        0 => None,
        len => Some(data.iter().sum::<f64>() / len as f64),
    }
}

fn population_std_dev(data: &[f64]) -> Option<f64> {
    let data_mean = mean(data)?;
    let variance = data
        .iter()
        .map(|value| {
            let diff = data_mean - *value;
            diff * diff
        })
        .sum::<f64>()
        / data.len() as f64;

    Some(variance.sqrt())
}
