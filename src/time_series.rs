/// Live wpm sampled once per tick, `t` in seconds since the session started
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSeriesPoint {
    pub t: f64,
    pub wpm: f64,
}

impl TimeSeriesPoint {
    pub fn new(t: f64, wpm: f64) -> Self {
        Self { t, wpm }
    }
}

impl From<TimeSeriesPoint> for (f64, f64) {
    fn from(p: TimeSeriesPoint) -> Self {
        (p.t, p.wpm)
    }
}

/// Raw wpm values of a series, for consistency metrics
pub fn wpm_values(points: &[TimeSeriesPoint]) -> Vec<f64> {
    points.iter().map(|p| p.wpm).collect()
}
