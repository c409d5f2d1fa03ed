use crate::time_series::TimeSeriesPoint;

/// X (seconds) and Y (wpm) upper bounds for the results chart
pub fn compute_chart_params(samples: &[TimeSeriesPoint], duration_secs: u32) -> (f64, f64) {
    let highest_wpm = samples.iter().map(|p| p.wpm).fold(0.0_f64, f64::max);
    let last_t = samples.last().map(|p| p.t).unwrap_or(0.0);
    let duration = last_t.max(duration_secs as f64).max(1.0);
    // keep the line off the top edge
    let ceiling = if highest_wpm > 0.0 {
        (highest_wpm * 1.1).ceil()
    } else {
        1.0
    };
    (duration, ceiling)
}

pub fn format_label(val: f64) -> String {
    if (val - val.round()).abs() < f64::EPSILON {
        format!("{}", val.round())
    } else {
        format!("{val:.1}")
    }
}
