use chrono::TimeDelta;

/// Characters per conventional word
pub const CHARS_PER_WORD: f64 = 5.0;

/// Elapsed minutes never drop below one second so wpm stays sane right after
/// the first keystroke.
pub const MIN_ELAPSED_MINUTES: f64 = 1.0 / 60.0;

/// Rounded accuracy percentage; reads 100 before anything was typed.
pub fn accuracy(correct_keystrokes: u64, incorrect_keystrokes: u64) -> u32 {
    let total = correct_keystrokes + incorrect_keystrokes;
    if total == 0 {
        return 100;
    }
    ((correct_keystrokes as f64 / total as f64) * 100.0).round() as u32
}

/// Words per minute from a keystroke count. Pass correct keystrokes for wpm
/// and all keystrokes for raw wpm.
pub fn wpm(keystrokes: u64, elapsed_minutes: f64) -> u32 {
    if keystrokes == 0 || elapsed_minutes <= 0.0 {
        return 0;
    }
    ((keystrokes as f64 / CHARS_PER_WORD) / elapsed_minutes).round() as u32
}

pub fn elapsed_minutes(elapsed: TimeDelta) -> f64 {
    let minutes = elapsed.num_milliseconds() as f64 / 60_000.0;
    minutes.max(MIN_ELAPSED_MINUTES)
}

/// Whole seconds reported for a finished session, at least one.
pub fn duration_secs(elapsed: TimeDelta) -> u32 {
    let secs = (elapsed.num_milliseconds() as f64 / 1000.0).round();
    secs.max(1.0) as u32
}
