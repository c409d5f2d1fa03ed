/// Character-level comparison of a submitted word against its target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordScore {
    pub correct: usize,
    pub incorrect: usize,
    pub extra: usize,
    pub missed: usize,
}

impl WordScore {
    pub fn add(&mut self, other: WordScore) {
        self.correct += other.correct;
        self.incorrect += other.incorrect;
        self.extra += other.extra;
        self.missed += other.missed;
    }
}

/// Compare `typed` with `target` position by position.
///
/// Only the shared prefix length is compared; anything typed past the end of
/// the target is `extra`, anything left untyped is `missed`.
pub fn score(typed: &str, target: &str) -> WordScore {
    let typed: Vec<char> = typed.chars().collect();
    let target: Vec<char> = target.chars().collect();

    let (correct, incorrect) = typed
        .iter()
        .zip(target.iter())
        .fold((0, 0), |(ok, bad), (t, e)| {
            if t == e {
                (ok + 1, bad)
            } else {
                (ok, bad + 1)
            }
        });

    WordScore {
        correct,
        incorrect,
        extra: typed.len().saturating_sub(target.len()),
        missed: target.len().saturating_sub(typed.len()),
    }
}

/// A word only counts as correct when it was typed exactly.
pub fn is_exact(typed: &str, target: &str) -> bool {
    typed == target
}

/// True when `typed` already diverges from `target`: a wrong character in the
/// shared prefix, or more characters than the target has.
pub fn diverges(typed: &str, target: &str) -> bool {
    let mut expected = target.chars();
    for c in typed.chars() {
        match expected.next() {
            Some(e) if e == c => {}
            _ => return true,
        }
    }
    false
}
