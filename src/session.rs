use chrono::{DateTime, TimeDelta, Utc};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::language::source::REFILL_COUNT;
use crate::language::{DecorationOptions, Language, WordDecorator};
use crate::metrics;
use crate::scoring::{self, WordScore};
use crate::time_series::TimeSeriesPoint;

/// Refill once fewer than this many words remain after the cursor
pub const LOOKAHEAD: usize = 5;

pub const DEFAULT_DURATION_SECS: u32 = 60;
pub const MIN_DURATION_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    pub duration_secs: u32,
    pub infinite: bool,
    pub hard_mode: bool,
    pub decoration: DecorationOptions,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            duration_secs: DEFAULT_DURATION_SECS,
            infinite: false,
            hard_mode: false,
            decoration: DecorationOptions {
                accents_enabled: true,
                ..Default::default()
            },
        }
    }
}

impl SessionOptions {
    /// Durations below the minimum fall back to the default
    pub fn budget_secs(&self) -> u32 {
        if self.duration_secs < MIN_DURATION_SECS {
            DEFAULT_DURATION_SECS
        } else {
            self.duration_secs
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub correct_keystrokes: u64,
    pub incorrect_keystrokes: u64,
    pub chars: WordScore,
    /// words submitted with any difference from their target
    pub errors: u64,
}

impl Counters {
    pub fn total_keystrokes(&self) -> u64 {
        self.correct_keystrokes + self.incorrect_keystrokes
    }
}

/// What happened to a completed word
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordOutcome {
    pub correct: bool,
    pub typed: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefillRequest {
    pub generation: u64,
    pub language: Language,
    pub count: usize,
    /// replace the whole word sequence instead of appending
    pub replace: bool,
}

/// Raw words answering a [`RefillRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBatch {
    pub generation: u64,
    pub words: Vec<String>,
    pub replace: bool,
}

/// Final figures of a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
    #[serde(rename = "duration")]
    pub duration_secs: u32,
    /// all keystrokes, correct and incorrect
    pub chars: u64,
    pub correct_chars: usize,
    pub incorrect_chars: usize,
    pub extra_chars: usize,
    pub missed_chars: usize,
    pub language: Language,
    pub caps_enabled: bool,
    pub accents_enabled: bool,
    pub punctuation_enabled: bool,
    pub hard_mode_enabled: bool,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started,
    KeystrokeScored { correct: bool },
    WordSubmitted { index: usize, correct: bool },
    RefillRequested(RefillRequest),
    WordsApplied { generation: u64, count: usize },
    HardModeAbort,
    Tick { remaining: Option<u32> },
    Finished(SessionSummary),
    Reset,
}

/// Receives session events in the order they happened
pub trait SessionObserver {
    fn on_event(&mut self, event: &SessionEvent);
}

impl<F: FnMut(&SessionEvent)> SessionObserver for F {
    fn on_event(&mut self, event: &SessionEvent) {
        self(event)
    }
}

/// Result of feeding a single key to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Scored { correct: bool },
    Penalized,
    Submitted { index: usize, correct: bool },
    HardModeAbort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveStats {
    pub wpm: u32,
    pub accuracy: u32,
    pub errors: u64,
    pub remaining_secs: Option<u32>,
}

/// Authoritative state of one typing session
pub struct Session {
    words: Vec<String>,
    cursor: usize,
    input: String,
    outcomes: Vec<WordOutcome>,
    counters: Counters,
    state: RunState,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
    remaining_secs: u32,
    options: SessionOptions,
    decorator: WordDecorator,
    generation: u64,
    refill_pending: bool,
    wpm_samples: Vec<TimeSeriesPoint>,
    summary: Option<SessionSummary>,
    clock: Box<dyn Clock>,
    outbox: VecDeque<SessionEvent>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("state", &self.state)
            .field("cursor", &self.cursor)
            .field("words", &self.words.len())
            .field("counters", &self.counters)
            .field("generation", &self.generation)
            .finish()
    }
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self::with_parts(options, SystemClock, StdRng::from_entropy())
    }

    /// Build a session with an explicit clock and decoration random source.
    /// The initial word request is already queued.
    pub fn with_parts<C, R>(options: SessionOptions, clock: C, rng: R) -> Self
    where
        C: Clock + 'static,
        R: RngCore + Send + 'static,
    {
        let mut session = Self {
            words: Vec::new(),
            cursor: 0,
            input: String::new(),
            outcomes: Vec::new(),
            counters: Counters::default(),
            state: RunState::Idle,
            started_at: None,
            finished_at: None,
            remaining_secs: options.budget_secs(),
            options,
            decorator: WordDecorator::with_rng(options.decoration, rng),
            generation: 0,
            refill_pending: false,
            wpm_samples: Vec::new(),
            summary: None,
            clock: Box::new(clock),
            outbox: VecDeque::new(),
        };
        session.request_refill(true);
        session
    }

    // ---- queries -------------------------------------------------------

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_word(&self) -> Option<&str> {
        self.words.get(self.cursor).map(String::as_str)
    }

    /// Text typed so far for the current word
    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn outcomes(&self) -> &[WordOutcome] {
        &self.outcomes
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_refill_pending(&self) -> bool {
        self.refill_pending
    }

    pub fn wpm_samples(&self) -> &[TimeSeriesPoint] {
        &self.wpm_samples
    }

    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Seconds left on the timer; `None` in infinite mode
    pub fn remaining_secs(&self) -> Option<u32> {
        if self.options.infinite {
            None
        } else {
            Some(self.remaining_secs)
        }
    }

    /// Character expected at `position` within the current word. One past the
    /// last letter a space is expected; beyond that nothing is.
    pub fn expected_char_at(&self, position: usize) -> Option<char> {
        let target = self.current_word().unwrap_or("");
        let len = target.chars().count();
        if position < len {
            target.chars().nth(position)
        } else if position == len {
            Some(' ')
        } else {
            None
        }
    }

    /// Unconsumed words after the cursor
    pub fn remaining_words(&self) -> usize {
        self.words.len().saturating_sub(self.cursor)
    }

    pub fn elapsed(&self) -> Option<TimeDelta> {
        let start = self.started_at?;
        let end = self.finished_at.unwrap_or_else(|| self.clock.now());
        Some(end - start)
    }

    pub fn accuracy(&self) -> u32 {
        metrics::accuracy(
            self.counters.correct_keystrokes,
            self.counters.incorrect_keystrokes,
        )
    }

    pub fn wpm(&self) -> u32 {
        match self.elapsed() {
            Some(elapsed) => metrics::wpm(
                self.counters.correct_keystrokes,
                metrics::elapsed_minutes(elapsed),
            ),
            None => 0,
        }
    }

    pub fn raw_wpm(&self) -> u32 {
        match self.elapsed() {
            Some(elapsed) => metrics::wpm(
                self.counters.total_keystrokes(),
                metrics::elapsed_minutes(elapsed),
            ),
            None => 0,
        }
    }

    pub fn live_stats(&self) -> LiveStats {
        LiveStats {
            wpm: self.wpm(),
            accuracy: self.accuracy(),
            errors: self.counters.errors,
            remaining_secs: self.remaining_secs(),
        }
    }

    // ---- operations ----------------------------------------------------

    /// Begin timing. Only legal while idle with words to type.
    pub fn start(&mut self) -> bool {
        if self.state != RunState::Idle || self.words.is_empty() {
            return false;
        }
        self.started_at = Some(self.clock.now());
        self.finished_at = None;
        self.remaining_secs = self.options.budget_secs();
        self.state = RunState::Running;
        info!(
            generation = self.generation,
            infinite = self.options.infinite,
            "session started"
        );
        self.outbox.push_back(SessionEvent::Started);
        true
    }

    /// Feed one typed character (a space completes the current word).
    pub fn type_char(&mut self, c: char) -> KeyOutcome {
        if self.state == RunState::Finished || !self.has_current_word() {
            return KeyOutcome::Ignored;
        }

        let expected = self.expected_char_at(self.input.chars().count());
        let correct = expected == Some(c);
        if correct {
            self.counters.correct_keystrokes += 1;
        } else {
            self.counters.incorrect_keystrokes += 1;
        }
        self.outbox
            .push_back(SessionEvent::KeystrokeScored { correct });

        self.input.push(c);
        if self.state == RunState::Idle {
            self.start();
        }

        let target = self.current_word().unwrap_or("").to_string();
        if self.options.hard_mode && scoring::diverges(self.input.trim_end(), &target) {
            self.abort_hard_mode();
            return KeyOutcome::HardModeAbort;
        }

        if self.input.ends_with(' ') {
            let typed = self.input.trim().to_string();
            self.input.clear();
            let (index, correct) = self.submit(typed, &target);
            return KeyOutcome::Submitted { index, correct };
        }

        KeyOutcome::Scored { correct }
    }

    /// Backspace or delete: always a penalty keystroke.
    pub fn backspace(&mut self) -> KeyOutcome {
        if self.state == RunState::Finished || !self.has_current_word() {
            return KeyOutcome::Ignored;
        }
        self.counters.incorrect_keystrokes += 1;
        self.input.pop();
        self.outbox
            .push_back(SessionEvent::KeystrokeScored { correct: false });
        KeyOutcome::Penalized
    }

    /// Once-per-second timer tick. Returns true when this tick finished the
    /// session.
    pub fn tick(&mut self) -> bool {
        if self.state != RunState::Running {
            return false;
        }
        if let Some(elapsed) = self.elapsed() {
            let t = elapsed.num_milliseconds() as f64 / 1000.0;
            self.wpm_samples
                .push(TimeSeriesPoint::new(t, self.wpm() as f64));
        }
        if self.options.infinite {
            self.outbox
                .push_back(SessionEvent::Tick { remaining: None });
            return false;
        }
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        self.outbox.push_back(SessionEvent::Tick {
            remaining: Some(self.remaining_secs),
        });
        if self.remaining_secs == 0 {
            self.finish();
            return true;
        }
        false
    }

    /// End a running session early. Returns the summary when one was produced.
    pub fn stop(&mut self) -> Option<&SessionSummary> {
        if self.state == RunState::Running {
            self.finish();
        }
        self.summary.as_ref()
    }

    /// Clear progress and go back to idle, keeping the current words.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.refill_pending = false;
        self.cursor = 0;
        self.input.clear();
        self.outcomes.clear();
        self.counters = Counters::default();
        self.started_at = None;
        self.finished_at = None;
        self.remaining_secs = self.options.budget_secs();
        self.wpm_samples.clear();
        self.summary = None;
        self.state = RunState::Idle;
        debug!(generation = self.generation, "session reset");
        self.outbox.push_back(SessionEvent::Reset);
    }

    /// Reset and ask for a fresh word sequence.
    pub fn reset_with_new_words(&mut self) {
        self.reset();
        self.words.clear();
        self.request_refill(true);
    }

    /// Swap options. New decoration settings need new words; the rest apply
    /// from the next start.
    pub fn set_options(&mut self, options: SessionOptions) {
        let redecorate = options.decoration != self.options.decoration;
        self.options = options;
        if redecorate {
            self.decorator.set_options(options.decoration);
            self.reset_with_new_words();
        } else if self.state != RunState::Running {
            self.remaining_secs = options.budget_secs();
        }
    }

    /// Decorate and apply words from a refill. Batches from an older
    /// generation are dropped.
    pub fn apply_words(&mut self, batch: WordBatch) -> bool {
        if batch.generation != self.generation {
            debug!(
                stale = batch.generation,
                current = self.generation,
                "dropping stale word batch"
            );
            return false;
        }
        self.refill_pending = false;
        let words = self.decorator.decorate_all(batch.words);
        let count = words.len();
        if batch.replace || self.words.is_empty() {
            self.words = words;
        } else {
            self.words.extend(words);
        }
        debug!(generation = batch.generation, count, "words applied");
        self.outbox.push_back(SessionEvent::WordsApplied {
            generation: batch.generation,
            count,
        });
        true
    }

    /// A refill for `generation` could not be served.
    pub fn refill_failed(&mut self, generation: u64) {
        if generation == self.generation {
            warn!(generation, "word refill failed");
            self.refill_pending = false;
        }
    }

    /// Hand queued events to `observer`, oldest first.
    pub fn dispatch<O: SessionObserver + ?Sized>(&mut self, observer: &mut O) {
        while let Some(event) = self.outbox.pop_front() {
            observer.on_event(&event);
        }
    }

    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.outbox.drain(..).collect()
    }

    // ---- internals -----------------------------------------------------

    /// Keys are only taken while the cursor sits on a word. Running off the
    /// end retries a refill that is no longer in flight.
    fn has_current_word(&mut self) -> bool {
        if self.current_word().is_some() {
            return true;
        }
        if !self.words.is_empty() && !self.refill_pending {
            self.request_refill(false);
        }
        false
    }

    fn submit(&mut self, typed: String, target: &str) -> (usize, bool) {
        let word_score = scoring::score(&typed, target);
        self.counters.chars.add(word_score);
        let correct = scoring::is_exact(&typed, target);
        if !correct {
            self.counters.errors += 1;
        }
        let index = self.cursor;
        self.outcomes.push(WordOutcome { correct, typed });
        self.cursor += 1;
        self.outbox
            .push_back(SessionEvent::WordSubmitted { index, correct });
        if self.remaining_words() < LOOKAHEAD && !self.refill_pending {
            self.request_refill(false);
        }
        (index, correct)
    }

    fn request_refill(&mut self, replace: bool) {
        self.refill_pending = true;
        let request = RefillRequest {
            generation: self.generation,
            language: self.options.decoration.language,
            count: REFILL_COUNT,
            replace,
        };
        debug!(?request, "requesting words");
        self.outbox.push_back(SessionEvent::RefillRequested(request));
    }

    fn abort_hard_mode(&mut self) {
        info!(cursor = self.cursor, "hard mode mistake, restarting");
        self.outbox.push_back(SessionEvent::HardModeAbort);
        self.reset_with_new_words();
    }

    fn finish(&mut self) {
        let now = self.clock.now();
        self.finished_at = Some(now);
        self.state = RunState::Finished;
        let summary = self.build_summary(now);
        info!(
            wpm = summary.wpm,
            accuracy = summary.accuracy,
            duration = summary.duration_secs,
            "session finished"
        );
        self.summary = Some(summary.clone());
        self.outbox.push_back(SessionEvent::Finished(summary));
    }

    fn build_summary(&self, finished_at: DateTime<Utc>) -> SessionSummary {
        let elapsed = self.elapsed().unwrap_or_else(TimeDelta::zero);
        let decoration = self.options.decoration;
        SessionSummary {
            wpm: self.wpm(),
            raw_wpm: self.raw_wpm(),
            accuracy: self.accuracy(),
            duration_secs: metrics::duration_secs(elapsed),
            chars: self.counters.total_keystrokes(),
            correct_chars: self.counters.chars.correct,
            incorrect_chars: self.counters.chars.incorrect,
            extra_chars: self.counters.chars.extra,
            missed_chars: self.counters.chars.missed,
            language: decoration.language,
            caps_enabled: decoration.capitalize,
            accents_enabled: decoration.accents_enabled,
            punctuation_enabled: decoration.punctuation,
            hard_mode_enabled: self.options.hard_mode,
            finished_at,
        }
    }
}
