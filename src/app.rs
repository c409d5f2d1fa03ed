use std::sync::mpsc::Sender;
use std::sync::Arc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use crate::app_dirs::AppDirs;
use crate::config::{Config, ConfigStore};
use crate::language::{EmbeddedWordSource, HttpWordSource, WordSource};
use crate::refill::{FallbackWordSource, WordFetcher};
use crate::runtime::AppEvent;
use crate::session::{Session, SessionEvent, SessionObserver, SessionSummary};
use crate::sink::{resolve_timezone, HttpResultSink, Reporter, ResultSink};
use crate::stats::ResultStore;
use crate::time_series::TimeSeriesPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Options that can be flipped from the results screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Capitalize,
    Accents,
    Punctuation,
    Numbers,
    HardMode,
    Infinite,
    Language,
}

impl Toggle {
    pub fn from_key(c: char) -> Option<Self> {
        match c {
            '1' => Some(Toggle::Capitalize),
            '2' => Some(Toggle::Accents),
            '3' => Some(Toggle::Punctuation),
            '4' => Some(Toggle::Numbers),
            '5' => Some(Toggle::HardMode),
            'i' => Some(Toggle::Infinite),
            'l' => Some(Toggle::Language),
            _ => None,
        }
    }

    fn apply(self, cfg: &mut Config) {
        match self {
            Toggle::Capitalize => cfg.capitalize = !cfg.capitalize,
            Toggle::Accents => cfg.accents_enabled = !cfg.accents_enabled,
            Toggle::Punctuation => cfg.punctuation = !cfg.punctuation,
            Toggle::Numbers => cfg.numbers = !cfg.numbers,
            Toggle::HardMode => cfg.hard_mode = !cfg.hard_mode,
            Toggle::Infinite => cfg.infinite_mode = !cfg.infinite_mode,
            Toggle::Language => cfg.language = cfg.language.next(),
        }
    }
}

/// Carries session events out to the fetcher, the reporter and the screen
struct Effects<'a> {
    fetcher: &'a WordFetcher,
    reporter: &'a Reporter,
    state: &'a mut AppState,
    last_result: &'a mut Option<(SessionSummary, Vec<TimeSeriesPoint>)>,
    samples: &'a [TimeSeriesPoint],
    notice: &'a mut Option<String>,
    rearm: &'a mut bool,
}

impl SessionObserver for Effects<'_> {
    fn on_event(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::RefillRequested(request) => self.fetcher.request(request.clone()),
            SessionEvent::Started => {
                *self.notice = None;
                *self.rearm = true;
            }
            SessionEvent::HardModeAbort => {
                *self.notice = Some("hard mode: mistake, starting over".to_string());
            }
            SessionEvent::Finished(summary) => {
                *self.last_result = Some((summary.clone(), self.samples.to_vec()));
                *self.state = AppState::Results;
                self.reporter.report(summary.clone());
            }
            _ => {}
        }
    }
}

pub struct App {
    pub session: Session,
    pub config: Config,
    pub state: AppState,
    /// summary and wpm samples of the last finished session
    pub last_result: Option<(SessionSummary, Vec<TimeSeriesPoint>)>,
    pub notice: Option<String>,
    config_store: Box<dyn ConfigStore + Send>,
    fetcher: WordFetcher,
    reporter: Reporter,
    rearm: bool,
}

impl App {
    pub fn new(
        config: Config,
        config_store: Box<dyn ConfigStore + Send>,
        fetcher: WordFetcher,
        reporter: Reporter,
    ) -> Self {
        Self::with_session(
            Session::new(config.session_options()),
            config,
            config_store,
            fetcher,
            reporter,
        )
    }

    /// Build around an existing session, e.g. one with a manual clock
    pub fn with_session(
        session: Session,
        config: Config,
        config_store: Box<dyn ConfigStore + Send>,
        fetcher: WordFetcher,
        reporter: Reporter,
    ) -> Self {
        let mut app = Self {
            session,
            config,
            state: AppState::Typing,
            last_result: None,
            notice: None,
            config_store,
            fetcher,
            reporter,
            rearm: false,
        };
        app.flush();
        app
    }

    /// The tick schedule should restart because a session just began
    pub fn take_rearm(&mut self) -> bool {
        std::mem::take(&mut self.rearm)
    }

    pub fn handle(&mut self, event: AppEvent) -> Flow {
        let flow = match event {
            AppEvent::Key(key) => self.on_key(key),
            AppEvent::Tick => {
                self.session.tick();
                Flow::Continue
            }
            AppEvent::Words(batch) => {
                self.session.apply_words(batch);
                Flow::Continue
            }
            AppEvent::WordsFailed(generation) => {
                self.session.refill_failed(generation);
                if self.session.words().is_empty() {
                    self.notice = Some("could not load words, ctrl+r to try again".to_string());
                }
                Flow::Continue
            }
            AppEvent::Resize => Flow::Continue,
        };
        self.flush();
        flow
    }

    fn flush(&mut self) {
        let samples = self.session.wpm_samples().to_vec();
        let mut effects = Effects {
            fetcher: &self.fetcher,
            reporter: &self.reporter,
            state: &mut self.state,
            last_result: &mut self.last_result,
            samples: &samples,
            notice: &mut self.notice,
            rearm: &mut self.rearm,
        };
        self.session.dispatch(&mut effects);
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }
        if is_new_words_key(&key) {
            self.new_words();
            return Flow::Continue;
        }
        match self.state {
            AppState::Typing => self.on_typing_key(key),
            AppState::Results => self.on_results_key(key),
        }
    }

    fn on_typing_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc => {
                if self.session.stop().is_none() {
                    return Flow::Quit;
                }
            }
            KeyCode::Tab => self.retry(),
            KeyCode::Backspace | KeyCode::Delete => {
                self.session.backspace();
            }
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                self.session.type_char(c);
            }
            _ => {}
        }
        Flow::Continue
    }

    fn on_results_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('r') | KeyCode::Tab => self.retry(),
            KeyCode::Char('n') => self.new_words(),
            KeyCode::Char(c) => {
                if let Some(toggle) = Toggle::from_key(c) {
                    self.toggle(toggle);
                }
            }
            _ => {}
        }
        Flow::Continue
    }

    /// Same words, fresh counters
    pub fn retry(&mut self) {
        self.session.reset();
        self.notice = None;
        self.state = AppState::Typing;
    }

    pub fn new_words(&mut self) {
        self.session.reset_with_new_words();
        self.notice = None;
        self.state = AppState::Typing;
    }

    /// Flip an option, persist it and start over with new words
    pub fn toggle(&mut self, toggle: Toggle) {
        toggle.apply(&mut self.config);
        info!(?toggle, "option changed");
        if let Err(err) = self.config_store.save(&self.config) {
            warn!(%err, "unable to save config");
        }
        let before = self.session.generation();
        self.session.set_options(self.config.session_options());
        if self.session.generation() == before {
            self.session.reset_with_new_words();
        }
    }
}

fn is_new_words_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Enter => key.modifiers.contains(KeyModifiers::SHIFT),
        KeyCode::Char('r') | KeyCode::Char('R') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Word service with the embedded lists as fallback, or the lists alone
pub fn word_source_for(config: &Config) -> Arc<dyn WordSource> {
    match config.word_service_url.as_deref() {
        Some(url) => match HttpWordSource::new(url) {
            Ok(http) => {
                let sources: Vec<Box<dyn WordSource>> =
                    vec![Box::new(http), Box::new(EmbeddedWordSource)];
                Arc::new(FallbackWordSource::new(sources))
            }
            Err(err) => {
                warn!(%err, "word service unavailable, using embedded lists");
                Arc::new(EmbeddedWordSource)
            }
        },
        None => Arc::new(EmbeddedWordSource),
    }
}

/// Local history and, when configured, the results service
pub fn reporter_for(config: &Config) -> Reporter {
    let mut sinks: Vec<Arc<dyn ResultSink>> = Vec::new();
    if config.keep_history {
        match ResultStore::open(&AppDirs::db_path()) {
            Ok(store) => sinks.push(Arc::new(store)),
            Err(err) => warn!(%err, "local history disabled"),
        }
    }
    if let Some((url, token)) = config.results_service() {
        match HttpResultSink::new(url, token) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(err) => warn!(%err, "results service disabled"),
        }
    }
    debug!(sinks = sinks.len(), "reporter ready");
    Reporter::new(sinks, resolve_timezone(config.timezone.as_deref()))
}

/// Wire an app to the given event channel using the configured services
pub fn build(
    config: Config,
    config_store: Box<dyn ConfigStore + Send>,
    tx: Sender<AppEvent>,
) -> App {
    let fetcher = WordFetcher::new(word_source_for(&config), tx);
    let reporter = reporter_for(&config);
    if config.results_service().is_some() {
        reporter.announce_timezone();
    }
    App::new(config, config_store, fetcher, reporter)
}
