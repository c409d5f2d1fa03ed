use anyhow::{Context, Result};
use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::io::{self, stdin};

use clackr::app::{self, App, Flow};
use clackr::app_dirs::AppDirs;
use clackr::config::{Config, ConfigStore, FileConfigStore};
use clackr::language::Language;
use clackr::logging;
use clackr::runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner};
use clackr::stats::{HistorySummary, ResultStore, StoredResult};

/// timed typing tests in the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Timed typing tests in the terminal with optional capitals, accents, punctuation and numbers, a hard mode that restarts on the first mistake, and a local history of results."
)]
pub struct Cli {
    /// seconds per test (minimum 5)
    #[clap(short = 'd', long)]
    duration: Option<u32>,

    /// keep going until esc instead of running against the clock
    #[clap(long)]
    infinite: bool,

    /// language to draw words from
    #[clap(short = 'l', long, value_enum)]
    language: Option<Language>,

    /// capitalize some words
    #[clap(short = 'c', long)]
    capitalize: bool,

    /// strip accents from words
    #[clap(long)]
    no_accents: bool,

    /// add punctuation around some words
    #[clap(short = 'p', long)]
    punctuation: bool,

    /// replace some words with numbers
    #[clap(short = 'n', long)]
    numbers: bool,

    /// restart on the first mistake
    #[clap(long)]
    hard: bool,

    /// base url of a word service (GET /api/words)
    #[clap(long)]
    word_service: Option<String>,

    /// base url of a results service (POST /api/results)
    #[clap(long)]
    results_service: Option<String>,

    /// bearer token for the results service
    #[clap(long)]
    api_token: Option<String>,

    /// timezone reported with results, e.g. Europe/Paris
    #[clap(long)]
    timezone: Option<String>,

    /// don't record results locally
    #[clap(long)]
    no_history: bool,

    /// store these options as the new defaults
    #[clap(long)]
    save: bool,

    /// print a summary of past results and exit
    #[clap(long)]
    history: bool,
}

impl Cli {
    /// Layer the flags given on the command line over the stored config
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(duration) = self.duration {
            cfg.duration = duration;
        }
        if let Some(language) = self.language {
            cfg.language = language;
        }
        cfg.infinite_mode |= self.infinite;
        cfg.capitalize |= self.capitalize;
        cfg.punctuation |= self.punctuation;
        cfg.numbers |= self.numbers;
        cfg.hard_mode |= self.hard;
        if self.no_accents {
            cfg.accents_enabled = false;
        }
        if self.no_history {
            cfg.keep_history = false;
        }
        for (flag, slot) in [
            (&self.word_service, &mut cfg.word_service_url),
            (&self.results_service, &mut cfg.results_service_url),
            (&self.api_token, &mut cfg.api_token),
            (&self.timezone, &mut cfg.timezone),
        ] {
            if flag.is_some() {
                slot.clone_from(flag);
            }
        }
        cfg.normalized()
    }
}

fn format_history(summary: &HistorySummary) -> String {
    if summary.total_tests == 0 {
        return "no results yet".to_string();
    }
    format!(
        "tests          {}\n\
         average        {:.0} wpm ({:.0} raw), {:.0}% acc\n\
         fastest        {} wpm ({} raw)\n\
         best accuracy  {}%\n\
         characters     {} typed, {}/{}/{}/{} correct/incorrect/extra/missed\n\
         streak         {} days (longest {})",
        summary.total_tests,
        summary.average_wpm,
        summary.average_raw_wpm,
        summary.average_accuracy,
        summary.fastest_wpm,
        summary.fastest_raw_wpm,
        summary.best_accuracy,
        summary.total_chars,
        summary.correct_chars,
        summary.incorrect_chars,
        summary.extra_chars,
        summary.missed_chars,
        summary.current_streak,
        summary.longest_streak,
    )
}

const RECENT_RESULTS: usize = 30;

fn format_recent(results: &[StoredResult]) -> String {
    let mut out = String::from("recent");
    for r in results {
        out.push_str(&format!(
            "\n  {}  {:>3} wpm ({:>3} raw)  {:>3}%  {:>4}s  {}{}",
            r.finished_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            r.wpm,
            r.raw_wpm,
            r.accuracy,
            r.duration_secs,
            r.language.label(),
            if r.hard_mode_enabled { "  hard" } else { "" },
        ));
    }
    out
}

fn print_history() -> Result<()> {
    let path = AppDirs::db_path();
    let store = ResultStore::open(&path)
        .with_context(|| format!("unable to open history at {}", path.display()))?;
    let summary = store.summary().context("unable to read history")?;
    println!("{}", format_history(&summary));
    let recent = store
        .recent(RECENT_RESULTS)
        .context("unable to read recent results")?;
    if !recent.is_empty() {
        println!("\n{}", format_recent(&recent));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&AppDirs::log_path());

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save {
        store
            .save(&config)
            .with_context(|| format!("unable to save config to {}", store.path().display()))?;
    }

    if cli.history {
        return print_history();
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::every_second());
    let mut app = app::build(config, Box::new(store), runner.sender());

    enable_raw_mode().context("unable to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("unable to enter alternate screen")?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let outcome = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    outcome
}

fn start_tui<B: Backend, E: EventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, FixedTicker>,
) -> Result<()> {
    loop {
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
        if app.handle(runner.step()) == Flow::Quit {
            return Ok(());
        }
        if app.take_rearm() {
            runner.rearm();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_keep_config() {
        let cli = Cli::parse_from(["clackr"]);
        assert!(!cli.save);
        assert!(!cli.history);
        assert_eq!(cli.apply(Config::default()), Config::default());

        let stored = Config {
            hard_mode: true,
            language: Language::De,
            ..Default::default()
        };
        assert_eq!(cli.apply(stored.clone()), stored);
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "clackr",
            "-d",
            "30",
            "-l",
            "fr",
            "--capitalize",
            "--no-accents",
            "-p",
            "-n",
            "--hard",
            "--infinite",
            "--no-history",
        ]);
        let cfg = cli.apply(Config::default());
        assert_eq!(cfg.duration, 30);
        assert_eq!(cfg.language, Language::Fr);
        assert!(cfg.capitalize);
        assert!(!cfg.accents_enabled);
        assert!(cfg.punctuation);
        assert!(cfg.numbers);
        assert!(cfg.hard_mode);
        assert!(cfg.infinite_mode);
        assert!(!cfg.keep_history);
    }

    #[test]
    fn test_cli_service_settings() {
        let cli = Cli::parse_from([
            "clackr",
            "--word-service",
            "http://localhost:5000",
            "--results-service",
            "http://localhost:5000",
            "--api-token",
            "abc",
            "--timezone",
            "Europe/Paris",
        ]);
        let cfg = cli.apply(Config::default());
        assert_eq!(cfg.word_service_url.as_deref(), Some("http://localhost:5000"));
        assert_eq!(cfg.results_service(), Some(("http://localhost:5000", "abc")));
        assert_eq!(cfg.timezone.as_deref(), Some("Europe/Paris"));
    }

    #[test]
    fn test_cli_short_duration_normalized() {
        let cli = Cli::parse_from(["clackr", "--duration", "2"]);
        assert_eq!(cli.apply(Config::default()).duration, 60);
    }

    #[test]
    fn test_cli_rejects_unknown_language() {
        assert!(Cli::try_parse_from(["clackr", "-l", "klingon"]).is_err());
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_recent() {
        let finished_at = chrono::Utc::now();
        let results = [
            StoredResult {
                id: 2,
                wpm: 71,
                raw_wpm: 75,
                accuracy: 98,
                duration_secs: 30,
                language: Language::Fr,
                hard_mode_enabled: true,
                finished_at,
            },
            StoredResult {
                id: 1,
                wpm: 9,
                raw_wpm: 12,
                accuracy: 80,
                duration_secs: 60,
                language: Language::En,
                hard_mode_enabled: false,
                finished_at,
            },
        ];
        let text = format_recent(&results);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "recent");
        assert!(lines[1].ends_with(" 71 wpm ( 75 raw)   98%    30s  FR  hard"));
        assert!(lines[2].ends_with("  9 wpm ( 12 raw)   80%    60s  EN"));
        assert!(lines[1].contains(&finished_at.with_timezone(&Local).format("%Y-%m-%d").to_string()));
    }

    #[test]
    fn test_format_history() {
        assert_eq!(format_history(&HistorySummary::default()), "no results yet");
        let summary = HistorySummary {
            total_tests: 3,
            average_wpm: 51.4,
            fastest_wpm: 63,
            current_streak: 2,
            longest_streak: 5,
            ..Default::default()
        };
        let text = format_history(&summary);
        assert!(text.contains("tests          3"));
        assert!(text.contains("51 wpm"));
        assert!(text.contains("2 days (longest 5)"));
    }
}
