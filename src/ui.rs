pub mod charting;
pub mod screen;

use std::ops::Range;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::app::App;
use crate::session::{RunState, Session, SessionSummary};
use crate::time_series::{self, TimeSeriesPoint};
use crate::util;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Words shown at once on the typing screen
pub const VISIBLE_WORDS: usize = 36;
/// The view scrolls a row of this many words at a time
const ROW_WORDS: usize = 12;

/// Which words of the sequence are on screen for a cursor position
pub fn visible_range(cursor: usize, len: usize) -> Range<usize> {
    let start = (cursor - cursor % ROW_WORDS).min(len);
    start..(start + VISIBLE_WORDS).min(len)
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    bold().add_modifier(Modifier::DIM)
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        screen::current_screen(&self.state).render(self, area, buf);
    }
}

/// Live figures above the word stream
pub fn live_stats_line(session: &Session) -> String {
    let stats = session.live_stats();
    let time = match stats.remaining_secs {
        Some(secs) => format!("{secs}s"),
        None => "∞".to_string(),
    };
    format!(
        "{} wpm   {}% acc   {} errors   {}",
        stats.wpm, stats.accuracy, stats.errors, time
    )
}

/// Spans for the current word, coloured per character against the input
pub fn current_word_spans(target: &str, typed: &str) -> Vec<Span<'static>> {
    let green = bold().fg(Color::Green);
    let red = bold().fg(Color::Red);
    let typed_chars: Vec<char> = typed.chars().collect();
    let target_chars: Vec<char> = target.chars().collect();

    let mut spans: Vec<Span<'static>> = target_chars
        .iter()
        .enumerate()
        .map(|(i, &expected)| match typed_chars.get(i) {
            Some(&c) if c == expected => Span::styled(expected.to_string(), green),
            Some(_) => Span::styled(expected.to_string(), red),
            None if i == typed_chars.len() => Span::styled(
                expected.to_string(),
                dim().add_modifier(Modifier::UNDERLINED),
            ),
            None => Span::styled(expected.to_string(), dim()),
        })
        .collect();

    // overflow past the end of the word
    if typed_chars.len() > target_chars.len() {
        let extra: String = typed_chars[target_chars.len()..].iter().collect();
        spans.push(Span::styled(
            extra,
            red.add_modifier(Modifier::CROSSED_OUT),
        ));
    }
    spans
}

fn word_stream(session: &Session) -> Line<'static> {
    let words = session.words();
    let cursor = session.cursor();
    let mut spans = Vec::new();
    for idx in visible_range(cursor, words.len()) {
        let word = &words[idx];
        if idx < cursor {
            let style = match session.outcomes().get(idx) {
                Some(outcome) if outcome.correct => Style::default().fg(Color::Green),
                _ => Style::default()
                    .fg(Color::Red)
                    .add_modifier(Modifier::UNDERLINED),
            };
            spans.push(Span::styled(word.clone(), style));
        } else if idx == cursor {
            spans.extend(current_word_spans(word, session.input()));
        } else {
            spans.push(Span::styled(word.clone(), dim()));
        }
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Display columns taken by the visible words and their separators
fn stream_width(session: &Session) -> usize {
    let words = session.words();
    visible_range(session.cursor(), words.len())
        .map(|idx| words[idx].width() + 1)
        .sum()
}

pub(crate) fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // live stats
            Constraint::Length(1),
            Constraint::Min(3), // words
            Constraint::Length(1), // notice
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled(live_stats_line(session), dim()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    if session.words().is_empty() {
        Paragraph::new(Span::styled(
            "loading words…",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    } else {
        let line = word_stream(session);
        // a stream that fits on one row sits in the middle
        let alignment = if stream_width(session) <= chunks[2].width as usize {
            Alignment::Center
        } else {
            Alignment::Left
        };
        Paragraph::new(line)
            .alignment(alignment)
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);
    }

    if let Some(notice) = &app.notice {
        Paragraph::new(Span::styled(notice.clone(), bold().fg(Color::Yellow)))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }

    let legend = if session.state() == RunState::Running {
        "(tab) retry / (ctrl+r) new words / (esc) stop"
    } else {
        "start typing / (tab) retry / (ctrl+r) new words / (esc) quit"
    };
    Paragraph::new(Span::styled(
        legend,
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);
}

pub fn summary_line(summary: &SessionSummary, samples: &[TimeSeriesPoint]) -> String {
    let consistency = util::consistency(&time_series::wpm_values(samples))
        .map(|c| format!("   {c:.0}% consistency"))
        .unwrap_or_default();
    format!(
        "{} wpm   {} raw   {}% acc   {}s{}",
        summary.wpm, summary.raw_wpm, summary.accuracy, summary.duration_secs, consistency
    )
}

pub fn chars_line(summary: &SessionSummary) -> String {
    format!(
        "characters {}/{}/{}/{} (correct/incorrect/extra/missed)",
        summary.correct_chars, summary.incorrect_chars, summary.extra_chars, summary.missed_chars
    )
}

pub fn settings_line(app: &App) -> String {
    let cfg = &app.config;
    format!(
        "(1) caps {}  (2) accents {}  (3) punctuation {}  (4) numbers {}  (5) hard {}  (i) infinite {}  (l) {}",
        on_off(cfg.capitalize),
        on_off(cfg.accents_enabled),
        on_off(cfg.punctuation),
        on_off(cfg.numbers),
        on_off(cfg.hard_mode),
        on_off(cfg.infinite_mode),
        cfg.language.label(),
    )
}

pub(crate) fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),    // chart
            Constraint::Length(1), // summary
            Constraint::Length(1), // characters
            Constraint::Length(3), // settings
            Constraint::Length(1), // legend
        ])
        .split(area);

    if let Some((summary, samples)) = &app.last_result {
        let (duration, highest_wpm) =
            charting::compute_chart_params(samples, summary.duration_secs);
        let points: Vec<(f64, f64)> = samples.iter().copied().map(Into::into).collect();
        let datasets = vec![Dataset::default()
            .marker(ratatui::symbols::Marker::Braille)
            .style(Style::default().fg(Color::Magenta))
            .graph_type(GraphType::Line)
            .data(&points)];

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("seconds")
                    .bounds([0.0, duration])
                    .labels(vec![
                        Span::styled("0", bold()),
                        Span::styled(charting::format_label(duration), bold()),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("wpm")
                    .bounds([0.0, highest_wpm])
                    .labels(vec![
                        Span::styled("0", bold()),
                        Span::styled(charting::format_label(highest_wpm), bold()),
                    ]),
            )
            .render(chunks[0], buf);

        Paragraph::new(Span::styled(summary_line(summary, samples), bold()))
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        Paragraph::new(Span::styled(
            chars_line(summary),
            Style::default().fg(Color::Cyan),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    Paragraph::new(settings_line(app))
        .style(
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[3], buf);

    Paragraph::new(Span::styled(
        "(r)etry / (n)ew / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);
}
