use assert_cmd::Command;
use chrono::{Duration, Utc};
use tempfile::tempdir;

use clackr::language::Language;
use clackr::session::SessionSummary;
use clackr::sink::ResultPayload;
use clackr::stats::ResultStore;

fn clackr(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("clackr").unwrap();
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("CLACKR_LOG");
    cmd
}

#[test]
fn help_lists_options() {
    let home = tempdir().unwrap();
    let output = clackr(home.path()).arg("--help").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for flag in ["--duration", "--language", "--hard", "--history", "--save"] {
        assert!(text.contains(flag), "missing {flag}");
    }
}

#[test]
fn history_without_results() {
    let home = tempdir().unwrap();
    let output = clackr(home.path()).arg("--history").output().unwrap();
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("no results yet"));
}

#[test]
fn history_with_results() {
    let home = tempdir().unwrap();
    let db = home.path().join(".local/state/clackr/history.db");
    let store = ResultStore::open(&db).unwrap();
    let summary = SessionSummary {
        wpm: 64,
        raw_wpm: 70,
        accuracy: 97,
        duration_secs: 60,
        chars: 340,
        correct_chars: 320,
        incorrect_chars: 6,
        extra_chars: 1,
        missed_chars: 2,
        language: Language::En,
        caps_enabled: false,
        accents_enabled: true,
        punctuation_enabled: false,
        hard_mode_enabled: false,
        finished_at: Utc::now() - Duration::seconds(1),
    };
    store
        .record(&ResultPayload::new(summary.clone(), "UTC"))
        .unwrap();
    store
        .record(&ResultPayload::new(
            SessionSummary {
                wpm: 48,
                raw_wpm: 55,
                accuracy: 91,
                duration_secs: 30,
                language: Language::De,
                hard_mode_enabled: true,
                finished_at: Utc::now(),
                ..summary
            },
            "UTC",
        ))
        .unwrap();
    drop(store);

    let output = clackr(home.path()).arg("--history").output().unwrap();
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("tests          2"));
    assert!(text.contains("streak         1 days"));

    let recent: Vec<&str> = text
        .lines()
        .skip_while(|l| *l != "recent")
        .skip(1)
        .collect();
    assert_eq!(recent.len(), 2);
    assert!(recent[0].contains(" 48 wpm ( 55 raw)   91%    30s  DE  hard"));
    assert!(recent[1].contains(" 64 wpm ( 70 raw)   97%    60s  EN"));
    assert!(!recent[1].contains("hard"));
}

#[test]
fn save_persists_overrides() {
    let home = tempdir().unwrap();
    let output = clackr(home.path())
        .args(["--save", "--history", "--hard", "-l", "pt", "-d", "15"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let saved = std::fs::read_to_string(home.path().join(".config/clackr/config.json")).unwrap();
    let json: serde_json::Value = serde_json::from_str(&saved).unwrap();
    assert_eq!(json["hardMode"], true);
    assert_eq!(json["language"], "pt");
    assert_eq!(json["duration"], 15);
}

#[test]
fn refuses_to_run_without_tty() {
    let home = tempdir().unwrap();
    let output = clackr(home.path()).write_stdin("").output().unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("stdin must be a tty"));
}
