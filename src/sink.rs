use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::SinkError;
use crate::session::SessionSummary;

/// What gets submitted for a finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultPayload {
    #[serde(flatten)]
    pub summary: SessionSummary,
    pub timezone: String,
}

impl ResultPayload {
    pub fn new(summary: SessionSummary, timezone: impl Into<String>) -> Self {
        Self {
            summary,
            timezone: timezone.into(),
        }
    }
}

/// Somewhere finished sessions are recorded
pub trait ResultSink: Send + Sync {
    fn submit(&self, payload: &ResultPayload) -> Result<(), SinkError>;

    /// Tell the sink the user's timezone. Most sinks don't care.
    fn set_timezone(&self, _timezone: &str) -> Result<(), SinkError> {
        Ok(())
    }

    fn name(&self) -> &'static str;
}

#[derive(Serialize)]
struct TimezoneBody<'a> {
    timezone: &'a str,
}

/// Results service client: `POST /api/results` and `POST /api/timezone`
#[derive(Debug, Clone)]
pub struct HttpResultSink {
    base_url: String,
    token: String,
    client: reqwest::blocking::Client,
}

impl HttpResultSink {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, SinkError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        })
    }

    pub fn results_url(&self) -> String {
        format!("{}/api/results", self.base_url)
    }

    pub fn timezone_url(&self) -> String {
        format!("{}/api/timezone", self.base_url)
    }

    fn post<T: Serialize + ?Sized>(&self, url: String, body: &T) -> Result<(), SinkError> {
        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(SinkError::Status(response.status().as_u16()))
        }
    }
}

impl ResultSink for HttpResultSink {
    fn submit(&self, payload: &ResultPayload) -> Result<(), SinkError> {
        self.post(self.results_url(), payload)
    }

    fn set_timezone(&self, timezone: &str) -> Result<(), SinkError> {
        self.post(self.timezone_url(), &TimezoneBody { timezone })
    }

    fn name(&self) -> &'static str {
        "results service"
    }
}

/// Fans results out to every sink on a background thread. Failures are
/// logged and otherwise ignored.
#[derive(Clone, Default)]
pub struct Reporter {
    sinks: Vec<Arc<dyn ResultSink>>,
    timezone: String,
}

impl Reporter {
    pub fn new(sinks: Vec<Arc<dyn ResultSink>>, timezone: impl Into<String>) -> Self {
        Self {
            sinks,
            timezone: timezone.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn timezone(&self) -> &str {
        &self.timezone
    }

    pub fn report(&self, summary: SessionSummary) -> Option<JoinHandle<()>> {
        if self.sinks.is_empty() {
            return None;
        }
        let payload = ResultPayload::new(summary, self.timezone.clone());
        let sinks = self.sinks.clone();
        Some(thread::spawn(move || {
            for sink in sinks {
                match sink.submit(&payload) {
                    Ok(()) => info!(sink = sink.name(), wpm = payload.summary.wpm, "result recorded"),
                    Err(err) => debug!(sink = sink.name(), %err, "result submission failed"),
                }
            }
        }))
    }

    pub fn announce_timezone(&self) -> Option<JoinHandle<()>> {
        if self.sinks.is_empty() {
            return None;
        }
        let timezone = self.timezone.clone();
        let sinks = self.sinks.clone();
        Some(thread::spawn(move || {
            for sink in sinks {
                if let Err(err) = sink.set_timezone(&timezone) {
                    debug!(sink = sink.name(), %err, "timezone update failed");
                }
            }
        }))
    }
}

/// Explicit override, then `TZ`, then the local UTC offset
pub fn resolve_timezone(configured: Option<&str>) -> String {
    if let Some(tz) = configured.map(str::trim).filter(|tz| !tz.is_empty()) {
        return tz.to_string();
    }
    match std::env::var("TZ") {
        Ok(tz) if !tz.trim().is_empty() => tz.trim().to_string(),
        _ => Local::now().format("%:z").to_string(),
    }
}
