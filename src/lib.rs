// Library surface shared by the binary and the integration tests.
pub mod app;
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod error;
pub mod language;
pub mod logging;
pub mod metrics;
pub mod refill;
pub mod runtime;
pub mod scoring;
pub mod session;
pub mod sink;
pub mod stats;
pub mod time_series;
pub mod ui;
pub mod util;
