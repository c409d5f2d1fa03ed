use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

use tracing::{debug, warn};

use crate::error::SourceError;
use crate::language::{Language, WordSource};
use crate::runtime::AppEvent;
use crate::session::{RefillRequest, WordBatch};

/// Serves refill requests off the UI thread. Results come back to the app
/// loop as `AppEvent::Words` or `AppEvent::WordsFailed`.
#[derive(Clone)]
pub struct WordFetcher {
    source: Arc<dyn WordSource>,
    tx: Sender<AppEvent>,
}

impl WordFetcher {
    pub fn new(source: Arc<dyn WordSource>, tx: Sender<AppEvent>) -> Self {
        Self { source, tx }
    }

    pub fn request(&self, request: RefillRequest) {
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        thread::spawn(move || {
            let event = fetch_batch(source.as_ref(), &request);
            // the app may already be gone
            let _ = tx.send(event);
        });
    }
}

/// Run one request synchronously
pub fn fetch_batch(source: &dyn WordSource, request: &RefillRequest) -> AppEvent {
    match source.fetch(request.language, request.count) {
        Ok(words) if !words.is_empty() => {
            debug!(
                generation = request.generation,
                count = words.len(),
                "refill fetched"
            );
            AppEvent::Words(WordBatch {
                generation: request.generation,
                words,
                replace: request.replace,
            })
        }
        Ok(_) => {
            warn!(generation = request.generation, "word source returned no words");
            AppEvent::WordsFailed(request.generation)
        }
        Err(err) => {
            warn!(generation = request.generation, %err, "refill failed");
            AppEvent::WordsFailed(request.generation)
        }
    }
}

/// Tries each source in turn, e.g. the word service then the embedded lists
pub struct FallbackWordSource {
    sources: Vec<Box<dyn WordSource>>,
}

impl FallbackWordSource {
    pub fn new(sources: Vec<Box<dyn WordSource>>) -> Self {
        Self { sources }
    }
}

impl WordSource for FallbackWordSource {
    fn fetch(&self, language: Language, count: usize) -> Result<Vec<String>, SourceError> {
        let mut last_err = None;
        for source in &self.sources {
            match source.fetch(language, count) {
                Ok(words) if !words.is_empty() => return Ok(words),
                Ok(_) => {}
                Err(err) => {
                    debug!(%err, "word source failed, trying next");
                    last_err = Some(err);
                }
            }
        }
        match last_err {
            Some(err) => Err(err),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::EmbeddedWordSource;
    use assert_matches::assert_matches;
    use std::sync::mpsc;
    use std::time::Duration;

    struct Failing;

    impl WordSource for Failing {
        fn fetch(&self, _: Language, _: usize) -> Result<Vec<String>, SourceError> {
            Err(SourceError::Status(503))
        }
    }

    struct Fixed(Vec<&'static str>);

    impl WordSource for Fixed {
        fn fetch(&self, _: Language, count: usize) -> Result<Vec<String>, SourceError> {
            Ok(self.0.iter().take(count).map(|w| w.to_string()).collect())
        }
    }

    fn request(generation: u64) -> RefillRequest {
        RefillRequest {
            generation,
            language: Language::En,
            count: 3,
            replace: false,
        }
    }

    #[test]
    fn test_fetch_batch_carries_generation() {
        let event = fetch_batch(&Fixed(vec!["alpha", "beta", "gamma", "delta"]), &request(4));
        assert_matches!(
            event,
            AppEvent::Words(WordBatch { generation: 4, ref words, replace: false }) if words.len() == 3
        );
    }

    #[test]
    fn test_fetch_batch_failure() {
        assert_matches!(fetch_batch(&Failing, &request(2)), AppEvent::WordsFailed(2));
        assert_matches!(fetch_batch(&Fixed(vec![]), &request(2)), AppEvent::WordsFailed(2));
    }

    #[test]
    fn test_fetcher_posts_back_to_channel() {
        let (tx, rx) = mpsc::channel();
        let fetcher = WordFetcher::new(Arc::new(EmbeddedWordSource), tx);
        fetcher.request(request(1));
        let event = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_matches!(event, AppEvent::Words(WordBatch { generation: 1, .. }));
    }

    #[test]
    fn test_fallback_source() {
        let sources: Vec<Box<dyn WordSource>> = vec![
            Box::new(Failing),
            Box::new(Fixed(vec!["alpha", "beta", "gamma"])),
        ];
        let source = FallbackWordSource::new(sources);
        assert_eq!(source.fetch(Language::En, 2).unwrap(), vec!["alpha", "beta"]);

        let source = FallbackWordSource::new(vec![Box::new(Failing)]);
        assert_matches!(source.fetch(Language::En, 2), Err(SourceError::Status(503)));
    }
}
