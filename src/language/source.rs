use include_dir::{include_dir, Dir};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::core::Language;
use crate::error::SourceError;

static LANG_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/src/lang");

/// Number of words requested per refill
pub const REFILL_COUNT: usize = 200;

/// Words shorter than this are dropped from embedded lists
const MIN_WORD_LEN: usize = 3;

/// Provider of raw, undecorated words
pub trait WordSource: Send + Sync {
    fn fetch(&self, language: Language, count: usize) -> Result<Vec<String>, SourceError>;
}

#[derive(Deserialize, Clone, Debug)]
pub struct WordList {
    pub name: String,
    pub words: Vec<String>,
}

impl WordList {
    pub fn load(language: Language) -> Result<Self, SourceError> {
        let file_name = format!("{}.json", language.code());
        let file = LANG_DIR
            .get_file(&file_name)
            .ok_or_else(|| SourceError::MissingList(language.code().to_string()))?;
        let contents = file
            .contents_utf8()
            .ok_or_else(|| SourceError::MissingList(language.code().to_string()))?;
        let mut list: WordList = serde_json::from_str(contents)?;
        list.words = list
            .words
            .into_iter()
            .map(|w| w.trim().to_string())
            .filter(|w| w.chars().count() >= MIN_WORD_LEN)
            .collect();
        Ok(list)
    }

    /// Draw `count` words, without repeats when the list is large enough.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, count: usize) -> Vec<String> {
        if self.words.is_empty() {
            return Vec::new();
        }
        if self.words.len() >= count {
            self.words.choose_multiple(rng, count).cloned().collect()
        } else {
            (0..count)
                .filter_map(|_| self.words.choose(rng).cloned())
                .collect()
        }
    }
}

/// Word lists compiled into the binary
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedWordSource;

impl WordSource for EmbeddedWordSource {
    fn fetch(&self, language: Language, count: usize) -> Result<Vec<String>, SourceError> {
        let list = WordList::load(language)?;
        Ok(list.sample(&mut rand::thread_rng(), count))
    }
}

#[derive(Deserialize)]
struct WordsResponse {
    #[serde(default)]
    words: Vec<String>,
}

/// Client for a word service exposing `GET /api/words?count=N&lang=xx`
#[derive(Debug, Clone)]
pub struct HttpWordSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

impl HttpWordSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn words_url(&self) -> String {
        format!("{}/api/words", self.base_url)
    }
}

impl WordSource for HttpWordSource {
    fn fetch(&self, language: Language, count: usize) -> Result<Vec<String>, SourceError> {
        let count = count.to_string();
        let response = self
            .client
            .get(self.words_url())
            .query(&[("count", count.as_str()), ("lang", language.code())])
            .send()?;
        if !response.status().is_success() {
            return Err(SourceError::Status(response.status().as_u16()));
        }
        let body: WordsResponse = response.json()?;
        debug!(count = body.words.len(), lang = %language, "received words");
        Ok(body.words)
    }
}
