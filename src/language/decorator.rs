use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use unicode_normalization::UnicodeNormalization;

use super::core::Language;

const CAPITALIZE_CHANCE: f64 = 0.3;
const NUMBER_CHANCE: f64 = 0.2;
const PUNCTUATE_CHANCE: f64 = 0.25;
const WRAP_SHARE: f64 = 0.2;
const SUFFIX_SHARE: f64 = 0.6;
const MAX_NUMBER_DIGITS: usize = 4;

const SUFFIXES: [&str; 7] = [",", ".", ";", ":", "!", "?", "..."];

/// Which decorations apply to freshly fetched words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecorationOptions {
    pub language: Language,
    pub accents_enabled: bool,
    pub capitalize: bool,
    pub punctuation: bool,
    pub numbers: bool,
}

/// One step of word decoration
pub trait WordTransform: Send {
    fn apply(&self, word: String, rng: &mut dyn RngCore) -> String;
}

/// Removes combining diacritical marks after canonical decomposition
pub struct AccentStripper;

impl WordTransform for AccentStripper {
    fn apply(&self, word: String, _rng: &mut dyn RngCore) -> String {
        strip_accents(&word)
    }
}

/// Uppercases the first letter of some words
pub struct Capitalizer;

impl WordTransform for Capitalizer {
    fn apply(&self, word: String, rng: &mut dyn RngCore) -> String {
        if word.is_empty() {
            return word;
        }
        if rng.gen::<f64>() < CAPITALIZE_CHANCE {
            capitalize_first_letter(&word)
        } else {
            word
        }
    }
}

/// Swaps some words for a short run of digits
pub struct NumberSubstituter;

impl WordTransform for NumberSubstituter {
    fn apply(&self, word: String, rng: &mut dyn RngCore) -> String {
        if rng.gen::<f64>() > NUMBER_CHANCE {
            return word;
        }
        let len = pick_index(rng, MAX_NUMBER_DIGITS) + 1;
        (0..len)
            .map(|_| char::from(b'0' + pick_index(rng, 10) as u8))
            .collect()
    }
}

/// Wraps words, appends trailing punctuation, or applies a compound form
pub struct Punctuator;

impl WordTransform for Punctuator {
    fn apply(&self, word: String, rng: &mut dyn RngCore) -> String {
        if word.is_empty() || rng.gen::<f64>() > PUNCTUATE_CHANCE {
            return word;
        }
        let roll = rng.gen::<f64>();
        if roll < WRAP_SHARE {
            match pick_index(rng, 2) {
                0 => format!("({word})"),
                _ => format!("\"{word}\""),
            }
        } else if roll < SUFFIX_SHARE {
            let suffix = SUFFIXES[pick_index(rng, SUFFIXES.len())];
            format!("{word}{suffix}")
        } else {
            match pick_index(rng, 3) {
                0 => format!("{word}'s"),
                1 => format!("{word}-{word}"),
                _ => format!("{word}\u{2014}{word}"),
            }
        }
    }
}

/// Applies the enabled transforms in order: accents, capitals, digits,
/// punctuation. A digit word can still be punctuated.
pub struct WordDecorator {
    options: DecorationOptions,
    transforms: Vec<Box<dyn WordTransform>>,
    rng: Box<dyn RngCore + Send>,
}

impl std::fmt::Debug for WordDecorator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WordDecorator")
            .field("options", &self.options)
            .field("transforms", &self.transforms.len())
            .finish()
    }
}

impl WordDecorator {
    pub fn new(options: DecorationOptions) -> Self {
        Self::with_rng(options, StdRng::from_entropy())
    }

    pub fn with_rng<R: RngCore + Send + 'static>(options: DecorationOptions, rng: R) -> Self {
        Self {
            options,
            transforms: build_transforms(&options),
            rng: Box::new(rng),
        }
    }

    pub fn options(&self) -> DecorationOptions {
        self.options
    }

    pub fn set_options(&mut self, options: DecorationOptions) {
        self.options = options;
        self.transforms = build_transforms(&options);
    }

    pub fn decorate(&mut self, word: &str) -> String {
        let mut out = word.to_string();
        for transform in &self.transforms {
            out = transform.apply(out, self.rng.as_mut());
        }
        out
    }

    pub fn decorate_all(&mut self, words: Vec<String>) -> Vec<String> {
        words.iter().map(|w| self.decorate(w)).collect()
    }
}

fn build_transforms(options: &DecorationOptions) -> Vec<Box<dyn WordTransform>> {
    let mut transforms: Vec<Box<dyn WordTransform>> = Vec::new();
    if options.language.has_accents() && !options.accents_enabled {
        transforms.push(Box::new(AccentStripper));
    }
    if options.capitalize {
        transforms.push(Box::new(Capitalizer));
    }
    if options.numbers {
        transforms.push(Box::new(NumberSubstituter));
    }
    if options.punctuation {
        transforms.push(Box::new(Punctuator));
    }
    transforms
}

fn pick_index(rng: &mut dyn RngCore, len: usize) -> usize {
    let idx = (rng.gen::<f64>() * len as f64) as usize;
    idx.min(len - 1)
}

pub fn strip_accents(word: &str) -> String {
    word.nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect()
}

pub fn capitalize_first_letter(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
pub(crate) mod test_rng {
    use rand::RngCore;
    use std::collections::VecDeque;

    /// Replays the given uniform draws in order, then keeps returning a draw
    /// that declines every chance.
    pub struct ScriptedRng {
        draws: VecDeque<f64>,
    }

    impl ScriptedRng {
        pub fn new(draws: &[f64]) -> Self {
            Self {
                draws: draws.iter().copied().collect(),
            }
        }
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            (self.next_u64() >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            let draw = self.draws.pop_front().unwrap_or(0.999);
            ((draw * (1u64 << 53) as f64) as u64) << 11
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            for b in dest.iter_mut() {
                *b = self.next_u32() as u8;
            }
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            self.fill_bytes(dest);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_rng::ScriptedRng;
    use super::*;

    fn options() -> DecorationOptions {
        DecorationOptions {
            language: Language::En,
            accents_enabled: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_strip_accents() {
        assert_eq!(strip_accents("café"), "cafe");
        assert_eq!(strip_accents("mañana"), "manana");
        assert_eq!(strip_accents("Über"), "Uber");
        assert_eq!(strip_accents("plain"), "plain");
    }

    #[test]
    fn test_capitalize_first_letter() {
        assert_eq!(capitalize_first_letter("hello"), "Hello");
        assert_eq!(capitalize_first_letter("éte"), "Éte");
        assert_eq!(capitalize_first_letter(""), "");
        assert_eq!(capitalize_first_letter("123"), "123");
    }

    #[test]
    fn test_no_options_is_identity() {
        let mut d = WordDecorator::with_rng(options(), ScriptedRng::new(&[0.0; 8]));
        assert_eq!(d.decorate("hello"), "hello");
    }

    #[test]
    fn test_accents_only_stripped_when_disabled_for_accented_language() {
        let mut opts = options();
        opts.language = Language::Fr;
        opts.accents_enabled = false;
        let mut d = WordDecorator::with_rng(opts, ScriptedRng::new(&[]));
        assert_eq!(d.decorate("élève"), "eleve");

        opts.accents_enabled = true;
        d.set_options(opts);
        assert_eq!(d.decorate("élève"), "élève");

        opts.language = Language::En;
        opts.accents_enabled = false;
        d.set_options(opts);
        assert_eq!(d.decorate("naïve"), "naïve");
    }

    #[test]
    fn test_capitalize_chance() {
        let mut opts = options();
        opts.capitalize = true;
        let mut d = WordDecorator::with_rng(opts, ScriptedRng::new(&[0.1, 0.5]));
        assert_eq!(d.decorate("word"), "Word");
        assert_eq!(d.decorate("word"), "word");
    }

    #[test]
    fn test_number_substitution() {
        let mut opts = options();
        opts.numbers = true;
        // chance hit, length 3, digits 4 0 9
        let mut d =
            WordDecorator::with_rng(opts, ScriptedRng::new(&[0.1, 0.6, 0.45, 0.0, 0.95]));
        assert_eq!(d.decorate("word"), "409");
        // chance miss
        assert_eq!(d.decorate("word"), "word");
    }

    #[test]
    fn test_punctuation_branches() {
        let mut opts = options();
        opts.punctuation = true;
        let mut d = WordDecorator::with_rng(
            opts,
            ScriptedRng::new(&[
                0.1, 0.1, 0.0, // wrap in parentheses
                0.1, 0.1, 0.9, // wrap in quotes
                0.1, 0.3, 0.95, // suffix "..."
                0.1, 0.7, 0.0, // possessive
                0.1, 0.7, 0.5, // hyphen duplicate
                0.1, 0.7, 0.9, // em-dash duplicate
                0.5, // unchanged
            ]),
        );
        assert_eq!(d.decorate("cat"), "(cat)");
        assert_eq!(d.decorate("cat"), "\"cat\"");
        assert_eq!(d.decorate("cat"), "cat...");
        assert_eq!(d.decorate("cat"), "cat's");
        assert_eq!(d.decorate("cat"), "cat-cat");
        assert_eq!(d.decorate("cat"), "cat\u{2014}cat");
        assert_eq!(d.decorate("cat"), "cat");
    }

    #[test]
    fn test_number_then_punctuation_stack() {
        let mut opts = options();
        opts.numbers = true;
        opts.punctuation = true;
        let mut d = WordDecorator::with_rng(
            opts,
            ScriptedRng::new(&[0.0, 0.0, 0.7, 0.1, 0.3, 0.0]),
        );
        assert_eq!(d.decorate("word"), "7,");
    }

    #[test]
    fn test_composition_order() {
        let opts = DecorationOptions {
            language: Language::Es,
            accents_enabled: false,
            capitalize: true,
            punctuation: true,
            numbers: true,
        };
        // capitalize hit, number miss, punctuation suffix ","
        let mut d =
            WordDecorator::with_rng(opts, ScriptedRng::new(&[0.0, 0.9, 0.1, 0.3, 0.0]));
        assert_eq!(d.decorate("árbol"), "Arbol,");
    }

    #[test]
    fn test_decorate_all_keeps_order_and_length() {
        let mut d = WordDecorator::new(options());
        let words = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(d.decorate_all(words.clone()), words);
    }
}
