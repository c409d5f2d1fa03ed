pub mod core;
pub mod decorator;
pub mod source;

pub use core::Language;
pub use decorator::{DecorationOptions, WordDecorator, WordTransform};
pub use source::{EmbeddedWordSource, HttpWordSource, WordList, WordSource, REFILL_COUNT};
