//! nomad-text
//!
//! Lexical scoring used when no sentence encoder is available. Text is run
//! through a tantivy analyzer chain (simple tokenizer, lowercasing, English
//! stop words) and compared as token sets.
pub mod analyzer;
pub mod lexical;

pub use analyzer::build_analyzer;
pub use lexical::{LexicalScorer, TokenSet};
