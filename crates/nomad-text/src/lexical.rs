use std::collections::BTreeSet;
use tantivy::tokenizer::{TextAnalyzer, TokenStream};

use crate::analyzer::build_analyzer;

/// Distinct analyzed terms of a text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet(BTreeSet<String>);

impl TokenSet {
	pub fn len(&self) -> usize { self.0.len() }

	pub fn is_empty(&self) -> bool { self.0.is_empty() }

	pub fn contains(&self, term: &str) -> bool { self.0.contains(term) }

	pub fn intersection_len(&self, other: &TokenSet) -> usize { self.0.intersection(&other.0).count() }
}

/// Token-set overlap scorer: the fraction of query terms found in the
/// candidate text, in `[0, 1]`.
#[derive(Clone)]
pub struct LexicalScorer {
	analyzer: TextAnalyzer,
}

impl Default for LexicalScorer {
	fn default() -> Self { Self { analyzer: build_analyzer() } }
}

impl LexicalScorer {
	pub fn new() -> Self { Self::default() }

	pub fn tokens(&self, text: &str) -> TokenSet {
		let mut analyzer = self.analyzer.clone();
		let mut stream = analyzer.token_stream(text);
		let mut terms = BTreeSet::new();
		while stream.advance() { terms.insert(stream.token().text.clone()); }
		TokenSet(terms)
	}

	/// `|Q ∩ C| / |Q|`; an empty query scores 0 against everything.
	pub fn overlap(&self, query: &TokenSet, candidate: &TokenSet) -> f32 {
		if query.is_empty() { return 0.0; }
		query.intersection_len(candidate) as f32 / query.len() as f32
	}

	pub fn score(&self, query: &str, candidate: &str) -> f32 {
		self.overlap(&self.tokens(query), &self.tokens(candidate))
	}
}
