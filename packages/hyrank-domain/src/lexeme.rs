//! Lexical analysis shared by stored documents and incoming queries.
//!
//! A document's title and body are analyzed once into [`LexicalVector`] counts. Queries run through
//! the same [`analyze`] so both sides agree on stemming and stop words.

use std::collections::HashMap;

use unicode_segmentation::UnicodeSegmentation;

use hyrank_config::LexicalMatch;

/// Title matches count fully, body matches 0.4. Mirrors weights A and B of the stored tsvector.
pub const TITLE_WEIGHT: f64 = 1.0;
pub const BODY_WEIGHT: f64 = 0.4;

const MIN_LEXEME_CHARS: usize = 2;
const STOP_WORDS: &[&str] = &[
	"a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do",
	"does", "did", "will", "would", "could", "should", "may", "might", "must", "shall", "can",
	"need", "to", "of", "in", "for", "on", "with", "at", "by", "from", "as", "into", "through",
	"during", "before", "after", "above", "below", "between", "under", "over", "again", "further",
	"then", "once", "here", "there", "when", "where", "why", "how", "all", "each", "few", "more",
	"most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too",
	"very", "just", "and", "but", "if", "or", "because", "until", "while", "about", "against",
	"this", "that", "these", "those", "what", "which", "who", "whom", "i", "me", "my", "we", "our",
	"you", "your", "he", "him", "his", "she", "her", "it", "its", "they", "them", "their",
];
// Checked in order; the first suffix whose removal leaves at least three characters wins.
const SUFFIXES: &[(&str, &str)] = &[
	("ational", "ate"),
	("ization", "ize"),
	("ations", ""),
	("ation", ""),
	("ments", ""),
	("ment", ""),
	("ings", ""),
	("ing", ""),
	("ies", "y"),
	("ied", "y"),
	("ed", ""),
	("es", ""),
	("ly", ""),
	("s", ""),
];

/// Splits text into normalized lexemes, keeping duplicates and order.
pub fn analyze(text: &str) -> Vec<String> {
	text.unicode_words()
		.map(str::to_lowercase)
		.filter(|word| word.chars().count() >= MIN_LEXEME_CHARS)
		.filter(|word| !is_stop_word(word))
		.map(|word| stem(&word))
		.collect()
}

/// Distinct query lexemes in first-seen order. Empty when the text is only stop words or
/// punctuation, which callers treat as "no lexical matches".
pub fn query_lexemes(text: &str) -> Vec<String> {
	let mut out: Vec<String> = Vec::new();

	for lexeme in analyze(text) {
		if !out.contains(&lexeme) {
			out.push(lexeme);
		}
	}

	out
}

pub fn is_stop_word(word: &str) -> bool {
	STOP_WORDS.contains(&word)
}

/// Light suffix stemmer for lowercase ASCII words. Anything containing digits, punctuation or
/// non-ASCII letters passes through untouched.
pub fn stem(word: &str) -> String {
	if word.len() <= 3 || !word.chars().all(|c| c.is_ascii_alphabetic()) {
		return word.to_string();
	}

	let mut out = word.to_string();

	for (suffix, replacement) in SUFFIXES {
		if let Some(base) = word.strip_suffix(suffix)
			&& base.len() >= 3
		{
			out = format!("{base}{replacement}");

			break;
		}
	}

	if out.len() > 4 && out.ends_with('e') {
		out.pop();
	}

	let bytes = out.as_bytes();

	if bytes.len() > 3
		&& bytes[bytes.len() - 1] == bytes[bytes.len() - 2]
		&& !b"aeioulsz".contains(&bytes[bytes.len() - 1])
	{
		out.pop();
	}

	out
}

/// Per-field lexeme counts for one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LexicalVector {
	title: HashMap<String, u32>,
	body: HashMap<String, u32>,
}
impl LexicalVector {
	pub fn new(title: &str, body: &str) -> Self {
		Self { title: count(analyze(title)), body: count(analyze(body)) }
	}

	pub fn title_frequency(&self, lexeme: &str) -> u32 {
		self.title.get(lexeme).copied().unwrap_or(0)
	}

	pub fn body_frequency(&self, lexeme: &str) -> u32 {
		self.body.get(lexeme).copied().unwrap_or(0)
	}

	/// Relevance of the document to already analyzed query lexemes, or `None` when it does not
	/// match under `mode`. A matched document always scores above zero.
	pub fn relevance(&self, lexemes: &[String], mode: LexicalMatch) -> Option<f64> {
		if lexemes.is_empty() {
			return None;
		}

		let mut score = 0.0;
		let mut matched = 0;

		for lexeme in lexemes {
			let title = self.title_frequency(lexeme);
			let body = self.body_frequency(lexeme);

			if title == 0 && body == 0 {
				continue;
			}

			matched += 1;
			score += TITLE_WEIGHT * f64::from(title) + BODY_WEIGHT * f64::from(body);
		}

		let accepted = match mode {
			LexicalMatch::Any => matched > 0,
			LexicalMatch::All => matched == lexemes.len(),
		};

		accepted.then_some(score)
	}
}

fn count(lexemes: Vec<String>) -> HashMap<String, u32> {
	let mut counts = HashMap::new();

	for lexeme in lexemes {
		*counts.entry(lexeme).or_insert(0) += 1;
	}

	counts
}
