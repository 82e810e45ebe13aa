//! Keyword matching shared by every record source.
//!
//! Keywords containing whitespace are phrases and must appear verbatim in the searchable text.
//! Single-word keywords only need to appear somewhere. A record matches when at least one phrase
//! matches (if any phrases were given) and at least one single token matches (if any tokens were
//! given).

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordBuckets {
	pub phrases: Vec<String>,
	pub tokens: Vec<String>,
}
impl KeywordBuckets {
	pub fn is_empty(&self) -> bool {
		self.phrases.is_empty() && self.tokens.is_empty()
	}
}

pub fn split_keywords(keywords: &[String]) -> KeywordBuckets {
	let mut buckets = KeywordBuckets::default();

	for keyword in keywords {
		let normalized = normalize_keyword(keyword);

		if normalized.is_empty() {
			continue;
		}
		if normalized.contains(' ') {
			buckets.phrases.push(normalized);
		} else {
			buckets.tokens.push(normalized);
		}
	}

	buckets
}

/// Joins the given fields into one lower-cased string, separated by single spaces.
pub fn searchable_text<'a, I>(fields: I) -> String
where
	I: IntoIterator<Item = &'a str>,
{
	let mut out = String::new();

	for field in fields {
		let trimmed = field.trim();

		if trimmed.is_empty() {
			continue;
		}
		if !out.is_empty() {
			out.push(' ');
		}

		out.push_str(&trimmed.to_lowercase());
	}

	out
}

/// `searchable` must already be lower-cased, e.g. built with [`searchable_text`].
pub fn matches_buckets(searchable: &str, buckets: &KeywordBuckets) -> bool {
	let phrase_ok = buckets.phrases.is_empty()
		|| buckets.phrases.iter().any(|phrase| searchable.contains(phrase.as_str()));
	let token_ok = buckets.tokens.is_empty()
		|| buckets.tokens.iter().any(|token| searchable.contains(token.as_str()));

	phrase_ok && token_ok
}

pub fn matches_keywords(searchable: &str, keywords: &[String]) -> bool {
	matches_buckets(searchable, &split_keywords(keywords))
}

/// Keywords (phrases and tokens alike) that occur in `text`, in keyword order.
pub fn matched_keywords<'a>(text: &str, keywords: &'a [String]) -> Vec<&'a str> {
	let lowered = text.to_lowercase();

	keywords
		.iter()
		.map(String::as_str)
		.filter(|keyword| {
			let normalized = normalize_keyword(keyword);

			!normalized.is_empty() && lowered.contains(normalized.as_str())
		})
		.collect()
}

fn normalize_keyword(keyword: &str) -> String {
	keyword.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}
