//! Rule-based query analysis.
//!
//! Extracts quoted phrases, named participants, a date range, and intent cues from a raw query,
//! then keeps the remaining content words as keywords. Everything is lower-cased on the way out.

use std::collections::BTreeSet;

use regex::Regex;
use time::{Date, Duration, Month};

use crate::query::{AnalyzedQuery, DateRange, Intent, SELF_PARTICIPANT};

pub const SIGNAL_ACTION_ITEMS: &str = "action_items";
pub const SIGNAL_SCHEDULE: &str = "schedule";
pub const SIGNAL_SELF: &str = "self";

const QUOTED_PHRASE: &str = r#""([^"]+)""#;
const NAMED_WITH: &str = r"(?i:\b(?:met|meet|meeting|meetings|call|calls|sync|syncs|synced|chat|chats|chatted|talked|spoke|1:1|1:1s|one-on-one|one-on-ones)\s+with)\s+([A-Z][\w'.-]*(?:\s+[A-Z][\w'.-]*)*)";
const LOWER_WITH: &str = r"(?i)\b(?:met|meet|meeting|meetings|call|calls|sync|syncs|synced|chat|chats|chatted|talked|spoke|1:1|1:1s|one-on-one|one-on-ones)\s+with\s+([a-z][\w'.-]*)";
const NAMED_OWNER: &str = r"(?i:\b(?:assigned\s+to|owned\s+by|from))\s+([A-Z][\w'.-]*(?:\s+[A-Z][\w'.-]*)*)";
const LAST_N_DAYS: &str = r"\b(?:last|past|previous)\s+(\d{1,3})\s+days?\b";
const NEXT_N_DAYS: &str = r"\b(?:next|coming)\s+(\d{1,3})\s+days?\b";
const SINCE_DATE: &str = r"\bsince\s+(\d{4}-\d{2}-\d{2})\b";
const ON_DATE: &str = r"\b(?:on\s+)?(\d{4}-\d{2}-\d{2})\b";

const ACTION_CUES: &[&str] = &[
	"action items",
	"action item",
	"to-dos",
	"to-do",
	"todos",
	"todo",
	"tasks",
	"task",
	"follow-ups",
	"follow-up",
	"follow ups",
	"follow up",
	"open items",
	"deliverables",
];
const ACTION_FILLERS: &[&str] = &["open", "pending", "outstanding", "remaining", "assigned"];
const SCHEDULE_CUES: &[&str] =
	&["schedule", "calendar", "upcoming", "agenda", "coming up", "next meeting", "next meetings"];
const SELF_WORDS: &[&str] = &["my", "me", "mine", "myself", "i"];
const NOT_NAMES: &[&str] = &[
	"monday",
	"tuesday",
	"wednesday",
	"thursday",
	"friday",
	"saturday",
	"sunday",
	"january",
	"february",
	"march",
	"april",
	"may",
	"june",
	"july",
	"august",
	"september",
	"october",
	"november",
	"december",
	"today",
	"tomorrow",
	"yesterday",
	"last",
	"next",
	"this",
	"me",
	"i",
	"my",
	"us",
	"the",
	"them",
	"everyone",
];
const STOPWORDS: &[&str] = &[
	"a", "about", "after", "all", "am", "an", "and", "any", "anything", "are", "as", "at", "be",
	"been", "before", "being", "but", "by", "call", "calls", "can", "could", "decide", "decided",
	"decision", "decisions", "did", "discuss", "discussed", "do", "does", "done", "during",
	"everything", "find", "for", "from", "get", "give", "had", "happen", "happened", "has", "have",
	"he", "her", "here", "his", "how", "i", "in", "into", "is", "it", "its", "last", "latest",
	"list", "look", "me", "meet", "meeting", "meetings", "mention", "mentioned", "met", "mine",
	"my", "myself", "need", "next", "notes", "of", "on", "or", "our", "ours", "past", "please",
	"recap", "recent", "recently", "regarding", "said", "say", "search", "see", "she", "should",
	"show", "some", "something", "summary", "summaries", "sync", "syncs", "talk", "talked", "tell",
	"that", "the", "their", "them", "there", "these", "they", "things", "this", "those", "to",
	"up", "us", "want", "was", "we", "were", "what", "whats", "when", "where", "which", "who",
	"why", "will", "with", "would", "you", "your",
];

/// Analyzes `raw` relative to `today`. Never fails; unrecognized input yields a `general` query
/// with whatever keywords survive stopword removal.
pub fn analyze(raw: &str, today: Date) -> AnalyzedQuery {
	let mut working = raw.trim().to_string();
	let mut keywords = Vec::new();
	let mut participants = BTreeSet::new();
	let mut signals = Vec::new();
	let mut names = Vec::new();

	for phrase in take_captures(&mut working, QUOTED_PHRASE, |_| true) {
		keywords.push(phrase.to_lowercase());
	}

	for pattern in [NAMED_WITH, NAMED_OWNER, LOWER_WITH] {
		for name in take_captures(&mut working, pattern, is_plausible_name) {
			let name = normalize_name(&name);

			if participants.insert(name.clone()) {
				names.push(name);
			}
		}
	}

	let mut lowered = working.to_lowercase();
	let date_range = extract_date_range(&mut lowered, today, &mut signals);
	let action = take_cues(&mut lowered, ACTION_CUES);
	let schedule = take_cues(&mut lowered, SCHEDULE_CUES)
		|| date_range.is_some_and(|range| range.start.is_some_and(|start| start > today));

	if action {
		signals.push(SIGNAL_ACTION_ITEMS.to_string());

		take_cues(&mut lowered, ACTION_FILLERS);
	}
	if schedule {
		signals.push(SIGNAL_SCHEDULE.to_string());
	}

	let tokens = tokenize(&lowered);

	if tokens.iter().any(|token| SELF_WORDS.contains(&token.as_str())) {
		participants.insert(SELF_PARTICIPANT.to_string());
		signals.push(SIGNAL_SELF.to_string());
	}

	let content_tokens = tokens
		.into_iter()
		.filter(|token| token.len() >= 2 && !STOPWORDS.contains(&token.as_str()))
		.collect::<Vec<_>>();
	let intent = if action {
		Intent::ActionItems
	} else if schedule {
		Intent::Schedule
	} else if !names.is_empty() && content_tokens.is_empty() && keywords.is_empty() {
		Intent::ParticipantLookup
	} else {
		Intent::General
	};

	keywords.extend(names);
	keywords.extend(content_tokens);

	AnalyzedQuery { intent, keywords, participants, date_range, signals }.normalized()
}

fn extract_date_range(text: &mut String, today: Date, signals: &mut Vec<String>) -> Option<DateRange> {
	if let Some(days) = take_first_capture(text, LAST_N_DAYS).and_then(|n| n.parse::<i64>().ok()) {
		signals.push("date:last_n_days".to_string());

		return Some(DateRange::between(today - Duration::days(days), today));
	}
	if let Some(days) = take_first_capture(text, NEXT_N_DAYS).and_then(|n| n.parse::<i64>().ok()) {
		signals.push("date:next_n_days".to_string());

		return Some(DateRange::between(today, today + Duration::days(days)));
	}
	if let Some(start) =
		take_first_capture(text, SINCE_DATE).and_then(|raw| crate::time_serde::date::parse(&raw).ok())
	{
		signals.push("date:since".to_string());

		return Some(DateRange::new(Some(start), None));
	}
	if let Some(day) =
		take_first_capture(text, ON_DATE).and_then(|raw| crate::time_serde::date::parse(&raw).ok())
	{
		signals.push("date:exact".to_string());

		return Some(DateRange::between(day, day));
	}

	let week_start = today - Duration::days(i64::from(today.weekday().number_days_from_monday()));
	let phrases: [(&str, Option<DateRange>); 11] = [
		("yesterday", today.previous_day().map(|day| DateRange::between(day, day))),
		("today", Some(DateRange::between(today, today))),
		("tonight", Some(DateRange::between(today, today))),
		("tomorrow", today.next_day().map(|day| DateRange::between(day, day))),
		("this week", Some(DateRange::between(week_start, week_start + Duration::days(6)))),
		("last week", Some(DateRange::between(today - Duration::days(7), today))),
		("past week", Some(DateRange::between(today - Duration::days(7), today))),
		(
			"next week",
			Some(DateRange::between(
				week_start + Duration::days(7),
				week_start + Duration::days(13),
			)),
		),
		("this month", month_bounds(today)),
		("last month", Some(DateRange::between(today - Duration::days(30), today))),
		("next month", next_month_start(today).and_then(month_bounds)),
	];

	for (phrase, range) in phrases {
		if take_cues(text, &[phrase]) {
			signals.push(format!("date:{}", phrase.replace(' ', "_")));

			return range;
		}
	}

	None
}

fn month_bounds(date: Date) -> Option<DateRange> {
	let first = Date::from_calendar_date(date.year(), date.month(), 1).ok()?;
	let last = next_month_start(date)?.previous_day()?;

	Some(DateRange::between(first, last))
}

fn next_month_start(date: Date) -> Option<Date> {
	let (year, month) = match date.month() {
		Month::December => (date.year() + 1, Month::January),
		month => (date.year(), month.next()),
	};

	Date::from_calendar_date(year, month, 1).ok()
}

fn normalize_name(raw: &str) -> String {
	raw.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

fn is_plausible_name(raw: &str) -> bool {
	let name = normalize_name(raw);

	!name.is_empty() && !NOT_NAMES.contains(&name.as_str())
}

/// Removes every match of `pattern` whose first capture group passes `accept`, returning those
/// captures. Rejected matches stay in `text`.
fn take_captures(text: &mut String, pattern: &str, accept: impl Fn(&str) -> bool) -> Vec<String> {
	let Ok(re) = Regex::new(pattern) else { return Vec::new() };
	let mut found = Vec::new();
	let mut kept = String::with_capacity(text.len());
	let mut last = 0;

	for caps in re.captures_iter(text) {
		let (Some(whole), Some(value)) = (caps.get(0), caps.get(1)) else { continue };
		let value = value.as_str().trim();

		if !accept(value) {
			continue;
		}

		kept.push_str(&text[last..whole.start()]);
		kept.push(' ');

		last = whole.end();

		found.push(value.to_string());
	}

	kept.push_str(&text[last..]);

	*text = kept;

	found
}

fn take_first_capture(text: &mut String, pattern: &str) -> Option<String> {
	let re = Regex::new(pattern).ok()?;
	let (range, value) = {
		let caps = re.captures(text)?;
		let whole = caps.get(0)?;

		(whole.range(), caps.get(1)?.as_str().to_string())
	};

	text.replace_range(range, " ");

	Some(value)
}

/// Removes whole-word occurrences of each cue from `text`. Returns whether any cue was present.
fn take_cues(text: &mut String, cues: &[&str]) -> bool {
	let mut found = false;

	for cue in cues {
		let pattern = format!(r"\b{}\b", regex::escape(cue));
		let Ok(re) = Regex::new(&pattern) else { continue };

		if re.is_match(text) {
			*text = re.replace_all(text, " ").into_owned();
			found = true;
		}
	}

	found
}

fn tokenize(text: &str) -> Vec<String> {
	text.split(|ch: char| !ch.is_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(str::to_string)
		.collect()
}
