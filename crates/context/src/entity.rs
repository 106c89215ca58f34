//! Entity tracking: the vocabulary of referents a conversation has built up.
//!
//! Scans message text for three kinds of terms:
//!
//! | Kind | Example | Rule |
//! |------|---------|------|
//! | Proper nouns | `Garland`, `Community Center` | Capitalized words that are not function words; adjacent runs are also kept as a phrase; a lone sentence opener needs a mid-sentence sighting |
//! | Code identifiers | `UserProfile`, `handleSubmit`, `max_tokens` | PascalCase / camelCase / snake_case shapes, plus capitalized names inside code |
//! | Salient nouns | `event`, `volunteers` | Head noun after a determiner, or a content word recurring across messages |
//!
//! The tracker does no pronoun resolution. Messages that keep mentioning
//! tracked terms simply rank higher, so "where should we hold it?" still
//! pulls in the turn that established the venue.
//!
//! Extraction is deterministic: the same messages always yield the same set.
//! Proper nouns and identifiers are kept with the casing they appear with;
//! matching against message text is case-insensitive.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::LazyLock;

use convoctx_core::message::Message;
use serde::{Deserialize, Serialize};
use tracing::debug;

// ── Types ─────────────────────────────────────────────────────────────────

/// The set of tracked entity strings.
///
/// Ordered so that iteration (and anything derived from it) is reproducible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackedEntities(BTreeSet<String>);

impl TrackedEntities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity. Empty strings are ignored.
    pub fn insert(&mut self, entity: impl Into<String>) -> bool {
        let entity = entity.into();
        if entity.trim().is_empty() {
            return false;
        }
        self.0.insert(entity)
    }

    /// Exact (case-sensitive) membership.
    pub fn contains(&self, entity: &str) -> bool {
        self.0.contains(entity)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of distinct tracked entities mentioned in `text`.
    ///
    /// Matching is case-insensitive and respects word boundaries, so
    /// `event` does not match inside `prevent`. All-caps acronyms match
    /// exactly, so `US` does not match `us`.
    pub fn mentions_in(&self, text: &str) -> usize {
        if text.is_empty() || self.is_empty() {
            return 0;
        }
        let haystack = text.to_lowercase();
        self.0
            .iter()
            .filter(|entity| {
                if is_acronym(entity) {
                    contains_word(text, entity)
                } else {
                    contains_word(&haystack, &entity.to_lowercase())
                }
            })
            .count()
    }
}

impl Extend<String> for TrackedEntities {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        for entity in iter {
            self.insert(entity);
        }
    }
}

impl FromIterator<String> for TrackedEntities {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<'a> FromIterator<&'a str> for TrackedEntities {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(str::to_string).collect()
    }
}

impl IntoIterator for TrackedEntities {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

// ── Extraction ────────────────────────────────────────────────────────────

/// Extract tracked entities from an entire conversation.
///
/// Besides the per-message rules, a content word that shows up in two or
/// more different messages is treated as a salient topic noun.
pub fn extract_entities(messages: &[Message]) -> TrackedEntities {
    let mut entities = TrackedEntities::new();
    let mut recurring: BTreeMap<String, usize> = BTreeMap::new();

    for message in messages {
        collect_from_text(&message.content, &mut entities);

        let mut seen_here = BTreeSet::new();
        for segment in split_fences(&message.content) {
            if segment.code {
                continue;
            }
            for word in scan_words(segment.body, false) {
                if word.code {
                    continue;
                }
                let lower = word.text.to_lowercase();
                if is_topic_candidate(&lower) {
                    seen_here.insert(lower);
                }
            }
        }
        for word in seen_here {
            *recurring.entry(word).or_default() += 1;
        }
    }

    // Skip words already tracked under another casing ("Center" / "center").
    let known: HashSet<String> = entities.iter().map(str::to_lowercase).collect();
    entities.extend(
        recurring
            .into_iter()
            .filter(|(word, messages)| *messages >= 2 && !known.contains(word))
            .map(|(word, _)| word),
    );

    debug!(
        messages = messages.len(),
        entities = entities.len(),
        "Extracted tracked entities"
    );
    entities
}

/// Extract tracked entities from a single piece of text.
pub fn extract_entities_from_text(text: &str) -> TrackedEntities {
    let mut entities = TrackedEntities::new();
    collect_from_text(text, &mut entities);
    entities
}

fn collect_from_text(text: &str, out: &mut TrackedEntities) {
    for segment in split_fences(text) {
        let words = scan_words(segment.body, segment.code);
        collect_identifiers(&words, out);
        if !segment.code {
            collect_proper_nouns(&words, out);
            collect_head_nouns(&words, out);
        }
    }
}

fn collect_identifiers(words: &[Word<'_>], out: &mut TrackedEntities) {
    for word in words {
        if is_code_identifier(word.text) || (word.code && is_code_name(word.text)) {
            out.insert(word.text);
        }
    }
}

/// Capitalized runs outside code.
///
/// A lone capitalized word that opens a sentence ("Glad", "Book") is only
/// kept when the same word also shows up capitalized mid-sentence, which
/// inserts it from that position instead. Multi-word runs are kept wherever
/// they start.
fn collect_proper_nouns(words: &[Word<'_>], out: &mut TrackedEntities) {
    let mut run: Vec<&str> = Vec::new();
    let mut run_opens_sentence = false;

    for word in words {
        let lower = word.text.to_lowercase();
        let accepted = !word.code
            && is_capitalized(word.text)
            && !is_stopword(&lower)
            && !(word.sentence_start && looks_inflected(&lower));

        if accepted && (run.is_empty() || word.joined) {
            if run.is_empty() {
                run_opens_sentence = word.sentence_start;
            }
            run.push(word.text);
            continue;
        }

        flush_run(&mut run, run_opens_sentence, out);
        if accepted {
            run_opens_sentence = word.sentence_start;
            run.push(word.text);
        }
    }
    flush_run(&mut run, run_opens_sentence, out);
}

fn flush_run(run: &mut Vec<&str>, opens_sentence: bool, out: &mut TrackedEntities) {
    if run.len() == 1 && opens_sentence {
        run.clear();
        return;
    }
    for word in run.iter() {
        out.insert(*word);
    }
    if run.len() >= 2 {
        out.insert(run.join(" "));
    }
    run.clear();
}

/// The last lowercase content word of a short noun phrase opened by a
/// determiner ("the annual holiday event" → `event`).
fn collect_head_nouns(words: &[Word<'_>], out: &mut TrackedEntities) {
    const MAX_PHRASE: usize = 3;

    for (i, word) in words.iter().enumerate() {
        if word.code || !DETERMINERS.contains(&word.text.to_lowercase().as_str()) {
            continue;
        }

        let mut head = None;
        for next in words[i + 1..].iter().take(MAX_PHRASE) {
            if !next.joined || next.code {
                break;
            }
            let lower = next.text.to_lowercase();
            if lower.chars().count() < 3
                || !lower.chars().all(char::is_alphabetic)
                || is_stopword(&lower)
            {
                break;
            }
            if next.text.starts_with(|c: char| c.is_lowercase()) {
                head = Some(lower);
            }
        }

        if let Some(noun) = head {
            out.insert(noun);
        }
    }
}

// ── Scanning ──────────────────────────────────────────────────────────────

struct Segment<'a> {
    body: &'a str,
    code: bool,
}

/// Split text into prose and fenced-code segments. An unterminated fence
/// runs to the end of the text.
fn split_fences(text: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut in_fence = false;
    let mut start = 0;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if line.trim_start().starts_with("```") {
            if start < offset {
                segments.push(Segment {
                    body: &text[start..offset],
                    code: in_fence,
                });
            }
            in_fence = !in_fence;
            start = offset + line.len();
        }
        offset += line.len();
    }
    if start < text.len() {
        segments.push(Segment {
            body: &text[start..],
            code: in_fence,
        });
    }
    segments
}

struct Word<'a> {
    text: &'a str,
    /// First word of a sentence, line, or clause opened by `:`.
    sentence_start: bool,
    /// Only spaces or tabs separate this word from the previous one.
    joined: bool,
    /// Inside a code fence or an inline code span.
    code: bool,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

fn scan_words(text: &str, in_fence: bool) -> Vec<Word<'_>> {
    let mut words = Vec::new();
    let mut sentence_start = true;
    let mut joined = false;
    let mut inline_code = false;
    let mut chars = text.char_indices().peekable();

    while let Some((start, ch)) = chars.next() {
        if !is_word_char(ch) {
            match ch {
                '.' | '!' | '?' | ':' | '\n' => sentence_start = true,
                '`' => inline_code = !inline_code,
                _ => {}
            }
            if ch != ' ' && ch != '\t' {
                joined = false;
            }
            continue;
        }

        let mut end = start + ch.len_utf8();
        while let Some(&(i, c)) = chars.peek() {
            if is_word_char(c) {
                end = i + c.len_utf8();
                chars.next();
                continue;
            }
            // Keep "Garland's" and "don't" together.
            let mut lookahead = chars.clone();
            lookahead.next();
            let letter_follows = lookahead.peek().is_some_and(|&(_, n)| n.is_alphabetic());
            if is_apostrophe(c) && letter_follows {
                chars.next();
                end = i + c.len_utf8();
                continue;
            }
            break;
        }

        words.push(Word {
            text: strip_possessive(&text[start..end]),
            sentence_start,
            joined,
            code: in_fence || inline_code,
        });
        sentence_start = false;
        joined = true;
    }
    words
}

fn strip_possessive(word: &str) -> &str {
    word.strip_suffix("'s")
        .or_else(|| word.strip_suffix("\u{2019}s"))
        .unwrap_or(word)
}

// ── Shape predicates ──────────────────────────────────────────────────────

/// Capitalized word (`Santa`) or short acronym (`NASA`).
fn is_capitalized(word: &str) -> bool {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    if !first.is_uppercase() {
        return false;
    }
    let rest: Vec<char> = chars.collect();
    if rest.iter().any(|c| c.is_lowercase()) {
        return true;
    }
    (1..=5).contains(&rest.len()) && rest.iter().all(|c| c.is_uppercase())
}

/// `NASA`, `US`: letters only, all uppercase.
fn is_acronym(word: &str) -> bool {
    word.chars().count() >= 2 && word.chars().all(|c| c.is_alphabetic() && c.is_uppercase())
}

/// camelCase, PascalCase with an inner capital, or snake_case.
fn is_code_identifier(word: &str) -> bool {
    if word.chars().count() < 3 || !word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return false;
    }
    let Some(first) = word.chars().next() else {
        return false;
    };
    let has_lower = word.chars().any(|c| c.is_ascii_lowercase());
    let inner_upper = word.chars().skip(1).any(|c| c.is_ascii_uppercase());

    let camel = first.is_ascii_lowercase() && inner_upper;
    let pascal = first.is_ascii_uppercase() && inner_upper && has_lower;
    let snake = word.contains('_')
        && word.chars().any(|c| c.is_ascii_alphabetic())
        && !word.trim_matches('_').is_empty();

    camel || pascal || snake
}

/// Capitalized names inside code (`<Button>`, `struct Venue`).
fn is_code_name(word: &str) -> bool {
    word.chars().count() >= 3
        && word.starts_with(|c: char| c.is_ascii_uppercase())
        && word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !is_stopword(&word.to_lowercase())
}

/// Sentence-initial "Honestly" / "Looking" / "Based" are rarely names.
fn looks_inflected(lower: &str) -> bool {
    lower.chars().count() > 4
        && (lower.ends_with("ly") || lower.ends_with("ing") || lower.ends_with("ed"))
}

fn is_topic_candidate(lower: &str) -> bool {
    lower.chars().count() >= 5 && lower.chars().all(char::is_alphabetic) && !is_stopword(lower)
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(i, _)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + needle.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

// ── Word lists ────────────────────────────────────────────────────────────

const DETERMINERS: &[&str] = &[
    "the", "a", "an", "this", "that", "these", "those", "our", "my", "your", "their", "his",
    "her", "its", "some", "more", "many", "few", "several", "any", "each", "every", "all", "no",
    "enough", "extra",
];

const STOPWORD_LIST: &[&str] = &[
    // articles, determiners, pronouns
    "a", "an", "the", "this", "that", "these", "those", "i", "me", "my", "mine", "we", "us",
    "our", "ours", "you", "your", "yours", "he", "him", "his", "she", "her", "hers", "it", "its",
    "they", "them", "their", "theirs", "there", "here", "what", "which", "who", "whom", "whose",
    "some", "any", "each", "every", "all", "both", "either", "neither", "more", "most", "many",
    "much", "few", "several", "other", "another", "such", "no", "none", "enough", "extra",
    // conjunctions, prepositions, adverbs
    "and", "or", "but", "nor", "so", "yet", "if", "then", "than", "when", "where", "why", "how",
    "because", "while", "until", "unless", "though", "although", "also", "just", "only", "even",
    "very", "really", "too", "now", "again", "still", "already", "maybe", "perhaps", "however",
    "actually", "basically", "instead", "otherwise", "about", "above", "after", "against",
    "along", "around", "before", "behind", "below", "between", "beyond", "during", "for",
    "from", "in", "into", "near", "of", "off", "on", "onto", "out", "over", "per", "since",
    "through", "to", "toward", "towards", "under", "up", "upon", "with", "within", "without",
    "at", "by", "as", "via", "not", "first", "next", "last", "finally", "well", "once",
    // auxiliaries and common verbs
    "is", "are", "was", "were", "be", "been", "being", "am", "do", "does", "did", "done",
    "doing", "have", "has", "had", "having", "can", "could", "will", "would", "shall", "should",
    "may", "might", "must", "need", "needs", "want", "wants", "like", "get", "got", "make",
    "makes", "made", "let", "lets", "use", "using", "used", "add", "create", "update", "change",
    "write", "show", "tell", "give", "find", "help", "build", "fix", "explain", "remove",
    "delete", "keep", "try", "check", "consider", "note", "remember", "think", "know", "see",
    "look", "going", "go", "goes", "come", "take", "put", "set", "sure", "plan", "thing",
    "things", "something", "anything", "everything", "nothing", "someone", "anyone",
    "everyone", "way", "lot", "lots", "kind", "sort",
    // conversational fillers
    "yes", "no", "ok", "okay", "hi", "hello", "hey", "thanks", "thank", "please", "great",
    "good", "nice", "cool", "awesome", "perfect", "sounds", "sorry", "right", "alright",
    "absolutely", "certainly", "definitely", "here's", "that's", "it's", "i'm", "i'd", "i'll",
    "i've", "we're", "we'll", "you're", "you'll", "don't", "doesn't", "didn't", "can't",
    "won't", "let's", "what's", "there's",
];

static STOPWORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOPWORD_LIST.iter().copied().collect());

fn is_stopword(lower: &str) -> bool {
    STOPWORDS.contains(lower.replace('\u{2019}', "'").as_str())
}
