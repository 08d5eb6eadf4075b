//! Tatoeba EN-RU sentence pairs.
//!
//! Rows are `id \t english \t id \t russian`. Each English sentence is
//! tokenized into whole words and every token that is a known catalog
//! word collects the pair. Matching is on exact tokens only, so "house"
//! never matches inside "warehouse".

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use refcatalog_types::{RefExample, SourceSlug, ids};
use tracing::info;
use uuid::Uuid;

use crate::{DatasetError, LoadMode, SourceBuffer};

/// Sentences longer than this (in characters) make poor examples.
pub const MAX_SENTENCE_CHARS: usize = 500;

/// Tatoeba examples sort after dictionary examples on the same sense.
pub const POSITION_OFFSET: u32 = 1000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentencePair {
    pub english: String,
    pub russian: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_lines: usize,
    pub malformed: usize,
    pub skipped_long: usize,
    pub matched_words: usize,
    pub total_pairs: usize,
}

#[derive(Debug, Default)]
pub struct Examples {
    /// Known word to its kept pairs, shortest English sentence first.
    pub by_word: BTreeMap<String, Vec<SentencePair>>,
    pub stats: Stats,
}

pub fn parse(
    path: &Path,
    known: &HashSet<String>,
    max_per_word: usize,
    mode: LoadMode,
) -> Result<Examples, DatasetError> {
    let buf = SourceBuffer::load(path, mode)?;
    let mut out = match_lines(buf.lines(), known, max_per_word);
    out.stats.total_pairs = out.by_word.values().map(Vec::len).sum();
    info!(
        lines = out.stats.total_lines,
        malformed = out.stats.malformed,
        skipped_long = out.stats.skipped_long,
        matched_words = out.stats.matched_words,
        pairs = out.stats.total_pairs,
        "matched tatoeba sentences"
    );
    Ok(out)
}

fn match_lines<'a>(
    lines: impl Iterator<Item = &'a [u8]>,
    known: &HashSet<String>,
    max_per_word: usize,
) -> Examples {
    let mut stats = Stats::default();
    let mut candidates: BTreeMap<String, Vec<SentencePair>> = BTreeMap::new();

    for raw in lines {
        stats.total_lines += 1;
        let Ok(line) = std::str::from_utf8(raw) else {
            stats.malformed += 1;
            continue;
        };
        let mut fields = line.splitn(4, '\t');
        let (Some(_), Some(english), Some(_), Some(russian)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            stats.malformed += 1;
            continue;
        };
        if english.chars().count() > MAX_SENTENCE_CHARS {
            stats.skipped_long += 1;
            continue;
        }
        for token in tokenize(english) {
            if let Some(word) = known.get(&token) {
                candidates
                    .entry(word.clone())
                    .or_default()
                    .push(SentencePair {
                        english: english.to_string(),
                        russian: russian.to_string(),
                    });
            }
        }
    }

    // Ordering is applied only once every line has been matched.
    for pairs in candidates.values_mut() {
        pairs.sort_by_key(|p| p.english.chars().count());
        pairs.truncate(max_per_word);
    }
    candidates.retain(|_, pairs| !pairs.is_empty());
    stats.matched_words = candidates.len();

    Examples {
        by_word: candidates,
        stats,
    }
}

/// Unique lowercase word tokens in order of first appearance.
///
/// Letters accumulate; an apostrophe stays only between a letter and a
/// following letter ("don't", "cat's"), so "'twas" yields "twas". Every
/// other character separates tokens.
pub fn tokenize(sentence: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut flush = |word: &mut String| {
        if !word.is_empty() {
            let token = word.to_lowercase();
            if seen.insert(token.clone()) {
                tokens.push(token);
            }
            word.clear();
        }
    };

    let mut chars = sentence.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_alphabetic() {
            word.push(c);
        } else if is_apostrophe(c)
            && !word.is_empty()
            && chars.peek().is_some_and(|next| next.is_alphabetic())
        {
            word.push('\'');
        } else {
            flush(&mut word);
        }
    }
    flush(&mut word);
    tokens
}

fn is_apostrophe(c: char) -> bool {
    c == '\'' || c == '\u{2019}'
}

impl Examples {
    /// Example rows for words that resolved to an entry with a first sense.
    /// Words missing either mapping are dropped.
    pub fn to_records(
        &self,
        entry_ids: &HashMap<String, Uuid>,
        first_senses: &HashMap<Uuid, Uuid>,
    ) -> Vec<RefExample> {
        let mut records = Vec::new();
        for (word, pairs) in &self.by_word {
            let Some(sense_id) = entry_ids
                .get(word)
                .and_then(|entry| first_senses.get(entry))
                .copied()
            else {
                continue;
            };
            for (i, pair) in pairs.iter().enumerate() {
                let position = POSITION_OFFSET + i as u32;
                records.push(RefExample {
                    id: ids::example_id(sense_id, SourceSlug::Tatoeba, position),
                    ref_sense_id: sense_id,
                    sentence: pair.english.clone(),
                    translation: Some(pair.russian.clone()),
                    source_slug: SourceSlug::Tatoeba,
                    position,
                });
            }
        }
        records
    }
}
