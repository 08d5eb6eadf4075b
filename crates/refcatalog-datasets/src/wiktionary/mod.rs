//! Kaikki.org English Wiktionary dump (JSON Lines).
//!
//! The dump is far larger than the catalog, so parsing runs in two passes
//! over one buffer. The scoring pass rates every English line with
//! [`score_entry`] and sums the scores per normalized word; core words
//! get [`CORE_WORD_BONUS`]. The top `top_n` words are selected, core
//! words always included. The parsing pass then fully decodes only the
//! selected words, merging all lines of a word into one [`ParsedEntry`].

use std::collections::{HashMap, HashSet};
use std::path::Path;

use refcatalog_types::{Region, normalize_text};
use serde::Deserialize;
use tracing::{debug, info};

use crate::{DatasetError, LoadMode, SourceBuffer};

mod clean;
mod domain;
mod score;

pub use clean::{MAX_DEFINITION_BYTES, dedup_strings, strip_markup, truncate_definition};
pub use domain::{WiktionaryRecords, to_records};
pub use score::{CORE_WORD_BONUS, score_entry};

/// All selected lines for one normalized word.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedEntry {
    /// Headword as spelled on the first line seen.
    pub word: String,
    /// One group per source line, in file order.
    pub pos_groups: Vec<PosGroup>,
    pub sounds: Vec<Sound>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PosGroup {
    pub pos: String,
    pub senses: Vec<ParsedSense>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedSense {
    pub glosses: Vec<String>,
    pub examples: Vec<String>,
    /// Russian only, deduplicated.
    pub translations: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Sound {
    pub ipa: String,
    pub region: Option<Region>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_lines: usize,
    pub malformed_lines: usize,
    pub english_lines: usize,
    pub entries_parsed: usize,
}

#[derive(Debug, Default)]
pub struct Dictionary {
    pub entries: Vec<ParsedEntry>,
    pub stats: Stats,
}

#[derive(Debug, Default, Deserialize)]
pub struct KaikkiEntry {
    #[serde(default)]
    pub word: String,
    #[serde(default)]
    pub pos: String,
    #[serde(default)]
    pub lang: String,
    #[serde(default)]
    pub senses: Vec<KaikkiSense>,
    #[serde(default)]
    pub sounds: Vec<KaikkiSound>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KaikkiSense {
    #[serde(default)]
    pub glosses: Vec<String>,
    #[serde(default)]
    pub examples: Vec<KaikkiExample>,
    #[serde(default)]
    pub translations: Vec<KaikkiTranslation>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KaikkiExample {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct KaikkiTranslation {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub word: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct KaikkiSound {
    #[serde(default)]
    pub ipa: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub fn parse(
    path: &Path,
    core_words: &HashSet<String>,
    top_n: usize,
    mode: LoadMode,
) -> Result<Dictionary, DatasetError> {
    let buf = SourceBuffer::load(path, mode)?;

    let (scores, mut stats) = scoring_pass(&buf, core_words);
    if scores.is_empty() {
        info!(lines = stats.total_lines, "no english entries in wiktionary dump");
        return Ok(Dictionary {
            entries: Vec::new(),
            stats,
        });
    }

    let selected = select_top_n(&scores, core_words, top_n);
    let entries = parsing_pass(&buf, &selected);
    stats.entries_parsed = entries.len();
    info!(
        lines = stats.total_lines,
        malformed = stats.malformed_lines,
        english = stats.english_lines,
        scored = scores.len(),
        selected = selected.len(),
        parsed = stats.entries_parsed,
        "parsed wiktionary dump"
    );
    Ok(Dictionary { entries, stats })
}

fn decode(line: &[u8]) -> Option<KaikkiEntry> {
    serde_json::from_slice(line).ok()
}

fn scoring_pass(buf: &SourceBuffer, core_words: &HashSet<String>) -> (HashMap<String, f64>, Stats) {
    let mut scores: HashMap<String, f64> = HashMap::new();
    let mut stats = Stats::default();

    for line in buf.lines() {
        stats.total_lines += 1;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let Some(entry) = decode(line) else {
            stats.malformed_lines += 1;
            continue;
        };
        if entry.lang != "English" {
            continue;
        }
        stats.english_lines += 1;
        let word = normalize_text(&entry.word);
        if word.is_empty() {
            continue;
        }
        *scores.entry(word).or_default() += score_entry(&entry);
    }

    for core in core_words {
        if let Some(score) = scores.get_mut(&normalize_text(core)) {
            *score += CORE_WORD_BONUS;
        }
    }
    (scores, stats)
}

/// Core words present in the dump first, then best scores until `top_n`.
/// Equal scores are ordered by word so selection is reproducible.
fn select_top_n(
    scores: &HashMap<String, f64>,
    core_words: &HashSet<String>,
    top_n: usize,
) -> HashSet<String> {
    let mut ranked: Vec<(&String, f64)> = scores.iter().map(|(w, s)| (w, *s)).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut selected: HashSet<String> = core_words
        .iter()
        .map(|w| normalize_text(w))
        .filter(|w| scores.contains_key(w))
        .collect();
    for (word, _) in ranked {
        if selected.len() >= top_n {
            break;
        }
        selected.insert(word.clone());
    }
    selected
}

fn parsing_pass(buf: &SourceBuffer, selected: &HashSet<String>) -> Vec<ParsedEntry> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<ParsedEntry> = Vec::new();

    for line in buf.lines() {
        let Some(entry) = decode(line) else {
            continue;
        };
        if entry.lang != "English" {
            continue;
        }
        let word = normalize_text(&entry.word);
        if !selected.contains(&word) {
            continue;
        }

        let group = build_pos_group(&entry);
        let sounds = build_sounds(&entry);
        match index.get(&word) {
            Some(&i) => {
                entries[i].pos_groups.push(group);
                merge_sounds(&mut entries[i].sounds, sounds);
            }
            None => {
                index.insert(word, entries.len());
                let mut parsed = ParsedEntry {
                    word: entry.word.clone(),
                    pos_groups: vec![group],
                    sounds: Vec::new(),
                };
                merge_sounds(&mut parsed.sounds, sounds);
                entries.push(parsed);
            }
        }
    }
    debug!(entries = entries.len(), "wiktionary parsing pass done");
    entries
}

fn build_pos_group(entry: &KaikkiEntry) -> PosGroup {
    let senses = entry
        .senses
        .iter()
        .filter_map(|sense| {
            let glosses: Vec<String> = sense
                .glosses
                .iter()
                .map(|g| truncate_definition(strip_markup(g), MAX_DEFINITION_BYTES))
                .filter(|g| !g.is_empty())
                .collect();
            if glosses.is_empty() {
                return None;
            }
            let examples = sense
                .examples
                .iter()
                .map(|ex| strip_markup(&ex.text))
                .filter(|ex| !ex.is_empty())
                .collect();
            let translations = dedup_strings(
                sense
                    .translations
                    .iter()
                    .filter(|t| t.code == "ru" && !t.word.is_empty())
                    .map(|t| t.word.clone()),
            );
            Some(ParsedSense {
                glosses,
                examples,
                translations,
            })
        })
        .collect();
    PosGroup {
        pos: entry.pos.clone(),
        senses,
    }
}

/// Phonemic (`/…/`) transcriptions only; phonetic `[…]` ones are dropped.
fn build_sounds(entry: &KaikkiEntry) -> Vec<Sound> {
    entry
        .sounds
        .iter()
        .filter(|s| s.ipa.starts_with('/'))
        .map(|s| Sound {
            ipa: s.ipa.clone(),
            region: Region::from_tags(&s.tags),
        })
        .collect()
}

fn merge_sounds(existing: &mut Vec<Sound>, incoming: Vec<Sound>) {
    for sound in incoming {
        if !existing.contains(&sound) {
            existing.push(sound);
        }
    }
}
