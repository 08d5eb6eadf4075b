//! Shared types for the reference word catalog.
//!
//! Every dataset that feeds the catalog keys its records on the same
//! identity: the normalized word text produced by [`normalize_text`]. The
//! enums here carry the stable string forms used by the store and the
//! data-source registry, and [`records`] holds the rows the seeding
//! pipeline writes.
//!
//! ```rust
//! use refcatalog_types::{RelationType, normalize_text};
//!
//! assert_eq!(normalize_text("  Well-Known   Fact "), "well-known fact");
//! assert!(RelationType::Synonym.is_symmetric());
//! assert!(!RelationType::Hypernym.is_symmetric());
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod ids;
pub mod records;

pub use records::{
    EntryMetadataUpdate, RefDataSource, RefEntry, RefEntrySourceCoverage, RefExample,
    RefPronunciation, RefSense, RefTranslation, RefWordRelation,
};

/// Canonicalize a word so that every source joins on the same key.
///
/// Trims surrounding whitespace, lowercases, and collapses runs of spaces
/// into one. Diacritics, hyphens, and apostrophes pass through untouched.
pub fn normalize_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let lowered = trimmed.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut prev_space = false;
    for c in lowered.chars() {
        if c == ' ' {
            if prev_space {
                continue;
            }
            prev_space = true;
        } else {
            prev_space = false;
        }
        out.push(c);
    }
    out
}

/// Provenance of a catalog row.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceSlug {
    FreeDict,
    Translate,
    Wiktionary,
    Ngsl,
    Nawl,
    Cmu,
    WordNet,
    Tatoeba,
}

impl SourceSlug {
    pub const ALL: [SourceSlug; 8] = [
        SourceSlug::FreeDict,
        SourceSlug::Translate,
        SourceSlug::Wiktionary,
        SourceSlug::Ngsl,
        SourceSlug::Nawl,
        SourceSlug::Cmu,
        SourceSlug::WordNet,
        SourceSlug::Tatoeba,
    ];

    /// Slug as stored in the registry.
    pub fn as_str(self) -> &'static str {
        match self {
            SourceSlug::FreeDict => "freedict",
            SourceSlug::Translate => "translate",
            SourceSlug::Wiktionary => "wiktionary",
            SourceSlug::Ngsl => "ngsl",
            SourceSlug::Nawl => "nawl",
            SourceSlug::Cmu => "cmu",
            SourceSlug::WordNet => "wordnet",
            SourceSlug::Tatoeba => "tatoeba",
        }
    }
}

impl fmt::Display for SourceSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic edge kind between two catalog entries.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationType {
    Synonym,
    Hypernym,
    Antonym,
    Derived,
}

impl RelationType {
    /// Symmetric relations are stored once, smaller word first.
    pub fn is_symmetric(self) -> bool {
        !matches!(self, RelationType::Hypernym)
    }

    /// Put a `(source, target)` pair into its stored orientation.
    ///
    /// Symmetric types swap so the lexicographically smaller word leads;
    /// hypernym edges keep the direction they were extracted with.
    pub fn orient<'a>(self, source: &'a str, target: &'a str) -> (&'a str, &'a str) {
        if self.is_symmetric() && source > target {
            (target, source)
        } else {
            (source, target)
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelationType::Synonym => "synonym",
            RelationType::Hypernym => "hypernym",
            RelationType::Antonym => "antonym",
            RelationType::Derived => "derived",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of checking one source for one entry.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    Fetched,
    NoData,
    Failed,
}

impl fmt::Display for CoverageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CoverageStatus::Fetched => "fetched",
            CoverageStatus::NoData => "no_data",
            CoverageStatus::Failed => "failed",
        })
    }
}

/// Kind of data a registered source contributes.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceCategory {
    Definitions,
    Translations,
    Metadata,
    Pronunciations,
    Relations,
    Examples,
}

/// Common European Framework band.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum CefrLevel {
    A1,
    A2,
    B1,
    B2,
    C1,
    C2,
}

impl CefrLevel {
    /// Band for a 1-based NGSL frequency rank.
    ///
    /// `1..=500` is A1, `..=1200` A2, `..=2000` B1, anything rarer B2.
    pub fn for_frequency_rank(rank: u32) -> Self {
        match rank {
            0..=500 => CefrLevel::A1,
            501..=1200 => CefrLevel::A2,
            1201..=2000 => CefrLevel::B1,
            _ => CefrLevel::B2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CefrLevel::A1 => "A1",
            CefrLevel::A2 => "A2",
            CefrLevel::B1 => "B1",
            CefrLevel::B2 => "B2",
            CefrLevel::C1 => "C1",
            CefrLevel::C2 => "C2",
        }
    }
}

impl fmt::Display for CefrLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grammatical category of a sense.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PartOfSpeech {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Pronoun,
    Preposition,
    Conjunction,
    Interjection,
    Phrase,
    Idiom,
    Other,
}

impl PartOfSpeech {
    /// Map a Wiktionary/Kaikki POS tag, case-insensitively.
    ///
    /// Proper names count as nouns and proverbs as phrases; anything
    /// unrecognised (numerals, affixes, symbols, ...) becomes `Other`.
    pub fn from_wiktionary(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "noun" | "name" => PartOfSpeech::Noun,
            "verb" => PartOfSpeech::Verb,
            "adj" => PartOfSpeech::Adjective,
            "adv" => PartOfSpeech::Adverb,
            "pron" => PartOfSpeech::Pronoun,
            "prep" => PartOfSpeech::Preposition,
            "conj" => PartOfSpeech::Conjunction,
            "intj" => PartOfSpeech::Interjection,
            "phrase" | "proverb" => PartOfSpeech::Phrase,
            "idiom" => PartOfSpeech::Idiom,
            _ => PartOfSpeech::Other,
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PartOfSpeech::Noun => "NOUN",
            PartOfSpeech::Verb => "VERB",
            PartOfSpeech::Adjective => "ADJECTIVE",
            PartOfSpeech::Adverb => "ADVERB",
            PartOfSpeech::Pronoun => "PRONOUN",
            PartOfSpeech::Preposition => "PREPOSITION",
            PartOfSpeech::Conjunction => "CONJUNCTION",
            PartOfSpeech::Interjection => "INTERJECTION",
            PartOfSpeech::Phrase => "PHRASE",
            PartOfSpeech::Idiom => "IDIOM",
            PartOfSpeech::Other => "OTHER",
        })
    }
}

/// Accent a pronunciation was recorded for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Region {
    US,
    UK,
}

impl Region {
    /// Derive a region from Wiktionary sound tags; first matching tag wins.
    pub fn from_tags<S: AsRef<str>>(tags: &[S]) -> Option<Self> {
        tags.iter().find_map(|tag| {
            let tag = tag.as_ref();
            if tag == "US" || tag == "General-American" || tag.contains("GenAm") {
                Some(Region::US)
            } else if tag == "UK" || tag == "Received-Pronunciation" || tag.contains("RP") {
                Some(Region::UK)
            } else {
                None
            }
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Region::US => "US",
            Region::UK => "UK",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a slug string names no known source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnknownSlug(pub String);

impl fmt::Display for UnknownSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown source slug: {}", self.0)
    }
}

impl std::error::Error for UnknownSlug {}

impl FromStr for SourceSlug {
    type Err = UnknownSlug;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceSlug::ALL
            .into_iter()
            .find(|slug| slug.as_str() == s)
            .ok_or_else(|| UnknownSlug(s.to_string()))
    }
}
