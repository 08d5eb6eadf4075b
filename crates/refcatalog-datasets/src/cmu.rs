//! CMU Pronouncing Dictionary.
//!
//! Lines look like `HOUSE(2)  HH AW1 S`. Stress digits are dropped and
//! each ARPAbet phoneme is mapped to IPA; the result is wrapped in
//! slashes. CMU describes General American, so every transcription is
//! tagged US.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use refcatalog_types::{RefPronunciation, Region, SourceSlug, ids, normalize_text};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{DatasetError, LoadMode, SourceBuffer};

/// A transcription and which numbered variant it came from (0 = primary).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transcription {
    pub ipa: String,
    pub variant: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_lines: usize,
    pub comment_lines: usize,
    pub parsed_lines: usize,
    pub unique_words: usize,
}

#[derive(Debug, Default)]
pub struct Pronunciations {
    /// Normalized word to its transcriptions in file order.
    pub by_word: BTreeMap<String, Vec<Transcription>>,
    pub stats: Stats,
}

pub fn parse(path: &Path, mode: LoadMode) -> Result<Pronunciations, DatasetError> {
    let buf = SourceBuffer::load(path, mode)?;
    let mut out = Pronunciations::default();

    for raw in buf.lines() {
        out.stats.total_lines += 1;
        if raw.starts_with(b";;;") {
            out.stats.comment_lines += 1;
            continue;
        }
        let Ok(line) = std::str::from_utf8(raw) else {
            continue;
        };
        let Some((word, transcription)) = parse_line(line) else {
            continue;
        };
        out.stats.parsed_lines += 1;
        out.by_word.entry(word).or_default().push(transcription);
    }

    out.stats.unique_words = out.by_word.len();
    info!(
        lines = out.stats.total_lines,
        comments = out.stats.comment_lines,
        words = out.stats.unique_words,
        "parsed cmu dictionary"
    );
    Ok(out)
}

/// Rows ready to write, plus how many variants collapsed into an
/// earlier transcription of the same word.
#[derive(Debug, Default)]
pub struct Records {
    pub rows: Vec<RefPronunciation>,
    pub duplicates: usize,
}

impl Pronunciations {
    /// Rows for every word that resolved to an entry id, one per distinct
    /// (entry, transcription, region).
    pub fn to_records(&self, entry_ids: &HashMap<String, Uuid>) -> Records {
        let mut out = Records::default();
        let mut seen = HashSet::new();
        for (word, transcriptions) in &self.by_word {
            let Some(&entry_id) = entry_ids.get(word) else {
                continue;
            };
            for t in transcriptions {
                let id =
                    ids::pronunciation_id(entry_id, SourceSlug::Cmu, &t.ipa, Some(Region::US));
                if !seen.insert(id) {
                    debug!(
                        word,
                        variant = t.variant,
                        ipa = %t.ipa,
                        "variant repeats a transcription"
                    );
                    out.duplicates += 1;
                    continue;
                }
                out.rows.push(RefPronunciation {
                    id,
                    ref_entry_id: entry_id,
                    transcription: Some(t.ipa.clone()),
                    audio_url: None,
                    region: Some(Region::US),
                    source_slug: SourceSlug::Cmu,
                });
            }
        }
        out
    }
}

/// Split a dictionary line into normalized word and transcription.
fn parse_line(line: &str) -> Option<(String, Transcription)> {
    let line = match line.find(" #") {
        Some(idx) => &line[..idx],
        None => line,
    };
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (raw_word, phonemes) = line.split_once(char::is_whitespace)?;
    let phonemes = phonemes.trim();
    if phonemes.is_empty() {
        return None;
    }
    let (word, variant) = split_variant(raw_word);
    if word.is_empty() {
        return None;
    }
    Some((
        word,
        Transcription {
            ipa: to_ipa(phonemes.split_whitespace()),
            variant,
        },
    ))
}

/// `HOUSE(2)` is variant 1 of `house`; malformed suffixes keep the raw word.
fn split_variant(raw: &str) -> (String, u32) {
    let parsed = raw.split_once('(').and_then(|(word, rest)| {
        let n: u32 = rest.strip_suffix(')')?.parse().ok()?;
        Some((word, n.saturating_sub(1)))
    });
    match parsed {
        Some((word, variant)) => (normalize_text(word), variant),
        None => (normalize_text(raw), 0),
    }
}

fn to_ipa<'a>(phonemes: impl Iterator<Item = &'a str>) -> String {
    let mut ipa = String::from("/");
    for phoneme in phonemes {
        let bare = phoneme.trim_end_matches(['0', '1', '2']);
        if let Some(symbol) = arpabet(bare) {
            ipa.push_str(symbol);
        }
    }
    ipa.push('/');
    ipa
}

fn arpabet(phoneme: &str) -> Option<&'static str> {
    Some(match phoneme {
        "AA" => "ɑ",
        "AE" => "æ",
        "AH" => "ʌ",
        "AO" => "ɔ",
        "AW" => "aʊ",
        "AY" => "aɪ",
        "B" => "b",
        "CH" => "tʃ",
        "D" => "d",
        "DH" => "ð",
        "EH" => "ɛ",
        "ER" => "ɝ",
        "EY" => "eɪ",
        "F" => "f",
        "G" => "ɡ",
        "HH" => "h",
        "IH" => "ɪ",
        "IY" => "i",
        "JH" => "dʒ",
        "K" => "k",
        "L" => "l",
        "M" => "m",
        "N" => "n",
        "NG" => "ŋ",
        "OW" => "oʊ",
        "OY" => "ɔɪ",
        "P" => "p",
        "R" => "ɹ",
        "S" => "s",
        "SH" => "ʃ",
        "T" => "t",
        "TH" => "θ",
        "UH" => "ʊ",
        "UW" => "u",
        "V" => "v",
        "W" => "w",
        "Y" => "j",
        "Z" => "z",
        "ZH" => "ʒ",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_primary_and_variants() {
        let (word, t) = parse_line("HOUSE  HH AW1 S").unwrap();
        assert_eq!(word, "house");
        assert_eq!(t, Transcription { ipa: "/haʊs/".into(), variant: 0 });

        let (word, t) = parse_line("HOUSE(2)  HH AW1 Z").unwrap();
        assert_eq!(word, "house");
        assert_eq!(t.ipa, "/haʊz/");
        assert_eq!(t.variant, 1);
    }

    #[test]
    fn single_space_and_trailing_comments() {
        let (word, t) = parse_line("TOMATO T AH0 M EY1 T OW2 # us").unwrap();
        assert_eq!(word, "tomato");
        assert_eq!(t.ipa, "/tʌmeɪtoʊ/");

        // Punctuation headwords are real entries, not comments.
        let (word, _) = parse_line("#HASH-MARK  HH AE1 SH M AA2 R K").unwrap();
        assert_eq!(word, "#hash-mark");
    }

    #[test]
    fn unknown_phonemes_are_dropped() {
        let (_, t) = parse_line("ODD  AA1 XX D").unwrap();
        assert_eq!(t.ipa, "/ɑd/");
    }

    #[test]
    fn malformed_variant_keeps_raw_word() {
        assert_eq!(split_variant("A(B)"), ("a(b)".to_string(), 0));
        assert_eq!(split_variant("READ(3)"), ("read".to_string(), 2));
    }

    #[test]
    fn variants_with_the_same_ipa_collapse() {
        let mut prons = Pronunciations::default();
        for line in ["EITHER  IY1 DH ER0", "EITHER(2)  AY1 DH ER0", "EITHER(3)  IY1 DH ER0"] {
            let (word, t) = parse_line(line).unwrap();
            prons.by_word.entry(word).or_default().push(t);
        }
        let entry = ids::entry_id("either");
        let records = prons.to_records(&HashMap::from([("either".to_string(), entry)]));

        assert_eq!(records.duplicates, 1);
        let ipa: Vec<_> = records.rows.iter().map(|r| r.transcription.as_deref()).collect();
        assert_eq!(ipa, vec![Some("/iðɝ/"), Some("/aɪðɝ/")]);
    }

    #[test]
    fn lines_without_phonemes_are_skipped() {
        assert!(parse_line("LONELY").is_none());
        assert!(parse_line("   ").is_none());
        assert!(parse_line("LONELY # no phonemes").is_none());
    }

    #[test]
    fn every_table_phoneme_maps() {
        let all = [
            "AA", "AE", "AH", "AO", "AW", "AY", "B", "CH", "D", "DH", "EH", "ER", "EY", "F", "G",
            "HH", "IH", "IY", "JH", "K", "L", "M", "N", "NG", "OW", "OY", "P", "R", "S", "SH",
            "T", "TH", "UH", "UW", "V", "W", "Y", "Z", "ZH",
        ];
        assert_eq!(all.len(), 39);
        assert!(all.iter().all(|p| arpabet(p).is_some()));
    }
}
