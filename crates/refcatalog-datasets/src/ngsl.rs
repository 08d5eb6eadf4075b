//! NGSL / NAWL word lists.
//!
//! Both files are CSV with a header row and the headword in the first
//! column. NGSL rows carry frequency: the n-th word gets rank `n` and the
//! CEFR band for that rank. NAWL words are academic vocabulary with no
//! rank and a fixed C1 band. Every word from either list is core lexicon.

use std::collections::HashSet;
use std::path::Path;

use refcatalog_types::{CefrLevel, EntryMetadataUpdate, normalize_text};
use tracing::info;

use crate::{DatasetError, LoadMode, SourceBuffer};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub ngsl_words: usize,
    pub nawl_words: usize,
    pub empty_rows: usize,
}

#[derive(Debug, Default)]
pub struct WordLists {
    /// NGSL updates in rank order, then NAWL updates in file order.
    pub updates: Vec<EntryMetadataUpdate>,
    /// Union of both lists, normalized.
    pub core_words: HashSet<String>,
    pub stats: Stats,
}

pub fn parse(ngsl: &Path, nawl: &Path, mode: LoadMode) -> Result<WordLists, DatasetError> {
    let ngsl_buf = SourceBuffer::load(ngsl, mode)?;
    let nawl_buf = SourceBuffer::load(nawl, mode)?;

    let mut stats = Stats::default();
    let mut updates = ngsl_updates(ngsl_buf.as_str()?, &mut stats.empty_rows);
    stats.ngsl_words = updates.len();
    let academic = nawl_updates(nawl_buf.as_str()?, &mut stats.empty_rows);
    stats.nawl_words = academic.len();
    updates.extend(academic);

    let core_words = updates.iter().map(|u| u.text_normalized.clone()).collect();
    info!(
        ngsl = stats.ngsl_words,
        nawl = stats.nawl_words,
        empty = stats.empty_rows,
        "parsed word lists"
    );
    Ok(WordLists {
        updates,
        core_words,
        stats,
    })
}

/// Ranked updates from NGSL text. Blank rows do not consume a rank.
pub fn ngsl_updates(text: &str, empty_rows: &mut usize) -> Vec<EntryMetadataUpdate> {
    let mut rank = 0u32;
    headwords(text, empty_rows)
        .map(|word| {
            rank += 1;
            EntryMetadataUpdate {
                text_normalized: word,
                frequency_rank: Some(rank),
                cefr_level: Some(CefrLevel::for_frequency_rank(rank)),
                is_core_lexicon: Some(true),
            }
        })
        .collect()
}

pub fn nawl_updates(text: &str, empty_rows: &mut usize) -> Vec<EntryMetadataUpdate> {
    headwords(text, empty_rows)
        .map(|word| EntryMetadataUpdate {
            text_normalized: word,
            frequency_rank: None,
            cefr_level: Some(CefrLevel::C1),
            is_core_lexicon: Some(true),
        })
        .collect()
}

/// Normalized first-column values after the header row.
fn headwords<'a>(text: &'a str, empty_rows: &'a mut usize) -> impl Iterator<Item = String> + 'a {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .skip(1)
        .filter_map(move |line| {
            let word = normalize_text(&first_field(line));
            if word.is_empty() {
                *empty_rows += 1;
                None
            } else {
                Some(word)
            }
        })
}

/// First CSV field, honouring double quotes and `""` escapes.
fn first_field(line: &str) -> std::borrow::Cow<'_, str> {
    let Some(rest) = line.strip_prefix('"') else {
        return line.split(',').next().unwrap_or("").into();
    };
    let mut out = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                out.push('"');
            } else {
                break;
            }
        } else {
            out.push(c);
        }
    }
    out.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ngsl_ranks_follow_file_order() {
        let mut blank = 0;
        let text = "Lemma,SFI\nthe,1\nbe,2\n";
        let updates = ngsl_updates(text, &mut blank);
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].text_normalized, "the");
        assert_eq!(updates[0].frequency_rank, Some(1));
        assert_eq!(updates[1].frequency_rank, Some(2));
        assert_eq!(updates[1].cefr_level, Some(CefrLevel::A1));
        assert_eq!(updates[1].is_core_lexicon, Some(true));
    }

    #[test]
    fn empty_rows_keep_rank_numbering() {
        let mut blank = 0;
        let text = "word\nalpha\n\n   \nbeta\n\"\",x\ngamma\n";
        let updates = ngsl_updates(text, &mut blank);
        let ranks: Vec<_> = updates
            .iter()
            .map(|u| (u.text_normalized.as_str(), u.frequency_rank))
            .collect();
        assert_eq!(ranks, vec![("alpha", Some(1)), ("beta", Some(2)), ("gamma", Some(3))]);
        assert_eq!(blank, 1);
    }

    #[test]
    fn rank_boundaries_map_to_cefr() {
        let mut text = String::from("word\n");
        for i in 1..=2001 {
            text.push_str(&format!("w{i}\n"));
        }
        let mut blank = 0;
        let updates = ngsl_updates(&text, &mut blank);
        let level = |rank: usize| updates[rank - 1].cefr_level;
        assert_eq!(level(500), Some(CefrLevel::A1));
        assert_eq!(level(501), Some(CefrLevel::A2));
        assert_eq!(level(1200), Some(CefrLevel::A2));
        assert_eq!(level(1201), Some(CefrLevel::B1));
        assert_eq!(level(2000), Some(CefrLevel::B1));
        assert_eq!(level(2001), Some(CefrLevel::B2));
    }

    #[test]
    fn nawl_is_c1_without_rank() {
        let mut blank = 0;
        let updates = nawl_updates("Word\nHypothesis\n", &mut blank);
        assert_eq!(
            updates,
            vec![EntryMetadataUpdate {
                text_normalized: "hypothesis".into(),
                frequency_rank: None,
                cefr_level: Some(CefrLevel::C1),
                is_core_lexicon: Some(true),
            }]
        );
    }

    #[test]
    fn quoted_first_field() {
        assert_eq!(first_field("\"ice cream\",12"), "ice cream");
        assert_eq!(first_field("\"say \"\"hi\"\"\",1"), "say \"hi\"");
        assert_eq!(first_field("plain,1,2"), "plain");
        assert_eq!(first_field("solo"), "solo");
    }

    #[test]
    fn header_only_file_yields_nothing() {
        let mut blank = 0;
        assert!(ngsl_updates("Lemma\n", &mut blank).is_empty());
        assert!(ngsl_updates("", &mut blank).is_empty());
    }
}
