//! Rows written by the seeding pipeline.
//!
//! Child rows reference their parent by id only; nothing here owns a
//! nested collection. Ids are expected to come from [`crate::ids`] so
//! that re-running a phase reproduces them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CefrLevel, CoverageStatus, PartOfSpeech, Region, RelationType, SourceCategory, SourceSlug};

/// A catalog word, unique on `text_normalized`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefEntry {
    pub id: Uuid,
    pub text: String,
    pub text_normalized: String,
    pub frequency_rank: Option<u32>,
    pub cefr_level: Option<CefrLevel>,
    pub is_core_lexicon: bool,
    pub created_at: DateTime<Utc>,
}

impl RefEntry {
    /// New entry keyed on the normalized form of `text`.
    pub fn new(text: &str, created_at: DateTime<Utc>) -> Self {
        let text_normalized = crate::normalize_text(text);
        RefEntry {
            id: crate::ids::entry_id(&text_normalized),
            text: text.to_string(),
            text_normalized,
            frequency_rank: None,
            cefr_level: None,
            is_core_lexicon: false,
            created_at,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefSense {
    pub id: Uuid,
    pub ref_entry_id: Uuid,
    pub definition: String,
    pub part_of_speech: Option<PartOfSpeech>,
    pub cefr_level: Option<CefrLevel>,
    pub source_slug: SourceSlug,
    pub position: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefTranslation {
    pub id: Uuid,
    pub ref_sense_id: Uuid,
    pub text: String,
    pub source_slug: SourceSlug,
    pub position: u32,
}

/// Usage example attached to a sense; `translation` is the Russian side
/// when the source provides one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefExample {
    pub id: Uuid,
    pub ref_sense_id: Uuid,
    pub sentence: String,
    pub translation: Option<String>,
    pub source_slug: SourceSlug,
    pub position: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefPronunciation {
    pub id: Uuid,
    pub ref_entry_id: Uuid,
    pub transcription: Option<String>,
    pub audio_url: Option<String>,
    pub region: Option<Region>,
    pub source_slug: SourceSlug,
}

/// Directed edge between two entries. Symmetric relation types are
/// stored with the lexicographically smaller word as the source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefWordRelation {
    pub id: Uuid,
    pub source_entry_id: Uuid,
    pub target_entry_id: Uuid,
    pub relation_type: RelationType,
    pub source_slug: SourceSlug,
    pub created_at: DateTime<Utc>,
}

/// Registry row describing one provenance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefDataSource {
    pub slug: SourceSlug,
    pub name: String,
    pub description: String,
    pub source_type: SourceCategory,
    pub is_active: bool,
    pub dataset_version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RefEntrySourceCoverage {
    pub ref_entry_id: Uuid,
    pub source_slug: SourceSlug,
    pub status: CoverageStatus,
    pub dataset_version: String,
    pub fetched_at: DateTime<Utc>,
}

/// Metadata patch for an existing entry, matched by `text_normalized`.
///
/// `None` fields leave the stored value alone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadataUpdate {
    pub text_normalized: String,
    pub frequency_rank: Option<u32>,
    pub cefr_level: Option<CefrLevel>,
    pub is_core_lexicon: Option<bool>,
}

impl EntryMetadataUpdate {
    /// Merge the present fields into `entry`. Returns whether anything changed.
    pub fn apply_to(&self, entry: &mut RefEntry) -> bool {
        let before = (entry.frequency_rank, entry.cefr_level, entry.is_core_lexicon);
        if let Some(rank) = self.frequency_rank {
            entry.frequency_rank = Some(rank);
        }
        if let Some(level) = self.cefr_level {
            entry.cefr_level = Some(level);
        }
        if let Some(core) = self.is_core_lexicon {
            entry.is_core_lexicon = core;
        }
        before != (entry.frequency_rank, entry.cefr_level, entry.is_core_lexicon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> RefEntry {
        let mut e = RefEntry::new("Time", Utc::now());
        e.frequency_rank = Some(7);
        e.cefr_level = Some(CefrLevel::A1);
        e
    }

    #[test]
    fn new_entry_normalizes_and_derives_id() {
        let e = RefEntry::new("  Ice   Cream ", Utc::now());
        assert_eq!(e.text, "  Ice   Cream ");
        assert_eq!(e.text_normalized, "ice cream");
        assert_eq!(e.id, crate::ids::entry_id("ice cream"));
    }

    #[test]
    fn metadata_patch_only_overwrites_present_fields() {
        let mut e = entry();
        let update = EntryMetadataUpdate {
            text_normalized: "time".into(),
            frequency_rank: None,
            cefr_level: Some(CefrLevel::C1),
            is_core_lexicon: Some(true),
        };
        assert!(update.apply_to(&mut e));
        assert_eq!(e.frequency_rank, Some(7));
        assert_eq!(e.cefr_level, Some(CefrLevel::C1));
        assert!(e.is_core_lexicon);
    }

    #[test]
    fn empty_patch_reports_no_change() {
        let mut e = entry();
        let before = e.clone();
        let update = EntryMetadataUpdate {
            text_normalized: "time".into(),
            ..Default::default()
        };
        assert!(!update.apply_to(&mut e));
        assert_eq!(e, before);
    }

    #[test]
    fn records_serialize_with_stable_enum_strings() {
        let cov = RefEntrySourceCoverage {
            ref_entry_id: Uuid::nil(),
            source_slug: SourceSlug::WordNet,
            status: CoverageStatus::NoData,
            dataset_version: "v1".into(),
            fetched_at: Utc::now(),
        };
        let json = serde_json::to_value(&cov).unwrap();
        assert_eq!(json["source_slug"], "wordnet");
        assert_eq!(json["status"], "no_data");

        let mut e = entry();
        e.cefr_level = Some(CefrLevel::B2);
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["cefr_level"], "B2");
    }
}
