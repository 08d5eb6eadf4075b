use std::collections::HashMap;

use chrono::{DateTime, Utc};
use refcatalog_types::{
    PartOfSpeech, RefEntry, RefExample, RefPronunciation, RefSense, RefTranslation, SourceSlug, ids,
};

use super::ParsedEntry;

/// Catalog rows for a set of parsed Wiktionary entries, parents first.
#[derive(Debug, Default)]
pub struct WiktionaryRecords {
    pub entries: Vec<RefEntry>,
    pub senses: Vec<RefSense>,
    pub translations: Vec<RefTranslation>,
    pub examples: Vec<RefExample>,
    pub pronunciations: Vec<RefPronunciation>,
}

#[derive(Default)]
struct MergedSense {
    definition: String,
    pos: Option<PartOfSpeech>,
    examples: Vec<String>,
    translations: Vec<String>,
}

impl MergedSense {
    fn absorb(&mut self, examples: &[String], translations: &[String]) {
        for ex in examples {
            if !self.examples.contains(ex) {
                self.examples.push(ex.clone());
            }
        }
        for tr in translations {
            if !self.translations.contains(tr) {
                self.translations.push(tr.clone());
            }
        }
    }
}

/// Convert parsed entries into rows. A sense is identified by its first
/// gloss and part of speech; repeats across lines merge their examples
/// and translations into the first occurrence.
pub fn to_records(parsed: &[ParsedEntry], now: DateTime<Utc>) -> WiktionaryRecords {
    let mut out = WiktionaryRecords::default();

    for pe in parsed {
        let entry = RefEntry::new(&pe.word, now);
        if entry.text_normalized.is_empty() {
            continue;
        }

        let mut merged: Vec<MergedSense> = Vec::new();
        let mut index: HashMap<(String, Option<PartOfSpeech>), usize> = HashMap::new();
        for group in &pe.pos_groups {
            let pos = (!group.pos.is_empty()).then(|| PartOfSpeech::from_wiktionary(&group.pos));
            for sense in &group.senses {
                let Some(definition) = sense.glosses.first() else {
                    continue;
                };
                let key = (definition.clone(), pos);
                let slot = *index.entry(key).or_insert_with(|| {
                    merged.push(MergedSense {
                        definition: definition.clone(),
                        pos,
                        ..Default::default()
                    });
                    merged.len() - 1
                });
                merged[slot].absorb(&sense.examples, &sense.translations);
            }
        }

        for (position, sense) in (0u32..).zip(merged) {
            let sense_id = ids::sense_id(entry.id, SourceSlug::Wiktionary, position);
            for (i, text) in (0u32..).zip(sense.translations) {
                out.translations.push(RefTranslation {
                    id: ids::translation_id(sense_id, SourceSlug::Wiktionary, i),
                    ref_sense_id: sense_id,
                    text,
                    source_slug: SourceSlug::Wiktionary,
                    position: i,
                });
            }
            for (i, sentence) in (0u32..).zip(sense.examples) {
                out.examples.push(RefExample {
                    id: ids::example_id(sense_id, SourceSlug::Wiktionary, i),
                    ref_sense_id: sense_id,
                    sentence,
                    translation: None,
                    source_slug: SourceSlug::Wiktionary,
                    position: i,
                });
            }
            out.senses.push(RefSense {
                id: sense_id,
                ref_entry_id: entry.id,
                definition: sense.definition,
                part_of_speech: sense.pos,
                cefr_level: None,
                source_slug: SourceSlug::Wiktionary,
                position,
                created_at: now,
            });
        }

        for sound in &pe.sounds {
            out.pronunciations.push(RefPronunciation {
                id: ids::pronunciation_id(entry.id, SourceSlug::Wiktionary, &sound.ipa, sound.region),
                ref_entry_id: entry.id,
                transcription: Some(sound.ipa.clone()),
                audio_url: None,
                region: sound.region,
                source_slug: SourceSlug::Wiktionary,
            });
        }

        out.entries.push(entry);
    }
    out
}
