use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use chrono::Utc;
use refcatalog_datasets::{DatasetError, LoadMode, cmu, ngsl, tatoeba, wiktionary, wordnet};
use refcatalog_types::{CefrLevel, PartOfSpeech, Region, RelationType, ids};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn words(list: &[&str]) -> HashSet<String> {
    list.iter().map(|w| w.to_string()).collect()
}

#[test]
fn wiktionary_selects_core_words_and_merges_lines() {
    for mode in [LoadMode::Mmap, LoadMode::Owned] {
        let dict = wiktionary::parse(&fixture("wiktionary.jsonl"), &words(&["time"]), 2, mode)
            .expect("parse wiktionary");

        assert_eq!(dict.stats.total_lines, 8);
        assert_eq!(dict.stats.malformed_lines, 1);
        assert_eq!(dict.stats.english_lines, 5);
        assert_eq!(dict.stats.entries_parsed, 2);

        let selected: Vec<&str> = dict.entries.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(selected, vec!["cat", "time"]);

        let cat = &dict.entries[0];
        assert_eq!(cat.pos_groups.len(), 2);
        assert_eq!(cat.pos_groups[0].senses[0].glosses, vec!["A small domesticated feline."]);
        assert_eq!(cat.sounds.len(), 2);
        assert_eq!(cat.sounds[0].region, Some(Region::US));
        assert_eq!(cat.sounds[1].region, Some(Region::UK));
    }
}

#[test]
fn wiktionary_records_link_children_to_parents() {
    let dict = wiktionary::parse(&fixture("wiktionary.jsonl"), &words(&["time"]), 2, LoadMode::Owned)
        .expect("parse wiktionary");
    let recs = wiktionary::to_records(&dict.entries, Utc::now());

    assert_eq!(recs.entries.len(), 2);
    let cat_id = ids::entry_id("cat");
    assert_eq!(recs.entries[0].id, cat_id);

    let cat_senses: Vec<_> = recs.senses.iter().filter(|s| s.ref_entry_id == cat_id).collect();
    assert_eq!(cat_senses.len(), 2);
    assert_eq!(cat_senses[0].part_of_speech, Some(PartOfSpeech::Noun));
    assert_eq!(cat_senses[1].part_of_speech, Some(PartOfSpeech::Verb));

    assert_eq!(recs.translations.len(), 1);
    assert_eq!(recs.translations[0].text, "кошка");
    assert_eq!(recs.translations[0].ref_sense_id, cat_senses[0].id);
    assert_eq!(recs.examples.len(), 1);
    assert_eq!(recs.pronunciations.len(), 2);
}

#[test]
fn word_lists_rank_ngsl_and_tag_nawl() {
    let lists = ngsl::parse(&fixture("ngsl.csv"), &fixture("nawl.csv"), LoadMode::Mmap)
        .expect("parse word lists");

    assert_eq!(lists.stats.ngsl_words, 3);
    assert_eq!(lists.stats.nawl_words, 1);
    assert_eq!(lists.core_words, words(&["the", "be", "time", "analyse"]));

    let time = lists
        .updates
        .iter()
        .find(|u| u.text_normalized == "time")
        .expect("time present");
    assert_eq!(time.frequency_rank, Some(3));
    assert_eq!(time.cefr_level, Some(CefrLevel::A1));

    let analyse = lists.updates.last().expect("nawl update");
    assert_eq!(analyse.text_normalized, "analyse");
    assert_eq!(analyse.frequency_rank, None);
    assert_eq!(analyse.cefr_level, Some(CefrLevel::C1));
}

#[test]
fn missing_word_list_is_an_io_error() {
    let err = ngsl::parse(&fixture("absent.csv"), &fixture("nawl.csv"), LoadMode::Mmap)
        .expect_err("missing file");
    assert!(matches!(err, DatasetError::Io { .. }));
}

#[test]
fn cmu_counts_comments_and_variants() {
    let prons = cmu::parse(&fixture("cmudict.txt"), LoadMode::Mmap).expect("parse cmu");

    assert_eq!(prons.stats.total_lines, 5);
    assert_eq!(prons.stats.comment_lines, 1);
    assert_eq!(prons.stats.parsed_lines, 4);
    assert_eq!(prons.stats.unique_words, 3);
    assert_eq!(prons.by_word["dog"].len(), 2);
    assert_eq!(prons.by_word["dog"][1].variant, 1);
    assert_eq!(prons.by_word["read"][0].ipa, "/ɹɛd/");

    let cat = ids::entry_id("cat");
    let records = prons.to_records(&HashMap::from([("cat".to_string(), cat)]));
    assert_eq!(records.duplicates, 0);
    assert_eq!(records.rows.len(), 1);
    assert_eq!(records.rows[0].transcription.as_deref(), Some("/kæt/"));
    assert_eq!(records.rows[0].region, Some(Region::US));
}

#[test]
fn wordnet_directory_yields_every_relation_kind() {
    let known = words(&["cat", "true cat", "feline", "hot", "cold", "heat"]);
    let rels = wordnet::parse(&fixture("wordnet"), &known, LoadMode::Mmap).expect("parse wordnet");

    assert_eq!(rels.stats.total_entries, 6);
    assert_eq!(rels.stats.total_synsets, 5);
    assert_eq!(rels.stats.duplicates, 1);

    let triples: Vec<(&str, &str, RelationType)> = rels
        .relations
        .iter()
        .map(|r| (r.source_word.as_str(), r.target_word.as_str(), r.relation_type))
        .collect();
    assert_eq!(
        triples,
        vec![
            ("cat", "true cat", RelationType::Synonym),
            ("cold", "hot", RelationType::Antonym),
            ("heat", "hot", RelationType::Derived),
            ("cat", "feline", RelationType::Hypernym),
            ("true cat", "feline", RelationType::Hypernym),
        ]
    );
}

#[test]
fn wordnet_respects_known_words() {
    let rels = wordnet::parse(&fixture("wordnet"), &words(&["cat", "feline"]), LoadMode::Owned)
        .expect("parse wordnet");
    assert_eq!(rels.relations.len(), 1);
    assert_eq!(rels.relations[0].relation_type, RelationType::Hypernym);
    assert!(rels.stats.filtered_by_known > 0);
}

#[test]
fn wordnet_rejects_a_file_path() {
    let err = wordnet::parse(&fixture("ngsl.csv"), &words(&["cat"]), LoadMode::Mmap)
        .expect_err("not a directory");
    assert!(matches!(err, DatasetError::NotADirectory { .. }));
}

#[test]
fn wordnet_reports_bad_json() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("entries-a.json"), "{ not json").expect("write");
    let err = wordnet::parse(dir.path(), &words(&["cat"]), LoadMode::Owned).expect_err("bad json");
    assert!(matches!(err, DatasetError::Json { .. }));
}

#[test]
fn tatoeba_keeps_shortest_sentences_first() {
    let known = words(&["cat", "dog", "house"]);
    let examples = tatoeba::parse(&fixture("tatoeba.tsv"), &known, 5, LoadMode::Mmap)
        .expect("parse tatoeba");

    assert_eq!(examples.stats.total_lines, 4);
    assert_eq!(examples.stats.malformed, 1);
    assert_eq!(examples.stats.matched_words, 2);
    assert_eq!(examples.stats.total_pairs, 4);
    assert!(!examples.by_word.contains_key("house"));
    assert_eq!(examples.by_word["cat"][0].english, "The cat sleeps.");
    assert_eq!(examples.by_word["dog"][0].english, "My dog.");
    assert_eq!(examples.by_word["dog"][0].russian, "Моя собака.");
}
