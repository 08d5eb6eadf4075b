use std::collections::HashSet;
use std::env;
use std::path::PathBuf;

use refcatalog_datasets::{LoadMode, wordnet};

fn json_dir() -> Option<PathBuf> {
    env::var("WORDNET_DIR").ok().map(PathBuf::from)
}

#[test]
fn extracts_relations_from_open_english_wordnet() {
    let Some(dir) = json_dir() else {
        eprintln!("skipping: WORDNET_DIR not set");
        return;
    };
    let known: HashSet<String> = ["dog", "domestic dog", "canine", "hot", "cold", "animal"]
        .into_iter()
        .map(String::from)
        .collect();
    let rels = wordnet::parse(&dir, &known, LoadMode::Mmap).expect("load open english wordnet json");

    assert!(rels.stats.total_entries > 10_000, "entries too small");
    assert!(rels.stats.total_synsets > 10_000, "synsets too small");
    assert!(!rels.relations.is_empty());
    assert!(
        rels.relations
            .iter()
            .all(|r| known.contains(&r.source_word) && known.contains(&r.target_word))
    );
}
