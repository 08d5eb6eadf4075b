//! Relation extraction from an Open English WordNet JSON directory.
//!
//! The directory holds `entries-*.json` files (word → POS → senses, each
//! sense naming its synset and optional antonym/derivation sense ids) and
//! `{noun,verb,adj,adv}.*.json` synset files (synset id → members and
//! hypernym synset ids).
//!
//! Both graphs are kept as id-keyed maps. Candidates are produced in a
//! fixed order (synonyms, then antonyms and derivations, then hypernyms)
//! and every candidate runs through one admission gate, which rejects
//! self-loops, then words outside the catalog, then canonicalizes
//! direction, then drops triples already emitted.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use refcatalog_types::{RefWordRelation, RelationType, SourceSlug, ids, normalize_text};
use serde::Deserialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{DatasetError, LoadMode, SourceBuffer};

const SYNSET_PREFIXES: [&str; 4] = ["noun.", "verb.", "adj.", "adv."];

/// A relation between two normalized words, already in stored orientation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Relation {
    pub source_word: String,
    pub target_word: String,
    pub relation_type: RelationType,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub total_synsets: usize,
    pub total_entries: usize,
    pub total_relations: usize,
    pub filtered_by_known: usize,
    pub self_referential: usize,
    pub duplicates: usize,
}

#[derive(Debug, Default)]
pub struct Relations {
    pub relations: Vec<Relation>,
    pub stats: Stats,
}

#[derive(Debug, Default, Deserialize)]
struct PosEntry {
    #[serde(default)]
    sense: Vec<Sense>,
}

#[derive(Debug, Default, Deserialize)]
struct Sense {
    id: String,
    synset: String,
    #[serde(default)]
    antonym: Vec<String>,
    #[serde(default)]
    derivation: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Synset {
    #[serde(default)]
    members: Vec<String>,
    #[serde(default)]
    hypernym: Vec<String>,
}

/// Every sense of one headword, across all its parts of speech.
struct Headword {
    word: String,
    senses: Vec<Sense>,
}

/// The single gate every candidate passes through.
struct Admission<'a> {
    known: &'a HashSet<String>,
    seen: HashSet<(String, String, RelationType)>,
    out: Relations,
}

impl<'a> Admission<'a> {
    fn new(known: &'a HashSet<String>) -> Self {
        Admission {
            known,
            seen: HashSet::new(),
            out: Relations::default(),
        }
    }

    fn offer(&mut self, source: &str, target: &str, relation_type: RelationType) {
        if source == target {
            self.out.stats.self_referential += 1;
            return;
        }
        if !self.known.contains(source) || !self.known.contains(target) {
            self.out.stats.filtered_by_known += 1;
            return;
        }
        let (source, target) = relation_type.orient(source, target);
        let key = (source.to_string(), target.to_string(), relation_type);
        if self.seen.contains(&key) {
            self.out.stats.duplicates += 1;
            return;
        }
        self.out.relations.push(Relation {
            source_word: key.0.clone(),
            target_word: key.1.clone(),
            relation_type,
        });
        self.seen.insert(key);
    }
}

/// Extract relations between words in `known`.
///
/// An empty `known` set returns immediately without touching the
/// directory: there is nothing a relation could link.
pub fn parse(dir: &Path, known: &HashSet<String>, mode: LoadMode) -> Result<Relations, DatasetError> {
    if known.is_empty() {
        debug!("no known words; skipping wordnet extraction");
        return Ok(Relations::default());
    }
    let meta = fs::metadata(dir).map_err(|e| DatasetError::io(dir, e))?;
    if !meta.is_dir() {
        return Err(DatasetError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let (entry_files, synset_files) = list_files(dir)?;

    let mut total_entries = 0;
    let mut headwords = Vec::new();
    for path in &entry_files {
        let file: BTreeMap<String, BTreeMap<String, serde_json::Value>> = read_json(path, mode)?;
        for (word, by_pos) in file {
            total_entries += 1;
            let mut senses = Vec::new();
            for (_pos, raw) in by_pos {
                match PosEntry::deserialize(raw) {
                    Ok(entry) => senses.extend(entry.sense),
                    Err(err) => debug!(word = %word, error = %err, "skipping malformed pos block"),
                }
            }
            headwords.push(Headword {
                word: normalize_text(&word),
                senses,
            });
        }
    }

    let mut synsets: BTreeMap<String, Synset> = BTreeMap::new();
    let mut total_synsets = 0;
    for path in &synset_files {
        let file: BTreeMap<String, Synset> = read_json(path, mode)?;
        total_synsets += file.len();
        synsets.extend(file);
    }

    let mut out = extract(&headwords, &synsets, known);
    out.stats.total_entries = total_entries;
    out.stats.total_synsets = total_synsets;
    info!(
        entries = out.stats.total_entries,
        synsets = out.stats.total_synsets,
        relations = out.stats.total_relations,
        filtered = out.stats.filtered_by_known,
        self_refs = out.stats.self_referential,
        duplicates = out.stats.duplicates,
        "extracted wordnet relations"
    );
    Ok(out)
}

fn extract(
    headwords: &[Headword],
    synsets: &BTreeMap<String, Synset>,
    known: &HashSet<String>,
) -> Relations {
    let mut sense_to_word: HashMap<&str, &str> = HashMap::new();
    let mut synset_to_words: HashMap<&str, Vec<&str>> = HashMap::new();
    for hw in headwords {
        for sense in &hw.senses {
            sense_to_word.insert(&sense.id, &hw.word);
            let words = synset_to_words.entry(&sense.synset).or_default();
            if !words.contains(&hw.word.as_str()) {
                words.push(&hw.word);
            }
        }
    }

    let mut gate = Admission::new(known);

    for synset in synsets.values() {
        if synset.members.len() < 2 {
            continue;
        }
        let members: Vec<String> = synset.members.iter().map(|m| normalize_text(m)).collect();
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                gate.offer(a, b, RelationType::Synonym);
            }
        }
    }

    for hw in headwords {
        for sense in &hw.senses {
            for target in &sense.antonym {
                if let Some(word) = sense_to_word.get(target.as_str()) {
                    gate.offer(&hw.word, word, RelationType::Antonym);
                }
            }
            for target in &sense.derivation {
                if let Some(word) = sense_to_word.get(target.as_str()) {
                    gate.offer(&hw.word, word, RelationType::Derived);
                }
            }
        }
    }

    for (id, synset) in synsets {
        let Some(sources) = synset_to_words.get(id.as_str()) else {
            continue;
        };
        for hyper in &synset.hypernym {
            let Some(targets) = synset_to_words.get(hyper.as_str()) else {
                continue;
            };
            for source in sources {
                for target in targets {
                    gate.offer(source, target, RelationType::Hypernym);
                }
            }
        }
    }

    let mut out = gate.out;
    out.stats.total_relations = out.relations.len();
    out
}

impl Relations {
    /// Rows for relations whose both ends resolved to entries.
    pub fn to_records(&self, entry_ids: &HashMap<String, Uuid>) -> Vec<RefWordRelation> {
        let now = Utc::now();
        self.relations
            .iter()
            .filter_map(|rel| {
                let source = *entry_ids.get(&rel.source_word)?;
                let target = *entry_ids.get(&rel.target_word)?;
                Some(RefWordRelation {
                    id: ids::relation_id(source, target, rel.relation_type, SourceSlug::WordNet),
                    source_entry_id: source,
                    target_entry_id: target,
                    relation_type: rel.relation_type,
                    source_slug: SourceSlug::WordNet,
                    created_at: now,
                })
            })
            .collect()
    }

    /// Distinct words appearing on either end, sorted.
    pub fn words(&self) -> Vec<String> {
        let mut words: Vec<String> = self
            .relations
            .iter()
            .flat_map(|r| [r.source_word.clone(), r.target_word.clone()])
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        words.sort();
        words
    }
}

fn list_files(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>), DatasetError> {
    let mut entries = Vec::new();
    let mut synsets = Vec::new();
    for item in fs::read_dir(dir).map_err(|e| DatasetError::io(dir, e))? {
        let path = item.map_err(|e| DatasetError::io(dir, e))?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".json") {
            continue;
        }
        if name.starts_with("entries-") {
            entries.push(path);
        } else if SYNSET_PREFIXES.iter().any(|p| name.starts_with(p)) {
            synsets.push(path);
        }
    }
    entries.sort();
    synsets.sort();
    Ok((entries, synsets))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path, mode: LoadMode) -> Result<T, DatasetError> {
    let buf = SourceBuffer::load(path, mode)?;
    serde_json::from_slice(buf.as_bytes()).map_err(|source| DatasetError::Json {
        path: path.to_path_buf(),
        source,
    })
}
