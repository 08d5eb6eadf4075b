use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;
use refcatalog_types::{
    EntryMetadataUpdate, RefDataSource, RefEntry, RefEntrySourceCoverage, RefExample,
    RefPronunciation, RefSense, RefTranslation, RefWordRelation, RelationType, SourceSlug,
};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{BulkRepository, StoreError};

/// Row count per table, as reported by [`MemoryCatalog::counts`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    pub entries: usize,
    pub senses: usize,
    pub translations: usize,
    pub examples: usize,
    pub pronunciations: usize,
    pub relations: usize,
    pub coverage: usize,
    pub data_sources: usize,
}

/// On-disk form. Indexes are rebuilt on load.
#[derive(Default, Serialize, Deserialize)]
struct Snapshot {
    entries: Vec<RefEntry>,
    senses: Vec<RefSense>,
    translations: Vec<RefTranslation>,
    examples: Vec<RefExample>,
    pronunciations: Vec<RefPronunciation>,
    relations: Vec<RefWordRelation>,
    coverage: Vec<RefEntrySourceCoverage>,
    data_sources: Vec<RefDataSource>,
}

#[derive(Default)]
struct Tables {
    entries: BTreeMap<Uuid, RefEntry>,
    entry_by_text: HashMap<String, Uuid>,
    senses: BTreeMap<Uuid, RefSense>,
    translations: BTreeMap<Uuid, RefTranslation>,
    examples: BTreeMap<Uuid, RefExample>,
    pronunciations: BTreeMap<Uuid, RefPronunciation>,
    relations: BTreeMap<Uuid, RefWordRelation>,
    relation_keys: HashSet<(Uuid, Uuid, RelationType)>,
    coverage: BTreeMap<(Uuid, SourceSlug), RefEntrySourceCoverage>,
    data_sources: BTreeMap<SourceSlug, RefDataSource>,
}

impl Tables {
    fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut tables = Tables::default();
        for entry in snapshot.entries {
            tables.entry_by_text.insert(entry.text_normalized.clone(), entry.id);
            tables.entries.insert(entry.id, entry);
        }
        tables.senses = snapshot.senses.into_iter().map(|s| (s.id, s)).collect();
        tables.translations = snapshot.translations.into_iter().map(|t| (t.id, t)).collect();
        tables.examples = snapshot.examples.into_iter().map(|e| (e.id, e)).collect();
        tables.pronunciations = snapshot.pronunciations.into_iter().map(|p| (p.id, p)).collect();
        for rel in snapshot.relations {
            tables
                .relation_keys
                .insert((rel.source_entry_id, rel.target_entry_id, rel.relation_type));
            tables.relations.insert(rel.id, rel);
        }
        tables.coverage = snapshot
            .coverage
            .into_iter()
            .map(|c| ((c.ref_entry_id, c.source_slug), c))
            .collect();
        tables.data_sources = snapshot
            .data_sources
            .into_iter()
            .map(|d| (d.slug, d))
            .collect();
        tables
    }

    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            entries: self.entries.values().cloned().collect(),
            senses: self.senses.values().cloned().collect(),
            translations: self.translations.values().cloned().collect(),
            examples: self.examples.values().cloned().collect(),
            pronunciations: self.pronunciations.values().cloned().collect(),
            relations: self.relations.values().cloned().collect(),
            coverage: self.coverage.values().cloned().collect(),
            data_sources: self.data_sources.values().cloned().collect(),
        }
    }

    fn counts(&self) -> TableCounts {
        TableCounts {
            entries: self.entries.len(),
            senses: self.senses.len(),
            translations: self.translations.len(),
            examples: self.examples.len(),
            pronunciations: self.pronunciations.len(),
            relations: self.relations.len(),
            coverage: self.coverage.len(),
            data_sources: self.data_sources.len(),
        }
    }

    fn require_entry(&self, table: &'static str, id: Uuid, parent: Uuid) -> Result<(), StoreError> {
        if self.entries.contains_key(&parent) {
            Ok(())
        } else {
            Err(StoreError::MissingParent { table, id, parent })
        }
    }

    fn require_sense(&self, table: &'static str, id: Uuid, parent: Uuid) -> Result<(), StoreError> {
        if self.senses.contains_key(&parent) {
            Ok(())
        } else {
            Err(StoreError::MissingParent { table, id, parent })
        }
    }

    fn remove_senses_of(&mut self, entry_id: Uuid) {
        let doomed: HashSet<Uuid> = self
            .senses
            .values()
            .filter(|s| s.ref_entry_id == entry_id)
            .map(|s| s.id)
            .collect();
        if doomed.is_empty() {
            return;
        }
        self.senses.retain(|id, _| !doomed.contains(id));
        self.translations.retain(|_, t| !doomed.contains(&t.ref_sense_id));
        self.examples.retain(|_, e| !doomed.contains(&e.ref_sense_id));
    }
}

/// In-memory [`BulkRepository`] with optional JSON snapshot persistence.
///
/// Every batch is validated before anything is written, so a batch that
/// references a missing parent leaves the tables untouched.
pub struct MemoryCatalog {
    path: Option<PathBuf>,
    tables: RwLock<Tables>,
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryCatalog {
    /// Empty catalog that is never written to disk.
    pub fn new() -> Self {
        MemoryCatalog {
            path: None,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Load the snapshot at `path`, or start empty if the file does not
    /// exist yet. [`persist`](Self::persist) writes back to the same path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let tables = match fs::read(&path) {
            Ok(bytes) => {
                let snapshot: Snapshot =
                    serde_json::from_slice(&bytes).map_err(|source| StoreError::SnapshotFormat {
                        path: path.clone(),
                        source,
                    })?;
                let tables = Tables::from_snapshot(snapshot);
                info!(path = %path.display(), entries = tables.entries.len(), "loaded catalog snapshot");
                tables
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot yet; starting empty");
                Tables::default()
            }
            Err(source) => return Err(StoreError::Snapshot { path, source }),
        };
        Ok(MemoryCatalog {
            path: Some(path),
            tables: RwLock::new(tables),
        })
    }

    /// Write the snapshot atomically: a temp file in the target directory
    /// is renamed over the old snapshot. No-op for catalogs without a path.
    pub fn persist(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let snapshot = self.read().to_snapshot();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let io_err = |source| StoreError::Snapshot {
            path: path.clone(),
            source,
        };

        let tmp = NamedTempFile::new_in(&dir).map_err(io_err)?;
        let mut writer = BufWriter::new(tmp);
        serde_json::to_writer(&mut writer, &snapshot).map_err(|source| {
            StoreError::SnapshotFormat {
                path: path.clone(),
                source,
            }
        })?;
        writer.flush().map_err(io_err)?;
        let tmp = writer
            .into_inner()
            .map_err(|err| io_err(err.into_error()))?;
        tmp.persist(path).map_err(|err| io_err(err.error))?;
        info!(path = %path.display(), entries = snapshot.entries.len(), "persisted catalog snapshot");
        Ok(())
    }

    pub fn counts(&self) -> TableCounts {
        self.read().counts()
    }

    pub fn entry_by_normalized_text(&self, text: &str) -> Option<RefEntry> {
        let tables = self.read();
        tables
            .entry_by_text
            .get(text)
            .and_then(|id| tables.entries.get(id))
            .cloned()
    }

    pub fn senses_of(&self, entry_id: Uuid) -> Vec<RefSense> {
        let mut senses: Vec<RefSense> = self
            .read()
            .senses
            .values()
            .filter(|s| s.ref_entry_id == entry_id)
            .cloned()
            .collect();
        senses.sort_by_key(|s| (s.position, s.id));
        senses
    }

    pub fn examples_of(&self, sense_id: Uuid) -> Vec<RefExample> {
        let mut examples: Vec<RefExample> = self
            .read()
            .examples
            .values()
            .filter(|e| e.ref_sense_id == sense_id)
            .cloned()
            .collect();
        examples.sort_by_key(|e| (e.position, e.id));
        examples
    }

    pub fn pronunciations_of(&self, entry_id: Uuid) -> Vec<RefPronunciation> {
        self.read()
            .pronunciations
            .values()
            .filter(|p| p.ref_entry_id == entry_id)
            .cloned()
            .collect()
    }

    pub fn relations(&self) -> Vec<RefWordRelation> {
        self.read().relations.values().cloned().collect()
    }

    pub fn coverage(&self) -> Vec<RefEntrySourceCoverage> {
        self.read().coverage.values().cloned().collect()
    }

    pub fn data_sources(&self) -> Vec<RefDataSource> {
        self.read().data_sources.values().cloned().collect()
    }

    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BulkRepository for MemoryCatalog {
    async fn insert_entries(&self, entries: &[RefEntry]) -> Result<usize, StoreError> {
        let mut tables = self.write();
        let mut inserted = 0;
        for entry in entries {
            if tables.entries.contains_key(&entry.id)
                || tables.entry_by_text.contains_key(&entry.text_normalized)
            {
                continue;
            }
            tables
                .entry_by_text
                .insert(entry.text_normalized.clone(), entry.id);
            tables.entries.insert(entry.id, entry.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn insert_senses(&self, senses: &[RefSense]) -> Result<usize, StoreError> {
        let mut tables = self.write();
        for sense in senses {
            tables.require_entry("ref_senses", sense.id, sense.ref_entry_id)?;
        }
        let mut inserted = 0;
        for sense in senses {
            if tables.senses.contains_key(&sense.id) {
                continue;
            }
            tables.senses.insert(sense.id, sense.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn insert_translations(
        &self,
        translations: &[RefTranslation],
    ) -> Result<usize, StoreError> {
        let mut tables = self.write();
        for tr in translations {
            tables.require_sense("ref_translations", tr.id, tr.ref_sense_id)?;
        }
        let mut inserted = 0;
        for tr in translations {
            if tables.translations.contains_key(&tr.id) {
                continue;
            }
            tables.translations.insert(tr.id, tr.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn insert_examples(&self, examples: &[RefExample]) -> Result<usize, StoreError> {
        let mut tables = self.write();
        for ex in examples {
            tables.require_sense("ref_examples", ex.id, ex.ref_sense_id)?;
        }
        let mut inserted = 0;
        for ex in examples {
            if tables.examples.contains_key(&ex.id) {
                continue;
            }
            tables.examples.insert(ex.id, ex.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn insert_pronunciations(
        &self,
        pronunciations: &[RefPronunciation],
    ) -> Result<usize, StoreError> {
        let mut tables = self.write();
        for pr in pronunciations {
            tables.require_entry("ref_pronunciations", pr.id, pr.ref_entry_id)?;
        }
        let mut inserted = 0;
        for pr in pronunciations {
            if tables.pronunciations.contains_key(&pr.id) {
                continue;
            }
            tables.pronunciations.insert(pr.id, pr.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn insert_relations(&self, relations: &[RefWordRelation]) -> Result<usize, StoreError> {
        let mut tables = self.write();
        for rel in relations {
            tables.require_entry("ref_word_relations", rel.id, rel.source_entry_id)?;
            tables.require_entry("ref_word_relations", rel.id, rel.target_entry_id)?;
        }
        let mut inserted = 0;
        for rel in relations {
            let key = (rel.source_entry_id, rel.target_entry_id, rel.relation_type);
            if tables.relations.contains_key(&rel.id) || tables.relation_keys.contains(&key) {
                continue;
            }
            tables.relation_keys.insert(key);
            tables.relations.insert(rel.id, rel.clone());
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn insert_coverage(
        &self,
        coverage: &[RefEntrySourceCoverage],
    ) -> Result<usize, StoreError> {
        let mut tables = self.write();
        for cov in coverage {
            tables.require_entry("ref_entry_source_coverage", cov.ref_entry_id, cov.ref_entry_id)?;
        }
        for cov in coverage {
            tables
                .coverage
                .insert((cov.ref_entry_id, cov.source_slug), cov.clone());
        }
        Ok(coverage.len())
    }

    async fn replace_entry_content(
        &self,
        entry_id: Uuid,
        senses: &[RefSense],
        translations: &[RefTranslation],
        examples: &[RefExample],
    ) -> Result<(), StoreError> {
        let mut tables = self.write();
        tables.require_entry("ref_senses", entry_id, entry_id)?;

        let new_senses: HashSet<Uuid> = senses.iter().map(|s| s.id).collect();
        for sense in senses {
            if sense.ref_entry_id != entry_id {
                return Err(StoreError::MissingParent {
                    table: "ref_senses",
                    id: sense.id,
                    parent: sense.ref_entry_id,
                });
            }
        }
        for tr in translations {
            if !new_senses.contains(&tr.ref_sense_id) {
                return Err(StoreError::MissingParent {
                    table: "ref_translations",
                    id: tr.id,
                    parent: tr.ref_sense_id,
                });
            }
        }
        for ex in examples {
            if !new_senses.contains(&ex.ref_sense_id) {
                return Err(StoreError::MissingParent {
                    table: "ref_examples",
                    id: ex.id,
                    parent: ex.ref_sense_id,
                });
            }
        }

        tables.remove_senses_of(entry_id);
        for sense in senses {
            tables.senses.insert(sense.id, sense.clone());
        }
        for tr in translations {
            tables.translations.insert(tr.id, tr.clone());
        }
        for ex in examples {
            tables.examples.insert(ex.id, ex.clone());
        }
        Ok(())
    }

    async fn update_entry_metadata(
        &self,
        updates: &[EntryMetadataUpdate],
    ) -> Result<usize, StoreError> {
        let mut tables = self.write();
        let Tables {
            entries,
            entry_by_text,
            ..
        } = &mut *tables;
        let mut matched = 0;
        for update in updates {
            let Some(entry) = entry_by_text
                .get(&update.text_normalized)
                .and_then(|id| entries.get_mut(id))
            else {
                continue;
            };
            update.apply_to(entry);
            matched += 1;
        }
        Ok(matched)
    }

    async fn entry_ids_by_normalized_texts(
        &self,
        texts: &[String],
    ) -> Result<HashMap<String, Uuid>, StoreError> {
        let tables = self.read();
        Ok(texts
            .iter()
            .filter_map(|t| tables.entry_by_text.get(t).map(|id| (t.clone(), *id)))
            .collect())
    }

    async fn all_normalized_texts(&self) -> Result<HashSet<String>, StoreError> {
        Ok(self.read().entry_by_text.keys().cloned().collect())
    }

    async fn first_sense_ids_by_entry_ids(
        &self,
        entry_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Uuid>, StoreError> {
        if entry_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let wanted: HashSet<Uuid> = entry_ids.iter().copied().collect();
        let mut best: HashMap<Uuid, (u32, Uuid)> = HashMap::new();
        for sense in self.read().senses.values() {
            if !wanted.contains(&sense.ref_entry_id) {
                continue;
            }
            let candidate = (sense.position, sense.id);
            best.entry(sense.ref_entry_id)
                .and_modify(|cur| {
                    if candidate < *cur {
                        *cur = candidate;
                    }
                })
                .or_insert(candidate);
        }
        Ok(best
            .into_iter()
            .map(|(entry, (_, sense))| (entry, sense))
            .collect())
    }

    async fn pronunciation_transcriptions_by_entry_ids(
        &self,
        entry_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, HashSet<String>>, StoreError> {
        if entry_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let wanted: HashSet<Uuid> = entry_ids.iter().copied().collect();
        let mut out: HashMap<Uuid, HashSet<String>> = HashMap::new();
        for pr in self.read().pronunciations.values() {
            if !wanted.contains(&pr.ref_entry_id) {
                continue;
            }
            if let Some(transcription) = &pr.transcription {
                out.entry(pr.ref_entry_id)
                    .or_default()
                    .insert(transcription.clone());
            }
        }
        Ok(out)
    }

    async fn upsert_data_sources(&self, sources: &[RefDataSource]) -> Result<(), StoreError> {
        let mut tables = self.write();
        let now = Utc::now();
        for source in sources {
            match tables.data_sources.get_mut(&source.slug) {
                Some(existing) => {
                    let created_at = existing.created_at;
                    *existing = source.clone();
                    existing.created_at = created_at;
                    existing.updated_at = now;
                }
                None => {
                    tables.data_sources.insert(source.slug, source.clone());
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refcatalog_types::{CefrLevel, ids};

    fn sense(entry: &RefEntry, position: u32) -> RefSense {
        RefSense {
            id: ids::sense_id(entry.id, SourceSlug::Wiktionary, position),
            ref_entry_id: entry.id,
            definition: format!("sense {position}"),
            part_of_speech: None,
            cefr_level: None,
            source_slug: SourceSlug::Wiktionary,
            position,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn entries_are_unique_on_normalized_text() {
        let store = MemoryCatalog::new();
        let a = RefEntry::new("House", Utc::now());
        let mut b = RefEntry::new("house", Utc::now());
        b.id = Uuid::from_u128(42);
        assert_eq!(store.insert_entries(&[a.clone(), b]).await.unwrap(), 1);
        assert_eq!(store.insert_entries(&[a]).await.unwrap(), 0);
        assert_eq!(store.counts().entries, 1);
    }

    #[tokio::test]
    async fn orphan_batch_is_rejected_whole() {
        let store = MemoryCatalog::new();
        let e = RefEntry::new("cat", Utc::now());
        store.insert_entries(std::slice::from_ref(&e)).await.unwrap();
        let good = sense(&e, 0);
        let mut orphan = sense(&e, 1);
        orphan.ref_entry_id = Uuid::from_u128(7);
        let err = store.insert_senses(&[good, orphan]).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingParent { table: "ref_senses", .. }));
        assert_eq!(store.counts().senses, 0);
    }

    #[tokio::test]
    async fn first_sense_is_lowest_position() {
        let store = MemoryCatalog::new();
        let e = RefEntry::new("run", Utc::now());
        store.insert_entries(std::slice::from_ref(&e)).await.unwrap();
        let s2 = sense(&e, 2);
        let s0 = sense(&e, 0);
        store.insert_senses(&[s2, s0.clone()]).await.unwrap();

        let firsts = store.first_sense_ids_by_entry_ids(&[e.id, Uuid::from_u128(1)]).await.unwrap();
        assert_eq!(firsts.len(), 1);
        assert_eq!(firsts[&e.id], s0.id);
    }

    #[tokio::test]
    async fn metadata_merge_counts_matches() {
        let store = MemoryCatalog::new();
        store.insert_entries(&[RefEntry::new("time", Utc::now())]).await.unwrap();
        let updates = vec![
            EntryMetadataUpdate {
                text_normalized: "time".into(),
                frequency_rank: Some(1),
                cefr_level: Some(CefrLevel::A1),
                is_core_lexicon: Some(true),
            },
            EntryMetadataUpdate {
                text_normalized: "absent".into(),
                ..Default::default()
            },
        ];
        assert_eq!(store.update_entry_metadata(&updates).await.unwrap(), 1);
        let time = store.entry_by_normalized_text("time").unwrap();
        assert_eq!(time.frequency_rank, Some(1));
        assert!(time.is_core_lexicon);
    }

    #[tokio::test]
    async fn empty_lookups_return_empty_containers() {
        let store = MemoryCatalog::new();
        assert!(store.entry_ids_by_normalized_texts(&[]).await.unwrap().is_empty());
        assert!(store.first_sense_ids_by_entry_ids(&[]).await.unwrap().is_empty());
        assert!(store.pronunciation_transcriptions_by_entry_ids(&[]).await.unwrap().is_empty());
        assert!(store.all_normalized_texts().await.unwrap().is_empty());
        assert_eq!(store.insert_relations(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn replace_content_cascades_to_children() {
        let store = MemoryCatalog::new();
        let e = RefEntry::new("bank", Utc::now());
        store.insert_entries(std::slice::from_ref(&e)).await.unwrap();
        let old = sense(&e, 0);
        store.insert_senses(std::slice::from_ref(&old)).await.unwrap();
        store
            .insert_translations(&[RefTranslation {
                id: ids::translation_id(old.id, SourceSlug::Wiktionary, 0),
                ref_sense_id: old.id,
                text: "банк".into(),
                source_slug: SourceSlug::Wiktionary,
                position: 0,
            }])
            .await
            .unwrap();

        let mut fresh = sense(&e, 0);
        fresh.id = Uuid::from_u128(99);
        fresh.definition = "river side".into();
        store
            .replace_entry_content(e.id, std::slice::from_ref(&fresh), &[], &[])
            .await
            .unwrap();

        let senses = store.senses_of(e.id);
        assert_eq!(senses, vec![fresh]);
        assert_eq!(store.counts().translations, 0);
    }
}
