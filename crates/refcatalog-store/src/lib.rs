//! Persistence boundary for the reference word catalog.
//!
//! [`BulkRepository`] is the capability set the seeding pipeline writes
//! through: conflict-safe batch inserts, a metadata merge, a handful of
//! lookups that resolve normalized text to ids, and the data-source
//! registry upsert. The pipeline only ever sees this trait.
//!
//! [`MemoryCatalog`] is the bundled implementation. It keeps every table in
//! memory behind a lock, enforces the same uniqueness and parent rules a
//! relational backend would, and can be snapshotted to a JSON file so a
//! seeding run survives process restarts.
//!
//! ```rust,no_run
//! use refcatalog_store::{BulkRepository, MemoryCatalog};
//!
//! # async fn demo() -> Result<(), refcatalog_store::StoreError> {
//! let store = MemoryCatalog::open("catalog.json")?;
//! let known = store.all_normalized_texts().await?;
//! println!("{} entries on file", known.len());
//! store.persist()?;
//! # Ok(())
//! # }
//! ```

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use refcatalog_types::{
    EntryMetadataUpdate, RefDataSource, RefEntry, RefEntrySourceCoverage, RefExample,
    RefPronunciation, RefSense, RefTranslation, RefWordRelation,
};
use thiserror::Error;
use uuid::Uuid;

mod memory;

pub use memory::{MemoryCatalog, TableCounts};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{table} row {id} references missing parent {parent}")]
    MissingParent {
        table: &'static str,
        id: Uuid,
        parent: Uuid,
    },
    #[error("snapshot {}: {source}", path.display())]
    Snapshot {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot {} is not a valid catalog: {source}", path.display())]
    SnapshotFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Batch contract consumed by the seeding pipeline.
///
/// Inserts are no-ops for rows that already exist (by id or by the table's
/// natural key) and return the number of rows actually written. Coverage
/// is the exception: it is upserted on `(entry, source)` and every row
/// counts. Lookups never fail on empty input; they return empty
/// containers.
#[async_trait]
pub trait BulkRepository: Send + Sync {
    async fn insert_entries(&self, entries: &[RefEntry]) -> Result<usize, StoreError>;
    async fn insert_senses(&self, senses: &[RefSense]) -> Result<usize, StoreError>;
    async fn insert_translations(
        &self,
        translations: &[RefTranslation],
    ) -> Result<usize, StoreError>;
    async fn insert_examples(&self, examples: &[RefExample]) -> Result<usize, StoreError>;
    async fn insert_pronunciations(
        &self,
        pronunciations: &[RefPronunciation],
    ) -> Result<usize, StoreError>;
    async fn insert_relations(&self, relations: &[RefWordRelation]) -> Result<usize, StoreError>;
    async fn insert_coverage(
        &self,
        coverage: &[RefEntrySourceCoverage],
    ) -> Result<usize, StoreError>;

    /// Swap out all senses of an entry (and their translations and
    /// examples) for the given content in one step.
    async fn replace_entry_content(
        &self,
        entry_id: Uuid,
        senses: &[RefSense],
        translations: &[RefTranslation],
        examples: &[RefExample],
    ) -> Result<(), StoreError>;

    /// Merge metadata into entries matched by normalized text. Returns the
    /// number of entries matched.
    async fn update_entry_metadata(
        &self,
        updates: &[EntryMetadataUpdate],
    ) -> Result<usize, StoreError>;

    async fn entry_ids_by_normalized_texts(
        &self,
        texts: &[String],
    ) -> Result<HashMap<String, Uuid>, StoreError>;
    async fn all_normalized_texts(&self) -> Result<HashSet<String>, StoreError>;

    /// Sense with the lowest position per entry; entries without senses
    /// are absent from the map.
    async fn first_sense_ids_by_entry_ids(
        &self,
        entry_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Uuid>, StoreError>;
    async fn pronunciation_transcriptions_by_entry_ids(
        &self,
        entry_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, HashSet<String>>, StoreError>;

    async fn upsert_data_sources(&self, sources: &[RefDataSource]) -> Result<(), StoreError>;
}
