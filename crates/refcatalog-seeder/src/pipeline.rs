//! Phase orchestration.
//!
//! Phases run one after another in [`Phase::ALL`] order because later
//! phases resolve words written by earlier ones. Each phase parses its
//! dataset, resolves cross-references through the repository, writes
//! parents before children, then records per-entry coverage. A failing
//! phase leaves its error in its [`PhaseResult`] and the run moves on;
//! only the data-source registry upsert can fail the run itself.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use refcatalog_datasets::{cmu, ngsl, tatoeba, wiktionary, wordnet};
use refcatalog_store::{BulkRepository, StoreError};
use refcatalog_types::{
    CoverageStatus, EntryMetadataUpdate, RefEntry, RefEntrySourceCoverage, RefExample,
    RefPronunciation, RefSense, RefTranslation, RefWordRelation, SourceSlug,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::batch::{batch_process, batched_lookup};
use crate::config::SeederConfig;
use crate::error::{PhaseError, SeedError};
use crate::phase::{Phase, select_phases};
use crate::sources::{DATASET_VERSION, known_data_sources};

/// Outcome of one phase.
#[derive(Debug, Default)]
pub struct PhaseResult {
    pub inserted: usize,
    pub updated: usize,
    /// Rows parsed but not written: dry-run volume, unresolved words,
    /// duplicates of existing data, or 1 for an unconfigured phase.
    pub skipped: usize,
    /// Failed coverage writes; these never set `err`.
    pub errors: usize,
    pub duration: Duration,
    pub err: Option<PhaseError>,
}

pub struct Pipeline<R> {
    repo: Arc<R>,
    cfg: SeederConfig,
    cancel: CancellationToken,
    results: BTreeMap<Phase, PhaseResult>,
}

impl<R: BulkRepository> Pipeline<R> {
    pub fn new(repo: Arc<R>, cfg: SeederConfig) -> Self {
        Pipeline {
            repo,
            cfg: cfg.normalized(),
            cancel: CancellationToken::new(),
            results: BTreeMap::new(),
        }
    }

    /// Stop issuing repository calls once `cancel` fires.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Results of the last run, in execution order. Phases filtered out
    /// are absent.
    pub fn results(&self) -> &BTreeMap<Phase, PhaseResult> {
        &self.results
    }

    pub fn has_errors(&self) -> bool {
        self.results
            .values()
            .any(|r| r.err.is_some() || r.errors > 0)
    }

    /// Register data sources, then run the selected phases (all when
    /// `filter` is empty).
    pub async fn run(&mut self, filter: &[Phase]) -> Result<(), SeedError> {
        self.results.clear();
        self.repo
            .upsert_data_sources(&known_data_sources(Utc::now()))
            .await
            .map_err(SeedError::Registry)?;

        let phases = select_phases(filter);
        for &phase in &phases {
            info!(phase = %phase, dry_run = self.cfg.dry_run, "starting phase");
            let start = Instant::now();
            let mut result = PhaseResult::default();
            let outcome = if self.cancel.is_cancelled() {
                Err(PhaseError::Cancelled { stage: "start" })
            } else {
                match phase {
                    Phase::Wiktionary => self.run_wiktionary(&mut result).await,
                    Phase::Ngsl => self.run_ngsl(&mut result).await,
                    Phase::Cmu => self.run_cmu(&mut result).await,
                    Phase::WordNet => self.run_wordnet(&mut result).await,
                    Phase::Tatoeba => self.run_tatoeba(&mut result).await,
                }
            };
            result.err = outcome.err();
            result.duration = start.elapsed();

            match &result.err {
                Some(err) => warn!(
                    phase = %phase,
                    error = %err,
                    duration_ms = result.duration.as_millis() as u64,
                    "phase failed"
                ),
                None => info!(
                    phase = %phase,
                    inserted = result.inserted,
                    updated = result.updated,
                    skipped = result.skipped,
                    errors = result.errors,
                    duration_ms = result.duration.as_millis() as u64,
                    "phase completed"
                ),
            }
            self.results.insert(phase, result);
        }

        info!(phases_run = phases.len(), "pipeline completed");
        Ok(())
    }

    /// One line per phase that ran, aligned for logging.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "{:<12}{:>10}{:>10}{:>10}{:>8}{:>12}  status",
            "phase", "inserted", "updated", "skipped", "errors", "ms"
        );
        for (phase, r) in &self.results {
            let status = match &r.err {
                Some(err) => format!("failed: {err}"),
                None => "ok".to_string(),
            };
            let _ = write!(
                out,
                "\n{:<12}{:>10}{:>10}{:>10}{:>8}{:>12}  {}",
                phase.as_str(),
                r.inserted,
                r.updated,
                r.skipped,
                r.errors,
                r.duration.as_millis(),
                status
            );
        }
        out
    }

    fn require(
        path: &Option<PathBuf>,
        dataset: &'static str,
        result: &mut PhaseResult,
    ) -> Result<PathBuf, PhaseError> {
        match path {
            Some(p) => Ok(p.clone()),
            None => {
                result.skipped = 1;
                Err(PhaseError::MissingPath { dataset })
            }
        }
    }

    async fn run_wiktionary(&self, result: &mut PhaseResult) -> Result<(), PhaseError> {
        let path = Self::require(&self.cfg.wiktionary_path, "wiktionary", result)?;

        let core_words = match (&self.cfg.ngsl_path, &self.cfg.nawl_path) {
            (Some(ngsl_path), Some(nawl_path)) => {
                match ngsl::parse(ngsl_path, nawl_path, self.cfg.load_mode) {
                    Ok(lists) => lists.core_words,
                    Err(err) => {
                        warn!(error = %err, "could not read ngsl/nawl for core words");
                        HashSet::new()
                    }
                }
            }
            _ => HashSet::new(),
        };

        let dict = wiktionary::parse(&path, &core_words, self.cfg.top_n, self.cfg.load_mode)
            .map_err(|source| PhaseError::Parse {
                dataset: "wiktionary",
                source,
            })?;
        if self.cfg.dry_run {
            result.skipped = dict.entries.len();
            return Ok(());
        }

        let recs = wiktionary::to_records(&dict.entries, Utc::now());
        result.inserted += self
            .write("insert entries", &recs.entries, async |b: &[RefEntry]| {
                self.repo.insert_entries(b).await
            })
            .await?;

        // An entry may already exist under another id; its children would
        // dangle, so only entries whose stored id matches keep them.
        let texts: Vec<String> = recs.entries.iter().map(|e| e.text_normalized.clone()).collect();
        let stored = self.resolve_entries("resolve entries", &texts).await?;
        let owned: BTreeSet<Uuid> = recs
            .entries
            .iter()
            .filter(|e| stored.get(&e.text_normalized) == Some(&e.id))
            .map(|e| e.id)
            .collect();

        let (senses, dropped): (Vec<RefSense>, Vec<RefSense>) = recs
            .senses
            .into_iter()
            .partition(|s| owned.contains(&s.ref_entry_id));
        let sense_ids: HashSet<Uuid> = senses.iter().map(|s| s.id).collect();
        let translations = keep(recs.translations, |t| sense_ids.contains(&t.ref_sense_id));
        let examples = keep(recs.examples, |e| sense_ids.contains(&e.ref_sense_id));
        let pronunciations = keep(recs.pronunciations, |p| owned.contains(&p.ref_entry_id));
        result.skipped += dropped.len()
            + translations.dropped
            + examples.dropped
            + pronunciations.dropped;

        let children = async {
            let mut n = self
                .write("insert senses", &senses, async |b: &[RefSense]| {
                    self.repo.insert_senses(b).await
                })
                .await?;
            n += self
                .write("insert translations", &translations.kept, async |b: &[RefTranslation]| {
                    self.repo.insert_translations(b).await
                })
                .await?;
            n += self
                .write("insert examples", &examples.kept, async |b: &[RefExample]| {
                    self.repo.insert_examples(b).await
                })
                .await?;
            n += self
                .write(
                    "insert pronunciations",
                    &pronunciations.kept,
                    async |b: &[RefPronunciation]| self.repo.insert_pronunciations(b).await,
                )
                .await?;
            Ok::<usize, PhaseError>(n)
        };
        match children.await {
            Ok(n) => result.inserted += n,
            Err(err) => {
                self.cover(result, SourceSlug::Wiktionary, CoverageStatus::Failed, owned)
                    .await;
                return Err(err);
            }
        }

        self.cover(result, SourceSlug::Wiktionary, CoverageStatus::Fetched, owned)
            .await;
        Ok(())
    }

    async fn run_ngsl(&self, result: &mut PhaseResult) -> Result<(), PhaseError> {
        let (ngsl_path, nawl_path) = match (&self.cfg.ngsl_path, &self.cfg.nawl_path) {
            (Some(a), Some(b)) => (a, b),
            _ => {
                result.skipped = 1;
                return Err(PhaseError::MissingPath { dataset: "ngsl/nawl" });
            }
        };

        let lists = ngsl::parse(ngsl_path, nawl_path, self.cfg.load_mode).map_err(|source| {
            PhaseError::Parse {
                dataset: "ngsl/nawl",
                source,
            }
        })?;
        if self.cfg.dry_run {
            result.skipped = lists.updates.len();
            return Ok(());
        }

        result.updated = self
            .write("update metadata", &lists.updates, async |b: &[EntryMetadataUpdate]| {
                self.repo.update_entry_metadata(b).await
            })
            .await?;
        result.skipped = lists.updates.len().saturating_sub(result.updated);

        let texts: Vec<String> = lists.updates.iter().map(|u| u.text_normalized.clone()).collect();
        let ids = match self.resolve_entries("resolve updated entries", &texts).await {
            Ok(ids) => ids,
            Err(err) => {
                warn!(error = %err, "ngsl coverage lookup failed");
                result.errors += 1;
                return Ok(());
            }
        };
        let (ngsl_words, nawl_words) = texts.split_at(lists.stats.ngsl_words.min(texts.len()));
        let pick = |words: &[String]| -> BTreeSet<Uuid> {
            words.iter().filter_map(|w| ids.get(w).copied()).collect()
        };
        self.cover(result, SourceSlug::Ngsl, CoverageStatus::Fetched, pick(ngsl_words))
            .await;
        self.cover(result, SourceSlug::Nawl, CoverageStatus::Fetched, pick(nawl_words))
            .await;
        Ok(())
    }

    async fn run_cmu(&self, result: &mut PhaseResult) -> Result<(), PhaseError> {
        let path = Self::require(&self.cfg.cmu_path, "cmu", result)?;
        let prons = cmu::parse(&path, self.cfg.load_mode).map_err(|source| PhaseError::Parse {
            dataset: "cmu",
            source,
        })?;
        if self.cfg.dry_run {
            result.skipped = prons.stats.unique_words;
            return Ok(());
        }

        let words: Vec<String> = prons.by_word.keys().cloned().collect();
        let ids = self.resolve_entries("resolve entries", &words).await?;
        let resolved: BTreeSet<Uuid> = ids.values().copied().collect();
        let entry_ids: Vec<Uuid> = resolved.iter().copied().collect();

        // Wiktionary may already have given the entry the same IPA.
        let existing: HashMap<Uuid, HashSet<String>> = batched_lookup(
            &self.cancel,
            &entry_ids,
            self.cfg.batch_size,
            async |chunk: &[Uuid]| self.repo.pronunciation_transcriptions_by_entry_ids(chunk).await,
        )
        .await
        .map_err(PhaseError::at("load existing pronunciations"))?;

        let candidates = prons.to_records(&ids);
        let total = candidates.rows.len();
        let fresh = keep(candidates.rows, |p| {
            let known = existing.get(&p.ref_entry_id);
            !matches!((known, &p.transcription), (Some(set), Some(t)) if set.contains(t))
        });
        if fresh.dropped > 0 {
            debug!(skipped = fresh.dropped, total, "pronunciations already present");
        }
        // A repository may answer with keys it was not asked for.
        let unresolved = words.len().saturating_sub(ids.len());
        result.skipped += candidates.duplicates + fresh.dropped + unresolved;

        match self
            .write("insert pronunciations", &fresh.kept, async |b: &[RefPronunciation]| {
                self.repo.insert_pronunciations(b).await
            })
            .await
        {
            Ok(n) => result.inserted = n,
            Err(err) => {
                self.cover(result, SourceSlug::Cmu, CoverageStatus::Failed, resolved)
                    .await;
                return Err(err);
            }
        }

        self.cover(result, SourceSlug::Cmu, CoverageStatus::Fetched, resolved)
            .await;
        Ok(())
    }

    async fn run_wordnet(&self, result: &mut PhaseResult) -> Result<(), PhaseError> {
        let path = Self::require(&self.cfg.wordnet_path, "wordnet", result)?;
        let known = self.known_words().await?;
        let rels = wordnet::parse(&path, &known, self.cfg.load_mode).map_err(|source| {
            PhaseError::Parse {
                dataset: "wordnet",
                source,
            }
        })?;
        if self.cfg.dry_run {
            result.skipped = rels.stats.total_relations;
            return Ok(());
        }

        let words = rels.words();
        let ids = self.resolve_entries("resolve entries", &words).await?;
        let records = rels.to_records(&ids);
        result.skipped += rels.relations.len().saturating_sub(records.len());
        let touched: BTreeSet<Uuid> = records
            .iter()
            .flat_map(|r| [r.source_entry_id, r.target_entry_id])
            .collect();

        match self
            .write("insert relations", &records, async |b: &[RefWordRelation]| {
                self.repo.insert_relations(b).await
            })
            .await
        {
            Ok(n) => result.inserted = n,
            Err(err) => {
                let resolved = ids.values().copied().collect();
                self.cover(result, SourceSlug::WordNet, CoverageStatus::Failed, resolved)
                    .await;
                return Err(err);
            }
        }

        self.cover(result, SourceSlug::WordNet, CoverageStatus::Fetched, touched)
            .await;
        Ok(())
    }

    async fn run_tatoeba(&self, result: &mut PhaseResult) -> Result<(), PhaseError> {
        let path = Self::require(&self.cfg.tatoeba_path, "tatoeba", result)?;
        let known = self.known_words().await?;
        let matched = tatoeba::parse(&path, &known, self.cfg.max_examples_per_word, self.cfg.load_mode)
            .map_err(|source| PhaseError::Parse {
                dataset: "tatoeba",
                source,
            })?;
        if self.cfg.dry_run {
            result.skipped = matched.stats.total_pairs;
            return Ok(());
        }

        let words: Vec<String> = matched.by_word.keys().cloned().collect();
        let ids = self.resolve_entries("resolve entries", &words).await?;
        let entry_ids: Vec<Uuid> = ids.values().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let first_senses: HashMap<Uuid, Uuid> = batched_lookup(
            &self.cancel,
            &entry_ids,
            self.cfg.batch_size,
            async |chunk: &[Uuid]| self.repo.first_sense_ids_by_entry_ids(chunk).await,
        )
        .await
        .map_err(PhaseError::at("resolve first senses"))?;

        let examples = matched.to_records(&ids, &first_senses);
        result.skipped += matched.stats.total_pairs.saturating_sub(examples.len());
        let (with_sense, without_sense): (BTreeSet<Uuid>, BTreeSet<Uuid>) = entry_ids
            .iter()
            .partition(|id| first_senses.contains_key(*id));

        match self
            .write("insert examples", &examples, async |b: &[RefExample]| {
                self.repo.insert_examples(b).await
            })
            .await
        {
            Ok(n) => result.inserted = n,
            Err(err) => {
                let resolved = entry_ids.iter().copied().collect();
                self.cover(result, SourceSlug::Tatoeba, CoverageStatus::Failed, resolved)
                    .await;
                return Err(err);
            }
        }

        self.cover(result, SourceSlug::Tatoeba, CoverageStatus::Fetched, with_sense)
            .await;
        self.cover(result, SourceSlug::Tatoeba, CoverageStatus::NoData, without_sense)
            .await;
        Ok(())
    }

    async fn write<T, F>(&self, stage: &'static str, items: &[T], write: F) -> Result<usize, PhaseError>
    where
        F: AsyncFnMut(&[T]) -> Result<usize, StoreError>,
    {
        batch_process(&self.cancel, items, self.cfg.batch_size, write)
            .await
            .map_err(PhaseError::at(stage))
    }

    async fn resolve_entries(
        &self,
        stage: &'static str,
        words: &[String],
    ) -> Result<HashMap<String, Uuid>, PhaseError> {
        batched_lookup(&self.cancel, words, self.cfg.batch_size, async |chunk: &[String]| {
            self.repo.entry_ids_by_normalized_texts(chunk).await
        })
        .await
        .map_err(PhaseError::at(stage))
    }

    async fn known_words(&self) -> Result<HashSet<String>, PhaseError> {
        const STAGE: &str = "load known words";
        if self.cancel.is_cancelled() {
            return Err(PhaseError::Cancelled { stage: STAGE });
        }
        self.repo
            .all_normalized_texts()
            .await
            .map_err(|source| PhaseError::Repository { stage: STAGE, source })
    }

    /// Best-effort coverage upsert. Failures are logged and counted in
    /// `result.errors`; they never fail the phase.
    async fn cover(
        &self,
        result: &mut PhaseResult,
        source: SourceSlug,
        status: CoverageStatus,
        entry_ids: BTreeSet<Uuid>,
    ) {
        if entry_ids.is_empty() {
            return;
        }
        let now = Utc::now();
        let rows: Vec<RefEntrySourceCoverage> = entry_ids
            .into_iter()
            .map(|ref_entry_id| RefEntrySourceCoverage {
                ref_entry_id,
                source_slug: source,
                status,
                dataset_version: DATASET_VERSION.to_string(),
                fetched_at: now,
            })
            .collect();
        let written = self
            .write("insert coverage", &rows, async |b: &[RefEntrySourceCoverage]| {
                self.repo.insert_coverage(b).await
            })
            .await;
        if let Err(err) = written {
            warn!(source = %source, status = %status, error = %err, "coverage insert failed");
            result.errors += 1;
        }
    }
}

struct Kept<T> {
    kept: Vec<T>,
    dropped: usize,
}

fn keep<T>(items: Vec<T>, pred: impl Fn(&T) -> bool) -> Kept<T> {
    let total = items.len();
    let kept: Vec<T> = items.into_iter().filter(|item| pred(item)).collect();
    Kept {
        dropped: total - kept.len(),
        kept,
    }
}
