//! Seed the reference word catalog from open lexical datasets.
//!
//! [`Pipeline`] runs five phases (Wiktionary, NGSL/NAWL, CMU, WordNet,
//! Tatoeba) against any [`BulkRepository`](refcatalog_store::BulkRepository)
//! and reports a [`PhaseResult`] per phase. Writes are idempotent, so
//! re-running over unchanged inputs inserts nothing new.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use refcatalog_seeder::{Pipeline, SeederConfig};
//! use refcatalog_store::MemoryCatalog;
//!
//! # async fn demo() -> Result<(), refcatalog_seeder::SeedError> {
//! let cfg = SeederConfig {
//!     cmu_path: Some("cmudict.txt".into()),
//!     ..SeederConfig::default()
//! };
//! let mut pipeline = Pipeline::new(Arc::new(MemoryCatalog::new()), cfg);
//! pipeline.run(&[]).await?;
//! for (phase, result) in pipeline.results() {
//!     println!("{phase}: {} inserted", result.inserted);
//! }
//! # Ok(()) }
//! ```

pub mod batch;
pub mod config;
mod error;
mod phase;
mod pipeline;
mod sources;

pub use config::{Cli, SeederConfig};
pub use error::{PhaseError, SeedError};
pub use phase::{Phase, UnknownPhase, parse_phase_names, select_phases};
pub use pipeline::{Pipeline, PhaseResult};
pub use sources::{DATASET_VERSION, known_data_sources};
