use refcatalog_datasets::DatasetError;
use refcatalog_store::StoreError;
use thiserror::Error;

use crate::batch::BatchError;

/// Why a single phase stopped. Recorded in its result; never aborts the run.
#[derive(Debug, Error)]
pub enum PhaseError {
    #[error("{dataset} path not configured")]
    MissingPath { dataset: &'static str },
    #[error("parse {dataset}: {source}")]
    Parse {
        dataset: &'static str,
        #[source]
        source: DatasetError,
    },
    #[error("{stage}: {source}")]
    Repository {
        stage: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("cancelled during {stage}")]
    Cancelled { stage: &'static str },
}

impl PhaseError {
    pub(crate) fn at(stage: &'static str) -> impl Fn(BatchError) -> PhaseError {
        move |err| match err {
            BatchError::Cancelled => PhaseError::Cancelled { stage },
            BatchError::Store(source) => PhaseError::Repository { stage, source },
        }
    }
}

/// Failures that stop the whole run.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("register data sources: {0}")]
    Registry(#[source] StoreError),
    #[error("configuration: {0}")]
    Config(String),
}
