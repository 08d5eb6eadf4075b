//! Chunked repository calls.
//!
//! Both helpers check the cancellation token before every chunk, so a
//! cancelled run stops between round-trips. Chunks already written stay
//! written; ids are deterministic, so a retry converges.

use refcatalog_store::StoreError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Chunk size used when the configured one is zero.
pub const DEFAULT_BATCH_SIZE: usize = 500;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("cancelled")]
    Cancelled,
    #[error(transparent)]
    Store(#[from] StoreError),
}

fn effective(batch_size: usize) -> usize {
    if batch_size == 0 {
        DEFAULT_BATCH_SIZE
    } else {
        batch_size
    }
}

/// Feed `items` to `write` in chunks and sum what it reports. Stops at
/// the first failing chunk.
pub async fn batch_process<T, F>(
    cancel: &CancellationToken,
    items: &[T],
    batch_size: usize,
    mut write: F,
) -> Result<usize, BatchError>
where
    F: AsyncFnMut(&[T]) -> Result<usize, StoreError>,
{
    let mut total = 0;
    for chunk in items.chunks(effective(batch_size)) {
        if cancel.is_cancelled() {
            return Err(BatchError::Cancelled);
        }
        total += write(chunk).await?;
    }
    Ok(total)
}

/// Run `lookup` over `keys` in chunks and merge the partial results.
pub async fn batched_lookup<K, M, F>(
    cancel: &CancellationToken,
    keys: &[K],
    batch_size: usize,
    mut lookup: F,
) -> Result<M, BatchError>
where
    M: Default + Extend<<M as IntoIterator>::Item> + IntoIterator,
    F: AsyncFnMut(&[K]) -> Result<M, StoreError>,
{
    let mut merged = M::default();
    for chunk in keys.chunks(effective(batch_size)) {
        if cancel.is_cancelled() {
            return Err(BatchError::Cancelled);
        }
        merged.extend(lookup(chunk).await?);
    }
    Ok(merged)
}
