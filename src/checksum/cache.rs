//! Compute-once checksum cache.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::io::AsyncReadExt;
use tokio::sync::OnceCell;

use crate::checksum::{format_line, Algorithm};
use crate::error::{OfferError, Result};
use crate::observability::metrics;
use crate::payload::Payload;

const READ_CHUNK: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Key {
    One(Algorithm),
    All,
}

/// Memoized checksum lines for one payload.
///
/// Each key owns a `OnceCell`: the first caller runs the digest, concurrent
/// callers await that same run. A failed run leaves the cell empty so a
/// later request retries.
#[derive(Clone)]
pub struct ChecksumCache {
    payload: Arc<Payload>,
    entries: Arc<DashMap<Key, Arc<OnceCell<String>>>>,
    computations: Arc<AtomicUsize>,
}

impl ChecksumCache {
    pub fn new(payload: Arc<Payload>) -> Self {
        Self {
            payload,
            entries: Arc::new(DashMap::new()),
            computations: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Checksum line for an algorithm given by name.
    pub async fn get_named(&self, name: &str) -> Result<String> {
        let algo = name.parse::<Algorithm>()?;
        self.get(algo).await
    }

    /// Checksum line for one algorithm.
    pub async fn get(&self, algo: Algorithm) -> Result<String> {
        let cell = self.cell(Key::One(algo));
        cell.get_or_try_init(|| self.compute(algo)).await.cloned()
    }

    /// Every supported algorithm's line, in sorted order.
    pub async fn all(&self) -> Result<String> {
        let cell = self.cell(Key::All);
        cell.get_or_try_init(|| async {
            let mut lines = String::new();
            for algo in Algorithm::ALL {
                lines.push_str(&self.get(algo).await?);
            }
            Ok::<_, OfferError>(lines)
        })
        .await
        .cloned()
    }

    /// How many digests have actually been run.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::SeqCst)
    }

    /// Number of populated entries, including the aggregate.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.value().initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn cell(&self, key: Key) -> Arc<OnceCell<String>> {
        Arc::clone(&self.entries.entry(key).or_default())
    }

    async fn compute(&self, algo: Algorithm) -> Result<String> {
        self.computations.fetch_add(1, Ordering::SeqCst);
        metrics::record_checksum_computation(algo.name());

        let mut reader = self.payload.reader().await.map_err(OfferError::ChecksumUnavailable)?;
        let mut hasher = algo.hasher();
        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = reader.read(&mut buf).await.map_err(OfferError::ChecksumUnavailable)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }

        let line = format_line(algo, &hasher.finalize(), self.payload.base_name());
        tracing::debug!(algorithm = %algo, "Checksum computed");
        Ok(line)
    }
}
