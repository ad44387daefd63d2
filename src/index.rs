use rayon::prelude::*;
use std::cmp::Ordering;
use std::ops::Range;
use std::time::{Duration, Instant};

use crate::config::Number;
use crate::error::{LogsaiError, Result};
use crate::vector_entry::{Embedding, IndexEntry, SearchResult};
use crate::vector_ops::squared_euclidean_distance_simd;

/// Exact in-memory nearest-neighbour index over line embeddings.
///
/// Entries are append-only: ids start at zero, grow by one per inserted vector
/// and are never reused. `entries[i]` and `vectors[i]` always describe the same line.
pub struct VectorIndex {
    dimension: usize,
    entries: Vec<IndexEntry>,
    vectors: Vec<Embedding>,
    next_id: u64,
}

#[derive(Debug, Default)]
pub struct SearchTimings {
    pub distance_duration: Duration,
    pub sort_duration: Duration,
    pub total_duration: Duration,
}

impl VectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: Vec::new(),
            vectors: Vec::new(),
            next_id: 0,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    /// Appends `vectors` paired with `texts`, returning the ids assigned to them.
    ///
    /// Everything is validated before the first entry is written, so a failed
    /// insert leaves the index exactly as it was.
    pub fn insert(&mut self, vectors: Vec<Embedding>, texts: Vec<String>) -> Result<Range<u64>> {
        if vectors.len() != texts.len() {
            return Err(LogsaiError::CountMismatch {
                vectors: vectors.len(),
                texts: texts.len(),
            });
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimension) {
            return Err(LogsaiError::DimensionMismatch {
                expected: self.dimension,
                got: bad.len(),
            });
        }

        let start = self.next_id;
        let end = start + texts.len() as u64;
        self.entries
            .extend(texts.into_iter().zip(start..end).map(|(text, id)| IndexEntry { id, text }));
        self.vectors.extend(vectors);
        self.next_id = end;

        tracing::debug!(
            inserted = self.next_id - start,
            total = self.entries.len(),
            "inserted vectors"
        );
        Ok(start..self.next_id)
    }

    /// The `k` entries closest to `query`, ascending by distance, lower id first on ties.
    pub fn search(&self, query: &[Number], k: usize) -> Result<Vec<SearchResult>> {
        self.search_timed(query, k).map(|(results, _)| results)
    }

    pub fn search_timed(
        &self,
        query: &[Number],
        k: usize,
    ) -> Result<(Vec<SearchResult>, SearchTimings)> {
        let start = Instant::now();
        let mut timings = SearchTimings::default();

        if query.len() != self.dimension {
            return Err(LogsaiError::DimensionMismatch {
                expected: self.dimension,
                got: query.len(),
            });
        }
        if k == 0 {
            return Err(LogsaiError::InvalidTopK);
        }

        let distance_start = Instant::now();
        let mut scored: Vec<(Number, usize)> = self
            .vectors
            .par_iter()
            .enumerate()
            .map(|(i, vector)| (squared_euclidean_distance_simd(query, vector), i))
            .collect();
        timings.distance_duration = distance_start.elapsed();

        let sort_start = Instant::now();
        let results = Self::select_nearest(&mut scored, k)
            .iter()
            .map(|&(distance, i)| SearchResult {
                id: self.entries[i].id,
                text: self.entries[i].text.clone(),
                distance,
            })
            .collect::<Vec<_>>();
        timings.sort_duration = sort_start.elapsed();
        timings.total_duration = start.elapsed();

        tracing::debug!(
            candidates = self.vectors.len(),
            returned = results.len(),
            ?timings,
            "exact search finished"
        );
        Ok((results, timings))
    }

    fn select_nearest(scored: &mut Vec<(Number, usize)>, k: usize) -> &[(Number, usize)] {
        // Insertion position breaks distance ties, which keeps the order total.
        let by_distance = |a: &(Number, usize), b: &(Number, usize)| -> Ordering {
            a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
        };

        if scored.len() > k {
            scored.select_nth_unstable_by(k - 1, by_distance);
            scored.truncate(k);
        }
        scored.sort_unstable_by(by_distance);
        scored
    }
}
