//! Kernel cache implementation
//!
//! Memoizes kernel rows (one instance against every instance of the current
//! sub-problem) in an LRU keyed by row index, plus an LRU of single pairs for
//! lookups that do not warrant a whole row. Kernel matrices are symmetric, so
//! pair keys are normalized so that i <= j and a cached row of either
//! endpoint answers a pair query.
//!
//! A cache is built for one solver run over one fixed point set and dropped
//! with it; entries are only ever removed by eviction.

use crate::backend::RowBackend;
use crate::core::SparseVector;
use crate::kernel::Kernel;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Bytes charged per cached single-pair entry (key + value + overhead)
const PAIR_ENTRY_BYTES: usize = 32;
/// Upper bound on single-pair entries
const MAX_PAIR_ENTRIES: usize = 4096;

/// Cache key for kernel values, normalized so that i <= j
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    i: usize,
    j: usize,
}

impl CacheKey {
    fn new(i: usize, j: usize) -> Self {
        if i <= j {
            Self { i, j }
        } else {
            Self { i: j, j: i }
        }
    }
}

/// Row-oriented LRU cache over the kernel matrix of a fixed point set
pub struct KernelCache<'a, K: Kernel, B: RowBackend> {
    kernel: &'a K,
    points: &'a [SparseVector],
    backend: &'a B,
    rows: Option<LruCache<usize, Arc<[f64]>>>,
    pairs: Option<LruCache<CacheKey, f64>>,
    diagonal: Vec<f64>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<'a, K: Kernel, B: RowBackend> KernelCache<'a, K, B> {
    /// Create a cache whose row and pair entries together fit in
    /// `memory_bytes`.
    ///
    /// Whole rows are carved out of the budget first; single pairs get the
    /// remainder. A budget smaller than one row disables row caching, and
    /// every row query is then recomputed.
    pub fn new(
        kernel: &'a K,
        points: &'a [SparseVector],
        backend: &'a B,
        memory_bytes: usize,
    ) -> Self {
        let n = points.len();
        let row_bytes = (n * std::mem::size_of::<f64>()).max(1);
        let row_capacity = memory_bytes / row_bytes;
        let remainder = memory_bytes - row_capacity * row_bytes;
        let rows = NonZeroUsize::new(row_capacity).map(LruCache::new);
        let pairs = NonZeroUsize::new((remainder / PAIR_ENTRY_BYTES).min(MAX_PAIR_ENTRIES))
            .map(LruCache::new);

        let mut diagonal = vec![0.0; n];
        backend.fill_row(&mut diagonal, |k| kernel.compute(&points[k], &points[k]));

        Self {
            kernel,
            points,
            backend,
            rows,
            pairs,
            diagonal,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Number of points the cache covers
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// K(i, i), precomputed at construction
    #[inline]
    pub fn diagonal(&self, i: usize) -> f64 {
        self.diagonal[i]
    }

    /// Kernel values of point `i` against every point
    pub fn query_row(&mut self, i: usize) -> Arc<[f64]> {
        if let Some(row) = self.rows.as_mut().and_then(|rows| rows.get(&i)) {
            self.hits += 1;
            return Arc::clone(row);
        }
        self.misses += 1;

        let mut buffer = vec![0.0; self.points.len()];
        self.backend
            .kernel_row(self.kernel, &self.points[i], self.points, &mut buffer);
        let row: Arc<[f64]> = buffer.into();

        if let Some(rows) = self.rows.as_mut() {
            if rows.push(i, Arc::clone(&row)).is_some() {
                self.evictions += 1;
            }
        }
        row
    }

    /// Single kernel value K(i, j)
    pub fn query(&mut self, i: usize, j: usize) -> f64 {
        if i == j {
            self.hits += 1;
            return self.diagonal[i];
        }
        if let Some(rows) = self.rows.as_mut() {
            if let Some(row) = rows.get(&i) {
                self.hits += 1;
                return row[j];
            }
            if let Some(row) = rows.get(&j) {
                self.hits += 1;
                return row[i];
            }
        }
        let key = CacheKey::new(i, j);
        if let Some(&value) = self.pairs.as_mut().and_then(|pairs| pairs.get(&key)) {
            self.hits += 1;
            return value;
        }
        self.misses += 1;

        let value = self.kernel.compute(&self.points[key.i], &self.points[key.j]);
        if let Some(pairs) = self.pairs.as_mut() {
            if pairs.push(key, value).is_some() {
                self.evictions += 1;
            }
        }
        value
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
            row_capacity: self.rows.as_ref().map_or(0, |rows| rows.cap().get()),
            rows_cached: self.rows.as_ref().map_or(0, |rows| rows.len()),
            pair_capacity: self.pairs.as_ref().map_or(0, |pairs| pairs.cap().get()),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub row_capacity: usize,
    pub rows_cached: usize,
    pub pair_capacity: usize,
}

impl std::ops::AddAssign for CacheStats {
    fn add_assign(&mut self, rhs: Self) {
        self.hits += rhs.hits;
        self.misses += rhs.misses;
        self.evictions += rhs.evictions;
        self.row_capacity += rhs.row_capacity;
        self.rows_cached += rhs.rows_cached;
        self.pair_capacity += rhs.pair_capacity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Parallelism;
    use crate::kernel::KernelKind;

    fn points() -> Vec<SparseVector> {
        (0..12)
            .map(|i| {
                let x = i as f64;
                SparseVector::new(vec![0, 1, (i % 4) + 2], vec![x * 0.3, 1.0 - x * 0.1, 0.5])
            })
            .collect()
    }

    const ROW: usize = 12 * 8;

    #[test]
    fn test_cache_key_normalization() {
        assert_eq!(CacheKey::new(1, 5), CacheKey::new(5, 1));
        assert_eq!(CacheKey::new(5, 1).i, 1);
    }

    #[test]
    fn test_query_equals_kernel_regardless_of_eviction() {
        let kernel = KernelKind::rbf(0.5);
        let pts = points();
        let backend = Parallelism::Sequential;

        // Room for two rows: constant eviction while walking the matrix
        let mut cache = KernelCache::new(&kernel, &pts, &backend, 2 * ROW);
        for round in 0..3 {
            for i in 0..pts.len() {
                let r = (i * 7 + round) % pts.len();
                let row = cache.query_row(r);
                for j in 0..pts.len() {
                    let expected = kernel.compute(&pts[r], &pts[j]);
                    assert_eq!(row[j].to_bits(), expected.to_bits());
                    assert_eq!(cache.query(r, j).to_bits(), expected.to_bits());
                    assert_eq!(cache.query(j, r).to_bits(), expected.to_bits());
                }
            }
        }
        assert!(cache.stats().evictions > 0);
    }

    #[test]
    fn test_row_lru_eviction() {
        let kernel = KernelKind::linear();
        let pts = points();
        let backend = Parallelism::Sequential;
        let mut cache = KernelCache::new(&kernel, &pts, &backend, 2 * ROW);
        assert_eq!(cache.stats().row_capacity, 2);

        cache.query_row(0);
        cache.query_row(1);
        cache.query_row(0); // 0 becomes most recent
        cache.query_row(2); // evicts 1

        let before = cache.stats();
        cache.query_row(0);
        assert_eq!(cache.stats().hits, before.hits + 1);
        cache.query_row(1);
        assert_eq!(cache.stats().misses, before.misses + 1);
    }

    #[test]
    fn test_zero_capacity_always_recomputes() {
        let kernel = KernelKind::rbf(1.0);
        let pts = points();
        let backend = Parallelism::Sequential;
        let mut cache = KernelCache::new(&kernel, &pts, &backend, 0);

        let a = cache.query_row(3);
        let b = cache.query_row(3);
        assert_eq!(a, b);
        let stats = cache.stats();
        assert_eq!(stats.row_capacity, 0);
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 0);
        assert_eq!(cache.query(3, 4), kernel.compute(&pts[3], &pts[4]));
    }

    #[test]
    fn test_budget_smaller_than_one_row() {
        let kernel = KernelKind::linear();
        let pts = points();
        let backend = Parallelism::Sequential;
        let mut cache = KernelCache::new(&kernel, &pts, &backend, ROW - 1);
        assert_eq!(cache.stats().row_capacity, 0);
        assert_eq!(cache.query_row(0).len(), pts.len());
    }

    #[test]
    fn test_rows_and_pairs_share_one_budget() {
        let kernel = KernelKind::linear();
        let pts = points();
        let backend = Parallelism::Sequential;

        for budget in [0, 31, ROW - 1, ROW, 2 * ROW + 70, 10 * ROW + 5, 1 << 20] {
            let stats = KernelCache::new(&kernel, &pts, &backend, budget).stats();
            let charged = stats.row_capacity * ROW + stats.pair_capacity * PAIR_ENTRY_BYTES;
            assert!(charged <= budget, "budget {budget} overcommitted: {charged}");
        }

        let stats = KernelCache::new(&kernel, &pts, &backend, 2 * ROW + 70).stats();
        assert_eq!(stats.row_capacity, 2);
        assert_eq!(stats.pair_capacity, 2);
    }

    #[test]
    fn test_pair_queries_served_from_rows() {
        let kernel = KernelKind::polynomial(2, 0.5, 1.0);
        let pts = points();
        let backend = Parallelism::Sequential;
        let mut cache = KernelCache::new(&kernel, &pts, &backend, 4 * ROW);

        cache.query_row(5);
        let misses = cache.stats().misses;
        cache.query(5, 9);
        cache.query(9, 5);
        assert_eq!(cache.stats().misses, misses);
        assert!(cache.hit_rate() > 0.0);
    }

    #[test]
    fn test_diagonal_precomputed() {
        let kernel = KernelKind::rbf(2.0);
        let pts = points();
        let backend = Parallelism::Sequential;
        let cache = KernelCache::new(&kernel, &pts, &backend, 0);
        for i in 0..pts.len() {
            assert_eq!(cache.diagonal(i), 1.0);
        }
        assert_eq!(cache.len(), pts.len());
    }
}
