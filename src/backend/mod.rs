//! Batched kernel evaluation backends
//!
//! The kernel cache and the solver only see [`RowBackend`]; whether a row is
//! filled on the calling thread or spread over a rayon pool is decided here.

use crate::core::{Result, SVMError, SparseVector};
use crate::kernel::Kernel;
use rayon::prelude::*;

/// Rows shorter than this are never split across threads
const MIN_PARALLEL_CHUNK: usize = 256;

/// Capability to evaluate one instance against many in a single call
pub trait RowBackend: Send + Sync {
    /// Fill `out[k] = f(k)` for every position of `out`.
    ///
    /// Must not return before every entry is written.
    fn fill_row<F>(&self, out: &mut [f64], f: F)
    where
        F: Fn(usize) -> f64 + Send + Sync;

    /// Kernel row of `x` against every vector in `points`
    fn kernel_row<K: Kernel>(
        &self,
        kernel: &K,
        x: &SparseVector,
        points: &[SparseVector],
        out: &mut [f64],
    ) {
        debug_assert_eq!(points.len(), out.len());
        self.fill_row(out, |k| kernel.compute(x, &points[k]));
    }
}

/// Whether parallel execution is allowed.
///
/// The thread pool itself is set up once by [`run_with_threads`]; components
/// only respect this flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
    #[default]
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map over a vector's items, preserving order
    #[inline]
    pub fn maybe_par_map<T, B, F>(self, items: Vec<T>, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            items.into_par_iter().map(f).collect()
        } else {
            items.into_iter().map(f).collect()
        }
    }
}

impl RowBackend for Parallelism {
    fn fill_row<F>(&self, out: &mut [f64], f: F)
    where
        F: Fn(usize) -> f64 + Send + Sync,
    {
        if self.is_parallel() && out.len() >= MIN_PARALLEL_CHUNK {
            out.par_iter_mut()
                .with_min_len(MIN_PARALLEL_CHUNK)
                .enumerate()
                .for_each(|(k, v)| *v = f(k));
        } else {
            for (k, v) in out.iter_mut().enumerate() {
                *v = f(k);
            }
        }
    }
}

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use all available cores)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T> {
    if n_threads == 1 {
        return Ok(f(Parallelism::Sequential));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(n_threads)
        .build()
        .map_err(|e| SVMError::InvalidParameter(format!("cannot build thread pool: {e}")))?;
    Ok(pool.install(|| f(Parallelism::from_threads(0))))
}
