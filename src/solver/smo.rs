//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Solves the dual of the binary soft-margin SVM
//!
//! ```text
//! max  Σ α_k - ½ Σ_k Σ_l α_k α_l y_k y_l K(x_k, x_l)
//! s.t. 0 ≤ α_k ≤ C,  Σ α_k y_k = 0
//! ```
//!
//! two multipliers at a time. For every instance the solver maintains
//! `f_k = Σ_l α_l y_l K(x_l, x_k) - y_k`, the decision value without bias
//! minus the label, which starts at `-y_k` because every alpha starts at 0.
//!
//! An index is in the *up* set when its alpha may still move so that `y α`
//! increases, and in the *low* set when it may move so that `y α` decreases.
//! The KKT violation is `max_low f - min_up f`; the run terminates when it
//! drops below epsilon.

use crate::backend::{Parallelism, RowBackend};
use crate::cache::KernelCache;
use crate::core::{
    ConvergenceStatus, DualSolution, Result, SVMError, SolverConfig, SparseVector,
    WorkingSetStrategy,
};
use crate::kernel::Kernel;
use crate::metrics::TrainingTimings;
use crate::solver::shrinking::{ShrinkingStrategy, SHRINK_HISTORY};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Curvature substituted for non-positive values in selection and in the update
const TAU: f64 = 1e-12;

/// Relative distance to a bound below which an alpha is snapped onto it
const BOUND_SNAP: f64 = 1e-12;

/// Progress is logged at debug level every this many iterations
const LOG_EVERY: usize = 1000;

/// SMO solver for one binary sub-problem
///
/// Labels must be +1/-1. Kernel rows come from a [`KernelCache`] built over
/// the sub-problem's points and filled through the solver's [`RowBackend`].
pub struct SMOSolver<K: Kernel, B: RowBackend = Parallelism> {
    kernel: K,
    backend: B,
    config: SolverConfig,
}

/// Outcome of one working set selection
enum Selection {
    Pair {
        i: usize,
        j: usize,
        /// Row of `i`, when selection already had to fetch it
        row_i: Option<Arc<[f64]>>,
        gap: f64,
    },
    Optimal,
    /// Violating pairs remain but none of them can make progress
    Stalled,
}

/// Extremes of `f` over the up and low sets
struct Extremes {
    i_up: Option<usize>,
    b_up: f64,
    b_low: f64,
}

impl Extremes {
    fn gap(&self) -> f64 {
        self.b_low - self.b_up
    }
}

/// Mutable optimisation state of one run
struct SolverState<'y> {
    y: &'y [f64],
    alpha: Vec<f64>,
    f: Vec<f64>,
    c: f64,
}

impl<'y> SolverState<'y> {
    fn new(y: &'y [f64], c: f64) -> Self {
        Self {
            y,
            alpha: vec![0.0; y.len()],
            f: y.iter().map(|&label| -label).collect(),
            c,
        }
    }

    #[inline]
    fn in_up(&self, k: usize) -> bool {
        if self.y[k] > 0.0 {
            self.alpha[k] < self.c
        } else {
            self.alpha[k] > 0.0
        }
    }

    #[inline]
    fn in_low(&self, k: usize) -> bool {
        if self.y[k] > 0.0 {
            self.alpha[k] > 0.0
        } else {
            self.alpha[k] < self.c
        }
    }

    fn extremes(&self, indices: impl Iterator<Item = usize>) -> Extremes {
        let mut ext = Extremes {
            i_up: None,
            b_up: f64::INFINITY,
            b_low: f64::NEG_INFINITY,
        };
        for k in indices {
            let f_k = self.f[k];
            if self.in_up(k) && f_k < ext.b_up {
                ext.b_up = f_k;
                ext.i_up = Some(k);
            }
            if self.in_low(k) && f_k > ext.b_low {
                ext.b_low = f_k;
            }
        }
        ext
    }

    /// Most violating (up, low) pair at least `epsilon` apart that is not
    /// blocked, searched over every up index rather than only the minimum
    fn unblocked_violating_pair(
        &self,
        active: &[usize],
        blocked: &HashSet<(usize, usize)>,
        epsilon: f64,
    ) -> Option<(usize, usize)> {
        let mut ups: Vec<usize> = active.iter().copied().filter(|&k| self.in_up(k)).collect();
        let mut lows: Vec<usize> = active.iter().copied().filter(|&k| self.in_low(k)).collect();
        ups.sort_by(|&a, &b| self.f[a].total_cmp(&self.f[b]));
        lows.sort_by(|&a, &b| self.f[b].total_cmp(&self.f[a]));
        let f_low_max = self.f[*lows.first()?];

        let mut best: Option<(usize, usize)> = None;
        let mut best_gap = f64::NEG_INFINITY;
        for &i in &ups {
            if f_low_max - self.f[i] <= best_gap {
                break;
            }
            for &j in &lows {
                let gap = self.f[j] - self.f[i];
                if gap < epsilon {
                    break;
                }
                if i != j && !blocked.contains(&(i, j)) {
                    if gap > best_gap {
                        best_gap = gap;
                        best = Some((i, j));
                    }
                    break;
                }
            }
        }
        best
    }
}

impl<K: Kernel, B: RowBackend> SMOSolver<K, B> {
    /// Create a new SMO solver with the given kernel, row backend and configuration
    pub fn new(kernel: K, backend: B, config: SolverConfig) -> Self {
        Self {
            kernel,
            backend,
            config,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Solve the binary problem given by `points` and +1/-1 labels `y`.
    ///
    /// Builds a kernel cache scoped to this run and drops it on return.
    pub fn solve(&self, points: &[SparseVector], y: &[f64]) -> Result<DualSolution> {
        self.config.validate()?;
        validate_binary_problem(points, y)?;

        let start = Instant::now();
        let mut precomputation = TrainingTimings::default();
        let mut cache = precomputation.time(
            |t| &mut t.precomputation,
            || KernelCache::new(&self.kernel, points, &self.backend, self.config.cache_size),
        );

        let mut solution = self.solve_with_cache(y, &mut cache)?;
        solution.timings.precomputation = precomputation.precomputation;
        solution.timings.total = start.elapsed();
        Ok(solution)
    }

    /// Solve using a caller-provided kernel cache over the same points as `y`
    pub fn solve_with_cache<KC: Kernel, BC: RowBackend>(
        &self,
        y: &[f64],
        cache: &mut KernelCache<'_, KC, BC>,
    ) -> Result<DualSolution> {
        if cache.len() != y.len() {
            return Err(SVMError::DimensionMismatch {
                expected: cache.len(),
                actual: y.len(),
            });
        }

        let n = y.len();
        let mut timings = TrainingTimings::default();
        let mut state = SolverState::new(y, self.config.c);
        let mut active: Vec<usize> = (0..n).collect();
        let mut shrinking = self
            .config
            .shrinking
            .then(|| ShrinkingStrategy::new(n, SHRINK_HISTORY));
        let mut blocked: HashSet<(usize, usize)> = HashSet::new();
        let mut iterations = 0;
        let mut status = ConvergenceStatus::IterationLimit;

        let loop_start = Instant::now();
        while iterations < self.config.max_iterations {
            let selection =
                self.select_working_set(&state, &active, &blocked, cache, &mut timings);

            match selection {
                Selection::Optimal | Selection::Stalled if active.len() < n => {
                    // Shrunk variables may violate again; re-check on the full set
                    debug!(
                        "reactivating {} shrunk variables at iteration {}",
                        n - active.len(),
                        iterations
                    );
                    active = (0..n).collect();
                    if let Some(strategy) = shrinking.as_mut() {
                        strategy.reset_history();
                    }
                }
                Selection::Optimal => {
                    status = ConvergenceStatus::Converged;
                    break;
                }
                Selection::Stalled => {
                    status = ConvergenceStatus::Stalled;
                    break;
                }
                Selection::Pair { i, j, row_i, gap } => {
                    iterations += 1;
                    if self.take_step(i, j, row_i, &mut state, cache, &mut timings) {
                        blocked.clear();
                    } else {
                        debug!("pair ({i}, {j}) cannot make progress, skipping");
                        blocked.insert((i, j));
                    }

                    if iterations % LOG_EVERY == 0 {
                        debug!(
                            "iteration {}: violation {:.6}, active {}/{}",
                            iterations,
                            gap,
                            active.len(),
                            n
                        );
                    }

                    if let Some(strategy) = shrinking.as_mut() {
                        if iterations % self.config.shrinking_iterations == 0 {
                            let ext = state.extremes(0..n);
                            strategy.update(&state.alpha, &state.f, y, state.c, ext.b_up, ext.b_low);
                            if strategy.has_sufficient_history() {
                                let shrinkable = strategy.shrinkable();
                                active.retain(|&k| !shrinkable[k]);
                            }
                        }
                    }
                }
            }
        }
        timings.iteration = loop_start.elapsed();

        let max_violation = state.extremes(0..n).gap().max(0.0);
        match status {
            ConvergenceStatus::Converged => debug!(
                "converged after {} iterations (violation {:.3e})",
                iterations, max_violation
            ),
            ConvergenceStatus::Stalled => info!(
                "stopped after {} iterations: no pair can make progress (violation {:.3e})",
                iterations, max_violation
            ),
            ConvergenceStatus::IterationLimit => warn!(
                "iteration limit {} reached before convergence (violation {:.3e})",
                self.config.max_iterations, max_violation
            ),
        }

        let b = self.calculate_bias(&state);
        let objective_value = calculate_objective(&state);
        let support_vectors: Vec<usize> = (0..n).filter(|&k| state.alpha[k] > 0.0).collect();

        Ok(DualSolution {
            alpha: state.alpha,
            b,
            support_vectors,
            iterations,
            objective_value,
            max_violation,
            status,
            cache_stats: cache.stats(),
            timings,
        })
    }

    /// Pick the next pair (i, j): i minimises f over the up set, j is taken
    /// from the low set by the configured strategy
    fn select_working_set<KC: Kernel, BC: RowBackend>(
        &self,
        state: &SolverState<'_>,
        active: &[usize],
        blocked: &HashSet<(usize, usize)>,
        cache: &mut KernelCache<'_, KC, BC>,
        timings: &mut TrainingTimings,
    ) -> Selection {
        let start = Instant::now();
        let ext = state.extremes(active.iter().copied());
        let gap = ext.gap();
        let i = match ext.i_up {
            Some(i) if gap >= self.config.epsilon => i,
            _ => {
                timings.selection += start.elapsed();
                return Selection::Optimal;
            }
        };
        let f_i = state.f[i];
        let is_blocked = |k: usize| !blocked.is_empty() && blocked.contains(&(i, k));

        let (j, row_i) = match self.config.working_set_strategy {
            WorkingSetStrategy::FirstOrder => {
                let j = active
                    .iter()
                    .copied()
                    .filter(|&k| state.in_low(k) && state.f[k] > f_i && !is_blocked(k))
                    .max_by(|&a, &b| state.f[a].total_cmp(&state.f[b]));
                timings.selection += start.elapsed();
                (j, None)
            }
            WorkingSetStrategy::SecondOrder => {
                timings.selection += start.elapsed();

                let kernel_start = Instant::now();
                let row_i = cache.query_row(i);
                timings.kernel_calculation += kernel_start.elapsed();

                let start = Instant::now();
                let k_ii = cache.diagonal(i);
                let mut best = None;
                let mut best_gain = f64::NEG_INFINITY;
                for &k in active {
                    if !state.in_low(k) {
                        continue;
                    }
                    let b = state.f[k] - f_i;
                    if b <= 0.0 || is_blocked(k) {
                        continue;
                    }
                    let mut a = k_ii + cache.diagonal(k) - 2.0 * row_i[k];
                    if a <= 0.0 {
                        a = TAU;
                    }
                    let gain = b * b / a;
                    if gain > best_gain {
                        best_gain = gain;
                        best = Some(k);
                    }
                }
                timings.selection += start.elapsed();
                (best, Some(row_i))
            }
        };

        match j {
            Some(j) => Selection::Pair { i, j, row_i, gap },
            None => {
                let start = Instant::now();
                let fallback = state.unblocked_violating_pair(active, blocked, self.config.epsilon);
                timings.selection += start.elapsed();
                match fallback {
                    Some((i, j)) => Selection::Pair {
                        i,
                        j,
                        row_i: None,
                        gap,
                    },
                    None => Selection::Stalled,
                }
            }
        }
    }

    /// Jointly optimise alpha_i and alpha_j; returns false if the pair could
    /// not move, leaving alphas and f untouched
    fn take_step<KC: Kernel, BC: RowBackend>(
        &self,
        i: usize,
        j: usize,
        row_i: Option<Arc<[f64]>>,
        state: &mut SolverState<'_>,
        cache: &mut KernelCache<'_, KC, BC>,
        timings: &mut TrainingTimings,
    ) -> bool {
        let kernel_start = Instant::now();
        let row_i = row_i.unwrap_or_else(|| cache.query_row(i));
        let row_j = cache.query_row(j);
        timings.kernel_calculation += kernel_start.elapsed();

        let start = Instant::now();
        let c = state.c;
        let y_i = state.y[i];
        let y_j = state.y[j];
        let alpha_i_old = state.alpha[i];
        let alpha_j_old = state.alpha[j];

        // Flat or concave direction: take the longest step the box allows
        let mut eta = cache.diagonal(i) + cache.diagonal(j) - 2.0 * row_i[j];
        if eta <= 0.0 {
            eta = TAU;
        }

        // Feasible segment for alpha_j on the line Σ α y = const
        let (low, high) = if y_i != y_j {
            let diff = alpha_j_old - alpha_i_old;
            (diff.max(0.0), (c + diff).min(c))
        } else {
            let sum = alpha_i_old + alpha_j_old;
            ((sum - c).max(0.0), sum.min(c))
        };
        if low >= high {
            timings.alpha_update += start.elapsed();
            return false;
        }

        let alpha_j_new = (alpha_j_old + y_j * (state.f[i] - state.f[j]) / eta).clamp(low, high);
        let alpha_i_new = alpha_i_old + y_i * y_j * (alpha_j_old - alpha_j_new);
        let alpha_j_new = snap_to_bounds(alpha_j_new, c);
        let alpha_i_new = snap_to_bounds(alpha_i_new, c);

        let delta_i = alpha_i_new - alpha_i_old;
        let delta_j = alpha_j_new - alpha_j_old;
        if delta_i == 0.0 && delta_j == 0.0 {
            timings.alpha_update += start.elapsed();
            return false;
        }
        state.alpha[i] = alpha_i_new;
        state.alpha[j] = alpha_j_new;
        timings.alpha_update += start.elapsed();

        let start = Instant::now();
        let scaled_i = delta_i * y_i;
        let scaled_j = delta_j * y_j;
        for (k, f_k) in state.f.iter_mut().enumerate() {
            *f_k += scaled_i * row_i[k] + scaled_j * row_j[k];
        }
        timings.gradient_update += start.elapsed();

        true
    }

    /// Bias from free support vectors, or the midpoint of the feasible
    /// interval when every support vector sits at a bound
    fn calculate_bias(&self, state: &SolverState<'_>) -> f64 {
        let (sum, count) = (0..state.alpha.len())
            .filter(|&k| state.alpha[k] > 0.0 && state.alpha[k] < state.c)
            .fold((0.0, 0usize), |(sum, count), k| (sum - state.f[k], count + 1));

        if count > 0 {
            return sum / count as f64;
        }

        let ext = state.extremes(0..state.alpha.len());
        match (ext.b_up.is_finite(), ext.b_low.is_finite()) {
            (true, true) => -(ext.b_up + ext.b_low) / 2.0,
            (true, false) => -ext.b_up,
            (false, true) => -ext.b_low,
            (false, false) => 0.0,
        }
    }
}

/// Dual objective Σ α - ½ αᵀQα, using Qα = y ∘ (f + y)
fn calculate_objective(state: &SolverState<'_>) -> f64 {
    state
        .alpha
        .iter()
        .zip(state.y)
        .zip(&state.f)
        .map(|((&a, &y), &f)| a - 0.5 * a * y * (f + y))
        .sum()
}

#[inline]
fn snap_to_bounds(alpha: f64, c: f64) -> f64 {
    let tol = BOUND_SNAP * c.max(1.0);
    if alpha < tol {
        0.0
    } else if alpha > c - tol {
        c
    } else {
        alpha
    }
}

fn validate_binary_problem(points: &[SparseVector], y: &[f64]) -> Result<()> {
    if points.is_empty() {
        return Err(SVMError::EmptyDataset);
    }
    if points.len() != y.len() {
        return Err(SVMError::DimensionMismatch {
            expected: points.len(),
            actual: y.len(),
        });
    }
    if let Some(&label) = y.iter().find(|&&label| label != 1.0 && label != -1.0) {
        return Err(SVMError::InvalidLabel(label));
    }
    let positives = y.iter().filter(|&&label| label > 0.0).count();
    if positives == 0 || positives == y.len() {
        return Err(SVMError::DegenerateProblem(
            "binary sub-problem needs instances of both classes".to_string(),
        ));
    }
    Ok(())
}
