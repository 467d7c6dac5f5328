//! Shrinking heuristic
//!
//! A variable stuck at a bound whose gradient keeps it out of every
//! violating pair is unlikely to move again. After it has looked that way
//! for `h` consecutive observations it is removed from working set
//! selection. Gradients are still maintained for shrunk variables, so
//! reactivating them costs nothing but a rescan.

use std::collections::VecDeque;

/// Number of consecutive observations before a variable is shrunk
pub const SHRINK_HISTORY: usize = 3;

/// Shrinking strategy for SVM optimization
///
/// Tracks, per variable, whether it was pinned at a bound on each of the
/// last `history_size` observations.
#[derive(Debug)]
pub struct ShrinkingStrategy {
    history: Vec<VecDeque<bool>>,
    history_size: usize,
    observations: usize,
}

impl ShrinkingStrategy {
    /// Create a new shrinking strategy for `n_samples` variables
    pub fn new(n_samples: usize, history_size: usize) -> Self {
        Self {
            history: vec![VecDeque::with_capacity(history_size); n_samples],
            history_size,
            observations: 0,
        }
    }

    /// Record one observation of every variable
    ///
    /// `f` is the solver's gradient vector, `b_up`/`b_low` the current
    /// minimum over the up set and maximum over the low set.
    pub fn update(&mut self, alpha: &[f64], f: &[f64], y: &[f64], c: f64, b_up: f64, b_low: f64) {
        for (k, history) in self.history.iter_mut().enumerate() {
            let pinned = is_pinned(alpha[k], f[k], y[k], c, b_up, b_low);
            Self::update_history(history, pinned, self.history_size);
        }
        self.observations += 1;
    }

    fn update_history(history: &mut VecDeque<bool>, value: bool, history_size: usize) {
        history.push_back(value);
        if history.len() > history_size {
            history.pop_front();
        }
    }

    /// Mask of variables pinned on every recorded observation
    pub fn shrinkable(&self) -> Vec<bool> {
        self.history
            .iter()
            .map(|h| h.len() == self.history_size && h.iter().all(|&pinned| pinned))
            .collect()
    }

    /// Check if enough history is available for shrinking decisions
    pub fn has_sufficient_history(&self) -> bool {
        self.observations >= self.history_size
    }

    /// Reset history (used when unshrinking)
    pub fn reset_history(&mut self) {
        for history in &mut self.history {
            history.clear();
        }
        self.observations = 0;
    }
}

/// A bounded variable belongs to exactly one of the up/low sets. It cannot
/// take part in a violating pair while its gradient lies on the far side of
/// the opposite set's extreme.
fn is_pinned(alpha: f64, f: f64, y: f64, c: f64, b_up: f64, b_low: f64) -> bool {
    let at_lower = alpha <= 0.0;
    let at_upper = alpha >= c;
    if !(at_lower || at_upper) {
        return false;
    }
    let up_only = (y > 0.0) == at_lower;
    if up_only {
        f > b_low
    } else {
        f < b_up
    }
}
