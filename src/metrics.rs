//! Explicit timing and accuracy context for training and evaluation runs
//!
//! Every solver run owns a [`TrainingTimings`] and hands it back with its
//! result; the pairwise fit sums them. Nothing here is process-global.

use std::fmt;
use std::ops::AddAssign;
use std::time::{Duration, Instant};

/// Per-phase elapsed time of a fit
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TrainingTimings {
    pub data_loading: Duration,
    /// Kernel diagonal computed before the first iteration
    pub precomputation: Duration,
    /// Whole optimisation loop
    pub iteration: Duration,
    pub selection: Duration,
    pub kernel_calculation: Duration,
    pub alpha_update: Duration,
    pub gradient_update: Duration,
    /// Wall-clock time of the fit call
    pub total: Duration,
}

impl TrainingTimings {
    /// Run `f` and add its elapsed time to the field chosen by `slot`
    #[inline]
    pub fn time<T>(
        &mut self,
        slot: fn(&mut TrainingTimings) -> &mut Duration,
        f: impl FnOnce() -> T,
    ) -> T {
        let start = Instant::now();
        let out = f();
        *slot(self) += start.elapsed();
        out
    }

    /// Rows of (phase name, elapsed), in reporting order
    pub fn phases(&self) -> [(&'static str, Duration); 8] {
        [
            ("data loading", self.data_loading),
            ("training", self.total),
            ("pre-computation kernel", self.precomputation),
            ("iteration", self.iteration),
            ("2 instances selection", self.selection),
            ("kernel calculation", self.kernel_calculation),
            ("alpha updating", self.alpha_update),
            ("g value updating", self.gradient_update),
        ]
    }
}

impl AddAssign for TrainingTimings {
    fn add_assign(&mut self, rhs: Self) {
        self.data_loading += rhs.data_loading;
        self.precomputation += rhs.precomputation;
        self.iteration += rhs.iteration;
        self.selection += rhs.selection;
        self.kernel_calculation += rhs.kernel_calculation;
        self.alpha_update += rhs.alpha_update;
        self.gradient_update += rhs.gradient_update;
        self.total += rhs.total;
    }
}

impl fmt::Display for TrainingTimings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, elapsed) in self.phases() {
            writeln!(f, "{name} timer: {:.3}s", elapsed.as_secs_f64())?;
        }
        Ok(())
    }
}

/// Outcome of scoring a labeled set
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvaluationReport {
    /// Percentage of correctly predicted instances
    pub accuracy: f64,
    pub correct: usize,
    pub total: usize,
    /// Wall-clock prediction time
    pub elapsed: Duration,
}

impl EvaluationReport {
    pub fn new(correct: usize, total: usize, elapsed: Duration) -> Self {
        let accuracy = if total == 0 {
            0.0
        } else {
            100.0 * correct as f64 / total as f64
        };
        Self {
            accuracy,
            correct,
            total,
            elapsed,
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "classifier accuracy = {:.2}%({}/{})",
            self.accuracy, self.correct, self.total
        )?;
        write!(
            f,
            "prediction time elapsed: {:.2}s",
            self.elapsed.as_secs_f64()
        )
    }
}
