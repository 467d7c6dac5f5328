//! Linear kernel and the sparse merge-join it is built on

use crate::core::SparseVector;
use crate::kernel::Kernel;
use serde::{Deserialize, Serialize};

/// K(x, y) = <x, y>
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LinearKernel;

impl Kernel for LinearKernel {
    #[inline]
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        sparse_dot(x, y)
    }
}

/// Walk two sorted index lists in lockstep.
///
/// `shared` sees entries present in both operands, `lone` sees entries
/// present in only one. Operands are visited in ascending index order
/// whichever side they come from, so swapping `x` and `y` performs the same
/// floating point operations in the same order.
#[inline]
pub(crate) fn merge_join(
    x: &SparseVector,
    y: &SparseVector,
    mut shared: impl FnMut(f64, f64),
    mut lone: impl FnMut(f64),
) {
    let (mut i, mut j) = (0, 0);
    while i < x.indices.len() && j < y.indices.len() {
        match x.indices[i].cmp(&y.indices[j]) {
            std::cmp::Ordering::Equal => {
                shared(x.values[i], y.values[j]);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => {
                lone(x.values[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                lone(y.values[j]);
                j += 1;
            }
        }
    }
    x.values[i..].iter().chain(&y.values[j..]).for_each(|&v| lone(v));
}

/// Inner product over the shared indices
pub(crate) fn sparse_dot(x: &SparseVector, y: &SparseVector) -> f64 {
    let mut sum = 0.0;
    merge_join(x, y, |a, b| sum += a * b, |_| {});
    sum
}
