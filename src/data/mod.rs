//! Data loading and problem construction
//!
//! Reads labeled sparse instances and splits them into the two-class
//! sub-problems of a one-vs-one fit.

pub mod libsvm;
pub mod problem;

pub use self::libsvm::*;
pub use self::problem::*;
