//! Binary SVM solver
//!
//! Sequential Minimal Optimization over the dual problem with first- or
//! second-order working set selection and optional shrinking.

pub mod shrinking;
pub mod smo;

pub use self::shrinking::*;
pub use self::smo::*;
