//! Kernel functions
//!
//! Every kernel here evaluates sparse operands through one merge-join over
//! their sorted indices, so `K(x, y)` and `K(y, x)` are the same bits. The
//! kernel cache depends on that to serve pair queries from either row.

pub mod kind;
pub mod linear;
pub mod polynomial;
pub mod rbf;
pub mod sigmoid;
pub mod traits;

pub use self::kind::*;
pub use self::linear::*;
pub use self::polynomial::*;
pub use self::rbf::*;
pub use self::sigmoid::*;
pub use self::traits::*;

use crate::core::{Result, SVMError};

fn check_gamma(gamma: f64) -> Result<()> {
    if gamma.is_finite() && gamma > 0.0 {
        Ok(())
    } else {
        Err(SVMError::InvalidParameter(format!(
            "gamma must be positive and finite, got {gamma}"
        )))
    }
}
