// src/rarefy/steps.rs

use crate::error::RarefyError;

/// Sampling sizes `lo, lo + step, ...` strictly below `hi`, then `hi` itself.
///
/// The endpoints may come in either order. `hi` is always the last element,
/// whether or not it falls on the stride.
pub fn generate_steps(a: usize, b: usize, step: usize) -> Result<Vec<usize>, RarefyError> {
    if step == 0 {
        return Err(RarefyError::InvalidRange { step });
    }
    let (lo, hi) = (a.min(b), a.max(b));

    let mut steps: Vec<usize> = (lo..hi).step_by(step).collect();
    steps.push(hi);
    Ok(steps)
}
