//! optimization::context — per-run mutable state for objective evaluation.
//!
//! Purpose
//! -------
//! Own the two pieces of state that objective evaluations update: the
//! evaluation-call counter used for progress lines and provenance, and the
//! inverse-covariance cache of the likelihood engine.
//!
//! Invariants & assumptions
//! ------------------------
//! - One context per optimization or uncertainty run. Interior mutability
//!   (`Cell` / `RefCell`) keeps objective methods `&self`, and makes the
//!   context `!Sync`, so it cannot be shared across threads.
//! - The counter is reset by the dispatcher after every run.
use crate::optimization::likelihood::InvCovCache;
use std::cell::{Cell, RefCell};

#[derive(Debug, Default)]
pub struct OptimizationContext {
    n_func_calls: Cell<usize>,
    inv_cov_cache: RefCell<InvCovCache>,
}

impl OptimizationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one objective evaluation and return the new total.
    pub fn record_call(&self) -> usize {
        let n = self.n_func_calls.get() + 1;
        self.n_func_calls.set(n);
        n
    }

    pub fn n_func_calls(&self) -> usize {
        self.n_func_calls.get()
    }

    pub fn reset_calls(&self) {
        self.n_func_calls.set(0);
    }

    /// Mutable access to the inverse-covariance cache for one likelihood
    /// evaluation.
    pub fn inv_cov_cache(&self) -> std::cell::RefMut<'_, InvCovCache> {
        self.inv_cov_cache.borrow_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // The counter increments per call and returns to zero on reset.
    fn counter_records_and_resets() {
        // Arrange
        let ctx = OptimizationContext::new();

        // Act
        ctx.record_call();
        let n = ctx.record_call();

        // Assert
        assert_eq!(n, 2);
        assert_eq!(ctx.n_func_calls(), 2);
        ctx.reset_calls();
        assert_eq!(ctx.n_func_calls(), 0);
    }
}
