//! minimizer::builders — solver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for the four solvers behind
//! [`Method`](super::traits::Method). These helpers hide argmin's generic
//! wiring and apply the crate's fixed tolerances, so the runners in
//! [`run`](super::run) can request a configured solver without touching
//! argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Nelder–Mead starts from a simplex built around `p0`: each non-zero
//!   coordinate is scaled by [`SIMPLEX_NONZERO_SCALE`], each zero one is
//!   set to [`SIMPLEX_ZERO_STEP`].
//! - BFGS and L-BFGS use the More–Thuente line search with the gradient
//!   tolerance [`TOL_GRAD`].
//! - Powell is a crate-local solver; its builder only fixes tolerances.
//!
//! Conventions
//! -----------
//! - The builders do **not** set `max_iters` or, apart from Nelder–Mead,
//!   the initial parameter vector; the runner applies both.
//! - Invalid tolerances surface as [`OptError`](crate::optimization::errors::OptError)
//!   via the crate's `From<argmin::core::Error>` conversion.
use crate::optimization::{
    errors::OptResult,
    minimizer::{
        powell::Powell,
        types::{
            BfgsMoreThuente, LbfgsMoreThuente, MoreThuenteLS, NelderMeadSolver, Theta,
            DEFAULT_LBFGS_MEM, NM_SD_TOLERANCE, POWELL_FTOL, POWELL_LINE_TOL,
            SIMPLEX_NONZERO_SCALE, SIMPLEX_ZERO_STEP, TOL_GRAD,
        },
    },
};

/// Initial simplex: `p0` plus one vertex per coordinate.
pub fn initial_simplex(p0: &Theta) -> Vec<Theta> {
    let mut vertices = Vec::with_capacity(p0.len() + 1);
    vertices.push(p0.clone());
    for k in 0..p0.len() {
        let mut vertex = p0.clone();
        vertex[k] =
            if vertex[k] != 0.0 { vertex[k] * SIMPLEX_NONZERO_SCALE } else { SIMPLEX_ZERO_STEP };
        vertices.push(vertex);
    }
    vertices
}

/// Nelder–Mead over the simplex from [`initial_simplex`].
pub fn build_nelder_mead(p0: &Theta) -> OptResult<NelderMeadSolver> {
    let solver = NelderMeadSolver::new(initial_simplex(p0)).with_sd_tolerance(NM_SD_TOLERANCE)?;
    Ok(solver)
}

/// BFGS with More–Thuente line search.
///
/// Notes
/// -----
/// - The runner seeds the inverse Hessian with the identity.
pub fn build_bfgs() -> OptResult<BfgsMoreThuente> {
    let solver = BfgsMoreThuente::new(MoreThuenteLS::new()).with_tolerance_grad(TOL_GRAD)?;
    Ok(solver)
}

/// L-BFGS with More–Thuente line search, run on a
/// [`ProjectedAdapter`](super::adapter::ProjectedAdapter) for the bounded
/// method.
pub fn build_lbfgsb() -> OptResult<LbfgsMoreThuente> {
    let solver = LbfgsMoreThuente::new(MoreThuenteLS::new(), DEFAULT_LBFGS_MEM)
        .with_tolerance_grad(TOL_GRAD)?;
    Ok(solver)
}

/// Powell's direction-set method.
pub fn build_powell() -> Powell {
    Powell::new(POWELL_FTOL, POWELL_LINE_TOL)
}
