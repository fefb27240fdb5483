//! inference::uncerts — standard errors of fitted demographic parameters.
//!
//! Purpose
//! -------
//! Compute standard errors for the parameters of a fitted graph from the
//! H2 composite likelihood, either from the observed Fisher information
//! (`FIM`) or from the Godambe information (`GIM`), which accounts for the
//! dependence between statistics through bootstrap replicates.
//!
//! Key behaviors
//! -------------
//! - The parameter vector is read from the fitted graph with the options
//!   document; bounds and constraints play no role.
//! - Without an explicit `u`, the fitted mutation rate recorded in the
//!   graph's `opt_info` is appended as the last parameter.
//! - Standard errors are `sqrt(diag(M⁻¹))` for `M = H` (FIM) or `M = G`
//!   (GIM).
//!
//! Conventions
//! -----------
//! - The model is evaluated with the H row exactly when `data` has one.
//! - A negative diagonal entry of `M⁻¹` yields a `NaN` standard error and a
//!   warning; it signals that `p0` is not a local optimum.
use std::fmt;
use std::str::FromStr;

use crate::graph::builder::GraphBuilder;
use crate::inference::{
    errors::{InferenceError, InferenceResult},
    godambe::godambe_matrix,
};
use crate::linalg::try_inverse;
use crate::model::H2Evaluator;
use crate::optimization::context::OptimizationContext;
use crate::params::{options::ParameterOptions, set::MUTATION_RATE_NAME};
use crate::spectra::h2::H2Spectrum;
use ndarray::{s, Array1};

/// Default relative finite-difference step.
pub const DEFAULT_DELTA: f64 = 0.01;

/// Information matrix used for the standard errors.
///
/// Parsing accepts `"FIM"` and `"GIM"` in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UncertaintyMethod {
    /// Observed Fisher information `H = −∇²ℓ`.
    Fim,
    /// Godambe information `G = H J⁻¹ H`.
    Gim,
}

impl FromStr for UncertaintyMethod {
    type Err = InferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "FIM" => Ok(UncertaintyMethod::Fim),
            "GIM" => Ok(UncertaintyMethod::Gim),
            _ => Err(InferenceError::UnsupportedMethod { name: s.to_string() }),
        }
    }
}

impl fmt::Display for UncertaintyMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UncertaintyMethod::Fim => f.write_str("FIM"),
            UncertaintyMethod::Gim => f.write_str("GIM"),
        }
    }
}

/// Parameter names, point estimates and standard errors, aligned by index.
#[derive(Debug, Clone, PartialEq)]
pub struct Uncertainties {
    pub names: Vec<String>,
    pub values: Array1<f64>,
    pub std_errors: Array1<f64>,
}

/// Standard errors of the parameters of a fitted graph.
///
/// Parameters
/// ----------
/// - `builder`: document of the fitted graph.
/// - `options`: parameter paths (bounds are ignored).
/// - `data`: observed H2 statistics with covariances.
/// - `bootstraps`: replicates of `data`; required for GIM.
/// - `evaluator`: expected-H2 model.
/// - `u`: fixed mutation rate; `None` reads it from `opt_info.u` and treats
///   it as a parameter.
/// - `delta`: relative finite-difference step (see [`DEFAULT_DELTA`]).
///
/// Returns
/// -------
/// [`Uncertainties`] with `u` last when it was read from the graph.
///
/// Errors
/// ------
/// - [`InferenceError::MissingMutationRate`] if `u` is `None` and the graph
///   has no `opt_info.u`.
/// - [`InferenceError::MissingBootstraps`] for GIM without replicates,
///   before any evaluation.
/// - [`InferenceError::SingularMatrix`] if `H` or `G` (or `J`) is singular.
/// - Finite-difference, model, graph, and parameter errors.
#[allow(clippy::too_many_arguments)]
pub fn get_uncerts<E: H2Evaluator + ?Sized>(
    builder: &GraphBuilder, options: &ParameterOptions, data: &H2Spectrum,
    bootstraps: &[H2Spectrum], evaluator: &E, u: Option<f64>, delta: f64,
    method: UncertaintyMethod, ctx: &OptimizationContext,
) -> InferenceResult<Uncertainties> {
    if method == UncertaintyMethod::Gim && bootstraps.is_empty() {
        return Err(InferenceError::MissingBootstraps);
    }
    let mut names = options.names();
    let mut p0 = options.read_values(builder)?;
    let n_graph = p0.len();
    let fit_u = u.is_none();
    if fit_u {
        let fitted_u = builder
            .build()?
            .opt_info()?
            .and_then(|info| info.u)
            .ok_or(InferenceError::MissingMutationRate)?;
        names.push(MUTATION_RATE_NAME.to_string());
        p0 = p0.iter().copied().chain(std::iter::once(fitted_u)).collect();
    }
    log::info!("estimating uncertainties with {method} at {p0}");

    let mut work = builder.clone();
    let model_fn = |p: &Array1<f64>| -> InferenceResult<H2Spectrum> {
        let rate = match u {
            Some(u) => u,
            None => p[n_graph],
        };
        options.write_values(&mut work, p.slice(s![..n_graph]))?;
        let graph = work.build()?;
        let model = H2Spectrum::from_graph(
            evaluator,
            &graph,
            data.sample_ids(),
            data.r_bins().view(),
            rate,
            data.has_h(),
        )?;
        Ok(model)
    };

    let just_h = method == UncertaintyMethod::Fim;
    let info = godambe_matrix(model_fn, p0.view(), data, bootstraps, delta, just_h, ctx)?;
    let what = if just_h { "Fisher information" } else { "Godambe information" };
    let cov = try_inverse(info.view()).ok_or(InferenceError::SingularMatrix { what })?;
    let std_errors = cov.diag().mapv(f64::sqrt);
    if std_errors.iter().any(|se| se.is_nan()) {
        log::warn!("negative variance in the {what} inverse; the point is not a local optimum");
    }

    Ok(Uncertainties { names, values: p0, std_errors })
}
