//! params::perturb — random starting points and bulk parameter reads.
//!
//! Purpose
//! -------
//! Draw random parameter vectors inside the box bounds (for restarting
//! fits from dispersed points) and read the parameter values of many
//! fitted graph files into one array.
//!
//! Key behaviors
//! -------------
//! - Parameters whose lower bound is `>= 1` (sizes, times) are drawn
//!   uniformly on `[lower, upper]`; the rest (rates) are drawn uniformly in
//!   `log10` space so that every order of magnitude is equally likely.
//! - Draws violating a constraint are rejected and redrawn; more than
//!   `timeout` rejections abort the draw.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every upper bound is finite; log-uniform parameters have a strictly
//!   positive lower bound.
//! - The caller owns the random generator, so seeded runs are
//!   reproducible.
use crate::graph::{builder::GraphBuilder, demes::DemeGraph};
use crate::params::{
    constraints::ConstraintSet,
    errors::{ParamError, ParamResult},
    options::ParameterOptions,
    set::ParameterSet,
};
use ndarray::{Array1, Array2};
use rand::Rng;
use std::path::Path;

/// Default number of rejected draws tolerated by [`perturb_parameters`].
pub const DEFAULT_PERTURB_TIMEOUT: usize = 1000;

/// Draw a random vector inside the bounds of `set` that satisfies
/// `constraints`.
///
/// Parameters
/// ----------
/// - `set`: parameters providing names and bounds (initial values unused).
/// - `constraints`: ordering constraints; an empty set accepts every draw.
/// - `rng`: random source.
/// - `timeout`: maximum number of rejected draws before giving up.
///
/// Errors
/// ------
/// - [`ParamError::InfiniteUpperBound`] if any upper bound is infinite.
/// - [`ParamError::NonPositiveLogBound`] if a log-uniform parameter has a
///   lower bound `<= 0`.
/// - [`ParamError::PerturbationTimeout`] after more than `timeout`
///   rejected draws.
pub fn perturb_parameters<R: Rng + ?Sized>(
    set: &ParameterSet, constraints: &ConstraintSet, rng: &mut R, timeout: usize,
) -> ParamResult<Array1<f64>> {
    let lower = set.lower();
    let upper = set.upper();
    for (i, name) in set.names().iter().enumerate() {
        if !upper[i].is_finite() {
            return Err(ParamError::InfiniteUpperBound { name: name.clone() });
        }
        if lower[i] <= 0.0 {
            return Err(ParamError::NonPositiveLogBound { name: name.clone(), lower: lower[i] });
        }
    }

    let mut rejected = 0usize;
    loop {
        let p: Array1<f64> = lower
            .iter()
            .zip(upper.iter())
            .map(|(&lo, &hi)| {
                if lo >= 1.0 {
                    rng.gen_range(lo..=hi)
                } else {
                    10f64.powf(rng.gen_range(lo.log10()..=hi.log10())).clamp(lo, hi)
                }
            })
            .collect();
        if constraints.is_satisfied(p.view()) {
            log::debug!("perturbed parameters: {p}");
            return Ok(p);
        }
        rejected += 1;
        if rejected > timeout {
            return Err(ParamError::PerturbationTimeout { attempts: rejected });
        }
    }
}

/// Build a graph with randomly drawn parameter values.
///
/// Notes
/// -----
/// - `builder` is not modified; a clone receives the drawn values.
/// - When `out` is given the graph is also written there as YAML.
pub fn perturb_graph<R: Rng + ?Sized>(
    builder: &GraphBuilder, options: &ParameterOptions, rng: &mut R, timeout: usize,
    out: Option<&Path>,
) -> ParamResult<DemeGraph> {
    let set = ParameterSet::from_builder(builder, options)?;
    let constraints = ConstraintSet::from_options(options, set.names())?;
    let p = perturb_parameters(&set, &constraints, rng, timeout)?;

    let mut perturbed = builder.clone();
    options.write_values(&mut perturbed, p.view())?;
    let graph = perturbed.build()?;
    if let Some(path) = out {
        graph.dump(path)?;
    }
    Ok(graph)
}

/// Parameter values of many graph files, one row per file.
///
/// With `permissive`, bounds are widened first (see
/// [`ParameterOptions::permissive`]) so that values sitting on a bound do
/// not fail the initial-value check.
pub fn get_param_arr<P: AsRef<Path>>(
    graph_paths: &[P], options: &ParameterOptions, permissive: bool,
) -> ParamResult<(Vec<String>, Array2<f64>)> {
    let options = if permissive { options.permissive() } else { options.clone() };
    let n_params = options.len();
    let mut flat = Vec::with_capacity(graph_paths.len() * n_params);
    for path in graph_paths {
        let builder = GraphBuilder::load(path.as_ref())?;
        let set = ParameterSet::from_builder(&builder, &options)?;
        flat.extend(set.values().iter().copied());
    }
    let arr = Array2::from_shape_vec((graph_paths.len(), n_params), flat).map_err(|_| {
        ParamError::DimensionMismatch { expected: graph_paths.len() * n_params, found: 0 }
    })?;
    Ok((options.names(), arr))
}
