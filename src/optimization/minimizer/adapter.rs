//! Adapters that expose an [`Objective`] as an `argmin` problem.
//!
//! The objective already returns a cost `c(θ) = −ℓ(θ)`, so no sign flip
//! happens here. Neither adapter has analytic gradients:
//! - [`ArgMinAdapter`] finite-differences the cost with central
//!   differences (BFGS).
//! - [`ProjectedAdapter`] rescales parameters by their box widths, clamps
//!   them to their bounds, differences inside the box only, and projects
//!   the gradient at active bounds (L-BFGS-B).
use std::cell::RefCell;

use crate::optimization::{
    errors::OptError,
    minimizer::{
        types::{Cost, Grad, Theta, LBFGSB_FD_STEP},
        validation::validate_grad,
    },
    objective::Objective,
};
use argmin::core::{CostFunction, Error, Gradient};
use finitediff::FiniteDiff;

/// Bridges an [`Objective`] to `argmin`'s `CostFunction` and `Gradient`.
pub struct ArgMinAdapter<'a, O: Objective + ?Sized> {
    pub objective: &'a O,
}

impl<'a, O: Objective + ?Sized> ArgMinAdapter<'a, O> {
    pub fn new(objective: &'a O) -> Self {
        Self { objective }
    }
}

impl<'a, O: Objective + ?Sized> CostFunction for ArgMinAdapter<'a, O> {
    type Param = Theta;
    type Output = Cost;

    /// Evaluate the cost, rejecting non-finite values with
    /// `OptError::NonFiniteCost`.
    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let output = self.objective.evaluate(theta)?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a, O: Objective + ?Sized> Gradient for ArgMinAdapter<'a, O> {
    type Param = Theta;
    type Gradient = Grad;

    /// Finite-difference gradient of the cost.
    ///
    /// Behavior:
    /// - Try *central* differences first.
    /// - If any cost evaluation failed (captured in `closure_err`), or the
    ///   result fails validation, retry once with *forward* differences.
    ///
    /// The FD closure must return `f64`, so the first error is stored in a
    /// slot and `NaN` returned; it is turned back into a real error after
    /// differencing.
    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        let dim = theta.len();
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let cost_func = |theta: &Theta| -> f64 {
            match self.cost(theta) {
                Ok(val) => val,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e);
                    }
                    f64::NAN
                }
            }
        };
        let fd_grad = theta.central_diff(&cost_func);
        if closure_err.borrow().is_some() {
            return run_fd_diff(theta, &cost_func, &closure_err);
        }
        match validate_grad(&fd_grad, dim) {
            Ok(()) => Ok(fd_grad),
            Err(_) => run_fd_diff(theta, &cost_func, &closure_err),
        }
    }
}

/// Box-constrained, rescaled view of an [`Objective`].
///
/// The solver works on `z = θ / s`, with one scale `s_i` per coordinate
/// (the width of its box, or the start magnitude when the box is
/// unbounded), so a mutation rate near `1e-8` and a population size near
/// `1e4` are both of order one. The cost is evaluated at `z · s` clamped
/// into `bounds`.
///
/// Gradients are taken in `z` with a step `h`: central differences when
/// both `z_i ± h` stay inside the box, otherwise a one-sided difference
/// towards the side with more room, shortened to that room. Probes never
/// leave the box, so the objective's infeasibility penalty is never
/// differenced. Components that would push an active bound further
/// outside are zeroed.
pub struct ProjectedAdapter<'a, O: Objective + ?Sized> {
    objective: &'a O,
    bounds: &'a [(f64, f64)],
    scaled_bounds: Vec<(f64, f64)>,
    scale: Theta,
    step: f64,
}

impl<'a, O: Objective + ?Sized> ProjectedAdapter<'a, O> {
    /// Parameters
    /// ----------
    /// - `bounds`: natural-space `(lower, upper)` per coordinate.
    /// - `reference`: start point; supplies the scale of coordinates whose
    ///   box is unbounded.
    pub fn new(objective: &'a O, bounds: &'a [(f64, f64)], reference: &Theta) -> Self {
        let scale = bound_scales(bounds, reference);
        let scaled_bounds =
            bounds.iter().zip(scale.iter()).map(|(&(lo, hi), &s)| (lo / s, hi / s)).collect();
        Self { objective, bounds, scaled_bounds, scale, step: LBFGSB_FD_STEP }
    }

    /// Solver coordinates of a natural-space point.
    pub fn to_scaled(&self, theta: &Theta) -> Theta {
        theta / &self.scale
    }

    /// Natural-space point of solver coordinates, clamped into the box.
    pub fn to_natural(&self, z: &Theta) -> Theta {
        clamp_to_bounds(&(z * &self.scale), self.bounds)
    }

    fn eval_scaled(&self, z: &Theta) -> Result<Cost, Error> {
        let output = self.objective.evaluate(&self.to_natural(z))?;
        if !output.is_finite() {
            return Err((OptError::NonFiniteCost { value: output }).into());
        }
        Ok(output)
    }
}

impl<'a, O: Objective + ?Sized> CostFunction for ProjectedAdapter<'a, O> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, z: &Self::Param) -> Result<Self::Output, Error> {
        self.eval_scaled(z)
    }
}

impl<'a, O: Objective + ?Sized> Gradient for ProjectedAdapter<'a, O> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, z: &Self::Param) -> Result<Self::Gradient, Error> {
        let clamped = clamp_to_bounds(z, &self.scaled_bounds);
        let mut grad = Grad::zeros(clamped.len());
        let mut f0 = None;
        for (i, &(lo, hi)) in self.scaled_bounds.iter().enumerate() {
            let x = clamped[i];
            let (room_down, room_up) = (x - lo, hi - x);
            let g = if room_down >= self.step && room_up >= self.step {
                let fp = self.eval_scaled(&shifted(&clamped, i, self.step))?;
                let fm = self.eval_scaled(&shifted(&clamped, i, -self.step))?;
                (fp - fm) / (2.0 * self.step)
            } else {
                let h = if room_up >= room_down {
                    self.step.min(room_up)
                } else {
                    -self.step.min(room_down)
                };
                if h == 0.0 {
                    0.0
                } else {
                    let base = match f0 {
                        Some(value) => value,
                        None => {
                            let value = self.eval_scaled(&clamped)?;
                            f0 = Some(value);
                            value
                        }
                    };
                    (self.eval_scaled(&shifted(&clamped, i, h))? - base) / h
                }
            };
            grad[i] = if (x <= lo && g > 0.0) || (x >= hi && g < 0.0) { 0.0 } else { g };
        }
        validate_grad(&grad, clamped.len())?;
        Ok(grad)
    }
}

/// Per-coordinate scale: the box width when it is finite and positive,
/// otherwise `|reference_i|`, otherwise `1`.
pub fn bound_scales(bounds: &[(f64, f64)], reference: &Theta) -> Theta {
    bounds
        .iter()
        .zip(reference.iter())
        .map(|(&(lo, hi), &r)| {
            let width = hi - lo;
            if width.is_finite() && width > 0.0 {
                width
            } else if r != 0.0 && r.is_finite() {
                r.abs()
            } else {
                1.0
            }
        })
        .collect()
}

fn shifted(z: &Theta, i: usize, h: f64) -> Theta {
    let mut out = z.clone();
    out[i] += h;
    out
}

/// Clamp each coordinate of `theta` into its `(lower, upper)` pair.
pub fn clamp_to_bounds(theta: &Theta, bounds: &[(f64, f64)]) -> Theta {
    theta.iter().zip(bounds.iter()).map(|(&v, &(lo, hi))| v.clamp(lo, hi)).collect()
}

/// Forward-difference gradient of `func` at `theta`, with error capture.
fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> Result<Grad, Error> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    if let Some(err) = closure_err.take() {
        return Err(err);
    }
    validate_grad(&fd_grad, theta.len())?;
    Ok(fd_grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptResult;
    use approx::assert_relative_eq;
    use ndarray::array;

    // Scope
    // -----
    // - Cost passthrough and non-finite rejection.
    // - Central-difference and projected gradients on a quadratic.
    // - Projected gradients in boxes narrower than one.

    struct Bowl;

    impl Objective for Bowl {
        fn name(&self) -> &str {
            "bowl"
        }

        fn evaluate(&self, theta: &Theta) -> OptResult<f64> {
            Ok((theta[0] - 1.0).powi(2) + 2.0 * (theta[1] + 0.5).powi(2))
        }
    }

    struct Broken;

    impl Objective for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn evaluate(&self, _theta: &Theta) -> OptResult<f64> {
            Ok(f64::NAN)
        }
    }

    #[test]
    // Purpose
    // -------
    // The adapter returns the objective unchanged and FD-differentiates it.
    fn central_gradient_matches_analytic() {
        let adapter = ArgMinAdapter::new(&Bowl);
        let theta = array![0.0, 0.0];

        let cost = adapter.cost(&theta).unwrap();
        let grad = adapter.gradient(&theta).unwrap();

        assert_relative_eq!(cost, 1.5);
        assert_relative_eq!(grad[0], -2.0, epsilon = 1e-5);
        assert_relative_eq!(grad[1], 2.0, epsilon = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // Non-finite costs surface as `NonFiniteCost`.
    fn non_finite_cost_is_an_error() {
        let adapter = ArgMinAdapter::new(&Broken);

        let err = adapter.cost(&array![0.0]).unwrap_err();

        assert!(matches!(OptError::from(err), OptError::NonFiniteCost { .. }));
    }

    #[test]
    // Purpose
    // -------
    // The projected adapter clamps out-of-box points and zeroes gradient
    // components that point outward at an active bound.
    //
    // Given
    // -----
    // - Bowl with minimum at (1, -0.5), box [2, 3] × [-1, 1], so the scales
    //   are the widths (1, 2).
    //
    // Expect
    // ------
    // - Cost at (0, 0) equals cost at (2, 0).
    // - At x0 = 2 (lower bound) the gradient points outward (> 0) → 0.
    // - The y component is 2 × ∂f/∂y = 2 × 2 = 4 in scaled units.
    fn projected_gradient_respects_bounds() {
        let bounds = [(2.0, 3.0), (-1.0, 1.0)];
        let adapter = ProjectedAdapter::new(&Bowl, &bounds, &array![2.5, 0.0]);
        let z = adapter.to_scaled(&array![2.0, 0.0]);

        let c_out = adapter.cost(&adapter.to_scaled(&array![0.0, 0.0])).unwrap();
        let c_in = adapter.cost(&z).unwrap();
        let grad = adapter.gradient(&z).unwrap();

        assert_relative_eq!(c_out, c_in);
        assert_eq!(grad[0], 0.0);
        assert_relative_eq!(grad[1], 4.0, epsilon = 1e-6);
    }

    /// Quadratic in a box much narrower than one, with a large penalty
    /// outside it.
    struct Narrow;

    const NARROW_BOX: (f64, f64) = (1e-6, 1e-3);

    impl Objective for Narrow {
        fn name(&self) -> &str {
            "narrow"
        }

        fn evaluate(&self, theta: &Theta) -> OptResult<f64> {
            let x = theta[0];
            if x < NARROW_BOX.0 || x > NARROW_BOX.1 {
                return Ok(1e10);
            }
            Ok(((x - 5e-4) / 1e-4).powi(2))
        }
    }

    #[test]
    // Purpose
    // -------
    // Difference probes stay inside a box narrower than the step would be
    // in natural units, so the penalty never enters the gradient.
    //
    // Given
    // -----
    // - f(x) = ((x − 5e-4) / 1e-4)² on [1e-6, 1e-3], 1e10 outside.
    //
    // Expect
    // ------
    // - Interior: scaled gradient s · f'(2e-4) = s · (−6e4), s = 9.99e-4.
    // - Upper bound: one-sided difference giving s · f'(1e-3) = s · 1e5,
    //   kept because it points into the box.
    fn narrow_box_gradient_ignores_penalty() {
        let bounds = [NARROW_BOX];
        let adapter = ProjectedAdapter::new(&Narrow, &bounds, &array![2e-4]);
        let s = NARROW_BOX.1 - NARROW_BOX.0;

        let inner = adapter.gradient(&adapter.to_scaled(&array![2e-4])).unwrap();
        let at_upper = adapter.gradient(&adapter.to_scaled(&array![NARROW_BOX.1])).unwrap();

        assert_relative_eq!(inner[0], s * -6e4, max_relative = 1e-6);
        assert_relative_eq!(at_upper[0], s * 1e5, max_relative = 1e-5);
    }

    #[test]
    // Purpose
    // -------
    // A zero-width box has nowhere to difference and reports a zero
    // component without evaluating outside it.
    fn degenerate_box_has_zero_gradient() {
        let bounds = [(5e-4, 5e-4)];
        let adapter = ProjectedAdapter::new(&Narrow, &bounds, &array![5e-4]);

        let grad = adapter.gradient(&adapter.to_scaled(&array![5e-4])).unwrap();

        assert_eq!(grad[0], 0.0);
    }
}
