//! minimizer::powell — Powell's conjugate direction-set method.
//!
//! Purpose
//! -------
//! Derivative-free minimization as an argmin [`Solver`], so it runs under
//! the same executor, iteration cap, and counters as the other methods.
//!
//! Key behaviors
//! -------------
//! - One solver iteration is one sweep: a line minimization along each
//!   direction in the set, followed by an optional replacement of the
//!   direction of largest decrease by the net displacement of the sweep.
//! - Line minimizations bracket a minimum along `x + α d` by golden-ratio
//!   expansion with parabolic steps, then refine it with Brent's method.
//! - The run converges once a sweep improves the cost by less than
//!   `ftol × (|f_start| + |f_end|)` (times one half).
//!
//! Invariants & assumptions
//! ------------------------
//! - The direction set starts as the identity.
//! - Every cost evaluation goes through `Problem::cost`, so argmin's
//!   `cost_count` is accurate.
//! - Costs are finite; the objective's out-of-bounds penalty keeps line
//!   searches inside the feasible box.
//!
//! Testing notes
//! -------------
//! - Unit tests check the Brent line search on a parabola and a full solve
//!   on a coupled quadratic.
use crate::optimization::minimizer::types::{Cost, SimplexState, Theta};
use argmin::core::{
    ArgminError, CostFunction, Error, Problem, Solver, State, TerminationReason,
    TerminationStatus, KV,
};
use ndarray::Array2;

const GOLD: f64 = 1.618034;
const GROW_LIMIT: f64 = 110.0;
const TINY: f64 = 1e-21;
const BRACKET_MAX_ITER: usize = 1000;
const CGOLD: f64 = 0.381966;
const BRENT_MIN_TOL: f64 = 1e-11;
const BRENT_MAX_ITER: usize = 500;

/// Powell's method with a Brent line search.
#[derive(Debug, Clone)]
pub struct Powell {
    ftol: f64,
    line_tol: f64,
    directions: Array2<f64>,
    converged: bool,
}

impl Powell {
    /// Parameters
    /// ----------
    /// - `ftol`: relative cost decrease per sweep below which the run stops.
    /// - `line_tol`: relative tolerance of each line minimization.
    pub fn new(ftol: f64, line_tol: f64) -> Self {
        Self { ftol, line_tol, directions: Array2::zeros((0, 0)), converged: false }
    }

    /// Minimize along `direction` from `x`, returning the new point, its
    /// cost, and the displacement taken.
    fn line_minimize<O>(
        &self, problem: &mut Problem<O>, x: &Theta, direction: &Theta, fx: Cost,
    ) -> Result<(Theta, Cost, Theta), Error>
    where
        O: CostFunction<Param = Theta, Output = Cost>,
    {
        let mut along = |alpha: f64| -> Result<f64, Error> {
            let point = x + &(direction * alpha);
            problem.cost(&point)
        };
        let bracket = bracket(&mut along, 0.0, 1.0, fx)?;
        let (alpha, f_alpha) = brent(&mut along, bracket, self.line_tol)?;
        if f_alpha >= fx {
            return Ok((x.clone(), fx, Theta::zeros(x.len())));
        }
        let step = direction * alpha;
        Ok((x + &step, f_alpha, step))
    }
}

impl<O> Solver<O, SimplexState> for Powell
where
    O: CostFunction<Param = Theta, Output = Cost>,
{
    const NAME: &'static str = "Powell";

    fn init(
        &mut self, problem: &mut Problem<O>, state: SimplexState,
    ) -> Result<(SimplexState, Option<KV>), Error> {
        let param = state.get_param().cloned().ok_or_else(|| ArgminError::NotInitialized {
            text: "Powell requires an initial parameter vector.".to_string(),
        })?;
        let cost = problem.cost(&param)?;
        self.directions = Array2::eye(param.len());
        self.converged = false;
        Ok((state.param(param).cost(cost), None))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, state: SimplexState,
    ) -> Result<(SimplexState, Option<KV>), Error> {
        let start = state.get_param().cloned().ok_or_else(|| ArgminError::NotInitialized {
            text: "Powell state lost its parameter vector.".to_string(),
        })?;
        let f_start = state.get_cost();
        let n = start.len();

        let mut x = start.clone();
        let mut fval = f_start;
        let mut biggest = 0;
        let mut delta = 0.0;
        for i in 0..n {
            let direction = self.directions.row(i).to_owned();
            let f_before = fval;
            let (next, f_next, _) = self.line_minimize(problem, &x, &direction, fval)?;
            x = next;
            fval = f_next;
            if f_before - fval > delta {
                delta = f_before - fval;
                biggest = i;
            }
        }

        let bound = self.ftol * (f_start.abs() + fval.abs()) + 1e-20;
        if 2.0 * (f_start - fval) <= bound {
            self.converged = true;
            return Ok((state.param(x).cost(fval), None));
        }

        // Extrapolate along the net displacement and decide whether it
        // replaces the direction of largest decrease.
        let displacement = &x - &start;
        let extrapolated = &x * 2.0 - &start;
        let f_extra = problem.cost(&extrapolated)?;
        if f_start > f_extra {
            let mut t = 2.0 * (f_start + f_extra - 2.0 * fval);
            let temp = f_start - fval - delta;
            t *= temp * temp;
            let temp = f_start - f_extra;
            t -= delta * temp * temp;
            if t < 0.0 {
                let (next, f_next, step) = self.line_minimize(problem, &x, &displacement, fval)?;
                x = next;
                fval = f_next;
                if step.iter().any(|&s| s != 0.0) {
                    let last = self.directions.row(n - 1).to_owned();
                    self.directions.row_mut(biggest).assign(&last);
                    self.directions.row_mut(n - 1).assign(&step);
                }
            }
        }
        Ok((state.param(x).cost(fval), None))
    }

    fn terminate(&mut self, _state: &SimplexState) -> TerminationStatus {
        if self.converged {
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
        } else {
            TerminationStatus::NotTerminated
        }
    }
}

/// Three abscissae `(a, b, c)` with `f(b)` below `f(a)` and `f(c)`, and
/// `f(b)`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Bracket {
    a: f64,
    b: f64,
    c: f64,
    fb: f64,
}

/// Expand `[xa, xb]` downhill until it brackets a minimum.
fn bracket<F>(f: &mut F, xa: f64, xb: f64, fa: f64) -> Result<Bracket, Error>
where
    F: FnMut(f64) -> Result<f64, Error>,
{
    let (mut xa, mut xb) = (xa, xb);
    let mut fa = fa;
    let mut fb = f(xb)?;
    if fa < fb {
        std::mem::swap(&mut xa, &mut xb);
        std::mem::swap(&mut fa, &mut fb);
    }
    let mut xc = xb + GOLD * (xb - xa);
    let mut fc = f(xc)?;
    let mut iter = 0;
    while fc < fb {
        let tmp1 = (xb - xa) * (fb - fc);
        let tmp2 = (xb - xc) * (fb - fa);
        let val = tmp2 - tmp1;
        let denom = if val.abs() < TINY { 2.0 * TINY } else { 2.0 * val };
        let mut w = xb - ((xb - xc) * tmp2 - (xb - xa) * tmp1) / denom;
        let wlim = xb + GROW_LIMIT * (xc - xb);
        if iter > BRACKET_MAX_ITER {
            return Err(ArgminError::ConditionViolated {
                text: "Powell line search could not bracket a minimum.".to_string(),
            }
            .into());
        }
        iter += 1;
        let mut fw;
        if (w - xc) * (xb - w) > 0.0 {
            fw = f(w)?;
            if fw < fc {
                return Ok(Bracket { a: xb, b: w, c: xc, fb: fw });
            } else if fw > fb {
                return Ok(Bracket { a: xa, b: xb, c: w, fb });
            }
            w = xc + GOLD * (xc - xb);
            fw = f(w)?;
        } else if (w - wlim) * (wlim - xc) >= 0.0 {
            w = wlim;
            fw = f(w)?;
        } else if (w - wlim) * (xc - w) > 0.0 {
            fw = f(w)?;
            if fw < fc {
                xb = xc;
                xc = w;
                w = xc + GOLD * (xc - xb);
                fb = fc;
                fc = fw;
                fw = f(w)?;
            }
        } else {
            w = xc + GOLD * (xc - xb);
            fw = f(w)?;
        }
        xa = xb;
        xb = xc;
        xc = w;
        fa = fb;
        fb = fc;
        fc = fw;
    }
    Ok(Bracket { a: xa, b: xb, c: xc, fb })
}

/// Brent's method inside a bracket; returns the minimizing abscissa and
/// its value.
fn brent<F>(f: &mut F, bracket: Bracket, tol: f64) -> Result<(f64, f64), Error>
where
    F: FnMut(f64) -> Result<f64, Error>,
{
    let (mut a, mut b) =
        if bracket.a < bracket.c { (bracket.a, bracket.c) } else { (bracket.c, bracket.a) };
    let (mut x, mut w, mut v) = (bracket.b, bracket.b, bracket.b);
    let (mut fx, mut fw, mut fv) = (bracket.fb, bracket.fb, bracket.fb);
    let mut deltax: f64 = 0.0;
    let mut rat: f64 = 0.0;

    for _ in 0..BRENT_MAX_ITER {
        let tol1 = tol * x.abs() + BRENT_MIN_TOL;
        let tol2 = 2.0 * tol1;
        let xmid = 0.5 * (a + b);
        if (x - xmid).abs() < tol2 - 0.5 * (b - a) {
            break;
        }
        if deltax.abs() <= tol1 {
            deltax = if x >= xmid { a - x } else { b - x };
            rat = CGOLD * deltax;
        } else {
            // Parabolic step through x, w, v.
            let tmp1 = (x - w) * (fx - fv);
            let mut tmp2 = (x - v) * (fx - fw);
            let mut p = (x - v) * tmp2 - (x - w) * tmp1;
            tmp2 = 2.0 * (tmp2 - tmp1);
            if tmp2 > 0.0 {
                p = -p;
            }
            tmp2 = tmp2.abs();
            let dx_temp = deltax;
            deltax = rat;
            if p > tmp2 * (a - x) && p < tmp2 * (b - x) && p.abs() < (0.5 * tmp2 * dx_temp).abs() {
                rat = p / tmp2;
                let u = x + rat;
                if (u - a) < tol2 || (b - u) < tol2 {
                    rat = if xmid - x >= 0.0 { tol1 } else { -tol1 };
                }
            } else {
                deltax = if x >= xmid { a - x } else { b - x };
                rat = CGOLD * deltax;
            }
        }

        let u = if rat.abs() < tol1 {
            if rat >= 0.0 {
                x + tol1
            } else {
                x - tol1
            }
        } else {
            x + rat
        };
        let fu = f(u)?;
        if fu > fx {
            if u < x {
                a = u;
            } else {
                b = u;
            }
            if fu <= fw || w == x {
                v = w;
                w = u;
                fv = fw;
                fw = fu;
            } else if fu <= fv || v == x || v == w {
                v = u;
                fv = fu;
            }
        } else {
            if u >= x {
                a = x;
            } else {
                b = x;
            }
            v = w;
            w = x;
            x = u;
            fv = fw;
            fw = fx;
            fx = fu;
        }
    }
    Ok((x, fx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use argmin::core::Executor;
    use ndarray::array;

    // Scope
    // -----
    // - Bracketing and Brent on a one-dimensional parabola.
    // - Full Powell solve on a coupled quadratic.
    // - Solver name exposed to the executor.

    struct Coupled;

    impl CostFunction for Coupled {
        type Param = Theta;
        type Output = Cost;

        fn cost(&self, p: &Theta) -> Result<Cost, Error> {
            let (x, y) = (p[0] - 3.0, p[1] + 1.0);
            Ok(x * x + x * y + 2.0 * y * y + 5.0)
        }
    }

    #[test]
    // Purpose
    // -------
    // The line search locates the vertex of a parabola.
    fn brent_finds_parabola_minimum() {
        let mut f = |a: f64| -> Result<f64, Error> { Ok((a - 2.5).powi(2) + 1.0) };
        let f0 = f(0.0).unwrap();

        let br = bracket(&mut f, 0.0, 1.0, f0).unwrap();
        let (alpha, fmin) = brent(&mut f, br, 1e-8).unwrap();

        assert!(br.a.min(br.c) <= 2.5 && 2.5 <= br.a.max(br.c));
        assert_relative_eq!(alpha, 2.5, epsilon = 1e-6);
        assert_relative_eq!(fmin, 1.0, epsilon = 1e-10);
    }

    #[test]
    // Purpose
    // -------
    // Powell converges on a quadratic with correlated coordinates.
    //
    // Expect
    // ------
    // - Solution (3, -1) to 1e-3, cost 5, converged status.
    fn powell_solves_coupled_quadratic() {
        // Arrange
        let solver = Powell::new(1e-10, 1e-4);

        // Act
        let result = Executor::new(Coupled, solver)
            .configure(|state| state.param(array![0.0, 0.0]).max_iters(100))
            .run()
            .unwrap();
        let state = result.state();
        let best = state.get_best_param().unwrap();

        // Assert
        assert_relative_eq!(best[0], 3.0, epsilon = 1e-3);
        assert_relative_eq!(best[1], -1.0, epsilon = 1e-3);
        assert_relative_eq!(state.get_best_cost(), 5.0, epsilon = 1e-6);
        assert_eq!(
            *state.get_termination_status(),
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
        );
    }

    #[test]
    // Purpose
    // -------
    // The executor reports the solver under its own name.
    fn solver_reports_its_name() {
        assert_eq!(<Powell as Solver<Coupled, SimplexState>>::NAME, "Powell");
    }
}
