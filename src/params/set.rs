//! params::set — ordered free parameters with box bounds.
//!
//! Purpose
//! -------
//! Hold the free parameters of a fit as parallel arrays of names, initial
//! values, and lower/upper bounds, derived once from a graph builder and
//! an options document, and answer feasibility queries for candidate
//! vectors.
//!
//! Key behaviors
//! -------------
//! - [`ParameterSet::from_builder`] reads each parameter's current value
//!   from the first graph field it is bound to.
//! - [`ParameterSet::with_mutation_rate`] appends the synthetic parameter
//!   `u` used when the mutation rate is fit jointly with the graph.
//! - [`ParameterSet::is_feasible`] combines the box bounds with an optional
//!   [`ConstraintSet`].
//!
//! Invariants & assumptions
//! ------------------------
//! - All four sequences have the same length.
//! - `lower[i] <= values[i] <= upper[i]` for every parameter.
//! - When present, `u` is always the last parameter.
//!
//! Conventions
//! -----------
//! - Bounds are inclusive; constraints are strict.
//!
//! Testing notes
//! -------------
//! - Unit tests cover bound validation on construction, reading values
//!   from a builder, and feasibility with and without constraints.
use crate::graph::builder::GraphBuilder;
use crate::params::{
    constraints::ConstraintSet,
    errors::{ParamError, ParamResult},
    options::ParameterOptions,
};
use ndarray::{Array1, ArrayView1};

/// Name of the synthetic mutation-rate parameter.
pub const MUTATION_RATE_NAME: &str = "u";
/// Initial mutation rate when it is fit.
pub const INIT_U: f64 = 1.35e-8;
/// Lower bound on a fitted mutation rate.
pub const LOWER_U: f64 = 1e-8;
/// Upper bound on a fitted mutation rate.
pub const UPPER_U: f64 = 1.6e-8;

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSet {
    names: Vec<String>,
    values: Array1<f64>,
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl ParameterSet {
    /// Validated parameter set from parallel parts.
    ///
    /// Errors
    /// ------
    /// - [`ParamError::DimensionMismatch`] if the parts differ in length.
    /// - [`ParamError::InvalidBounds`] if `lower > upper` or a bound is NaN.
    /// - [`ParamError::InitialValueOutOfBounds`] if a value lies outside its
    ///   bounds.
    pub fn new(
        names: Vec<String>, values: Array1<f64>, lower: Array1<f64>, upper: Array1<f64>,
    ) -> ParamResult<Self> {
        let n = names.len();
        for len in [values.len(), lower.len(), upper.len()] {
            if len != n {
                return Err(ParamError::DimensionMismatch { expected: n, found: len });
            }
        }
        for i in 0..n {
            let (v, lo, hi) = (values[i], lower[i], upper[i]);
            if lo.is_nan() || hi.is_nan() || lo > hi {
                return Err(ParamError::InvalidBounds {
                    name: names[i].clone(),
                    lower: lo,
                    upper: hi,
                });
            }
            if !(lo <= v && v <= hi) {
                return Err(ParamError::InitialValueOutOfBounds {
                    name: names[i].clone(),
                    value: v,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(Self { names, values, lower, upper })
    }

    /// Parameters declared by `options` with initial values read from
    /// `builder`.
    pub fn from_builder(builder: &GraphBuilder, options: &ParameterOptions) -> ParamResult<Self> {
        let values = options.read_values(builder)?;
        let lower = options.parameters().iter().map(|p| p.lower).collect();
        let upper = options.parameters().iter().map(|p| p.upper).collect();
        Self::new(options.names(), values, lower, upper)
    }

    /// Append the mutation rate `u` with its default start and bounds.
    pub fn with_mutation_rate(self) -> ParamResult<Self> {
        self.with_parameter(MUTATION_RATE_NAME, INIT_U, LOWER_U, UPPER_U)
    }

    /// Append one parameter at the end.
    pub fn with_parameter(
        self, name: &str, value: f64, lower: f64, upper: f64,
    ) -> ParamResult<Self> {
        if self.names.iter().any(|n| n == name) {
            return Err(ParamError::DuplicateName { name: name.to_string() });
        }
        let push = |arr: Array1<f64>, x: f64| {
            let mut v = arr.to_vec();
            v.push(x);
            Array1::from(v)
        };
        let mut names = self.names;
        names.push(name.to_string());
        Self::new(names, push(self.values, value), push(self.lower, lower), push(self.upper, upper))
    }
}

// ---- Access ----

impl ParameterSet {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// `(lower, upper)` pairs, as consumed by bounded minimizers.
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.lower.iter().copied().zip(self.upper.iter().copied()).collect()
    }
}

// ---- Feasibility ----

impl ParameterSet {
    /// `true` when `p` has the right length and lies inside the box.
    pub fn in_bounds(&self, p: ArrayView1<f64>) -> bool {
        p.len() == self.len()
            && p.iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&x, (&lo, &hi))| lo <= x && x <= hi)
    }

    /// Box bounds and, when given, every constraint value `> 0`.
    pub fn is_feasible(&self, p: ArrayView1<f64>, constraints: Option<&ConstraintSet>) -> bool {
        self.in_bounds(p) && constraints.map_or(true, |c| c.is_satisfied(p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    // Scope
    // -----
    // - Construction-time validation of bounds and initial values.
    // - Reading initial values through the builder.
    // - Feasibility, including the appended mutation rate.

    const GRAPH: &str = "
demes:
  - name: A
    epochs:
      - start_size: 10000
        end_time: 1000
      - start_size: 2000
";

    const OPTIONS: &str = "
parameters:
  - name: N_anc
    path: demes.A.epochs.0.start_size
    lower_bound: 100
    upper_bound: 100000
  - name: N_recent
    path: demes.A.epochs.1.start_size
    lower_bound: 100
    upper_bound: 100000
";

    #[test]
    // Purpose
    // -------
    // Initial values come from the builder; `u` is appended last.
    //
    // Given
    // -----
    // - Two size parameters bound to a one-deme graph.
    //
    // Expect
    // ------
    // - values [10000, 2000, 1.35e-8], names end in "u".
    fn from_builder_reads_values_and_appends_u() {
        // Arrange
        let builder = GraphBuilder::from_yaml_str(GRAPH).unwrap();
        let options = ParameterOptions::from_yaml_str(OPTIONS).unwrap();

        // Act
        let set =
            ParameterSet::from_builder(&builder, &options).unwrap().with_mutation_rate().unwrap();

        // Assert
        assert_eq!(set.values(), &array![10000.0, 2000.0, INIT_U]);
        assert_eq!(set.names().last().map(String::as_str), Some(MUTATION_RATE_NAME));
        assert_eq!(set.bounds()[2], (LOWER_U, UPPER_U));
    }

    #[test]
    // Purpose
    // -------
    // An initial value outside its bounds is rejected.
    fn rejects_initial_value_outside_bounds() {
        let result = ParameterSet::new(
            vec!["N".to_string()],
            array![50.0],
            array![100.0],
            array![1000.0],
        );
        assert!(matches!(result, Err(ParamError::InitialValueOutOfBounds { .. })));
    }

    #[test]
    // Purpose
    // -------
    // Feasibility combines inclusive bounds with strict constraints.
    //
    // Given
    // -----
    // - Bounds [0, 10] on two parameters, constraint p0 > p1.
    //
    // Expect
    // ------
    // - [10, 1] feasible; [11, 1] out of bounds; [1, 2] violates p0 > p1.
    fn feasibility_checks_bounds_and_constraints() {
        // Arrange
        let set = ParameterSet::new(
            vec!["a".to_string(), "b".to_string()],
            array![5.0, 1.0],
            array![0.0, 0.0],
            array![10.0, 10.0],
        )
        .unwrap();
        let constraints = ConstraintSet::new().greater_than(0, 1);

        // Act / Assert
        assert!(set.is_feasible(array![10.0, 1.0].view(), Some(&constraints)));
        assert!(!set.is_feasible(array![11.0, 1.0].view(), Some(&constraints)));
        assert!(!set.is_feasible(array![1.0, 2.0].view(), Some(&constraints)));
        assert!(set.is_feasible(array![1.0, 2.0].view(), None));
    }
}
