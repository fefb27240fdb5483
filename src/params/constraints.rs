//! Pairwise ordering constraints between parameters.
//!
//! A [`ConstraintSet`] maps a parameter vector to one value per constraint;
//! the vector is feasible when every value is strictly positive.
use crate::params::{
    errors::{ParamError, ParamResult},
    options::{ConstraintKind, ParameterOptions},
};
use ndarray::{Array1, ArrayView1};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstraintSet {
    // (larger, smaller) index pairs; each term evaluates p[larger] - p[smaller].
    terms: Vec<(usize, usize)>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `p[a] > p[b]`.
    pub fn greater_than(mut self, a: usize, b: usize) -> Self {
        self.terms.push((a, b));
        self
    }

    /// Require `p[a] < p[b]`.
    pub fn less_than(mut self, a: usize, b: usize) -> Self {
        self.terms.push((b, a));
        self
    }

    /// Resolve the named constraints of `options` against `names`.
    ///
    /// `names` may be longer than the options' parameter list (for example
    /// when a mutation rate is appended); only declared names are looked up.
    pub fn from_options(options: &ParameterOptions, names: &[String]) -> ParamResult<Self> {
        let index = |name: &str| {
            names
                .iter()
                .position(|n| n == name)
                .ok_or_else(|| ParamError::UnknownParameter { name: name.to_string() })
        };
        let mut set = Self::new();
        for c in options.constraints() {
            let (a, b) = (index(&c.first)?, index(&c.second)?);
            set = match c.kind {
                ConstraintKind::GreaterThan => set.greater_than(a, b),
                ConstraintKind::LessThan => set.less_than(a, b),
            };
        }
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Constraint values at `p`; indices beyond `p.len()` evaluate to NaN.
    pub fn evaluate(&self, p: ArrayView1<f64>) -> Array1<f64> {
        self.terms
            .iter()
            .map(|&(hi, lo)| match (p.get(hi), p.get(lo)) {
                (Some(a), Some(b)) => a - b,
                _ => f64::NAN,
            })
            .collect()
    }

    /// `true` when every constraint value is `> 0`.
    pub fn is_satisfied(&self, p: ArrayView1<f64>) -> bool {
        self.evaluate(p).iter().all(|&v| v > 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // greater_than yields p[a] - p[b]; less_than yields p[b] - p[a].
    //
    // Given
    // -----
    // - p = [5, 3, 1], constraints p0 > p1 and p2 < p1.
    //
    // Expect
    // ------
    // - Values [2, 2]; satisfied. Swapping p0 and p1 breaks it.
    fn evaluates_both_relations() {
        // Arrange
        let set = ConstraintSet::new().greater_than(0, 1).less_than(2, 1);

        // Act
        let values = set.evaluate(array![5.0, 3.0, 1.0].view());

        // Assert
        assert_eq!(values, array![2.0, 2.0]);
        assert!(set.is_satisfied(array![5.0, 3.0, 1.0].view()));
        assert!(!set.is_satisfied(array![3.0, 5.0, 1.0].view()));
    }

    #[test]
    // Purpose
    // -------
    // Equality is infeasible: constraints are strict.
    fn equal_values_are_not_feasible() {
        let set = ConstraintSet::new().greater_than(0, 1);
        assert!(!set.is_satisfied(array![2.0, 2.0].view()));
    }
}
