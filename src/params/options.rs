//! params::options — the parameter options document.
//!
//! Purpose
//! -------
//! Parse the YAML document that declares which graph fields are free
//! parameters, their bounds, and pairwise ordering constraints, into
//! strongly typed [`ParameterSpec`] and [`ConstraintSpec`] records.
//!
//! Key behaviors
//! -------------
//! - A parameter names its graph fields either with nested `values`
//!   mappings (`{demes: {A: {epochs: {0: start_size}}}}`) or with dotted
//!   `path` / `paths` strings; all of them receive the same value.
//! - `lower_bound` defaults to `0` and `upper_bound` to `+∞`.
//! - Constraints take exactly two parameter names and a relation,
//!   `greater_than` or `less_than`.
//!
//! Invariants & assumptions
//! ------------------------
//! - A constructed [`ParameterOptions`] has at least one parameter, unique
//!   names, at least one path per parameter, ordered bounds, and
//!   constraints that only mention declared parameters.
//!
//! Downstream usage
//! ----------------
//! - [`crate::params::set::ParameterSet::from_builder`] reads initial
//!   values through [`ParameterOptions::read_values`].
//! - Objectives write candidate vectors through
//!   [`ParameterOptions::write_values`].
use crate::graph::{builder::GraphBuilder, demes::time_from_value, path::GraphPath};
use crate::params::errors::{ParamError, ParamResult};
use ndarray::{Array1, ArrayView1};
use serde::{de::Error as _, Deserialize, Deserializer};
use serde_yaml_ng::Value;
use std::{collections::HashSet, path::Path};

/// Relation imposed by a constraint between two parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    GreaterThan,
    LessThan,
}

/// One free parameter: name, bound graph fields, and box bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterSpec {
    pub name: String,
    pub description: Option<String>,
    pub paths: Vec<GraphPath>,
    pub lower: f64,
    pub upper: f64,
}

/// `first <kind> second`, e.g. `T_split greater_than T_admix`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSpec {
    pub first: String,
    pub second: String,
    pub kind: ConstraintKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParameterOptions {
    parameters: Vec<ParameterSpec>,
    constraints: Vec<ConstraintSpec>,
}

// ---- Raw document ----

#[derive(Debug, Deserialize)]
struct RawOptions {
    #[serde(default)]
    parameters: Vec<RawParameter>,
    #[serde(default)]
    constraints: Vec<RawConstraint>,
}

#[derive(Debug, Deserialize)]
struct RawParameter {
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    values: Option<Value>,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    paths: Vec<String>,
    #[serde(default, deserialize_with = "de_opt_bound")]
    lower_bound: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_bound")]
    upper_bound: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawConstraint {
    params: Vec<String>,
    constraint: ConstraintKind,
}

fn de_opt_bound<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => time_from_value(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid bound {value:?}"))),
    }
}

// ---- Construction ----

impl ParameterOptions {
    /// Validated options from typed parts.
    ///
    /// Errors
    /// ------
    /// - [`ParamError::EmptyParameters`], [`ParamError::DuplicateName`],
    ///   [`ParamError::MissingPath`], [`ParamError::InvalidBounds`] for
    ///   malformed parameters.
    /// - [`ParamError::UnknownParameter`] when a constraint names an
    ///   undeclared parameter.
    pub fn new(
        parameters: Vec<ParameterSpec>, constraints: Vec<ConstraintSpec>,
    ) -> ParamResult<Self> {
        if parameters.is_empty() {
            return Err(ParamError::EmptyParameters);
        }
        let mut names = HashSet::new();
        for spec in &parameters {
            if !names.insert(spec.name.as_str()) {
                return Err(ParamError::DuplicateName { name: spec.name.clone() });
            }
            if spec.paths.is_empty() {
                return Err(ParamError::MissingPath { name: spec.name.clone() });
            }
            if spec.lower.is_nan() || spec.upper.is_nan() || spec.lower > spec.upper {
                return Err(ParamError::InvalidBounds {
                    name: spec.name.clone(),
                    lower: spec.lower,
                    upper: spec.upper,
                });
            }
        }
        for c in &constraints {
            for name in [&c.first, &c.second] {
                if !names.contains(name.as_str()) {
                    return Err(ParamError::UnknownParameter { name: name.clone() });
                }
            }
            if c.first == c.second {
                return Err(ParamError::InvalidConstraint {
                    reason: format!("'{}' is constrained against itself", c.first),
                });
            }
        }
        Ok(Self { parameters, constraints })
    }

    pub fn from_yaml_str(text: &str) -> ParamResult<Self> {
        let raw: RawOptions = serde_yaml_ng::from_str(text)?;
        let parameters =
            raw.parameters.into_iter().map(ParameterSpec::from_raw).collect::<ParamResult<_>>()?;
        let constraints = raw
            .constraints
            .into_iter()
            .map(|c| match c.params.as_slice() {
                [first, second] => Ok(ConstraintSpec {
                    first: first.clone(),
                    second: second.clone(),
                    kind: c.constraint,
                }),
                other => Err(ParamError::InvalidConstraint {
                    reason: format!("expected two parameter names, found {}", other.len()),
                }),
            })
            .collect::<ParamResult<_>>()?;
        Self::new(parameters, constraints)
    }

    pub fn load(path: &Path) -> ParamResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| ParamError::Io {
            path: path.display().to_string(),
            text: e.to_string(),
        })?;
        Self::from_yaml_str(&text)
    }
}

impl ParameterSpec {
    fn from_raw(raw: RawParameter) -> ParamResult<Self> {
        let mut paths = Vec::new();
        if let Some(values) = &raw.values {
            paths.extend(GraphPath::from_nested(values)?);
        }
        if let Some(path) = &raw.path {
            paths.push(path.parse::<GraphPath>()?);
        }
        for path in &raw.paths {
            paths.push(path.parse::<GraphPath>()?);
        }
        Ok(Self {
            name: raw.name,
            description: raw.description,
            paths,
            lower: raw.lower_bound.unwrap_or(0.0),
            upper: raw.upper_bound.unwrap_or(f64::INFINITY),
        })
    }
}

// ---- Access ----

impl ParameterOptions {
    pub fn parameters(&self) -> &[ParameterSpec] {
        &self.parameters
    }

    pub fn constraints(&self) -> &[ConstraintSpec] {
        &self.constraints
    }

    pub fn names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Copy with every bound widened to `0.99 × lower` and `1.01 × upper`.
    ///
    /// Notes
    /// -----
    /// - Used when reading many fitted graphs whose values may sit exactly
    ///   on a bound after rounding.
    pub fn permissive(&self) -> Self {
        let parameters = self
            .parameters
            .iter()
            .map(|p| ParameterSpec { lower: p.lower * 0.99, upper: p.upper * 1.01, ..p.clone() })
            .collect();
        Self { parameters, constraints: self.constraints.clone() }
    }

    /// Current value of every parameter, read from its first path.
    pub fn read_values(&self, builder: &GraphBuilder) -> ParamResult<Array1<f64>> {
        self.parameters
            .iter()
            .map(|p| match p.paths.first() {
                Some(path) => Ok(builder.get(path)?),
                None => Err(ParamError::MissingPath { name: p.name.clone() }),
            })
            .collect::<ParamResult<Vec<f64>>>()
            .map(Array1::from)
    }

    /// Write `values[i]` to every path of parameter `i`.
    ///
    /// Errors
    /// ------
    /// - [`ParamError::DimensionMismatch`] if `values.len()` differs from the
    ///   number of parameters.
    /// - [`ParamError::Graph`] if a path does not resolve.
    pub fn write_values(
        &self, builder: &mut GraphBuilder, values: ArrayView1<f64>,
    ) -> ParamResult<()> {
        if values.len() != self.parameters.len() {
            return Err(ParamError::DimensionMismatch {
                expected: self.parameters.len(),
                found: values.len(),
            });
        }
        for (spec, &value) in self.parameters.iter().zip(values.iter()) {
            for path in &spec.paths {
                builder.set(path, value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Scope
    // -----
    // - Both path forms, bound defaults and permissive widening.
    // - Rejection of malformed constraints and bounds.

    const OPTIONS: &str = "
parameters:
  - name: N_anc
    description: ancestral size
    values:
      - demes:
          A:
            epochs:
              0: start_size
    lower_bound: 100
    upper_bound: 100000
  - name: N_recent
    path: demes.A.epochs.1.start_size
constraints:
  - params: [N_anc, N_recent]
    constraint: greater_than
";

    #[test]
    // Purpose
    // -------
    // Nested and dotted forms parse into the same path representation.
    //
    // Given
    // -----
    // - N_anc in nested form with explicit bounds; N_recent dotted with
    //   default bounds.
    //
    // Expect
    // ------
    // - Paths render identically; defaults are [0, inf]; one constraint.
    fn parses_both_path_forms_and_defaults() {
        // Arrange / Act
        let options = ParameterOptions::from_yaml_str(OPTIONS).unwrap();

        // Assert
        let params = options.parameters();
        assert_eq!(params[0].paths[0].to_string(), "demes.A.epochs.0.start_size");
        assert_eq!(params[1].paths[0].to_string(), "demes.A.epochs.1.start_size");
        assert_eq!((params[0].lower, params[0].upper), (100.0, 100000.0));
        assert_eq!(params[1].lower, 0.0);
        assert!(params[1].upper.is_infinite());
        assert_eq!(options.constraints()[0].kind, ConstraintKind::GreaterThan);
    }

    #[test]
    // Purpose
    // -------
    // Permissive widening scales bounds by 0.99 and 1.01.
    fn permissive_widens_bounds() {
        let options = ParameterOptions::from_yaml_str(OPTIONS).unwrap().permissive();
        let p = &options.parameters()[0];
        assert!((p.lower - 99.0).abs() < 1e-9);
        assert!((p.upper - 101000.0).abs() < 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Constraints against unknown names and inverted bounds are rejected.
    //
    // Given
    // -----
    // - A constraint naming "T"; a parameter with lower 10, upper 1.
    //
    // Expect
    // ------
    // - `UnknownParameter` and `InvalidBounds` respectively.
    fn rejects_unknown_constraint_names_and_inverted_bounds() {
        // Arrange
        let unknown = "parameters:\n  - name: N\n    path: demes.A.epochs.0.start_size\nconstraints:\n  - params: [N, T]\n    constraint: less_than\n";
        let inverted = "parameters:\n  - name: N\n    path: demes.A.epochs.0.start_size\n    lower_bound: 10\n    upper_bound: 1\n";

        // Act / Assert
        assert!(matches!(
            ParameterOptions::from_yaml_str(unknown),
            Err(ParamError::UnknownParameter { .. })
        ));
        assert!(matches!(
            ParameterOptions::from_yaml_str(inverted),
            Err(ParamError::InvalidBounds { .. })
        ));
    }
}
