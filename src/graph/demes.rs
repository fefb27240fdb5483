//! graph::demes — typed, validated view of a demes-style demographic graph.
//!
//! Purpose
//! -------
//! Deserialize a YAML demographic graph into strongly typed records and
//! enforce the structural rules the model evaluators rely on: positive
//! population sizes, consistent epoch timing, known ancestors, and sane
//! migration and pulse parameters.
//!
//! Key behaviors
//! -------------
//! - Times accept plain numbers, YAML `.inf`, and the strings `"Infinity"`
//!   / `"inf"`; a missing deme `start_time` means "infinitely old".
//! - Epoch sizes inherit from the previous epoch when omitted, and an
//!   epoch's `end_size` defaults to its `start_size`.
//! - Free-form `metadata` is preserved verbatim and carries the
//!   optimization provenance record (`opt_info`).
//!
//! Invariants & assumptions
//! ------------------------
//! - A graph returned by [`DemeGraph::from_yaml_str`] or
//!   [`DemeGraph::load`] has passed [`DemeGraph::validate`].
//! - Demes are listed after their ancestors.
//!
//! Conventions
//! -----------
//! - Times are measured backwards from the present in `time_units`.
//! - Only `defaults` is kept as raw YAML; it is not applied to epochs.
use crate::graph::{
    errors::{GraphError, GraphResult},
    provenance::{OptimizationProvenance, OPT_INFO_KEY},
};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize};
use serde_yaml_ng::{Mapping, Value};
use std::{collections::HashSet, path::Path};

const PROPORTION_TOL: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemeGraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_time_units")]
    pub time_units: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub doi: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<Value>,
    pub demes: Vec<Deme>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub migrations: Vec<Migration>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pulses: Vec<Pulse>,
    #[serde(default, skip_serializing_if = "Mapping::is_empty")]
    pub metadata: Mapping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deme {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_opt_time", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ancestors: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proportions: Vec<f64>,
    pub epochs: Vec<Epoch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epoch {
    #[serde(default, deserialize_with = "de_opt_time", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_function: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selfing_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cloning_rate: Option<f64>,
}

/// Continuous migration, either directed (`source` → `dest`) or symmetric
/// among every deme listed in `demes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub demes: Vec<String>,
    #[serde(default, deserialize_with = "de_opt_time", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_time", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<f64>,
    pub rate: f64,
}

/// Instantaneous admixture from `sources` into `dest` at `time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pulse {
    pub sources: Vec<String>,
    pub dest: String,
    #[serde(deserialize_with = "de_time")]
    pub time: f64,
    pub proportions: Vec<f64>,
}

// ---- Loading and saving ----

impl DemeGraph {
    /// Parse and validate a graph from YAML text.
    pub fn from_yaml_str(text: &str) -> GraphResult<Self> {
        let graph: DemeGraph = serde_yaml_ng::from_str(text)?;
        graph.validate()?;
        Ok(graph)
    }

    /// Parse and validate a graph from an already-loaded YAML document.
    pub fn from_value(value: Value) -> GraphResult<Self> {
        let graph: DemeGraph = serde_yaml_ng::from_value(value)?;
        graph.validate()?;
        Ok(graph)
    }

    pub fn load(path: &Path) -> GraphResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| GraphError::io(path, e))?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml_string(&self) -> GraphResult<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn dump(&self, path: &Path) -> GraphResult<()> {
        let text = self.to_yaml_string()?;
        std::fs::write(path, text).map_err(|e| GraphError::io(path, e))
    }
}

// ---- Queries ----

impl DemeGraph {
    pub fn deme(&self, name: &str) -> Option<&Deme> {
        self.demes.iter().find(|d| d.name == name)
    }

    /// Deme names in declaration order.
    pub fn deme_names(&self) -> Vec<&str> {
        self.demes.iter().map(|d| d.name.as_str()).collect()
    }

    /// End time of each deme's last epoch, in declaration order.
    ///
    /// This is the time at which a deme is sampled when expected spectra
    /// are evaluated.
    pub fn end_times(&self) -> Vec<(String, f64)> {
        self.demes.iter().map(|d| (d.name.clone(), d.end_time())).collect()
    }

    /// Decode the `opt_info` metadata record, if present.
    ///
    /// Errors
    /// ------
    /// - [`GraphError::InvalidMetadata`] when the record exists but does not
    ///   match [`OptimizationProvenance`].
    pub fn opt_info(&self) -> GraphResult<Option<OptimizationProvenance>> {
        match self.metadata.get(OPT_INFO_KEY) {
            None => Ok(None),
            Some(value) => serde_yaml_ng::from_value(value.clone())
                .map(Some)
                .map_err(|e| GraphError::InvalidMetadata { text: e.to_string() }),
        }
    }

    /// Attach (or replace) the `opt_info` metadata record.
    pub fn set_opt_info(&mut self, info: &OptimizationProvenance) -> GraphResult<()> {
        let value = serde_yaml_ng::to_value(info)?;
        self.metadata.insert(Value::String(OPT_INFO_KEY.to_string()), value);
        Ok(())
    }
}

impl Deme {
    /// Start time with a missing value resolved to infinity.
    pub fn start_time(&self) -> f64 {
        self.start_time.unwrap_or(f64::INFINITY)
    }

    /// End time of the last epoch (`0` when omitted).
    pub fn end_time(&self) -> f64 {
        self.epochs.last().and_then(|e| e.end_time).unwrap_or(0.0)
    }

    /// Resolved `(start_size, end_size)` for every epoch.
    pub fn epoch_sizes(&self) -> GraphResult<Vec<(f64, f64)>> {
        let mut out = Vec::with_capacity(self.epochs.len());
        let mut prev_end: Option<f64> = None;
        for (i, epoch) in self.epochs.iter().enumerate() {
            let start = epoch.start_size.or(epoch.end_size).or(prev_end).ok_or_else(|| {
                GraphError::invalid(format!("deme '{}' epoch {i} has no size", self.name))
            })?;
            let end = epoch.end_size.unwrap_or(start);
            out.push((start, end));
            prev_end = Some(end);
        }
        Ok(out)
    }
}

// ---- Validation ----

impl DemeGraph {
    /// Check the structural rules documented at module level.
    ///
    /// Errors
    /// ------
    /// - [`GraphError::InvalidGraph`] naming the first violated rule.
    pub fn validate(&self) -> GraphResult<()> {
        if self.demes.is_empty() {
            return Err(GraphError::invalid("graph has no demes"));
        }
        if let Some(g) = self.generation_time {
            if !(g.is_finite() && g > 0.0) {
                return Err(GraphError::invalid("generation_time must be positive and finite"));
            }
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for deme in &self.demes {
            for ancestor in &deme.ancestors {
                if !seen.contains(ancestor.as_str()) {
                    return Err(GraphError::invalid(format!(
                        "deme '{}' has unknown ancestor '{ancestor}'",
                        deme.name
                    )));
                }
            }
            if !seen.insert(deme.name.as_str()) {
                return Err(GraphError::invalid(format!("duplicate deme name '{}'", deme.name)));
            }
            deme.validate()?;
        }
        for migration in &self.migrations {
            validate_migration(migration, &seen)?;
        }
        for pulse in &self.pulses {
            validate_pulse(pulse, &seen)?;
        }
        Ok(())
    }
}

impl Deme {
    fn validate(&self) -> GraphResult<()> {
        if self.name.trim().is_empty() {
            return Err(GraphError::invalid("deme name must not be empty"));
        }
        if self.epochs.is_empty() {
            return Err(GraphError::invalid(format!("deme '{}' has no epochs", self.name)));
        }
        let start = self.start_time();
        if !(start > 0.0) {
            return Err(GraphError::invalid(format!("deme '{}' start_time must be > 0", self.name)));
        }
        if !self.ancestors.is_empty() && !start.is_finite() {
            return Err(GraphError::invalid(format!(
                "deme '{}' has ancestors but no finite start_time",
                self.name
            )));
        }

        let mut prev_end = start;
        for (i, epoch) in self.epochs.iter().enumerate() {
            let end = epoch.end_time.unwrap_or(0.0);
            if !(end.is_finite() && end >= 0.0) {
                return Err(GraphError::invalid(format!(
                    "deme '{}' epoch {i} end_time must be finite and >= 0",
                    self.name
                )));
            }
            if end >= prev_end {
                return Err(GraphError::invalid(format!(
                    "deme '{}' epoch {i} end_time {end} is not below {prev_end}",
                    self.name
                )));
            }
            prev_end = end;
        }

        for (i, (s, e)) in self.epoch_sizes()?.into_iter().enumerate() {
            if !(s.is_finite() && s > 0.0 && e.is_finite() && e > 0.0) {
                return Err(GraphError::invalid(format!(
                    "deme '{}' epoch {i} sizes must be positive and finite",
                    self.name
                )));
            }
        }

        match (self.ancestors.len(), self.proportions.len()) {
            (0, 0) | (1, 0) => {}
            (n, m) if n == m => {
                let sum: f64 = self.proportions.iter().sum();
                if self.proportions.iter().any(|p| !(0.0..=1.0).contains(p))
                    || (sum - 1.0).abs() > PROPORTION_TOL
                {
                    return Err(GraphError::invalid(format!(
                        "deme '{}' ancestry proportions must lie in [0, 1] and sum to 1",
                        self.name
                    )));
                }
            }
            _ => {
                return Err(GraphError::invalid(format!(
                    "deme '{}' needs one proportion per ancestor",
                    self.name
                )))
            }
        }
        Ok(())
    }
}

fn validate_migration(m: &Migration, known: &HashSet<&str>) -> GraphResult<()> {
    if !(0.0..=1.0).contains(&m.rate) {
        return Err(GraphError::invalid(format!("migration rate {} outside [0, 1]", m.rate)));
    }
    let names: Vec<&String> = match (&m.source, &m.dest) {
        (Some(source), Some(dest)) => {
            if source == dest {
                return Err(GraphError::invalid(format!("migration from '{source}' to itself")));
            }
            vec![source, dest]
        }
        (None, None) if m.demes.len() >= 2 => m.demes.iter().collect(),
        _ => {
            return Err(GraphError::invalid(
                "migration needs source and dest, or at least two symmetric demes",
            ))
        }
    };
    for name in names {
        if !known.contains(name.as_str()) {
            return Err(GraphError::invalid(format!("migration names unknown deme '{name}'")));
        }
    }
    Ok(())
}

fn validate_pulse(p: &Pulse, known: &HashSet<&str>) -> GraphResult<()> {
    if !(p.time.is_finite() && p.time >= 0.0) {
        return Err(GraphError::invalid("pulse time must be finite and >= 0"));
    }
    if p.sources.is_empty() || p.sources.len() != p.proportions.len() {
        return Err(GraphError::invalid("pulse needs one proportion per source"));
    }
    let sum: f64 = p.proportions.iter().sum();
    if p.proportions.iter().any(|x| !(0.0..=1.0).contains(x)) || sum > 1.0 + PROPORTION_TOL {
        return Err(GraphError::invalid("pulse proportions must lie in [0, 1] and sum to <= 1"));
    }
    for name in p.sources.iter().chain(std::iter::once(&p.dest)) {
        if !known.contains(name.as_str()) {
            return Err(GraphError::invalid(format!("pulse names unknown deme '{name}'")));
        }
    }
    Ok(())
}

// ---- Serde helpers ----

fn default_time_units() -> String {
    "generations".to_string()
}

/// Interpret a YAML scalar as a time value.
pub(crate) fn time_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "infinity" | "inf" | ".inf" => Some(f64::INFINITY),
            other => other.parse().ok(),
        },
        _ => None,
    }
}

fn de_opt_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => time_from_value(&value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid time value {value:?}"))),
    }
}

fn de_time<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    time_from_value(&value).ok_or_else(|| D::Error::custom(format!("invalid time value {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Scope
    // -----
    // - Parsing of times including "Infinity".
    // - Size inheritance across epochs.
    // - Structural validation failures.
    // - opt_info metadata round trip.

    const TWO_DEMES: &str = "
time_units: generations
demes:
  - name: X
    epochs:
      - start_size: 5000
        end_time: 2000
  - name: A
    start_time: 2000
    ancestors: [X]
    epochs:
      - start_size: 1000
        end_time: 500
      - end_time: 0
  - name: B
    start_time: 2000
    ancestors: [X]
    epochs:
      - start_size: 800
        end_time: 100
migrations:
  - source: A
    dest: B
    rate: 0.0001
";

    #[test]
    // Purpose
    // -------
    // A well-formed graph parses, inherits sizes and reports end times.
    //
    // Given
    // -----
    // - Root deme X with two children; A's second epoch has no size.
    //
    // Expect
    // ------
    // - X starts at infinity; A's second epoch inherits 1000; B ends at 100.
    fn parses_graph_and_resolves_defaults() {
        // Arrange / Act
        let graph = DemeGraph::from_yaml_str(TWO_DEMES).unwrap();

        // Assert
        assert_eq!(graph.deme_names(), vec!["X", "A", "B"]);
        assert!(graph.deme("X").unwrap().start_time().is_infinite());
        assert_eq!(graph.deme("A").unwrap().epoch_sizes().unwrap()[1], (1000.0, 1000.0));
        let ends = graph.end_times();
        assert_eq!(ends[2], ("B".to_string(), 100.0));
    }

    #[test]
    // Purpose
    // -------
    // The string "Infinity" is accepted as a start time.
    fn infinity_string_parses_as_infinite_time() {
        let text = "demes:\n  - name: A\n    start_time: Infinity\n    epochs:\n      - start_size: 10\n";
        let graph = DemeGraph::from_yaml_str(text).unwrap();
        assert!(graph.demes[0].start_time().is_infinite());
    }

    #[test]
    // Purpose
    // -------
    // Non-positive sizes and non-decreasing end times are rejected.
    //
    // Given
    // -----
    // - One graph with a zero size, one with end times 100 then 200.
    //
    // Expect
    // ------
    // - Both fail with `InvalidGraph`.
    fn rejects_bad_sizes_and_times() {
        // Arrange
        let zero_size = "demes:\n  - name: A\n    epochs:\n      - start_size: 0\n";
        let bad_times = "demes:\n  - name: A\n    epochs:\n      - start_size: 10\n        end_time: 100\n      - start_size: 10\n        end_time: 200\n";

        // Act / Assert
        assert!(matches!(
            DemeGraph::from_yaml_str(zero_size),
            Err(GraphError::InvalidGraph { .. })
        ));
        assert!(matches!(
            DemeGraph::from_yaml_str(bad_times),
            Err(GraphError::InvalidGraph { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Ancestors must be declared before the demes that reference them.
    fn rejects_unknown_ancestor() {
        let text = "demes:\n  - name: A\n    start_time: 100\n    ancestors: [Z]\n    epochs:\n      - start_size: 10\n";
        let err = DemeGraph::from_yaml_str(text).unwrap_err();
        assert!(matches!(err, GraphError::InvalidGraph { .. }));
    }

    #[test]
    // Purpose
    // -------
    // Provenance stored in metadata survives a YAML round trip.
    //
    // Given
    // -----
    // - A graph annotated with `u = 1.23e-8` and `fopt = -1234.5`.
    //
    // Expect
    // ------
    // - Reparsing the dumped YAML yields the identical record.
    fn opt_info_round_trips_through_yaml() {
        // Arrange
        let mut graph = DemeGraph::from_yaml_str(TWO_DEMES).unwrap();
        let info = OptimizationProvenance {
            method: "NelderMead".to_string(),
            objective_func: "objective_H2".to_string(),
            fopt: -1234.5,
            max_iter: 500,
            n_iter: 321,
            func_calls: 640,
            flag: 0,
            u: Some(1.23e-8),
        };

        // Act
        graph.set_opt_info(&info).unwrap();
        let text = graph.to_yaml_string().unwrap();
        let reread = DemeGraph::from_yaml_str(&text).unwrap();

        // Assert
        assert_eq!(reread.opt_info().unwrap(), Some(info));
        assert!(reread.deme("X").unwrap().start_time().is_infinite());
    }
}
