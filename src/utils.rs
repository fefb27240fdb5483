//! utils — time stamps, progress lines, and output naming.
//!
//! Purpose
//! -------
//! Small helpers shared by the fit drivers and objectives: a wall-clock
//! stamp for progress lines, the fixed-width status line itself, and the
//! naming helper used for per-job output files.
//!
//! Conventions
//! -----------
//! - Progress lines are emitted through `log` at `info` level under the
//!   [`PROGRESS_TARGET`] target; the library never prints directly.
//! - Values greater than one are shown with one decimal; smaller values in
//!   scientific notation with two decimals.
use ndarray::ArrayView1;

/// `log` target for fit progress lines.
pub const PROGRESS_TARGET: &str = "archaic::progress";

/// Local wall-clock time as `[HH:MM:SS]`.
pub fn get_time() -> String {
    chrono::Local::now().format("[%H:%M:%S]").to_string()
}

/// Output-file stem `prefix[_cluster][_process]`; empty parts are skipped.
pub fn get_tag(prefix: &str, cluster: &str, process: &str) -> String {
    let mut tag = prefix.to_string();
    for part in [cluster, process] {
        if !part.is_empty() {
            tag.push('_');
            tag.push_str(part);
        }
    }
    tag
}

/// Fixed-width rendering of one parameter value.
pub fn format_value(x: f64) -> String {
    if x > 1.0 {
        format!("{x:>10.1}")
    } else {
        format!("{:>10}", format!("{x:.2e}"))
    }
}

/// One status line: time stamp, call count, a label or log-likelihood, and
/// already formatted columns.
pub fn format_status(n_calls: usize, label: &str, columns: &[String]) -> String {
    format!("{} {n_calls:<6} {label:>10} {}", get_time(), columns.concat())
}

/// Status line for an evaluation with log-likelihood `ll` at `p`.
pub fn status_line(n_calls: usize, ll: f64, p: ArrayView1<f64>) -> String {
    let columns: Vec<String> = p.iter().map(|&x| format_value(x)).collect();
    format_status(n_calls, &format!("{ll:.2}"), &columns)
}

/// Log the parameter names and start vector of a fit.
pub fn log_start(names: &[String], p0: ArrayView1<f64>) {
    let names: Vec<String> = names.iter().map(|n| format!("{n:>10}")).collect();
    let values: Vec<String> = p0.iter().map(|&x| format_value(x)).collect();
    log::info!(target: PROGRESS_TARGET, "{}", format_status(0, "pnames", &names));
    log::info!(target: PROGRESS_TARGET, "{}", format_status(0, "p0", &values));
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Empty tag parts are dropped, present ones joined with underscores.
    fn get_tag_skips_empty_parts() {
        assert_eq!(get_tag("fit", "", ""), "fit");
        assert_eq!(get_tag("fit", "12", ""), "fit_12");
        assert_eq!(get_tag("fit", "12", "3"), "fit_12_3");
        assert_eq!(get_tag("fit", "", "3"), "fit_3");
    }

    #[test]
    // Purpose
    // -------
    // Large values use one decimal, small ones scientific notation.
    fn format_value_switches_notation_at_one() {
        assert_eq!(format_value(12345.67).trim(), "12345.7");
        assert_eq!(format_value(1.35e-8).trim(), "1.35e-8");
        assert_eq!(format_value(1.35e-8).len(), 10);
    }

    #[test]
    // Purpose
    // -------
    // A status line carries the call count, rounded log-likelihood, and
    // every parameter.
    fn status_line_contains_fields() {
        // Act
        let line = status_line(42, -3.14159, array![2000.0, 1.5e-8].view());

        // Assert
        assert!(line.starts_with('['));
        assert!(line.contains("42"));
        assert!(line.contains("-3.14"));
        assert!(line.contains("2000.0"));
        assert!(line.contains("1.50e-8"));
    }
}
