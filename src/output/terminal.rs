//! Terminal output formatting with colors and box drawing.

use colored::Colorize;

use crate::config::{MassStatistic, Tail};
use crate::result::{ClusterSummary, ClusterTestResult};
use crate::types::Polarity;

/// Format a ClusterTestResult for human-readable terminal output.
///
/// Lists significant clusters by p-value with their time window and the
/// units involved, followed by any warnings.
pub fn format_result(result: &ClusterTestResult) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);
    let meta = &result.metadata;

    output.push_str("erp-clusters\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!(
        "  Data: {} subjects x {} samples x {} units\n",
        meta.n_subjects, meta.n_times, meta.n_units
    ));
    output.push_str(&format!(
        "  Test: {}, {}, forming threshold t = {:.3}\n",
        format_tail(meta.tail),
        format_mass(meta.mass),
        result.threshold
    ));
    output.push_str(&format!(
        "  Permutations: {} (seed {}, {} skipped)\n",
        meta.n_permutations,
        meta.seed,
        result.null.skipped()
    ));
    if let Some(critical) = result.null.critical_mass(meta.cluster_alpha) {
        output.push_str(&format!(
            "  Critical |mass| at alpha = {}: {:.2}\n",
            meta.cluster_alpha, critical
        ));
    }
    output.push('\n');

    let significant: Vec<ClusterSummary> = result.summaries().into_iter().filter(|s| s.significant).collect();
    if significant.is_empty() {
        output.push_str(&format!(
            "  {}\n",
            "\u{2713} No significant clusters found".green().bold()
        ));
        output.push_str(&format!(
            "    {} cluster(s) formed, smallest p = {}\n",
            result.clusters.len(),
            result
                .min_p_value()
                .map_or_else(|| "n/a".to_string(), |p| format!("{p:.4}"))
        ));
    } else {
        output.push_str(&format!(
            "  {}\n\n",
            format!("\u{26A0} Found {} significant cluster(s)", significant.len())
                .yellow()
                .bold()
        ));
        for (i, summary) in significant.iter().enumerate() {
            output.push_str(&format_cluster(i + 1, summary));
        }
    }

    if !result.warnings.is_empty() {
        output.push('\n');
        output.push_str(&format!("  {}\n", "Warnings:".yellow()));
        for warning in &result.warnings {
            output.push_str(&format!("    - {}\n", warning.description()));
        }
    }

    output.push('\n');
    output.push_str(&sep);
    output.push('\n');
    output.push_str(&format!("Completed in {:.2} s\n", meta.runtime_secs));

    output
}

fn format_cluster(number: usize, summary: &ClusterSummary) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "    Cluster #{} ({}, p = {:.4}, mass = {:.2})\n",
        number,
        format_polarity(summary.polarity),
        summary.p_value,
        summary.mass
    ));
    match summary.time_window {
        Some((tmin, tmax)) => out.push_str(&format!(
            "      Time window: {:.1} ms to {:.1} ms\n",
            tmin * 1000.0,
            tmax * 1000.0
        )),
        None => out.push_str(&format!(
            "      Samples: {} to {}\n",
            summary.samples.0, summary.samples.1
        )),
    }
    out.push_str(&format!("      Number of units: {}\n", summary.units.len()));
    out.push_str(&format!("      Units involved: {}\n", summary.units.join(", ")));
    out.push_str(&format!(
        "      Peak t = {:.2} at sample {}\n\n",
        summary.peak_t, summary.peak.time
    ));
    out
}

fn format_polarity(polarity: Polarity) -> String {
    match polarity {
        Polarity::Positive => "positive".red().to_string(),
        Polarity::Negative => "negative".blue().to_string(),
    }
}

fn format_tail(tail: Tail) -> &'static str {
    match tail {
        Tail::TwoSided => "two-sided",
        Tail::Positive => "one-sided (positive)",
        Tail::Negative => "one-sided (negative)",
    }
}

fn format_mass(mass: MassStatistic) -> &'static str {
    match mass {
        MassStatistic::Sum => "cluster mass = sum of t",
        MassStatistic::Size => "cluster mass = size",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Cluster, NullDistribution, ScoredCluster};
    use crate::result::Metadata;
    use crate::types::Cell;
    use ndarray::array;

    fn result(significant: bool) -> ClusterTestResult {
        ClusterTestResult {
            t_obs: array![[4.0, 3.5], [0.2, -0.1]],
            threshold: 2.26,
            clusters: vec![ScoredCluster {
                cluster: Cluster {
                    polarity: Polarity::Positive,
                    cells: vec![Cell::new(0, 0), Cell::new(0, 1)],
                    mass: 7.5,
                },
                p_value: if significant { 0.01 } else { 0.3 },
                significant,
            }],
            null: NullDistribution::from_values(vec![1.0; 99], 1),
            warnings: vec![],
            metadata: Metadata {
                seed: 1,
                n_subjects: 10,
                n_times: 2,
                n_units: 2,
                n_permutations: 99,
                tail: Tail::TwoSided,
                cluster_alpha: 0.05,
                max_step: 1,
                mass: MassStatistic::Sum,
                unit_names: vec!["C3".into(), "C4".into()],
                times: Some(vec![0.1, 0.2]),
                runtime_secs: 0.1,
            },
        }
    }

    #[test]
    fn reports_significant_clusters() {
        colored::control::set_override(false);
        let text = format_result(&result(true));
        assert!(text.contains("Found 1 significant cluster(s)"));
        assert!(text.contains("Time window: 100.0 ms to 100.0 ms"));
        assert!(text.contains("Units involved: C3, C4"));
    }

    #[test]
    fn reports_absence() {
        colored::control::set_override(false);
        let text = format_result(&result(false));
        assert!(text.contains("No significant clusters found"));
        assert!(text.contains("smallest p = 0.3000"));
    }
}
