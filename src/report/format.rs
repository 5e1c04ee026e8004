//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use chrono::Local;

use crate::domain::{DatasetStats, FitConfig, MetricRecord};
use crate::fit::{FitOutcome, FittedModel, ModelSlots};
use crate::models::formula;
use crate::report::best_by_aic;

/// p-values below this print as `<2e-16`.
const P_FLOOR: f64 = 2e-16;

/// Run header: sample stats and the settings that reproduce the run.
pub fn format_run_header(stats: &DatasetStats, config: &FitConfig) -> String {
    let mut out = String::new();

    out.push_str("=== hd - Height-Diameter Model Comparison ===\n");
    out.push_str(&format!("Run: {}\n", Local::now().format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!(
        "Sample: n={} | seed={} | noise_sd={:.2}cm\n",
        config.sample_count, config.sample_seed, config.noise_sd
    ));
    out.push_str(&format!(
        "Points: n={} | dbh=[{:.2}, {:.2}]cm | height=[{:.2}, {:.2}]m\n",
        stats.n_points, stats.diameter_min, stats.diameter_max, stats.height_min, stats.height_max
    ));
    out.push_str(&format!(
        "Solver: Levenberg-Marquardt | max_iterations={} | tolerance={:.1e}\n",
        config.solver.max_iterations, config.solver.tolerance
    ));

    out
}

/// Coefficient summary for one converged model.
pub fn format_model_summary(fit: &FittedModel) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "--- {}: {} ---\n",
        fit.kind.slot_name(),
        fit.kind.display_name()
    ));
    out.push_str(&format!("Formula: {}\n\n", formula(fit.kind)));

    out.push_str("Parameters:\n");
    out.push_str(&format!(
        "{:<4} {:>12} {:>12} {:>10} {:>10}\n",
        "", "Estimate", "Std. Error", "t value", "Pr(>|t|)"
    ));
    for est in &fit.estimates {
        out.push_str(
            format!(
                "{:<4} {:>12} {:>12} {:>10.3} {:>10} {}\n",
                est.name,
                fmt_num(est.estimate),
                fmt_num(est.std_error),
                est.t_value,
                fmt_p_value(est.p_value),
                signif_stars(est.p_value),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out.push_str("---\n");
    out.push_str("Signif. codes:  0 '***' 0.001 '**' 0.01 '*' 0.05 '.' 0.1 ' ' 1\n\n");

    out.push_str(&format!(
        "Residual standard error: {:.4} on {} degrees of freedom\n\n",
        fit.sigma, fit.df
    ));
    out.push_str(&format!(
        "Number of evaluations to convergence: {}\n",
        fit.evaluations
    ));
    out.push_str(&format!(
        "Achieved convergence tolerance: {:.4e}\n",
        fit.convergence
    ));

    out
}

/// Side-by-side coefficient table, one column per converged model.
///
/// Each parameter row shows the estimate with its standard error in
/// parentheses underneath.
pub fn format_comparison_table(slots: &ModelSlots, records: &[MetricRecord]) -> String {
    let fits: Vec<&FittedModel> = slots.values().filter_map(FitOutcome::fitted).collect();
    if fits.is_empty() {
        return "No converged models.\n".to_string();
    }

    let mut out = String::new();
    let label_w = 10;
    let col_w = 12;

    let mut header = format!("{:<label_w$}", "");
    let mut rule = format!("{:-<label_w$}", "");
    for fit in &fits {
        header.push_str(&format!(" {:>col_w$}", fit.kind.slot_name()));
        rule.push_str(&format!(" {:-<col_w$}", ""));
    }
    out.push_str(&header);
    out.push('\n');
    let mut names = format!("{:<label_w$}", "");
    for fit in &fits {
        names.push_str(&format!(" {:>col_w$}", truncate(fit.kind.display_name(), col_w)));
    }
    out.push_str(&names);
    out.push('\n');
    out.push_str(&rule);
    out.push('\n');

    for (k, param) in ["a", "b", "c"].iter().enumerate() {
        let mut est_row = format!("{param:<label_w$}");
        let mut se_row = format!("{:<label_w$}", "");
        for fit in &fits {
            match fit.estimates.get(k) {
                Some(est) => {
                    let stars = signif_stars(est.p_value).trim_end();
                    est_row.push_str(&format!(" {:>col_w$}", format!("{}{stars}", fmt_num(est.estimate))));
                    se_row.push_str(&format!(" {:>col_w$}", format!("({})", fmt_num(est.std_error))));
                }
                None => {
                    est_row.push_str(&format!(" {:>col_w$}", ""));
                    se_row.push_str(&format!(" {:>col_w$}", ""));
                }
            }
        }
        out.push_str(est_row.trim_end());
        out.push('\n');
        out.push_str(se_row.trim_end());
        out.push('\n');
    }

    out.push_str(&rule);
    out.push('\n');

    let mut n_row = format!("{:<label_w$}", "Num.Obs.");
    let mut aic_row = format!("{:<label_w$}", "AIC");
    let mut sigma_row = format!("{:<label_w$}", "Sigma");
    for fit in &fits {
        let aic = records
            .iter()
            .find(|r| r.model == fit.kind.slot_name())
            .map(|r| format!("{:.2}", r.aic))
            .unwrap_or_default();
        n_row.push_str(&format!(" {:>col_w$}", fit.n));
        aic_row.push_str(&format!(" {:>col_w$}", aic));
        sigma_row.push_str(&format!(" {:>col_w$.4}", fit.sigma));
    }
    for row in [n_row, aic_row, sigma_row] {
        out.push_str(row.trim_end());
        out.push('\n');
    }

    out
}

/// Metrics table plus the lowest-AIC model.
pub fn format_metrics_table(records: &[MetricRecord]) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "{:<8} {:>12} {:>10} {:>10} {:>10}\n",
        "Model", "AIC", "RMSE", "Mean_Bias", "MAE"
    ));
    out.push_str(&format!(
        "{:-<8} {:-<12} {:-<10} {:-<10} {:-<10}\n",
        "", "", "", "", ""
    ));
    for r in records {
        out.push_str(&format!(
            "{:<8} {:>12.4} {:>10.4} {:>10.4} {:>10.4}\n",
            r.model, r.aic, r.rmse, r.mean_bias, r.mae
        ));
    }

    if let Some(best) = best_by_aic(records) {
        out.push_str(&format!("\nLowest AIC: {} ({:.4})\n", best.model, best.aic));
    }

    out
}

/// Lines for models that failed to converge (empty when all converged).
pub fn format_failures(slots: &ModelSlots) -> String {
    let mut out = String::new();
    for failure in slots.values().filter_map(FitOutcome::failure) {
        out.push_str(&format!("  (skipped) {failure}\n"));
    }
    out
}

fn fmt_num(v: f64) -> String {
    let a = v.abs();
    if a != 0.0 && !(1e-3..1e5).contains(&a) {
        format!("{v:.3e}")
    } else {
        format!("{v:.4}")
    }
}

fn fmt_p_value(p: f64) -> String {
    if p.is_nan() {
        "NA".to_string()
    } else if p < P_FLOOR {
        format!("<{P_FLOOR:.0e}")
    } else if p < 1e-4 {
        format!("{p:.2e}")
    } else {
        format!("{p:.4}")
    }
}

fn signif_stars(p: f64) -> &'static str {
    match p {
        p if p < 0.001 => "***",
        p if p < 0.01 => "** ",
        p if p < 0.05 => "*  ",
        p if p < 0.1 => ".  ",
        _ => "   ",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;
    use crate::fit::{FitError, FitFailure, ParamEstimate};

    fn fitted(kind: ModelKind) -> FittedModel {
        FittedModel {
            kind,
            params: vec![25.0, 0.03],
            estimates: vec![
                ParamEstimate {
                    name: "a",
                    estimate: 25.0,
                    std_error: 1.5,
                    t_value: 16.67,
                    p_value: 1e-20,
                },
                ParamEstimate {
                    name: "b",
                    estimate: 0.03,
                    std_error: 0.02,
                    t_value: 1.5,
                    p_value: 0.14,
                },
            ],
            fitted: vec![],
            n: 100,
            sse: 120.0,
            sigma: 1.1066,
            df: 98,
            evaluations: 5,
            convergence: 2.5e-6,
        }
    }

    #[test]
    fn model_summary_lists_parameters_and_diagnostics() {
        let text = format_model_summary(&fitted(ModelKind::Meyer));
        assert!(text.contains("model1: Meyer"));
        assert!(text.contains("Formula: h = 1.3 + a * (1 - exp(-b * d))"));
        assert!(text.contains("<2e-16 ***"));
        assert!(text.contains("on 98 degrees of freedom"));
        assert!(text.contains("Number of evaluations to convergence: 5"));
    }

    #[test]
    fn comparison_table_has_one_column_per_converged_model() {
        let mut slots = ModelSlots::new();
        slots.insert(ModelKind::Meyer, FitOutcome::Converged(fitted(ModelKind::Meyer)));
        slots.insert(
            ModelKind::Power,
            FitOutcome::Failed(FitFailure {
                kind: ModelKind::Power,
                reason: FitError::SingularCovariance,
            }),
        );
        slots.insert(ModelKind::Curtis, FitOutcome::Converged(fitted(ModelKind::Curtis)));

        let text = format_comparison_table(&slots, &[]);
        let header = text.lines().next().unwrap();
        assert!(header.contains("model1") && header.contains("model5"));
        assert!(!header.contains("model2"));
        assert!(text.contains("(1.5000)"));

        let failures = format_failures(&slots);
        assert!(failures.contains("model2 (Power) failed"));
    }

    #[test]
    fn metrics_table_reports_lowest_aic() {
        let records = vec![
            MetricRecord {
                model: "model1".into(),
                aic: 310.2,
                rmse: 1.2,
                mean_bias: 0.01,
                mae: 0.9,
            },
            MetricRecord {
                model: "model9".into(),
                aic: 305.7,
                rmse: 1.1,
                mean_bias: -0.02,
                mae: 0.8,
            },
        ];
        let text = format_metrics_table(&records);
        assert!(text.starts_with("Model"));
        assert!(text.contains("Lowest AIC: model9"));
    }

    #[test]
    fn number_formatting_switches_to_scientific() {
        assert_eq!(fmt_num(12.5), "12.5000");
        assert_eq!(fmt_num(0.0), "0.0000");
        assert_eq!(fmt_num(0.00012), "1.200e-4");
        assert_eq!(fmt_p_value(0.5), "0.5000");
        assert_eq!(fmt_p_value(f64::NAN), "NA");
    }
}
