//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - used in-memory during fitting
//! - exported to CSV
//! - reloaded later for comparisons

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Breast height (m). Every H–D equation is anchored so that `height(0) = 1.3`.
pub const BREAST_HEIGHT: f64 = 1.3;

/// A single tree measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Diameter at breast height (cm).
    pub diameter: f64,
    /// Total height (m).
    pub height: f64,
}

/// Basic dataset summary stats for reporting.
#[derive(Debug, Clone)]
pub struct DatasetStats {
    pub n_points: usize,
    pub diameter_min: f64,
    pub diameter_max: f64,
    pub height_min: f64,
    pub height_max: f64,
}

/// The height–diameter equations compared by a run.
///
/// Declaration order is slot order (`model1..model10`); the derived `Ord`
/// relies on it. Each curve below is added to `BREAST_HEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, ValueEnum)]
pub enum ModelKind {
    /// Exponential saturation, `a·(1 − e^(−b·d))`.
    Meyer,
    /// Power law, `a·d^b`.
    Power,
    /// Three-parameter logistic, `a / (1 + b·e^(−c·d))`.
    Logistic,
    /// Gompertz sigmoid, `a·e^(−b·e^(−c·d))`.
    Gompertz,
    /// Curtis, `a·(d / (1 + d))^b`.
    Curtis,
    /// Schumacher, `a·e^(−b/d)`.
    Schumacher,
    /// Näslund, `d² / (a + b·d)²`.
    Naslund,
    /// Michaelis–Menten saturation, `a·d / (b + d)`.
    MichaelisMenten,
    /// Wykoff, `e^(a + b/(d + 1))`.
    Wykoff,
    /// Ratkowsky, `a·e^(−b/(d + c))`.
    Ratkowsky,
}

impl ModelKind {
    pub const ALL: [ModelKind; 10] = [
        ModelKind::Meyer,
        ModelKind::Power,
        ModelKind::Logistic,
        ModelKind::Gompertz,
        ModelKind::Curtis,
        ModelKind::Schumacher,
        ModelKind::Naslund,
        ModelKind::MichaelisMenten,
        ModelKind::Wykoff,
        ModelKind::Ratkowsky,
    ];

    /// Slot identifier used in the metrics table (`model1..model10`).
    pub fn slot_name(self) -> &'static str {
        match self {
            ModelKind::Meyer => "model1",
            ModelKind::Power => "model2",
            ModelKind::Logistic => "model3",
            ModelKind::Gompertz => "model4",
            ModelKind::Curtis => "model5",
            ModelKind::Schumacher => "model6",
            ModelKind::Naslund => "model7",
            ModelKind::MichaelisMenten => "model8",
            ModelKind::Wykoff => "model9",
            ModelKind::Ratkowsky => "model10",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Meyer => "Meyer",
            ModelKind::Power => "Power",
            ModelKind::Logistic => "Logistic",
            ModelKind::Gompertz => "Gompertz",
            ModelKind::Curtis => "Curtis",
            ModelKind::Schumacher => "Schumacher",
            ModelKind::Naslund => "Naslund",
            ModelKind::MichaelisMenten => "Michaelis-Menten",
            ModelKind::Wykoff => "Wykoff",
            ModelKind::Ratkowsky => "Ratkowsky",
        }
    }

    /// Parameter labels, in the order used by parameter vectors.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ModelKind::Logistic | ModelKind::Gompertz | ModelKind::Ratkowsky => &["a", "b", "c"],
            _ => &["a", "b"],
        }
    }

    /// Number of fitted parameters.
    pub fn param_count(self) -> usize {
        self.param_names().len()
    }
}

/// One row of the exported metrics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    #[serde(rename = "Model")]
    pub model: String,
    #[serde(rename = "AIC")]
    pub aic: f64,
    #[serde(rename = "RMSE")]
    pub rmse: f64,
    #[serde(rename = "Mean_Bias")]
    pub mean_bias: f64,
    #[serde(rename = "MAE")]
    pub mae: f64,
}

/// Solver budget shared by every model fit.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    pub max_iterations: usize,
    /// Relative-offset convergence tolerance.
    pub tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            tolerance: 1e-5,
        }
    }
}

/// Fit configuration (derived from CLI args).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub sample_count: usize,
    pub sample_seed: u64,
    pub diameter_min: f64,
    pub diameter_max: f64,
    pub height_min: f64,
    pub height_max: f64,
    /// Standard deviation (cm) of the noise added to diameter before rescaling to height.
    pub noise_sd: f64,

    /// Models to fit, in slot order.
    pub models: Vec<ModelKind>,
    pub solver: SolverOptions,

    pub output: PathBuf,
    /// Print per-model coefficient summaries.
    pub summaries: bool,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            sample_count: 100,
            sample_seed: 123,
            diameter_min: 10.0,
            diameter_max: 60.0,
            height_min: 10.0,
            height_max: 25.0,
            noise_sd: 4.0,
            models: ModelKind::ALL.to_vec(),
            solver: SolverOptions::default(),
            output: PathBuf::from("hd_model_metrics.csv"),
            summaries: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_order_follows_declaration() {
        let mut sorted = ModelKind::ALL.to_vec();
        sorted.sort();
        assert_eq!(sorted, ModelKind::ALL.to_vec());

        let names: Vec<&str> = ModelKind::ALL.iter().map(|k| k.slot_name()).collect();
        assert_eq!(names[0], "model1");
        assert_eq!(names[8], "model9");
        assert_eq!(names[9], "model10");
    }

    #[test]
    fn every_model_has_cli_help() {
        for kind in ModelKind::ALL {
            let value = kind.to_possible_value().expect("no skipped variants");
            assert!(value.get_help().is_some(), "{kind:?} has no help text");
        }
    }
}
