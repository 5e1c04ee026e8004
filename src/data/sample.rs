//! Synthetic DBH/height sample generation.
//!
//! Diameters are drawn uniformly; height is an affine rescaling of a noisy
//! copy of diameter into the configured height range, so every height lies
//! inside `[height_min, height_max]` and the relationship is linear apart
//! from the noise.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DatasetStats, FitConfig, Observation};
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct SampleData {
    pub observations: Vec<Observation>,
    pub stats: DatasetStats,
}

pub fn generate_sample(config: &FitConfig) -> Result<SampleData, AppError> {
    if config.sample_count < 3 {
        return Err(AppError::new(2, "Sample count must be >= 3."));
    }
    if !(config.diameter_min.is_finite()
        && config.diameter_max.is_finite()
        && config.diameter_min > 0.0
        && config.diameter_max > config.diameter_min)
    {
        return Err(AppError::new(2, "Invalid diameter range for sample generation."));
    }
    if !(config.height_min.is_finite()
        && config.height_max.is_finite()
        && config.height_min > 0.0
        && config.height_max > config.height_min)
    {
        return Err(AppError::new(2, "Invalid height range for sample generation."));
    }

    if !(config.noise_sd.is_finite() && config.noise_sd >= 0.0) {
        return Err(AppError::new(
            2,
            format!("Noise standard deviation must be finite and >= 0, got {}.", config.noise_sd),
        ));
    }

    let mut rng = StdRng::seed_from_u64(config.sample_seed);
    let normal = Normal::new(0.0, config.noise_sd)
        .map_err(|e| AppError::new(2, format!("Invalid noise setting: {e}")))?;

    let diameters: Vec<f64> = (0..config.sample_count)
        .map(|_| rng.gen_range(config.diameter_min..config.diameter_max))
        .collect();
    let latent: Vec<f64> = diameters.iter().map(|&d| d + normal.sample(&mut rng)).collect();

    let heights = rescale(&latent, config.height_min, config.height_max)
        .ok_or_else(|| AppError::new(2, "Degenerate sample: all latent heights are equal."))?;

    let observations: Vec<Observation> = diameters
        .into_iter()
        .zip(heights)
        .map(|(diameter, height)| Observation { diameter, height })
        .collect();

    let stats = compute_stats(&observations).ok_or_else(|| AppError::new(4, "Failed to compute sample stats."))?;

    Ok(SampleData { observations, stats })
}

/// Affine map of `values` onto `[lo, hi]` (min → lo, max → hi).
fn rescale(values: &[f64], lo: f64, hi: f64) -> Option<Vec<f64>> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if !(span.is_finite() && span > 0.0) {
        return None;
    }
    Some(values.iter().map(|v| lo + (hi - lo) * (v - min) / span).collect())
}

fn compute_stats(observations: &[Observation]) -> Option<DatasetStats> {
    let mut diameter_min = f64::INFINITY;
    let mut diameter_max = f64::NEG_INFINITY;
    let mut height_min = f64::INFINITY;
    let mut height_max = f64::NEG_INFINITY;

    for o in observations {
        diameter_min = diameter_min.min(o.diameter);
        diameter_max = diameter_max.max(o.diameter);
        height_min = height_min.min(o.height);
        height_max = height_max.max(o.height);
    }

    if !diameter_min.is_finite() || !diameter_max.is_finite() || !height_min.is_finite() || !height_max.is_finite() {
        return None;
    }

    Some(DatasetStats {
        n_points: observations.len(),
        diameter_min,
        diameter_max,
        height_min,
        height_max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_is_reproducible_for_a_seed() {
        let config = FitConfig::default();
        let a = generate_sample(&config).unwrap();
        let b = generate_sample(&config).unwrap();
        assert_eq!(a.observations, b.observations);

        let other = FitConfig {
            sample_seed: config.sample_seed + 1,
            ..config
        };
        let c = generate_sample(&other).unwrap();
        assert_ne!(a.observations, c.observations);
    }

    #[test]
    fn heights_span_the_configured_range() {
        let config = FitConfig::default();
        let sample = generate_sample(&config).unwrap();

        assert_eq!(sample.observations.len(), config.sample_count);
        assert!((sample.stats.height_min - config.height_min).abs() < 1e-9);
        assert!((sample.stats.height_max - config.height_max).abs() < 1e-9);
        for o in &sample.observations {
            assert!(o.diameter >= config.diameter_min && o.diameter < config.diameter_max);
            assert!(o.height >= config.height_min - 1e-9 && o.height <= config.height_max + 1e-9);
        }
    }

    #[test]
    fn noiseless_heights_are_affine_in_diameter() {
        let config = FitConfig {
            noise_sd: 0.0,
            ..FitConfig::default()
        };
        let sample = generate_sample(&config).unwrap();
        let s = &sample.stats;
        let slope = (s.height_max - s.height_min) / (s.diameter_max - s.diameter_min);

        for o in &sample.observations {
            let expected = s.height_min + slope * (o.diameter - s.diameter_min);
            assert!((o.height - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let too_small = FitConfig {
            sample_count: 2,
            ..FitConfig::default()
        };
        assert_eq!(generate_sample(&too_small).unwrap_err().exit_code(), 2);

        let bad_range = FitConfig {
            diameter_min: 60.0,
            diameter_max: 10.0,
            ..FitConfig::default()
        };
        assert_eq!(generate_sample(&bad_range).unwrap_err().exit_code(), 2);

        for noise_sd in [-1.0, f64::NAN, f64::INFINITY] {
            let bad_noise = FitConfig {
                noise_sd,
                ..FitConfig::default()
            };
            let err = generate_sample(&bad_noise).unwrap_err();
            assert_eq!(err.exit_code(), 2, "{noise_sd}");
            assert!(err.to_string().contains("Noise standard deviation"), "{err}");
        }
    }

    #[test]
    fn rescale_maps_extremes_to_bounds() {
        let out = rescale(&[3.0, 5.0, 4.0], 10.0, 25.0).unwrap();
        assert_eq!(out, vec![10.0, 25.0, 17.5]);
        assert!(rescale(&[1.0, 1.0], 0.0, 1.0).is_none());
    }
}
