//! Synthetic launch data generation
//!
//! Produces a plausible launch history in which equipment flags, landing
//! attempts and landing success all become more common as the flight
//! number grows. Output is fully determined by the seed.

use super::{LandingType, LaunchRecord, LaunchSite, Orbit};
use crate::error::{LandingError, Result};
use chrono::{Duration, NaiveDate};
use rand::distributions::WeightedIndex;
use rand::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Configuration for the sample generator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Number of launches to generate
    pub n_samples: usize,
    /// Random seed
    pub seed: u64,
    /// Date of the first possible launch
    pub start_date: NaiveDate,
    /// Launch dates are drawn from `start_date + [0, span_days)`
    pub span_days: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            n_samples: 100,
            seed: 42,
            start_date: NaiveDate::from_ymd_opt(2010, 6, 4).unwrap_or_default(),
            span_days: 4000,
        }
    }
}

impl GeneratorConfig {
    pub fn with_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = n_samples;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

const SITE_WEIGHTS: [(LaunchSite, f64); 4] = [
    (LaunchSite::CcafsLc40, 0.35),
    (LaunchSite::CcafsSlc40, 0.25),
    (LaunchSite::KscLc39a, 0.25),
    (LaunchSite::VafbSlc4e, 0.15),
];

const ORBIT_WEIGHTS: [(Orbit, f64); 7] = [
    (Orbit::Leo, 0.30),
    (Orbit::Iss, 0.20),
    (Orbit::Gto, 0.15),
    (Orbit::Sso, 0.10),
    (Orbit::Po, 0.10),
    (Orbit::Meo, 0.10),
    (Orbit::EsL1, 0.05),
];

const LANDING_TYPE_WEIGHTS: [(LandingType, f64); 3] = [
    (LandingType::DroneShip, 0.6),
    (LandingType::ReturnToLaunchSite, 0.3),
    (LandingType::None, 0.1),
];

/// Deterministic sample data generator
#[derive(Debug, Clone)]
pub struct SampleGenerator {
    config: GeneratorConfig,
}

impl SampleGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Generate `n_samples` records ordered by date
    pub fn generate(&self) -> Result<Vec<LaunchRecord>> {
        let n = self.config.n_samples;
        if n == 0 {
            return Err(LandingError::InvalidParameter {
                name: "n_samples".to_string(),
                value: "0".to_string(),
                reason: "at least one launch is required".to_string(),
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);

        let mut offsets: Vec<f64> = (0..n)
            .map(|_| rng.gen_range(0.0..self.config.span_days as f64))
            .collect();
        offsets.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let site_dist = weighted(&SITE_WEIGHTS)?;
        let orbit_dist = weighted(&ORBIT_WEIGHTS)?;
        let landing_dist = weighted(&LANDING_TYPE_WEIGHTS)?;

        let records: Vec<LaunchRecord> = offsets
            .iter()
            .enumerate()
            .map(|(i, &offset)| {
                let progress = i as f64 / n as f64;

                let grid_fins = rng.gen::<f64>() < 0.2 + 0.6 * progress;
                let legs = rng.gen::<f64>() < 0.3 + 0.6 * progress;
                let reused = rng.gen::<f64>() < 0.1 + 0.4 * progress;
                let landing_attempt = rng.gen::<f64>() < 0.5 + 0.4 * progress;

                let mut success_rate = 0.3 + 0.5 * progress;
                if grid_fins {
                    success_rate += 0.15;
                }
                if legs {
                    success_rate += 0.15;
                }
                if reused {
                    success_rate -= 0.05;
                }

                // outcome is unknown when no landing was attempted
                let landing_success = landing_attempt.then(|| rng.gen::<f64>() < success_rate);

                let launch_site = SITE_WEIGHTS[site_dist.sample(&mut rng)].0.clone();
                let orbit = ORBIT_WEIGHTS[orbit_dist.sample(&mut rng)].0.clone();
                let payload_mass = rng.gen_range(500.0..15000.0);
                let payload_count = rng.gen_range(1..4);

                let landing_type = if landing_attempt {
                    LANDING_TYPE_WEIGHTS[landing_dist.sample(&mut rng)].0
                } else {
                    LandingType::None
                };

                LaunchRecord {
                    flight_number: (i + 1) as u32,
                    date: self.config.start_date + Duration::days(offset as i64),
                    launch_site,
                    rocket: "Falcon 9".to_string(),
                    grid_fins,
                    reused,
                    legs,
                    landing_attempt,
                    landing_success,
                    landing_type,
                    payload_count,
                    payload_mass: Some(payload_mass),
                    orbit,
                }
            })
            .collect();

        let successes = records.iter().filter(|r| r.class()).count();
        info!(
            launches = records.len(),
            successful_landings = successes,
            seed = self.config.seed,
            "Generated sample launch data"
        );

        Ok(records)
    }
}

fn weighted<T>(choices: &[(T, f64)]) -> Result<WeightedIndex<f64>> {
    WeightedIndex::new(choices.iter().map(|(_, w)| *w))
        .map_err(|e| LandingError::Data(format!("invalid sampling weights: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_deterministic() {
        let config = GeneratorConfig::default().with_samples(50).with_seed(7);
        let a = SampleGenerator::new(config.clone()).generate().unwrap();
        let b = SampleGenerator::new(config).generate().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generated_records_are_consistent() {
        let records = SampleGenerator::new(GeneratorConfig::default()).generate().unwrap();
        assert_eq!(records.len(), 100);

        for (i, r) in records.iter().enumerate() {
            assert_eq!(r.flight_number as usize, i + 1);
            assert!((1..=3).contains(&r.payload_count));
            let mass = r.payload_mass.unwrap();
            assert!((500.0..15000.0).contains(&mass));
            if !r.landing_attempt {
                assert_eq!(r.landing_success, None);
                assert!(!r.class());
                assert_eq!(r.landing_type, LandingType::None);
            }
        }

        for pair in records.windows(2) {
            assert!(pair[0].date <= pair[1].date);
        }
    }

    #[test]
    fn test_zero_samples_rejected() {
        let result = SampleGenerator::new(GeneratorConfig::default().with_samples(0)).generate();
        assert!(matches!(result, Err(LandingError::InvalidParameter { .. })));
    }
}
