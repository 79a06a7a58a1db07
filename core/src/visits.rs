//! Monthly visit generation.
//!
//! One Poisson draw per user-month. Two interchangeable samplers:
//! `PoissonSampler` (rand_distr) and `KnuthSampler` (multiplicative
//! method). Exactly one is selected per engine, at construction.

use crate::{
    error::{SimError, SimResult},
    rng::SimRng,
    types::Visits,
};
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Largest rate handled by a single Knuth pass. Above it e^-λ loses
/// precision, so the draw is split into chunks (sum of Poissons is Poisson).
const KNUTH_MAX_STEP: f64 = 500.0;

/// A validated Poisson rate: finite and >= 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct VisitRate(f64);

impl VisitRate {
    pub const ZERO: VisitRate = VisitRate(0.0);

    /// `label` names the rate's owner in the error.
    pub fn new(label: &str, rate: f64) -> SimResult<Self> {
        if !rate.is_finite() || rate < 0.0 {
            return Err(SimError::InvalidRate {
                segment: label.to_string(),
                rate,
            });
        }
        Ok(Self(rate))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// Draws one month's visit count.
pub trait VisitGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns 0 for a zero rate without consuming randomness.
    fn sample(&self, rate: VisitRate, rng: &mut SimRng) -> Visits;
}

/// Native sampler backed by `rand_distr::Poisson`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoissonSampler;

impl VisitGenerator for PoissonSampler {
    fn name(&self) -> &'static str {
        "poisson"
    }

    fn sample(&self, rate: VisitRate, rng: &mut SimRng) -> Visits {
        if rate.value() == 0.0 {
            return 0;
        }
        // VisitRate is finite and positive here, which is all Poisson::new checks.
        match Poisson::new(rate.value()) {
            Ok(dist) => {
                let draw: f64 = dist.sample(rng);
                draw as Visits
            }
            Err(_) => 0,
        }
    }
}

/// Knuth's multiplicative method on uniform draws.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnuthSampler;

impl KnuthSampler {
    fn sample_step(lambda: f64, rng: &mut SimRng) -> Visits {
        let limit = (-lambda).exp();
        let mut k: Visits = 0;
        let mut p = 1.0;
        loop {
            p *= rng.next_f64();
            if p <= limit {
                return k;
            }
            k = k.saturating_add(1);
        }
    }
}

impl VisitGenerator for KnuthSampler {
    fn name(&self) -> &'static str {
        "knuth"
    }

    fn sample(&self, rate: VisitRate, rng: &mut SimRng) -> Visits {
        let mut remaining = rate.value();
        let mut total: Visits = 0;
        while remaining > 0.0 {
            let step = remaining.min(KNUTH_MAX_STEP);
            total = total.saturating_add(Self::sample_step(step, rng));
            remaining -= step;
        }
        total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    #[default]
    Poisson,
    Knuth,
}

impl SamplerKind {
    pub fn build(self) -> Box<dyn VisitGenerator> {
        match self {
            Self::Poisson => Box::new(PoissonSampler),
            Self::Knuth => Box::new(KnuthSampler),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Poisson => "poisson",
            Self::Knuth => "knuth",
        }
    }
}

impl fmt::Display for SamplerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplerKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "poisson" => Ok(Self::Poisson),
            "knuth" => Ok(Self::Knuth),
            other => Err(SimError::parameter(
                "sampler",
                format!("unknown sampler '{other}' (expected poisson|knuth)"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::RngBank;

    #[test]
    fn rate_validation() {
        assert!(VisitRate::new("x", 0.0).is_ok());
        assert!(VisitRate::new("x", 2.5).is_ok());
        assert!(VisitRate::new("x", -0.1).is_err());
        assert!(VisitRate::new("x", f64::NAN).is_err());
        assert!(VisitRate::new("x", f64::INFINITY).is_err());
    }

    #[test]
    fn zero_rate_always_zero() {
        let mut rng = RngBank::new(1).for_user(1);
        for sampler in [SamplerKind::Poisson.build(), SamplerKind::Knuth.build()] {
            for _ in 0..1_000 {
                assert_eq!(sampler.sample(VisitRate::ZERO, &mut rng), 0);
            }
        }
    }

    #[test]
    fn knuth_handles_large_rates() {
        let mut rng = RngBank::new(3).for_user(1);
        let rate = VisitRate::new("big", 1_200.0).unwrap();
        let n = 200;
        let mean = (0..n)
            .map(|_| KnuthSampler.sample(rate, &mut rng) as f64)
            .sum::<f64>()
            / n as f64;
        // sd of the mean = sqrt(1200 / 200) ~ 2.45
        assert!((mean - 1_200.0).abs() < 15.0, "mean {mean} far from 1200");
    }

    #[test]
    fn sampler_names_parse() {
        assert_eq!("knuth".parse::<SamplerKind>().unwrap(), SamplerKind::Knuth);
        assert_eq!("poisson".parse::<SamplerKind>().unwrap(), SamplerKind::Poisson);
        assert!("normal".parse::<SamplerKind>().is_err());
        assert_eq!(SamplerKind::Knuth.build().name(), "knuth");
    }
}
