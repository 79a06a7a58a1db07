//! User risk segments and their monthly visit rates.
//!
//! Population mix is fixed: 50% Healthy, 30% Average, 20% Chronic.
//! Rates are configuration. Two rate sets are in circulation; the
//! canonical default is `SegmentRates::HIGH_UTILIZATION`.

use crate::{
    error::{SimError, SimResult},
    rng::SimRng,
    visits::VisitRate,
};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

pub const HEALTHY_UPPER: f64 = 0.50;
pub const AVERAGE_UPPER: f64 = 0.80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Segment {
    Healthy,
    Average,
    Chronic,
}

impl Segment {
    /// Report order.
    pub const ALL: [Segment; 3] = [Segment::Healthy, Segment::Average, Segment::Chronic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Healthy => "Healthy",
            Self::Average => "Average",
            Self::Chronic => "Chronic",
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Healthy => 0,
            Self::Average => 1,
            Self::Chronic => 2,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Segment {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "healthy" => Ok(Self::Healthy),
            "average" => Ok(Self::Average),
            "chronic" => Ok(Self::Chronic),
            other => Err(SimError::parameter("segment", format!("unknown segment '{other}'"))),
        }
    }
}

/// Expected visits per month for each segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentRates {
    pub healthy: f64,
    pub average: f64,
    pub chronic: f64,
}

impl SegmentRates {
    /// Canonical default.
    pub const HIGH_UTILIZATION: SegmentRates = SegmentRates {
        healthy: 1.0,
        average: 5.0,
        chronic: 12.0,
    };

    pub const LOW_UTILIZATION: SegmentRates = SegmentRates {
        healthy: 0.2,
        average: 0.6,
        chronic: 2.5,
    };

    pub fn rate(&self, segment: Segment) -> f64 {
        match segment {
            Segment::Healthy => self.healthy,
            Segment::Average => self.average,
            Segment::Chronic => self.chronic,
        }
    }
}

impl Default for SegmentRates {
    fn default() -> Self {
        Self::HIGH_UTILIZATION
    }
}

/// Named rate set, selectable from config files and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatePreset {
    High,
    Low,
}

impl RatePreset {
    pub fn rates(self) -> SegmentRates {
        match self {
            Self::High => SegmentRates::HIGH_UTILIZATION,
            Self::Low => SegmentRates::LOW_UTILIZATION,
        }
    }
}

impl FromStr for RatePreset {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            other => Err(SimError::parameter(
                "segment_rates",
                format!("unknown preset '{other}' (expected high|low)"),
            )),
        }
    }
}

/// Maps one uniform draw to a segment and hands out that segment's rate.
#[derive(Debug, Clone)]
pub struct SegmentAssigner {
    rates: [VisitRate; 3],
}

impl SegmentAssigner {
    /// Fails with `InvalidRate` if any rate is negative or non-finite.
    pub fn new(rates: &SegmentRates) -> SimResult<Self> {
        let mut validated = [VisitRate::ZERO; 3];
        for segment in Segment::ALL {
            validated[segment.index()] = VisitRate::new(segment.as_str(), rates.rate(segment))?;
        }
        Ok(Self { rates: validated })
    }

    pub fn assign(&self, rng: &mut SimRng) -> Segment {
        Self::segment_for_draw(rng.next_f64())
    }

    /// Partition of [0,1). Anything outside it (NaN, negative, >= 1)
    /// is clamped to Chronic.
    pub fn segment_for_draw(u: f64) -> Segment {
        if !(0.0..1.0).contains(&u) {
            log::warn!("segment draw {u} outside [0,1), clamping to Chronic");
            return Segment::Chronic;
        }
        if u < HEALTHY_UPPER {
            Segment::Healthy
        } else if u < AVERAGE_UPPER {
            Segment::Average
        } else {
            Segment::Chronic
        }
    }

    pub fn rate(&self, segment: Segment) -> VisitRate {
        self.rates[segment.index()]
    }
}
