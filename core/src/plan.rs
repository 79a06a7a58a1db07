//! Plan catalog: the immutable set of billing plans for one run.
//!
//! Validation happens once, at construction. After that the catalog is
//! read-only and its insertion order is the tie-break order used by
//! plan selection.

use crate::error::{SimError, SimResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub const DEFAULT_MAX_PLANS: usize = 8;

/// Visits covered by the monthly price.
///
/// Stored data from older runs encodes "unlimited" as `-1` (integer
/// columns) or `+inf` (float columns). Use `from_legacy_count` /
/// `from_legacy_float` to map those onto this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IncludedVisitsRepr", into = "IncludedVisitsRepr")]
pub enum IncludedVisits {
    Finite(u32),
    Unlimited,
}

impl IncludedVisits {
    /// Integer encoding: `-1` is unlimited, `0..` is a finite allotment.
    pub fn from_legacy_count(raw: i64) -> SimResult<Self> {
        match raw {
            -1 => Ok(Self::Unlimited),
            n if n >= 0 => u32::try_from(n)
                .map(Self::Finite)
                .map_err(|_| SimError::catalog(format!("included visits {n} out of range"))),
            n => Err(SimError::catalog(format!("included visits {n} is negative"))),
        }
    }

    /// Float encoding: `+inf` is unlimited, any non-negative whole
    /// number is a finite allotment.
    pub fn from_legacy_float(raw: f64) -> SimResult<Self> {
        if raw == f64::INFINITY {
            return Ok(Self::Unlimited);
        }
        if raw.is_finite() && raw >= 0.0 && raw.fract() == 0.0 && raw <= u32::MAX as f64 {
            return Ok(Self::Finite(raw as u32));
        }
        Err(SimError::catalog(format!("included visits {raw} is not a visit count")))
    }

    /// Inverse of `from_legacy_count`.
    pub fn to_legacy_count(self) -> i64 {
        match self {
            Self::Finite(n) => i64::from(n),
            Self::Unlimited => -1,
        }
    }

    pub fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }
}

impl fmt::Display for IncludedVisits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(n) => write!(f, "{n}"),
            Self::Unlimited => write!(f, "unlimited"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum IncludedVisitsRepr {
    Count(u32),
    Tag(UnlimitedTag),
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum UnlimitedTag {
    Unlimited,
}

impl From<IncludedVisitsRepr> for IncludedVisits {
    fn from(repr: IncludedVisitsRepr) -> Self {
        match repr {
            IncludedVisitsRepr::Count(n) => Self::Finite(n),
            IncludedVisitsRepr::Tag(UnlimitedTag::Unlimited) => Self::Unlimited,
        }
    }
}

impl From<IncludedVisits> for IncludedVisitsRepr {
    fn from(v: IncludedVisits) -> Self {
        match v {
            IncludedVisits::Finite(n) => Self::Count(n),
            IncludedVisits::Unlimited => Self::Tag(UnlimitedTag::Unlimited),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    pub monthly_price: f64,
    pub included_visits: IncludedVisits,
    /// Price per visit beyond the allotment. Ignored for unlimited plans.
    pub overage_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
}

impl Plan {
    pub fn new(name: &str, monthly_price: f64, included: u32, overage_price: f64) -> Self {
        Self {
            name: name.to_string(),
            monthly_price,
            included_visits: IncludedVisits::Finite(included),
            overage_price,
            features: None,
        }
    }

    pub fn unlimited(name: &str, monthly_price: f64) -> Self {
        Self {
            name: name.to_string(),
            monthly_price,
            included_visits: IncludedVisits::Unlimited,
            overage_price: 0.0,
            features: None,
        }
    }

    pub fn with_features(mut self, features: &str) -> Self {
        self.features = Some(features.to_string());
        self
    }

    fn validate(&self) -> SimResult<()> {
        if self.name.trim().is_empty() {
            return Err(SimError::catalog("plan name must not be empty"));
        }
        for (field, value) in [
            ("monthly_price", self.monthly_price),
            ("overage_price", self.overage_price),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimError::catalog(format!(
                    "plan '{}' has invalid {field}: {value}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Ordered, validated, immutable list of plans.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    /// Validate and freeze a plan list. Fails on an empty list, more than
    /// `max_plans` entries, duplicate or blank names, and negative or
    /// non-finite prices.
    pub fn new(plans: Vec<Plan>, max_plans: usize) -> SimResult<Self> {
        if plans.is_empty() {
            return Err(SimError::catalog("catalog must contain at least one plan"));
        }
        if plans.len() > max_plans {
            return Err(SimError::catalog(format!(
                "catalog has {} plans, at most {max_plans} allowed",
                plans.len()
            )));
        }
        let mut seen = HashSet::with_capacity(plans.len());
        for plan in &plans {
            plan.validate()?;
            if !seen.insert(plan.name.as_str()) {
                return Err(SimError::catalog(format!("duplicate plan name '{}'", plan.name)));
            }
        }
        Ok(Self { plans })
    }

    /// Lite, Standard, Chronic, Unlimited.
    pub fn default_plans() -> Vec<Plan> {
        vec![
            Plan::new("Lite", 20.0, 2, 15.0)
                .with_features("Basic doctor consultations, blood pressure check, basic blood test"),
            Plan::new("Standard", 50.0, 6, 10.0)
                .with_features("Doctor consultations, yearly X-ray, basic diagnostic tests"),
            Plan::new("Chronic", 90.0, 12, 5.0)
                .with_features("Priority doctor access, monthly blood tests, chronic disease monitoring"),
            Plan::unlimited("Unlimited", 150.0)
                .with_features("Unlimited consultations, yearly check-up, specialist referrals"),
        ]
    }

    pub fn default_catalog() -> Self {
        Self {
            plans: Self::default_plans(),
        }
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    pub fn iter(&self) -> impl Iterator<Item = &Plan> {
        self.plans.iter()
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Plan> {
        self.plans.get(index)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.plans.iter().position(|p| p.name == name)
    }
}
