//! Result records produced by a run.

use crate::{
    report::SimulationReport,
    segment::{Segment, SegmentRates},
    types::{MonthlyVisits, RunId, UserId, Visits},
    visits::SamplerKind,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One user's simulated year. Owned by a single simulation step and
/// consumed when its result row is built.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticUser {
    pub id: UserId,
    pub segment: Segment,
    pub monthly_visits: MonthlyVisits,
}

impl SyntheticUser {
    pub fn annual_visits(&self) -> u64 {
        self.monthly_visits.iter().map(|&v| u64::from(v)).sum()
    }
}

/// One row per user. Revenue equals the chosen plan's annual cost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResultRow {
    pub user_id: UserId,
    pub segment: Segment,
    pub annual_visits: u64,
    pub monthly_visits: Vec<Visits>,
    pub chosen_plan: String,
    pub user_annual_cost: f64,
    pub company_revenue: f64,
    pub company_cost: f64,
    pub company_profit: f64,
}

impl SimulationResultRow {
    /// Monthly counts as a fixed-size array, if the row holds exactly 12.
    pub fn months(&self) -> Option<MonthlyVisits> {
        self.monthly_visits.as_slice().try_into().ok()
    }
}

/// Parameters of a run, persisted alongside its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub run_id: RunId,
    pub seed: u64,
    pub num_users: usize,
    pub cost_per_visit: f64,
    pub sampler: SamplerKind,
    pub segment_rates: SegmentRates,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationOutput {
    pub metadata: RunMetadata,
    pub rows: Vec<SimulationResultRow>,
    pub report: SimulationReport,
    /// True if a cancel signal stopped the run before every user started.
    pub cancelled: bool,
}
