use crate::{
    error::{SimError, SimResult},
    plan::{Plan, PlanCatalog, DEFAULT_MAX_PLANS},
    segment::{RatePreset, SegmentAssigner, SegmentRates},
    visits::SamplerKind,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NUM_USERS: i64 = 1000;
pub const DEFAULT_SEED: u64 = 42;

/// Rates in a config file: a preset name or three explicit values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SegmentRatesSpec {
    Preset(RatePreset),
    Explicit(SegmentRates),
}

impl SegmentRatesSpec {
    pub fn resolve(self) -> SegmentRates {
        match self {
            Self::Preset(p) => p.rates(),
            Self::Explicit(r) => r,
        }
    }
}

impl Default for SegmentRatesSpec {
    fn default() -> Self {
        Self::Preset(RatePreset::High)
    }
}

/// `data/simulation.json`. `cost_per_visit` has no default on purpose:
/// deployments have used both 10 and 30.
#[derive(Debug, Clone, Deserialize)]
struct SimulationFile {
    #[serde(default = "default_num_users")]
    num_users: i64,
    cost_per_visit: f64,
    #[serde(default = "default_seed")]
    seed: u64,
    #[serde(default)]
    segment_rates: SegmentRatesSpec,
    #[serde(default)]
    sampler: SamplerKind,
    #[serde(default = "default_max_plans")]
    max_plans: usize,
    #[serde(default)]
    parallel: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct PlanCatalogFile {
    plans: Vec<Plan>,
}

fn default_num_users() -> i64 {
    DEFAULT_NUM_USERS
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

fn default_max_plans() -> usize {
    DEFAULT_MAX_PLANS
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    /// Signed so a negative count from the outside is reported, not wrapped.
    pub num_users: i64,
    pub cost_per_visit: f64,
    pub seed: u64,
    pub segment_rates: SegmentRates,
    pub sampler: SamplerKind,
    pub plans: Vec<Plan>,
    pub max_plans: usize,
    pub parallel: bool,
}

/// Everything the engine needs, checked.
#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub num_users: usize,
    pub cost_per_visit: f64,
    pub catalog: PlanCatalog,
    pub assigner: SegmentAssigner,
}

impl SimConfig {
    /// Defaults for everything except the per-visit cost, which the
    /// caller must always state.
    pub fn new(cost_per_visit: f64) -> Self {
        Self {
            num_users: DEFAULT_NUM_USERS,
            cost_per_visit,
            seed: DEFAULT_SEED,
            segment_rates: SegmentRates::HIGH_UTILIZATION,
            sampler: SamplerKind::default(),
            plans: PlanCatalog::default_plans(),
            max_plans: DEFAULT_MAX_PLANS,
            parallel: false,
        }
    }

    /// Load from the data/ directory.
    /// In tests, use SimConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/simulation.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let file: SimulationFile = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;

        let plan_path = format!("{data_dir}/plans/plan_catalog.json");
        let plan_content = std::fs::read_to_string(&plan_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {plan_path}: {e}"))?;
        let plan_file: PlanCatalogFile = serde_json::from_str(&plan_content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {plan_path}: {e}"))?;

        Ok(Self {
            num_users: file.num_users,
            cost_per_visit: file.cost_per_visit,
            seed: file.seed,
            segment_rates: file.segment_rates.resolve(),
            sampler: file.sampler,
            plans: plan_file.plans,
            max_plans: file.max_plans,
            parallel: file.parallel,
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            num_users: 200,
            ..Self::new(30.0)
        }
    }

    pub fn with_users(mut self, num_users: i64) -> Self {
        self.num_users = num_users;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_rates(mut self, rates: SegmentRates) -> Self {
        self.segment_rates = rates;
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerKind) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_plans(mut self, plans: Vec<Plan>) -> Self {
        self.plans = plans;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// All configuration errors surface here, before any user is simulated.
    pub fn validate(&self) -> SimResult<ValidatedConfig> {
        let num_users = usize::try_from(self.num_users).map_err(|_| {
            SimError::parameter("num_users", format!("must be >= 0, got {}", self.num_users))
        })?;
        if !self.cost_per_visit.is_finite() || self.cost_per_visit < 0.0 {
            return Err(SimError::parameter(
                "cost_per_visit",
                format!("must be finite and >= 0, got {}", self.cost_per_visit),
            ));
        }
        let catalog = PlanCatalog::new(self.plans.clone(), self.max_plans)?;
        let assigner = SegmentAssigner::new(&self.segment_rates)?;
        Ok(ValidatedConfig {
            num_users,
            cost_per_visit: self.cost_per_visit,
            catalog,
            assigner,
        })
    }
}
