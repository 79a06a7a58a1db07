//! The simulation engine.
//!
//! PHASES (strictly sequential, no re-entry):
//!   Ready -> Simulating -> Reporting -> Finished
//!
//! RULES:
//!   - Configuration is validated before the first user is simulated.
//!   - Each user owns its RNG stream (see rng.rs) and touches no shared
//!     mutable state, so users may run in parallel.
//!   - Rows are merged in user-id order before aggregation.
//!   - Nothing is persisted here. Sinks run once, after the run.

use crate::{
    config::SimConfig,
    error::{SimError, SimResult},
    plan::PlanCatalog,
    report::SimulationReport,
    results::{RunMetadata, SimulationOutput, SimulationResultRow},
    rng::RngBank,
    segment::{SegmentAssigner, SegmentRates},
    selection::PlanSelector,
    types::{RunId, UserId},
    visits::{SamplerKind, VisitGenerator},
};
use rayon::prelude::*;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Ready,
    Simulating,
    Reporting,
    Finished,
}

impl EnginePhase {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready => "ready",
            Self::Simulating => "simulating",
            Self::Reporting => "reporting",
            Self::Finished => "finished",
        }
    }
}

/// Stops the engine from starting new users. Users already in flight
/// run to completion.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct SimEngine {
    pub run_id:     RunId,
    pub rng_bank:   RngBank,
    phase:          EnginePhase,
    num_users:      usize,
    cost_per_visit: f64,
    parallel:       bool,
    sampler:        SamplerKind,
    segment_rates:  SegmentRates,
    catalog:        PlanCatalog,
    assigner:       SegmentAssigner,
    generator:      Box<dyn VisitGenerator>,
    cancel:         CancelToken,
}

impl SimEngine {
    /// Build an engine using the sampler named in the config.
    pub fn build(run_id: RunId, config: &SimConfig) -> SimResult<Self> {
        Self::with_generator(run_id, config, config.sampler.build())
    }

    /// Build an engine with an explicit visit generator.
    /// Fails on any configuration error; nothing has run yet.
    pub fn with_generator(
        run_id: RunId,
        config: &SimConfig,
        generator: Box<dyn VisitGenerator>,
    ) -> SimResult<Self> {
        let validated = config.validate()?;
        Ok(Self {
            run_id,
            rng_bank:       RngBank::new(config.seed),
            phase:          EnginePhase::Ready,
            num_users:      validated.num_users,
            cost_per_visit: validated.cost_per_visit,
            parallel:       config.parallel,
            sampler:        config.sampler,
            segment_rates:  config.segment_rates,
            catalog:        validated.catalog,
            assigner:       validated.assigner,
            generator,
            cancel:         CancelToken::default(),
        })
    }

    /// Engine with a fresh uuid run id.
    pub fn build_test(config: &SimConfig) -> SimResult<Self> {
        Self::build(new_run_id(), config)
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Simulate every user, then aggregate. Callable once per engine.
    pub fn run(&mut self) -> SimResult<SimulationOutput> {
        if self.phase != EnginePhase::Ready {
            return Err(SimError::PhaseViolation {
                expected: EnginePhase::Ready.name(),
                actual: self.phase.name(),
            });
        }
        let metadata = RunMetadata {
            run_id: self.run_id.clone(),
            seed: self.rng_bank.master_seed(),
            num_users: self.num_users,
            cost_per_visit: self.cost_per_visit,
            sampler: self.sampler,
            segment_rates: self.segment_rates,
            started_at: chrono::Utc::now(),
        };
        log::info!(
            "run {} start: users={} seed={} sampler={} parallel={}",
            self.run_id,
            self.num_users,
            metadata.seed,
            self.generator.name(),
            self.parallel
        );

        self.enter(EnginePhase::Simulating);
        let rows = if self.parallel {
            self.simulate_parallel()
        } else {
            self.simulate_sequential()
        };
        let cancelled = rows.len() < self.num_users;
        if cancelled {
            log::warn!(
                "run {} cancelled after {} of {} users",
                self.run_id,
                rows.len(),
                self.num_users
            );
        }

        self.enter(EnginePhase::Reporting);
        let report = SimulationReport::build(&rows, &self.catalog);

        self.enter(EnginePhase::Finished);
        log::info!(
            "run {} finished: rows={} total_profit={:.2}",
            self.run_id,
            rows.len(),
            report.total_profit
        );

        Ok(SimulationOutput {
            metadata,
            rows,
            report,
            cancelled,
        })
    }

    fn enter(&mut self, phase: EnginePhase) {
        log::debug!("run {}: {} -> {}", self.run_id, self.phase.name(), phase.name());
        self.phase = phase;
    }

    fn simulate_sequential(&self) -> Vec<SimulationResultRow> {
        let mut rows = Vec::with_capacity(self.num_users);
        for user_id in 1..=self.num_users as UserId {
            if self.cancel.is_cancelled() {
                break;
            }
            rows.push(self.simulate_user(user_id));
        }
        rows
    }

    fn simulate_parallel(&self) -> Vec<SimulationResultRow> {
        let slots: Vec<Option<SimulationResultRow>> = (0..self.num_users)
            .into_par_iter()
            .map(|i| {
                if self.cancel.is_cancelled() {
                    None
                } else {
                    Some(self.simulate_user(i as UserId + 1))
                }
            })
            .collect();
        slots.into_iter().flatten().collect()
    }

    fn simulate_user(&self, user_id: UserId) -> SimulationResultRow {
        let mut rng = self.rng_bank.for_user(user_id);
        let segment = self.assigner.assign(&mut rng);
        let rate = self.assigner.rate(segment);
        PlanSelector::new(&self.catalog, self.cost_per_visit).simulate_user(
            user_id,
            segment,
            rate,
            self.generator.as_ref(),
            &mut rng,
        )
    }
}

pub fn new_run_id() -> RunId {
    format!("run-{}", uuid::Uuid::new_v4())
}

/// One-shot entry point: validate, simulate, aggregate.
pub fn run(
    catalog: &PlanCatalog,
    num_users: i64,
    cost_per_visit: f64,
    segment_rates: SegmentRates,
    seed: u64,
) -> SimResult<(Vec<SimulationResultRow>, SimulationReport)> {
    let mut config = SimConfig::new(cost_per_visit)
        .with_users(num_users)
        .with_rates(segment_rates)
        .with_seed(seed)
        .with_plans(catalog.plans().to_vec());
    config.max_plans = config.max_plans.max(catalog.len());
    let output = SimEngine::build(new_run_id(), &config)?.run()?;
    Ok((output.rows, output.report))
}
