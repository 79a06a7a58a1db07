//! Shared test doubles.

#![allow(dead_code)]

use plansim_core::{
    rng::SimRng,
    types::Visits,
    visits::{VisitGenerator, VisitRate},
};

/// Every month, every user, the same visit count.
pub struct FixedVisits(pub Visits);

impl VisitGenerator for FixedVisits {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn sample(&self, _rate: VisitRate, _rng: &mut SimRng) -> Visits {
        self.0
    }
}

/// Replays a fixed cycle of counts, ignoring the rate.
pub struct CycleVisits(pub Vec<Visits>, pub std::sync::atomic::AtomicUsize);

impl CycleVisits {
    pub fn new(counts: Vec<Visits>) -> Self {
        Self(counts, std::sync::atomic::AtomicUsize::new(0))
    }
}

impl VisitGenerator for CycleVisits {
    fn name(&self) -> &'static str {
        "cycle"
    }

    fn sample(&self, _rate: VisitRate, _rng: &mut SimRng) -> Visits {
        let i = self.1.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.0[i % self.0.len()]
    }
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-6 * (1.0 + a.abs().max(b.abs()))
}
