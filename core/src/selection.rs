//! Per-user driver: twelve monthly draws, every plan priced on the same
//! draw, then the rational (cheapest) plan is chosen.

use crate::{
    billing::PlanEvaluator,
    plan::PlanCatalog,
    results::{SimulationResultRow, SyntheticUser},
    rng::SimRng,
    segment::Segment,
    types::{UserId, MONTHS_PER_YEAR},
    visits::{VisitGenerator, VisitRate},
};

pub struct PlanSelector<'a> {
    catalog: &'a PlanCatalog,
    cost_per_visit: f64,
}

impl<'a> PlanSelector<'a> {
    pub fn new(catalog: &'a PlanCatalog, cost_per_visit: f64) -> Self {
        Self {
            catalog,
            cost_per_visit,
        }
    }

    /// Index of the cheapest plan. The first plan attaining the minimum
    /// wins, so ties go to catalog order. `None` only for an empty slice.
    pub fn cheapest(annual_costs: &[f64]) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &cost) in annual_costs.iter().enumerate() {
            match best {
                Some((_, best_cost)) if cost >= best_cost => {}
                _ => best = Some((i, cost)),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Simulate one user's year and settle it.
    pub fn simulate_user(
        &self,
        user_id: UserId,
        segment: Segment,
        rate: VisitRate,
        generator: &dyn VisitGenerator,
        rng: &mut SimRng,
    ) -> SimulationResultRow {
        let mut monthly_visits = [0; MONTHS_PER_YEAR];
        let mut annual_costs = vec![0.0; self.catalog.len()];

        for month in monthly_visits.iter_mut() {
            let visits = generator.sample(rate, rng);
            *month = visits;
            for (total, plan) in annual_costs.iter_mut().zip(self.catalog.iter()) {
                *total += PlanEvaluator::monthly_bill(plan, visits);
            }
        }

        let user = SyntheticUser {
            id: user_id,
            segment,
            monthly_visits,
        };
        self.settle(user, &annual_costs)
    }

    /// Price an already-drawn year under every plan and settle it.
    pub fn price_user(&self, user: SyntheticUser) -> SimulationResultRow {
        let annual_costs = PlanEvaluator::annual_costs(self.catalog, &user.monthly_visits);
        self.settle(user, &annual_costs)
    }

    fn settle(&self, user: SyntheticUser, annual_costs: &[f64]) -> SimulationResultRow {
        // A validated catalog is never empty.
        let best = Self::cheapest(annual_costs).unwrap_or(0);
        let (chosen_plan, user_annual_cost) = match self.catalog.get(best) {
            Some(plan) => (plan.name.clone(), annual_costs[best]),
            None => (String::new(), 0.0),
        };

        let annual_visits = user.annual_visits();
        let company_revenue = user_annual_cost;
        let company_cost = annual_visits as f64 * self.cost_per_visit;

        SimulationResultRow {
            user_id: user.id,
            segment: user.segment,
            annual_visits,
            monthly_visits: user.monthly_visits.to_vec(),
            chosen_plan,
            user_annual_cost,
            company_revenue,
            company_cost,
            company_profit: company_revenue - company_cost,
        }
    }
}
