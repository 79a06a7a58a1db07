//! Plan pricing: what a user pays for a month (or a year) of visits.
//!
//! Pure functions, no state.

use crate::{
    plan::{IncludedVisits, Plan, PlanCatalog},
    types::{MonthlyVisits, Visits},
};

pub struct PlanEvaluator;

impl PlanEvaluator {
    /// Visits billed at the overage price. Always 0 for unlimited plans.
    pub fn overage_visits(plan: &Plan, visits: Visits) -> Visits {
        match plan.included_visits {
            IncludedVisits::Unlimited => 0,
            IncludedVisits::Finite(included) => visits.saturating_sub(included),
        }
    }

    /// `monthly_price + overage * overage_price`.
    pub fn monthly_bill(plan: &Plan, visits: Visits) -> f64 {
        let overage = Self::overage_visits(plan, visits);
        if overage == 0 {
            return plan.monthly_price;
        }
        plan.monthly_price + f64::from(overage) * plan.overage_price
    }

    /// Sum of the twelve monthly bills. Overage is settled per month,
    /// never against the annual total.
    pub fn annual_cost(plan: &Plan, monthly: &MonthlyVisits) -> f64 {
        monthly.iter().map(|&v| Self::monthly_bill(plan, v)).sum()
    }

    /// Annual cost under every plan, in catalog order.
    pub fn annual_costs(catalog: &PlanCatalog, monthly: &MonthlyVisits) -> Vec<f64> {
        catalog.iter().map(|plan| Self::annual_cost(plan, monthly)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overage_charged_per_visit_above_allotment() {
        let lite = Plan::new("Lite", 20.0, 2, 15.0);
        assert_eq!(PlanEvaluator::monthly_bill(&lite, 0), 20.0);
        assert_eq!(PlanEvaluator::monthly_bill(&lite, 2), 20.0);
        assert_eq!(PlanEvaluator::monthly_bill(&lite, 3), 35.0);
        assert_eq!(PlanEvaluator::monthly_bill(&lite, 6), 80.0);
    }

    #[test]
    fn unlimited_ignores_overage_price() {
        let mut plan = Plan::unlimited("Unlimited", 150.0);
        plan.overage_price = 99.0;
        assert_eq!(PlanEvaluator::overage_visits(&plan, 1_000), 0);
        assert_eq!(PlanEvaluator::monthly_bill(&plan, 1_000), 150.0);
    }

    #[test]
    fn annual_overage_is_monthly_not_pooled() {
        // 12 visits in one month, none in the others: 10 overage visits,
        // even though the annual total equals the pooled allotment.
        let lite = Plan::new("Lite", 20.0, 2, 15.0);
        let mut monthly = [0; 12];
        monthly[0] = 12;
        assert_eq!(PlanEvaluator::annual_cost(&lite, &monthly), 240.0 + 150.0);
    }
}
