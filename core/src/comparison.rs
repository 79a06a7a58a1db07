//! Plan comparison: a derived view, not a second storage schema.
//!
//! Re-prices every stored user year under every plan, answering
//! "what if everyone had been on plan X". Company cost does not depend
//! on the plan, so only revenue and profit move.

use crate::{
    billing::PlanEvaluator,
    plan::PlanCatalog,
    results::SimulationResultRow,
    types::UserId,
};
use serde::Serialize;
use std::fmt;

/// One user's outcome under one plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanOutcome {
    pub user_id: UserId,
    pub plan: String,
    pub annual_cost: f64,
    pub company_profit: f64,
    pub chosen: bool,
}

/// Portfolio totals if every user were on one plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanComparison {
    pub plan: String,
    pub revenue: f64,
    pub cost: f64,
    pub profit: f64,
    pub avg_profit: Option<f64>,
    /// Users for whom this plan was the rational choice.
    pub chosen_by: usize,
}

/// Row-per-user-per-plan view, users in row order, plans in catalog order.
/// Rows without exactly 12 monthly counts are skipped.
pub fn per_user_outcomes(catalog: &PlanCatalog, rows: &[SimulationResultRow]) -> Vec<PlanOutcome> {
    let mut out = Vec::with_capacity(rows.len() * catalog.len());
    for row in rows {
        let Some(months) = row.months() else {
            log::warn!("user {} has no monthly breakdown, skipped", row.user_id);
            continue;
        };
        for plan in catalog.iter() {
            let annual_cost = PlanEvaluator::annual_cost(plan, &months);
            out.push(PlanOutcome {
                user_id: row.user_id,
                plan: plan.name.clone(),
                annual_cost,
                company_profit: annual_cost - row.company_cost,
                chosen: plan.name == row.chosen_plan,
            });
        }
    }
    out
}

pub fn compare_plans(catalog: &PlanCatalog, rows: &[SimulationResultRow]) -> Vec<PlanComparison> {
    let mut out: Vec<PlanComparison> = catalog
        .iter()
        .map(|plan| PlanComparison {
            plan: plan.name.clone(),
            revenue: 0.0,
            cost: 0.0,
            profit: 0.0,
            avg_profit: None,
            chosen_by: 0,
        })
        .collect();

    let mut priced = 0usize;
    for row in rows {
        let Some(months) = row.months() else {
            continue;
        };
        priced += 1;
        for (cmp, plan) in out.iter_mut().zip(catalog.iter()) {
            let revenue = PlanEvaluator::annual_cost(plan, &months);
            cmp.revenue += revenue;
            cmp.cost += row.company_cost;
            cmp.profit += revenue - row.company_cost;
            if plan.name == row.chosen_plan {
                cmp.chosen_by += 1;
            }
        }
    }

    if priced > 0 {
        for cmp in &mut out {
            cmp.avg_profit = Some(cmp.profit / priced as f64);
        }
    }
    out
}

/// Text table for the runner.
pub struct ComparisonTable<'a>(pub &'a [PlanComparison]);

impl fmt::Display for ComparisonTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== PLAN COMPARISON (everyone on one plan) ===")?;
        writeln!(
            f,
            "  {:<12} {:>14} {:>14} {:>14} {:>8}",
            "plan", "revenue", "cost", "profit", "chosen"
        )?;
        for c in self.0 {
            writeln!(
                f,
                "  {:<12} {:>14.2} {:>14.2} {:>14.2} {:>8}",
                c.plan, c.revenue, c.cost, c.profit, c.chosen_by
            )?;
        }
        Ok(())
    }
}
