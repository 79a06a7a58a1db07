//! Aggregation over a finished result set.
//!
//! The report is derived, read-only, and always recomputed in full
//! from the rows. It never mutates incrementally.

use crate::{plan::PlanCatalog, results::SimulationResultRow, segment::Segment};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanSummary {
    pub plan: String,
    pub users: usize,
    /// Fraction of all users choosing this plan; 0 when there are no users.
    pub share: f64,
    /// None when no user chose the plan.
    pub avg_profit: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub users: usize,
    pub avg_visits: f64,
    pub avg_revenue: f64,
    pub avg_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub total_users: usize,
    pub total_revenue: f64,
    pub total_cost: f64,
    pub total_profit: f64,
    /// None for an empty run.
    pub avg_profit: Option<f64>,
    /// Descending by user count, ties in catalog order.
    pub plans: Vec<PlanSummary>,
    /// Healthy, Average, Chronic; segments without users are omitted.
    pub segments: Vec<SegmentSummary>,
}

#[derive(Default)]
struct Acc {
    users: usize,
    visits: f64,
    revenue: f64,
    profit: f64,
}

impl Acc {
    fn add(&mut self, row: &SimulationResultRow) {
        self.users += 1;
        self.visits += row.annual_visits as f64;
        self.revenue += row.company_revenue;
        self.profit += row.company_profit;
    }

    fn mean(&self, total: f64) -> f64 {
        if self.users == 0 {
            0.0
        } else {
            total / self.users as f64
        }
    }
}

impl SimulationReport {
    /// Every catalog plan gets a summary, chosen or not. Rows naming a
    /// plan outside the catalog are listed after it, in first-seen order.
    pub fn build(rows: &[SimulationResultRow], catalog: &PlanCatalog) -> Self {
        let mut plan_names: Vec<String> = catalog.iter().map(|p| p.name.clone()).collect();
        let mut plan_accs: Vec<Acc> = plan_names.iter().map(|_| Acc::default()).collect();
        let mut segment_accs: [Acc; 3] = Default::default();

        let mut total_revenue = 0.0;
        let mut total_cost = 0.0;
        let mut total_profit = 0.0;

        for row in rows {
            total_revenue += row.company_revenue;
            total_cost += row.company_cost;
            total_profit += row.company_profit;

            let idx = match plan_names.iter().position(|n| *n == row.chosen_plan) {
                Some(i) => i,
                None => {
                    plan_names.push(row.chosen_plan.clone());
                    plan_accs.push(Acc::default());
                    plan_names.len() - 1
                }
            };
            plan_accs[idx].add(row);

            let seg_idx = Segment::ALL
                .iter()
                .position(|s| *s == row.segment)
                .unwrap_or(Segment::ALL.len() - 1);
            segment_accs[seg_idx].add(row);
        }

        let total_users = rows.len();
        let mut plans: Vec<PlanSummary> = plan_names
            .into_iter()
            .zip(plan_accs.iter())
            .map(|(plan, acc)| PlanSummary {
                plan,
                users: acc.users,
                share: if total_users == 0 {
                    0.0
                } else {
                    acc.users as f64 / total_users as f64
                },
                avg_profit: (acc.users > 0).then(|| acc.mean(acc.profit)),
            })
            .collect();
        // Stable sort keeps catalog order among equal counts.
        plans.sort_by(|a, b| b.users.cmp(&a.users));

        let segments = Segment::ALL
            .iter()
            .zip(segment_accs.iter())
            .filter(|(_, acc)| acc.users > 0)
            .map(|(&segment, acc)| SegmentSummary {
                segment,
                users: acc.users,
                avg_visits: acc.mean(acc.visits),
                avg_revenue: acc.mean(acc.revenue),
                avg_profit: acc.mean(acc.profit),
            })
            .collect();

        Self {
            total_users,
            total_revenue,
            total_cost,
            total_profit,
            avg_profit: (total_users > 0).then(|| total_profit / total_users as f64),
            plans,
            segments,
        }
    }

    pub fn plan(&self, name: &str) -> Option<&PlanSummary> {
        self.plans.iter().find(|p| p.plan == name)
    }

    pub fn segment(&self, segment: Segment) -> Option<&SegmentSummary> {
        self.segments.iter().find(|s| s.segment == segment)
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== SIMULATION REPORT ===")?;
        writeln!(f, "  users simulated:  {}", self.total_users)?;
        writeln!(f, "  total revenue:    {:.2}", self.total_revenue)?;
        writeln!(f, "  total cost:       {:.2}", self.total_cost)?;
        writeln!(f, "  total profit:     {:.2}", self.total_profit)?;
        match self.avg_profit {
            Some(avg) => writeln!(f, "  avg profit/user:  {avg:.2}")?,
            None => writeln!(f, "  avg profit/user:  n/a")?,
        }

        writeln!(f)?;
        writeln!(f, "=== PLAN SELECTION ===")?;
        for p in &self.plans {
            match p.avg_profit {
                Some(avg) => writeln!(
                    f,
                    "  {:<12} {:>6} users ({:>5.1}%) | avg profit {avg:.2}",
                    p.plan,
                    p.users,
                    p.share * 100.0
                )?,
                None => writeln!(f, "  {:<12} {:>6} users", p.plan, p.users)?,
            }
        }

        writeln!(f)?;
        writeln!(f, "=== ECONOMICS BY SEGMENT ===")?;
        if self.segments.is_empty() {
            writeln!(f, "  (no users simulated)")?;
        }
        writeln!(
            f,
            "  {:<10} {:>6} {:>11} {:>10} {:>10}",
            "segment", "users", "avg visits", "revenue", "profit"
        )?;
        for s in &self.segments {
            writeln!(
                f,
                "  {:<10} {:>6} {:>11.1} {:>10.1} {:>10.1}",
                s.segment.as_str(),
                s.users,
                s.avg_visits,
                s.avg_revenue,
                s.avg_profit
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(user_id: u64, segment: Segment, plan: &str, revenue: f64, cost: f64) -> SimulationResultRow {
        SimulationResultRow {
            user_id,
            segment,
            annual_visits: (cost / 10.0) as u64,
            monthly_visits: vec![0; 12],
            chosen_plan: plan.into(),
            user_annual_cost: revenue,
            company_revenue: revenue,
            company_cost: cost,
            company_profit: revenue - cost,
        }
    }

    #[test]
    fn empty_rows_produce_zero_report() {
        let report = SimulationReport::build(&[], &PlanCatalog::default_catalog());
        assert_eq!(report.total_users, 0);
        assert_eq!(report.total_profit, 0.0);
        assert_eq!(report.avg_profit, None);
        assert!(report.segments.is_empty());
        assert_eq!(report.plans.len(), 4);
        assert!(report.plans.iter().all(|p| p.users == 0 && p.avg_profit.is_none()));
        // Rendering must not panic on an empty run.
        assert!(report.to_string().contains("n/a"));
    }

    #[test]
    fn plans_sorted_by_count_then_catalog_order() {
        let rows = vec![
            row(1, Segment::Healthy, "Standard", 600.0, 100.0),
            row(2, Segment::Healthy, "Unlimited", 1800.0, 900.0),
            row(3, Segment::Average, "Standard", 600.0, 300.0),
        ];
        let report = SimulationReport::build(&rows, &PlanCatalog::default_catalog());
        let order: Vec<_> = report.plans.iter().map(|p| p.plan.as_str()).collect();
        assert_eq!(order, ["Standard", "Unlimited", "Lite", "Chronic"]);
        assert_eq!(report.plan("Standard").unwrap().avg_profit, Some(400.0));
        assert_eq!(report.plan("Lite").unwrap().avg_profit, None);
    }

    #[test]
    fn segment_averages() {
        let rows = vec![
            row(1, Segment::Chronic, "Chronic", 1080.0, 1440.0),
            row(2, Segment::Chronic, "Chronic", 1080.0, 1040.0),
        ];
        let report = SimulationReport::build(&rows, &PlanCatalog::default_catalog());
        assert_eq!(report.segments.len(), 1);
        let chronic = report.segment(Segment::Chronic).unwrap();
        assert_eq!(chronic.users, 2);
        assert_eq!(chronic.avg_revenue, 1080.0);
        assert_eq!(chronic.avg_profit, -160.0);
        assert_eq!(chronic.avg_visits, 124.0);
    }
}
