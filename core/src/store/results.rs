use super::SimStore;
use crate::{
    error::SimResult,
    results::SimulationResultRow,
    types::Visits,
};
use rusqlite::params;

impl SimStore {
    // ── Simulation results ────────────────────────────────────────

    /// Insert a finished row set. Callers wanting atomicity wrap this in
    /// a transaction (see `ResultSink for SimStore`).
    pub fn insert_results(&self, run_id: &str, rows: &[SimulationResultRow]) -> SimResult<()> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT INTO simulation_result (
                run_id, user_id, segment, annual_visits, monthly_visits, chosen_plan,
                user_annual_cost, company_revenue, company_cost, company_profit
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        )?;
        for r in rows {
            stmt.execute(params![
                run_id,
                r.user_id as i64,
                r.segment.as_str(),
                r.annual_visits as i64,
                serde_json::to_string(&r.monthly_visits)?,
                &r.chosen_plan,
                r.user_annual_cost,
                r.company_revenue,
                r.company_cost,
                r.company_profit,
            ])?;
        }
        Ok(())
    }

    pub fn results_for_run(&self, run_id: &str) -> SimResult<Vec<SimulationResultRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, segment, annual_visits, monthly_visits, chosen_plan,
                    user_annual_cost, company_revenue, company_cost, company_profit
             FROM simulation_result WHERE run_id = ?1
             ORDER BY user_id ASC",
        )?;
        let raw = stmt
            .query_map(params![run_id], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, f64>(6)?,
                    row.get::<_, f64>(7)?,
                    row.get::<_, f64>(8)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(
                |(user_id, segment, annual_visits, monthly, chosen_plan, cost, revenue, company_cost, profit)|
                 -> SimResult<SimulationResultRow> {
                    let monthly_visits: Vec<Visits> = serde_json::from_str(&monthly)?;
                    Ok(SimulationResultRow {
                        user_id: user_id as u64,
                        segment: segment.parse()?,
                        annual_visits: annual_visits as u64,
                        monthly_visits,
                        chosen_plan,
                        user_annual_cost: cost,
                        company_revenue: revenue,
                        company_cost,
                        company_profit: profit,
                    })
                },
            )
            .collect()
    }

    pub fn result_count(&self, run_id: &str) -> SimResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM simulation_result WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn total_profit(&self, run_id: &str) -> SimResult<f64> {
        let total: Option<f64> = self.conn.query_row(
            "SELECT SUM(company_profit) FROM simulation_result WHERE run_id = ?1",
            params![run_id],
            |row| row.get(0),
        )?;
        Ok(total.unwrap_or(0.0))
    }

    /// (plan, users) ordered by descending count.
    pub fn plan_counts(&self, run_id: &str) -> SimResult<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT chosen_plan, COUNT(*) FROM simulation_result
             WHERE run_id = ?1
             GROUP BY chosen_plan
             ORDER BY COUNT(*) DESC, chosen_plan ASC",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
