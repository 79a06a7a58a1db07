//! Aggregation: conservation, empty runs, unchosen plans.

mod common;

use common::{approx_eq, FixedVisits};
use plansim_core::{
    config::SimConfig,
    engine::{self, SimEngine},
    plan::PlanCatalog,
    segment::{Segment, SegmentRates},
};

#[test]
fn total_profit_is_sum_of_row_profits() {
    let config = SimConfig::default_test().with_users(1_500).with_seed(77);
    let out = SimEngine::build("conservation".into(), &config).unwrap().run().unwrap();

    let sum: f64 = out.rows.iter().map(|r| r.company_profit).sum();
    assert!(approx_eq(out.report.total_profit, sum));
    assert!(approx_eq(
        out.report.total_profit,
        out.report.total_revenue - out.report.total_cost
    ));

    let users: usize = out.report.plans.iter().map(|p| p.users).sum();
    assert_eq!(users, out.rows.len());
    let seg_users: usize = out.report.segments.iter().map(|s| s.users).sum();
    assert_eq!(seg_users, out.rows.len());
    assert!(approx_eq(out.report.avg_profit.unwrap(), sum / 1_500.0));
}

/// Zero users is a valid no-op.
#[test]
fn zero_users_returns_empty_report() {
    let (rows, report) = engine::run(
        &PlanCatalog::default_catalog(),
        0,
        30.0,
        SegmentRates::HIGH_UTILIZATION,
        1,
    )
    .unwrap();

    assert!(rows.is_empty());
    assert_eq!(report.total_users, 0);
    assert_eq!(report.total_profit, 0.0);
    assert_eq!(report.total_revenue, 0.0);
    assert_eq!(report.avg_profit, None);
    assert!(report.segments.is_empty());
}

#[test]
fn plans_nobody_chose_are_reported_with_zero() {
    let config = SimConfig::new(30.0).with_users(10);
    let out = SimEngine::with_generator("zero-plans".into(), &config, Box::new(FixedVisits(6)))
        .unwrap()
        .run()
        .unwrap();

    assert_eq!(out.report.plans[0].plan, "Standard");
    assert_eq!(out.report.plans[0].users, 10);
    assert_eq!(out.report.plans[0].share, 1.0);
    for name in ["Lite", "Chronic", "Unlimited"] {
        let p = out.report.plan(name).unwrap();
        assert_eq!(p.users, 0);
        assert_eq!(p.avg_profit, None);
    }
}

#[test]
fn plan_distribution_is_descending() {
    let config = SimConfig::default_test().with_users(3_000).with_seed(5);
    let out = SimEngine::build("distribution".into(), &config).unwrap().run().unwrap();
    for pair in out.report.plans.windows(2) {
        assert!(pair[0].users >= pair[1].users);
    }
}

#[test]
fn segment_mix_roughly_matches_thresholds() {
    let config = SimConfig::default_test().with_users(10_000).with_seed(8);
    let out = SimEngine::build("mix".into(), &config).unwrap().run().unwrap();
    let share = |s: Segment| out.report.segment(s).map_or(0, |x| x.users) as f64 / 10_000.0;

    // sd of a share at n=10k is at most 0.005
    assert!((share(Segment::Healthy) - 0.50).abs() < 0.03);
    assert!((share(Segment::Average) - 0.30).abs() < 0.03);
    assert!((share(Segment::Chronic) - 0.20).abs() < 0.03);

    // Heavier segments visit more.
    let visits = |s: Segment| out.report.segment(s).unwrap().avg_visits;
    assert!(visits(Segment::Healthy) < visits(Segment::Average));
    assert!(visits(Segment::Average) < visits(Segment::Chronic));
}

#[test]
fn report_renders_every_section() {
    let out = SimEngine::build("render".into(), &SimConfig::default_test())
        .unwrap()
        .run()
        .unwrap();
    let text = out.report.to_string();
    assert!(text.contains("SIMULATION REPORT"));
    assert!(text.contains("PLAN SELECTION"));
    assert!(text.contains("ECONOMICS BY SEGMENT"));
    assert!(text.contains("Unlimited"));
}
