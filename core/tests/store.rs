//! Persistence: one batch per finished run.

use plansim_core::{
    config::SimConfig,
    engine::SimEngine,
    error::SimError,
    results::SimulationOutput,
    sink::{persist, JsonFileSink, ResultSink},
    store::SimStore,
};

fn store() -> SimStore {
    let store = SimStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store
}

fn output(run_id: &str, users: i64) -> SimulationOutput {
    let config = SimConfig::default_test().with_users(users).with_seed(4242);
    SimEngine::build(run_id.into(), &config).unwrap().run().unwrap()
}

#[test]
fn rows_round_trip_through_sqlite() {
    let mut store = store();
    let out = output("store-rt", 300);
    store.write_run(&out).unwrap();

    assert_eq!(store.result_count("store-rt").unwrap(), 300);
    let loaded = store.results_for_run("store-rt").unwrap();
    assert_eq!(loaded, out.rows);

    let total = store.total_profit("store-rt").unwrap();
    assert!((total - out.report.total_profit).abs() < 1e-6);
}

#[test]
fn plan_counts_match_report() {
    let mut store = store();
    let out = output("store-counts", 500);
    store.write_run(&out).unwrap();

    for (plan, count) in store.plan_counts("store-counts").unwrap() {
        let summary = out.report.plan(&plan).unwrap();
        assert_eq!(summary.users as i64, count, "count mismatch for {plan}");
    }
}

#[test]
fn run_metadata_round_trips() {
    let mut store = store();
    let out = output("store-meta", 10);
    store.write_run(&out).unwrap();

    let meta = store.run_metadata("store-meta").unwrap();
    assert_eq!(meta.seed, out.metadata.seed);
    assert_eq!(meta.num_users, 10);
    assert_eq!(meta.sampler, out.metadata.sampler);
    assert_eq!(meta.segment_rates, out.metadata.segment_rates);
    assert_eq!(meta.started_at.timestamp(), out.metadata.started_at.timestamp());
    assert_eq!(store.run_ids().unwrap(), vec!["store-meta".to_string()]);
}

#[test]
fn unknown_run_is_not_initialized() {
    let err = store().run_metadata("nope").unwrap_err();
    assert!(matches!(err, SimError::RunNotInitialized));
}

#[test]
fn duplicate_run_leaves_no_partial_rows() {
    let mut store = store();
    let out = output("store-dup", 20);
    store.write_run(&out).unwrap();

    // Second write violates the run primary key and rolls back.
    assert!(store.write_run(&out).is_err());
    assert_eq!(store.result_count("store-dup").unwrap(), 20);
}

#[test]
fn empty_run_persists_cleanly() {
    let mut store = store();
    let out = output("store-empty", 0);
    store.write_run(&out).unwrap();
    assert_eq!(store.result_count("store-empty").unwrap(), 0);
    assert_eq!(store.total_profit("store-empty").unwrap(), 0.0);
}

#[test]
fn json_sink_writes_whole_output() {
    let path = std::env::temp_dir().join(format!("plansim-{}.json", uuid::Uuid::new_v4()));
    let out = output("json-sink", 15);

    let mut db = store();
    let mut json = JsonFileSink::new(&path);
    let mut sinks: Vec<&mut dyn ResultSink> = Vec::new();
    sinks.push(&mut db);
    sinks.push(&mut json);
    persist(&out, &mut sinks).unwrap();

    let doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc["metadata"]["run_id"], "json-sink");
    assert_eq!(doc["rows"].as_array().unwrap().len(), 15);
    assert_eq!(doc["report"]["total_users"], 15);
    assert_eq!(db.result_count("json-sink").unwrap(), 15);

    let _ = std::fs::remove_file(&path);
}
