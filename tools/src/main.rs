//! sim-runner: headless runner for the clinic plan simulator.
//!
//! Usage:
//!   sim-runner --cost-per-visit 30 --users 1000 --seed 12345
//!   sim-runner --data-dir ./data --db run.db --json run.json --compare
//!   sim-runner --cost-per-visit 10 --rates low --sampler knuth --parallel

use anyhow::{bail, Context, Result};
use plansim_core::{
    comparison::{compare_plans, ComparisonTable},
    config::SimConfig,
    engine::{new_run_id, SimEngine},
    segment::RatePreset,
    sink::{persist, JsonFileSink, ResultSink},
    store::SimStore,
    visits::SamplerKind,
};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = build_config(&args)?;

    let db = flag_value(&args, "--db");
    let json = flag_value(&args, "--json");
    let compare = has_flag(&args, "--compare");
    let report_json = has_flag(&args, "--report-json");

    if !report_json {
        println!("Clinic plan simulator: sim-runner");
        println!("  users:          {}", config.num_users);
        println!("  cost/visit:     {}", config.cost_per_visit);
        println!("  seed:           {}", config.seed);
        println!(
            "  rates:          healthy={} average={} chronic={}",
            config.segment_rates.healthy, config.segment_rates.average, config.segment_rates.chronic
        );
        println!("  sampler:        {}", config.sampler);
        println!("  parallel:       {}", config.parallel);
        println!();
    }

    let mut engine = SimEngine::build(new_run_id(), &config)?;
    let output = engine.run()?;

    let mut store = match db {
        Some(path) => {
            let store = SimStore::open(path)?;
            store.migrate()?;
            Some(store)
        }
        None => None,
    };
    let mut json_sink = json.map(JsonFileSink::new);
    let mut sinks: Vec<&mut dyn ResultSink> = Vec::new();
    if let Some(store) = store.as_mut() {
        sinks.push(store);
    }
    if let Some(sink) = json_sink.as_mut() {
        sinks.push(sink);
    }
    persist(&output, &mut sinks)?;

    if report_json {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
        return Ok(());
    }

    println!("  run_id:         {}", output.metadata.run_id);
    if output.cancelled {
        println!("  (run cancelled: {} users simulated)", output.rows.len());
    }
    println!();
    print!("{}", output.report);

    if compare {
        println!();
        let comparison = compare_plans(engine.catalog(), &output.rows);
        print!("{}", ComparisonTable(&comparison));
    }
    Ok(())
}

/// Config file (if `--data-dir`) overlaid with command-line flags.
fn build_config(args: &[String]) -> Result<SimConfig> {
    let mut config = match flag_value(args, "--data-dir") {
        Some(dir) => {
            log::info!("loading config from {dir}");
            SimConfig::load(dir)?
        }
        None => {
            let Some(cost) = flag_value(args, "--cost-per-visit") else {
                bail!("--cost-per-visit is required without --data-dir");
            };
            SimConfig::new(cost.parse().context("--cost-per-visit must be a number")?)
        }
    };

    if let Some(cost) = flag_value(args, "--cost-per-visit") {
        config.cost_per_visit = cost.parse().context("--cost-per-visit must be a number")?;
    }
    if let Some(users) = flag_value(args, "--users") {
        config.num_users = users.parse().context("--users must be an integer")?;
    }
    if let Some(seed) = flag_value(args, "--seed") {
        config.seed = seed.parse().context("--seed must be an unsigned integer")?;
    }
    if let Some(rates) = flag_value(args, "--rates") {
        config.segment_rates = rates.parse::<RatePreset>()?.rates();
    }
    if let Some(sampler) = flag_value(args, "--sampler") {
        config.sampler = sampler.parse::<SamplerKind>()?;
    }
    if has_flag(args, "--parallel") {
        config.parallel = true;
    }
    Ok(config)
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}
