//! Flat-fee clinic subscription simulator.
//!
//! Synthesizes a population, draws each user's monthly visits for a
//! year, lets every user pick the plan that is cheapest for them, and
//! reports what the clinic earns.

pub mod billing;
pub mod comparison;
pub mod config;
pub mod engine;
pub mod error;
pub mod plan;
pub mod report;
pub mod results;
pub mod rng;
pub mod segment;
pub mod selection;
pub mod sink;
pub mod store;
pub mod types;
pub mod visits;
