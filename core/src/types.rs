//! Shared primitive types used across the entire simulation.

/// Sequential synthetic user identifier, 1..=N.
pub type UserId = u64;

/// The canonical run identifier.
pub type RunId = String;

/// Visit count for one month.
pub type Visits = u32;

/// Months simulated per user. One draw per month.
pub const MONTHS_PER_YEAR: usize = 12;

/// The 12 monthly visit counts of one synthetic user.
pub type MonthlyVisits = [Visits; MONTHS_PER_YEAR];
