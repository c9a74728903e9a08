pub mod claim;
pub mod metrics;
pub mod pda;
pub mod schedule;
