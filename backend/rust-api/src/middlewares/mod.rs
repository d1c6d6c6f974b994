pub mod metrics;
pub mod trace;
