//! Template preparation for correlation scans.

mod plan;

pub use plan::CorrelationPlan;
