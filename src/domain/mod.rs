// Domain layer - plain data shared by every stage
pub mod chart;
pub mod station;
pub mod telemetry;
