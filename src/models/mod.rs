// Data shapes shared across the wizard, planner, and migration engine.

pub mod config;
pub mod plan;
pub mod records;
