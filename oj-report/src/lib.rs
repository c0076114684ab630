pub mod cli;
pub mod configuration;
pub mod domain;
pub mod session;
pub mod startup;
pub mod telemetry;
