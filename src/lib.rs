pub mod config;
pub mod controller;
pub mod domain;
pub mod events;
pub mod report;
pub mod telemetry;
pub mod topology;
