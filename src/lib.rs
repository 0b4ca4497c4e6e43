pub mod config;
pub mod context;
pub mod errors;
pub mod exit;
pub mod flags;
pub mod gate;
pub mod localizer;
pub mod logging;
pub mod notify;
pub mod orchestrator;
pub mod pipeline;
pub mod telemetry;
pub mod ui;
