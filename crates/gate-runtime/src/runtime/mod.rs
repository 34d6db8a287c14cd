mod app;
mod config;
mod error;
mod logging;
mod sink;
mod telemetry;

pub use app::run_from_args;
