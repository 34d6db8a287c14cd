use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber with optional JSON output.
///
/// Output goes through a non-blocking writer so the gate loop never waits
/// on stdout. `log` records from `gate-core` are bridged into tracing. Keep
/// the returned guard alive until shutdown or buffered lines are lost.
pub fn init_tracing(json_output: bool) -> WorkerGuard {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gate_runtime=debug,gate_core=info"));
    let (writer, guard) = tracing_appender::non_blocking(std::io::stdout());

    if json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(writer))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_writer(writer))
            .init();
    }
    guard
}
