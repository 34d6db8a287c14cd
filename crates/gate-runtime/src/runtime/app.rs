use crate::infra::audit::{AuditEventType, AuditLogger};
use crate::runtime::config::RuntimeConfig;
use crate::runtime::error::RuntimeError;
use crate::runtime::logging::init_tracing;
use crate::runtime::sink::RuntimeSink;
use crate::runtime::telemetry;
use gate_core::{GateLoop, SimulatedTurntable, StateExchange};
use std::path::Path;
use std::sync::{atomic::AtomicBool, Arc};
use std::thread;
use std::time::Duration;
use tracing::info;

pub fn run_from_args() -> Result<(), RuntimeError> {
    let config = RuntimeConfig::from_env()?;
    if config.show_help {
        RuntimeConfig::print_help();
        return Ok(());
    }
    run(config)
}

pub fn run(config: RuntimeConfig) -> Result<(), RuntimeError> {
    // Validate before any side effects
    let gate_config = config.gate_config()?;

    let _log_guard = init_tracing(config.json_logs);

    telemetry::init();
    let metrics_enabled = config.metrics_addr.is_some();
    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let audit_logger = config
        .audit_path
        .as_deref()
        .map(init_audit_logger)
        .transpose()?;

    if let Some(ref logger) = audit_logger {
        let _ = logger.log_event(
            AuditEventType::SystemStart,
            serde_json::json!({
                "version": env!("CARGO_PKG_VERSION"),
                "relative_threshold": gate_config.inhibitor.relative_threshold,
                "cooldown_rounds": gate_config.inhibitor.cooldown_rounds,
                "metrics_enabled": metrics_enabled,
            }),
        );
    }

    let exchange = Arc::new(StateExchange::new());
    let stop = Arc::new(AtomicBool::new(false));

    info!(
        relative_threshold = gate_config.inhibitor.relative_threshold,
        cooldown_rounds = gate_config.inhibitor.cooldown_rounds,
        period_ms = config.period_ms,
        marks_per_round = config.marks_per_round,
        "Starting gate loop"
    );

    let turntable = SimulatedTurntable::new(config.period_s(), config.marks_per_round);
    let mut gate = GateLoop::new(
        turntable,
        gate_config,
        RuntimeSink::new(audit_logger.clone()),
        Arc::clone(&exchange),
    )?;

    let stop_gate = Arc::clone(&stop);
    let gate_handle = thread::spawn(move || {
        gate.run(&stop_gate);
        gate.stats().clone()
    });

    let updater_handle = telemetry::start_metrics_updater(Arc::clone(&exchange), Arc::clone(&stop));

    info!("turntable-gate running");

    let Some(seconds) = config.run_seconds else {
        let _ = gate_handle.join();
        let _ = updater_handle.join();
        return Ok(());
    };

    info!(seconds, "Running for limited duration");
    thread::sleep(Duration::from_secs(seconds));
    stop.store(true, std::sync::atomic::Ordering::Relaxed);

    let stats = gate_handle
        .join()
        .map_err(|_| RuntimeError::GateThreadPanicked)?;
    let _ = updater_handle.join();

    let final_state = exchange.read();
    info!(
        cycles_executed = stats.cycles_executed,
        cycles_missed = stats.cycles_missed,
        watchdog_resyncs = stats.watchdog_resyncs,
        max_jitter_us = stats.max_jitter_us,
        fine_observations = stats.fine_observations,
        coarse_observations = stats.coarse_observations,
        inhibitions_armed = stats.inhibitions_armed,
        inhibited_cycles = stats.inhibited_cycles,
        inhibited = final_state.inhibited,
        "Run complete"
    );

    if let Some(ref logger) = audit_logger {
        let _ = logger.log_event(
            AuditEventType::SystemShutdown,
            serde_json::json!({
                "cycles_executed": stats.cycles_executed,
                "cycles_missed": stats.cycles_missed,
                "watchdog_resyncs": stats.watchdog_resyncs,
                "max_jitter_us": stats.max_jitter_us,
                "inhibitions_armed": stats.inhibitions_armed,
                "inhibited_cycles": stats.inhibited_cycles,
                "inhibited": final_state.inhibited,
            }),
        );
    }
    Ok(())
}

fn init_audit_logger(path: &Path) -> Result<Arc<AuditLogger>, RuntimeError> {
    let logger = AuditLogger::new(path).map_err(|source| RuntimeError::Audit {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), "Audit logging enabled");
    Ok(Arc::new(logger))
}
