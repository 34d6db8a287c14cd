//! Prometheus metrics for the turntable gate.

use gate_core::tags::{self, Tag};
use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

fn gauge(tag: Tag) -> Gauge {
    let gauge = Gauge::new(tag.metric, tag.help).expect("static gauge definition");
    REGISTRY
        .register(Box::new(gauge.clone()))
        .expect("gauge registered once");
    gauge
}

fn counter(tag: Tag) -> IntCounter {
    let counter = IntCounter::new(tag.metric, tag.help).expect("static counter definition");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("counter registered once");
    counter
}

// ============================================================================
// Gate State
// ============================================================================

pub static INHIBITED: LazyLock<Gauge> = LazyLock::new(|| gauge(tags::INHIBITED));

pub static REMAINING_COOLDOWN_ROUNDS: LazyLock<Gauge> =
    LazyLock::new(|| gauge(tags::REMAINING_COOLDOWN_ROUNDS));

pub static LAST_ROUND_DURATION_US: LazyLock<Gauge> =
    LazyLock::new(|| gauge(tags::LAST_ROUND_DURATION_US));

pub static PERIOD_S: LazyLock<Gauge> = LazyLock::new(|| gauge(tags::PERIOD_S));

// ============================================================================
// Event Counters
// ============================================================================

pub static INHIBITIONS_ARMED: LazyLock<IntCounter> =
    LazyLock::new(|| counter(tags::INHIBITIONS_ARMED));

pub static FINE_OBSERVATIONS: LazyLock<IntCounter> =
    LazyLock::new(|| counter(tags::FINE_OBSERVATIONS));

pub static COARSE_OBSERVATIONS: LazyLock<IntCounter> =
    LazyLock::new(|| counter(tags::COARSE_OBSERVATIONS));

pub static CYCLES_EXECUTED: LazyLock<IntCounter> =
    LazyLock::new(|| counter(tags::CYCLES_EXECUTED));

// ============================================================================
// Metrics HTTP Server
// ============================================================================

/// Render the registry in the Prometheus text format.
pub fn render() -> Result<Vec<u8>, prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(buffer)
}

/// Start the metrics HTTP server on the given address.
/// Returns a join handle for the server thread.
pub fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        tracing::info!("Metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            match request.url() {
                "/metrics" => match render() {
                    Ok(buffer) => {
                        let mut response = Response::from_data(buffer);
                        if let Ok(header) = tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"text/plain; version=0.0.4"[..],
                        ) {
                            response = response.with_header(header);
                        }
                        let _ = request.respond(response);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to encode metrics: {}", e);
                        let _ = request.respond(
                            Response::from_string("Internal Server Error").with_status_code(500),
                        );
                    }
                },
                "/health" => {
                    let _ = request.respond(Response::from_string("OK"));
                }
                "/ready" => {
                    // Ready once the gate loop has run a cycle
                    if CYCLES_EXECUTED.get() > 0 {
                        let _ = request.respond(Response::from_string("Ready"));
                    } else {
                        let _ = request
                            .respond(Response::from_string("Not Ready").with_status_code(503));
                    }
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("Not Found").with_status_code(404));
                }
            }
        }
    })
}

/// Initialize all metrics (forces lazy initialization)
pub fn init_metrics() {
    let _ = INHIBITED.get();
    let _ = REMAINING_COOLDOWN_ROUNDS.get();
    let _ = LAST_ROUND_DURATION_US.get();
    let _ = PERIOD_S.get();
    let _ = INHIBITIONS_ARMED.get();
    let _ = FINE_OBSERVATIONS.get();
    let _ = COARSE_OBSERVATIONS.get();
    let _ = CYCLES_EXECUTED.get();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_output_names_every_gate_metric() {
        init_metrics();
        let text = String::from_utf8(render().unwrap()).unwrap();
        for tag in [
            tags::INHIBITED,
            tags::REMAINING_COOLDOWN_ROUNDS,
            tags::LAST_ROUND_DURATION_US,
            tags::PERIOD_S,
            tags::INHIBITIONS_ARMED,
            tags::FINE_OBSERVATIONS,
            tags::COARSE_OBSERVATIONS,
            tags::CYCLES_EXECUTED,
        ] {
            assert!(text.contains(tag.metric), "missing {}", tag.metric);
        }
    }
}
