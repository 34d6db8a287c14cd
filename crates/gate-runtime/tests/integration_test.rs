use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Command, Output};
use std::thread;
use std::time::{Duration, Instant};

const BIN: &str = env!("CARGO_BIN_EXE_turntable-gate");

fn run_gate(args: &[&str]) -> Output {
    Command::new(BIN)
        .args(args)
        .output()
        .expect("Failed to start turntable-gate")
}

fn free_addr() -> String {
    let listener =
        TcpListener::bind("127.0.0.1:0").expect("Failed to bind ephemeral port for integration test");
    let addr = listener.local_addr().expect("Failed to resolve bound address");
    format!("127.0.0.1:{}", addr.port())
}

fn audit_lines(path: &std::path::Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .expect("audit log written")
        .lines()
        .map(|line| serde_json::from_str(line).expect("audit line is JSON"))
        .collect()
}

#[test]
fn test_help_exits_cleanly() {
    let output = run_gate(&["--help"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("USAGE"));
    assert!(stdout.contains("--cooldown-rounds"));
}

#[test]
fn test_invalid_tuning_is_rejected() {
    let output = run_gate(&["--cooldown-rounds", "0", "--run-seconds", "1"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("cooldown"), "stderr: {stderr}");
}

#[test]
fn test_unknown_flag_is_rejected() {
    let output = run_gate(&["--no-such-flag"]);
    assert!(!output.status.success());
}

#[test]
fn test_audit_trail_records_power_up_inhibition() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("audit.jsonl");

    let output = run_gate(&[
        "--run-seconds",
        "3",
        "--json-logs",
        "--period-ms",
        "200",
        "--audit-log",
        path.to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{output:?}");

    let entries = audit_lines(&path);
    let kinds: Vec<&str> = entries
        .iter()
        .map(|e| e["event_type"].as_str().unwrap())
        .collect();

    assert_eq!(kinds.first(), Some(&"system_start"));
    assert_eq!(kinds.last(), Some(&"system_shutdown"));

    // The first fine round is measured against zero, so the gate arms on
    // power-up and clears two coarse rounds later.
    let armed = kinds.iter().position(|k| *k == "inhibition_armed").unwrap();
    let cleared = kinds.iter().position(|k| *k == "inhibition_cleared").unwrap();
    assert!(armed < cleared);
    assert_eq!(entries[armed]["details"]["previous"], 0);

    let shutdown = &entries[entries.len() - 1]["details"];
    assert!(shutdown["cycles_executed"].as_u64().unwrap() > 0);
    assert!(shutdown["watchdog_resyncs"].is_u64());
    assert!(shutdown["max_jitter_us"].is_u64());
    assert_eq!(shutdown["inhibited"], false);
}

#[test]
fn test_metrics_endpoint_exposes_gate_state() {
    let addr = free_addr();
    let mut child = Command::new(BIN)
        .args(["--run-seconds", "4", "--metrics-addr", &addr])
        .spawn()
        .expect("Failed to start turntable-gate");

    let start = Instant::now();
    let mut body = String::new();
    while start.elapsed() < Duration::from_secs(3) {
        if let Ok(mut stream) = TcpStream::connect(&addr) {
            stream
                .set_read_timeout(Some(Duration::from_secs(2)))
                .unwrap();
            write!(stream, "GET /metrics HTTP/1.0\r\nHost: {addr}\r\n\r\n").unwrap();
            body.clear();
            let _ = stream.read_to_string(&mut body);
            if body.contains("turntable_gate_inhibited") {
                break;
            }
        }
        thread::sleep(Duration::from_millis(100));
    }

    let status = child.wait().expect("turntable-gate exits");
    assert!(status.success());
    assert!(body.contains("turntable_gate_inhibited"), "body: {body}");
    assert!(body.contains("turntable_gate_remaining_cooldown_rounds"));
    assert!(body.contains("turntable_gate_inhibitions_armed_total"));
}
