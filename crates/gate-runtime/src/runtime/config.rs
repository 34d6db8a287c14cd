use super::error::RuntimeError;
use gate_core::{DisturbanceSchedule, GateConfig, InhibitorConfig};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub run_seconds: Option<u64>,
    pub json_logs: bool,
    pub metrics_addr: Option<String>,
    pub audit_path: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub threshold: Option<f64>,
    pub cooldown_rounds: Option<u16>,
    pub period_ms: f64,
    pub marks_per_round: u32,
    pub disturb_every: Option<Duration>,
    pub disturb_step: f64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            run_seconds: None,
            json_logs: false,
            metrics_addr: None,
            audit_path: None,
            config_path: None,
            threshold: None,
            cooldown_rounds: None,
            period_ms: 500.0,
            marks_per_round: 8,
            disturb_every: None,
            disturb_step: 0.2,
        }
    }
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str, RuntimeError> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| RuntimeError::MissingValue(flag.to_string()))
}

fn parse<T: FromStr>(flag: &str, raw: &str) -> Result<T, RuntimeError> {
    raw.parse().map_err(|_| RuntimeError::InvalidValue {
        flag: flag.to_string(),
        value: raw.to_string(),
    })
}

fn positive(flag: &str, value: f64) -> Result<f64, RuntimeError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(RuntimeError::InvalidValue {
            flag: flag.to_string(),
            value: value.to_string(),
        })
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, RuntimeError> {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Result<Self, RuntimeError> {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--run-seconds" => {
                    cfg.run_seconds = Some(parse(flag, value(args, i, flag)?)?);
                    i += 1;
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--metrics-addr" => {
                    cfg.metrics_addr = Some(value(args, i, flag)?.to_string());
                    i += 1;
                }
                "--audit-log" => {
                    cfg.audit_path = Some(PathBuf::from(value(args, i, flag)?));
                    i += 1;
                }
                "--config" => {
                    cfg.config_path = Some(PathBuf::from(value(args, i, flag)?));
                    i += 1;
                }
                "--threshold" => {
                    cfg.threshold = Some(parse(flag, value(args, i, flag)?)?);
                    i += 1;
                }
                "--cooldown-rounds" => {
                    cfg.cooldown_rounds = Some(parse(flag, value(args, i, flag)?)?);
                    i += 1;
                }
                "--period-ms" => {
                    cfg.period_ms = positive(flag, parse(flag, value(args, i, flag)?)?)?;
                    i += 1;
                }
                "--marks-per-round" => {
                    cfg.marks_per_round = parse(flag, value(args, i, flag)?)?;
                    if cfg.marks_per_round == 0 {
                        return Err(RuntimeError::InvalidValue {
                            flag: flag.to_string(),
                            value: "0".to_string(),
                        });
                    }
                    i += 1;
                }
                "--disturb-every" => {
                    let raw = value(args, i, flag)?;
                    let seconds = positive(flag, parse(flag, raw)?)?;
                    let every = Duration::try_from_secs_f64(seconds).map_err(|_| {
                        RuntimeError::InvalidValue {
                            flag: flag.to_string(),
                            value: raw.to_string(),
                        }
                    })?;
                    cfg.disturb_every = Some(every);
                    i += 1;
                }
                "--disturb-step" => {
                    cfg.disturb_step = positive(flag, parse(flag, value(args, i, flag)?)?)?;
                    i += 1;
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                other => return Err(RuntimeError::UnknownFlag(other.to_string())),
            }
            i += 1;
        }
        Ok(cfg)
    }

    /// Inhibitor tuning: config file first, then command line overrides.
    pub fn inhibitor_config(&self) -> Result<InhibitorConfig, RuntimeError> {
        let mut inhibitor = match &self.config_path {
            Some(path) => {
                let raw =
                    std::fs::read_to_string(path).map_err(|source| RuntimeError::ConfigRead {
                        path: path.clone(),
                        source,
                    })?;
                serde_json::from_str(&raw).map_err(|source| RuntimeError::ConfigParse {
                    path: path.clone(),
                    source,
                })?
            }
            None => InhibitorConfig::default(),
        };

        if let Some(threshold) = self.threshold {
            inhibitor.relative_threshold = threshold;
        }
        if let Some(rounds) = self.cooldown_rounds {
            inhibitor.cooldown_rounds = rounds;
        }
        inhibitor.validate()?;
        Ok(inhibitor)
    }

    pub fn gate_config(&self) -> Result<GateConfig, RuntimeError> {
        Ok(GateConfig {
            inhibitor: self.inhibitor_config()?,
            disturbance: self.disturb_every.map(|every| DisturbanceSchedule {
                every,
                step: self.disturb_step,
            }),
            ..Default::default()
        })
    }

    pub fn period_s(&self) -> f64 {
        self.period_ms / 1000.0
    }

    pub fn print_help() {
        println!(
            r#"turntable-gate - Speed-stability gate for turntable ball release

USAGE:
    turntable-gate [OPTIONS]

OPTIONS:
    --run-seconds <SECS>      Run for a fixed duration then exit
    --json-logs               Output logs in JSON format (for log aggregation)
    --metrics-addr <ADDR>     Enable Prometheus metrics server on address (e.g., 0.0.0.0:9090)
    --audit-log <PATH>        Append inhibition events to the specified JSONL file
    --config <PATH>           Load inhibitor tuning from a JSON file
    --threshold <FRACTION>    Relative round-duration change that inhibits release [default: 0.08]
    --cooldown-rounds <N>     Coarse rounds release stays inhibited [default: 2]
    --period-ms <MS>          Simulated turntable rotation period [default: 500]
    --marks-per-round <N>     Light sensor marks per round [default: 8]
    --disturb-every <SECS>    Change the simulated drive speed periodically
    --disturb-step <FRACTION> Size of each drive speed change [default: 0.2]
    -h, --help                Print this help message

CONFIG FILE:
    {{ "relative_threshold": 0.08, "cooldown_rounds": 2 }}
    Command line values override the file.

ENVIRONMENT VARIABLES:
    RUST_LOG                  Set log filter (e.g., RUST_LOG=debug,gate_core=trace)

EXAMPLES:
    # Short simulated run with a speed change every 3 seconds
    turntable-gate --run-seconds 10 --disturb-every 3

    # Production-style run with all observability
    turntable-gate --json-logs --metrics-addr 0.0.0.0:9090 --audit-log /var/log/turntable/audit.jsonl
"#
        );
    }
}
