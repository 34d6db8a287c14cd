mod infra;
mod metrics;
mod runtime;

use std::process::ExitCode;

fn main() -> ExitCode {
    match runtime::run_from_args() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("turntable-gate: {e}");
            ExitCode::FAILURE
        }
    }
}
