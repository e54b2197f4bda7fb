//! `pdp-eval`: CLI test harness for smoke-testing policy expressions
//! against an in-memory PIP/PAP fixture, without a live deployment (spec §6).
//!
//! Usage: `pdp-eval <fixture.json>`
//!
//! The fixture file is a JSON object `{"request": Request, "fixture":
//! Fixture}` (see `pdp_core::infrastructure::fixture::Fixture` and
//! `pdp_core::entities::Request`). Exit codes follow spec §6's table: `0`
//! decision returned (may be deny); `1` invalid request; `2` upstream (PIP/
//! PAP) error; `3` internal or expression-parse error.

use pdp_core::config::PdpConfig;
use pdp_core::entities::Request;
use pdp_core::entrance::Entrance;
use pdp_core::infrastructure::{Fixture, FixturePap, FixturePip};
use pdp_core::PdpError;
use serde::Deserialize;
use std::process::ExitCode;

#[derive(Deserialize)]
struct CliInput {
    request: Request,
    fixture: Fixture,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let Some(path) = std::env::args().nth(1) else {
        eprintln!("usage: pdp-eval <fixture.json>");
        return ExitCode::from(1);
    };

    match run(&path).await {
        Ok(allowed) => {
            println!("{{\"allow\":{allowed}}}");
            ExitCode::from(0)
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

async fn run(path: &str) -> Result<bool, PdpError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| PdpError::invalid_request("pdp-eval", format!("reading {path}: {e}")))?;
    let mut input: CliInput = serde_json::from_str(&raw)
        .map_err(|e| PdpError::invalid_request("pdp-eval", format!("parsing {path}: {e}")))?;

    let entrance = Entrance::new(
        FixturePip::from(&input.fixture),
        FixturePap::from(&input.fixture),
        PdpConfig::from_env(),
    );

    entrance.eval(&mut input.request, false).await
}
