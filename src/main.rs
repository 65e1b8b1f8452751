//!
//! evgate server binary
//! --------------------
//! Starts the guarded HTTP server. Configuration comes from `EVGATE_*`
//! environment variables; `--http-port` and `--policy` override them.

use std::env;
use std::path::PathBuf;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use evgate::config::GuardConfig;

fn parse_port_arg(args: &[String], flag: &str) -> Option<u16> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return args[i + 1].parse::<u16>().ok();
        }
        i += 1;
    }
    None
}

fn parse_value_arg(args: &[String], flag: &str) -> Option<String> {
    args.iter().position(|a| a == flag).and_then(|i| args.get(i + 1)).cloned()
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let args: Vec<String> = env::args().collect();
    if has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("evgate\n\nUSAGE:\n  evgate [--http-port N] [--policy PATH]\n\nOPTIONS:\n  --http-port N    HTTP port (env: EVGATE_HTTP_PORT, default 3000)\n  --policy PATH    JSON route policy (env: EVGATE_POLICY_FILE)\n\nEVGATE_JWT_SECRET must be set.\n");
        return Ok(());
    }

    let mut config = GuardConfig::from_env()?;
    if let Some(port) = parse_port_arg(&args, "--http-port") {
        config.http_port = port;
    }
    if let Some(path) = parse_value_arg(&args, "--policy") {
        config.policy_file = Some(PathBuf::from(path));
    }

    let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(target: "evgate", "evgate starting: RUST_LOG='{}', http_port={}", rust_log, config.http_port);

    evgate::server::run(config).await
}
