//! dpuctl - DPU command channel diagnostics
//!
//! Drives a DPU agent's command endpoint directly, outside any framework
//! task: probe the heartbeat, or connect/disconnect a volume session by
//! hand while commissioning a node.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dpu_storage_operator::remote::{
    CMD_CHECK_HEARTBEAT, CMD_CONNECT_CLOUD_DISK, CMD_DISCONNECT_CLOUD_DISK,
};
use dpu_storage_operator::{CommandSender, DpuCommandClient, RemoteConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// DPU command channel diagnostics
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// DPU command endpoint port
    #[arg(long, env = "DPU_COMMAND_PORT", default_value = "9999")]
    port: u16,

    /// Per-command timeout in seconds
    #[arg(long, env = "DPU_COMMAND_TIMEOUT", default_value = "30")]
    timeout_secs: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe the DPU agent's liveness
    Heartbeat {
        /// DPU address
        dpu_addr: String,
    },
    /// Connect a volume session on the DPU
    Connect {
        /// DPU address
        dpu_addr: String,
        /// Initiator IQN
        #[arg(long)]
        iqn: String,
        /// Initiator-side address
        #[arg(long)]
        ip: String,
    },
    /// Disconnect a volume session on the DPU
    Disconnect {
        /// DPU address
        dpu_addr: String,
        /// Initiator IQN
        #[arg(long)]
        iqn: String,
        /// Initiator-side address
        #[arg(long)]
        ip: String,
    },
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let client = DpuCommandClient::new(RemoteConfig {
        command_port: args.port,
        command_timeout: Duration::from_secs(args.timeout_secs),
    });

    let result = match &args.command {
        Command::Heartbeat { dpu_addr } => {
            client
                .send(dpu_addr, CMD_CHECK_HEARTBEAT, json!({"ip": dpu_addr}))
                .await?
        }
        Command::Connect { dpu_addr, iqn, ip } => {
            client
                .send(dpu_addr, CMD_CONNECT_CLOUD_DISK, json!({"iqn": iqn, "ip": ip}))
                .await?
        }
        Command::Disconnect { dpu_addr, iqn, ip } => {
            client
                .send(
                    dpu_addr,
                    CMD_DISCONNECT_CLOUD_DISK,
                    json!({"iqn": iqn, "ip": ip}),
                )
                .await?
        }
    };

    info!("Command completed");
    println!("{}", result);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().unwrap())
        .add_directive("reqwest=warn".parse().unwrap());

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}
