//! steadyrpc CLI — probe and exercise RPC endpoints from the terminal.
//!
//! Usage:
//! ```bash
//! # Probe an endpoint (health, slot, latency)
//! steadyrpc test --url https://api.devnet.solana.com
//!
//! # Send a raw JSON-RPC call
//! steadyrpc call --url https://api.devnet.solana.com --method getSlot
//!
//! # List built-in provider profiles
//! steadyrpc providers
//! ```

use std::env;
use std::process;

use serde_json::Value;

use steadyrpc_core::policy::EndpointSet;
use steadyrpc_core::retry::RetryPolicy;
use steadyrpc_http::{RpcClient, RpcClientConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let result = match args[1].as_str() {
        "test" => cmd_test(&args[2..]).await,
        "call" => cmd_call(&args[2..]).await,
        "providers" => {
            cmd_providers();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("steadyrpc {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("steadyrpc {}", env!("CARGO_PKG_VERSION"));
    println!("Probe and exercise rate-limited Solana RPC endpoints\n");
    println!("USAGE:");
    println!("    steadyrpc <COMMAND>\n");
    println!("COMMANDS:");
    println!("    test       Probe an endpoint (health, slot, latency)");
    println!("    call       Send a raw JSON-RPC call");
    println!("    providers  List built-in provider profiles");
    println!("    version    Print version");
    println!("    help       Print this help\n");
    println!("TEST FLAGS:");
    println!("    --url <URL>       RPC endpoint URL  [required]");
    println!("CALL FLAGS:");
    println!("    --url <URL>       RPC endpoint URL  [required]");
    println!("    --method <M>      JSON-RPC method   [required]");
    println!("    --params <JSON>   Positional params as a JSON array");
}

/// One-shot client: a single probe should answer now, not sit through the
/// free-tier retry schedule.
fn probe_client(url: &str) -> Result<RpcClient, String> {
    let mut config = RpcClientConfig::new(EndpointSet::single(url));
    config.retry = RetryPolicy::immediate();
    RpcClient::new(config).map_err(|e| e.to_string())
}

async fn cmd_test(args: &[String]) -> Result<(), String> {
    let url = parse_flag(args, "--url").ok_or("--url is required")?;
    let client = probe_client(&url)?;

    println!("Testing {url}...");

    let start = std::time::Instant::now();
    let health: String = client
        .call("getHealth", vec![])
        .await
        .map_err(|e| e.to_string())?;
    let slot: u64 = client
        .call("getSlot", vec![])
        .await
        .map_err(|e| e.to_string())?;
    let latency = start.elapsed();

    println!("  Status:   {health}");
    println!("  Slot:     {slot}");
    println!("  Latency:  {}ms over 2 calls", latency.as_millis());
    println!("  Breaker:  {}", if client.is_healthy() { "closed" } else { "open" });

    Ok(())
}

async fn cmd_call(args: &[String]) -> Result<(), String> {
    let url = parse_flag(args, "--url").ok_or("--url is required")?;
    let method = parse_flag(args, "--method").ok_or("--method is required")?;
    let params = match parse_flag(args, "--params") {
        Some(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(items)) => items,
            Ok(_) => return Err("--params must be a JSON array".into()),
            Err(e) => return Err(format!("--params is not valid JSON: {e}")),
        },
        None => vec![],
    };

    let client = probe_client(&url)?;
    let result = client
        .call_value(&method, params)
        .await
        .map_err(|e| e.to_string())?;

    println!("{}", serde_json::to_string_pretty(&result).unwrap_or_default());
    Ok(())
}

fn cmd_providers() {
    println!("Built-in provider profiles:\n");
    println!("  public     Solana Foundation clusters (no API key)");
    println!("             mainnet-beta, devnet, testnet");
    println!("             Pacing: patient free-tier schedule");
    println!();
    println!("  helius     Helius (https://helius.dev)");
    println!("             Auth:   API key");
    println!("             Pacing: free or paid schedule, public fallback");
    println!();
    println!("  quicknode  QuickNode (https://quicknode.com)");
    println!("             Auth:   endpoint URL from the dashboard");
    println!("             Pacing: paid schedule, public fallback");
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}
