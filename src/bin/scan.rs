//! Parmair MAC Register Scanner
//!
//! Walks an address range with single-register reads and prints every
//! register that answers: the raw word, the sign-adjusted reading, and the
//! vendor labels the catalogs know for that address. Hits outside the
//! catalogs are the interesting ones when a new firmware shows up.
//!
//! Usage: cargo run --bin scan <host[:port]> [start] [end]
//! Example: cargo run --bin scan 192.168.1.50 1000 1300

use std::time::Duration;

use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

use parmair_modbus::codec::decode_raw;
use parmair_modbus::registers::{V1_REGISTERS, V2_REGISTERS};
use parmair_modbus::{ParmairTcpClient, UnitIdShim, DEFAULT_TCP_PORT, PARMAIR_UNIT_ID};

/// Pause between single reads; the controller serves one request at a time
const SCAN_DELAY: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let target = match args.next() {
        Some(target) => target,
        None => {
            eprintln!("Usage: scan <host[:port]> [start] [end]");
            std::process::exit(2);
        }
    };
    let start: u16 = parse_or_exit(args.next(), 1000);
    let end: u16 = parse_or_exit(args.next(), 1300);
    if end < start {
        eprintln!("End address {end} is below start address {start}");
        std::process::exit(2);
    }

    let addr = if target.contains(':') {
        target
    } else {
        format!("{target}:{DEFAULT_TCP_PORT}")
    };

    println!("🔍 Parmair MAC Register Scanner");
    println!("===============================");
    println!("  Scanning {addr}, registers {start}-{end}\n");

    let mut client = match ParmairTcpClient::connect(&addr, Duration::from_secs(5)).await {
        Ok(client) => client,
        Err(e) => {
            eprintln!("  ⚠️  Connection failed: {e}");
            std::process::exit(1);
        }
    };
    let shim = UnitIdShim::new(PARMAIR_UNIT_ID);

    println!("  Addr   Raw      Signed  Labels");
    println!("  ----   ------   ------  ------");

    let mut documented = 0u32;
    let mut undocumented = 0u32;
    let mut silent = 0u32;

    for address in start..=end {
        match shim.read_block(&mut client, address, 1).await {
            Ok(words) => {
                let raw = words[0];
                let labels = labels_for(address);
                if labels.is_empty() {
                    undocumented += 1;
                    println!("  {address:<6} {raw:<8} {:<7} -", decode_raw(raw));
                } else {
                    documented += 1;
                    println!(
                        "  {address:<6} {raw:<8} {:<7} {}",
                        decode_raw(raw),
                        labels.join(", ")
                    );
                }
            }
            Err(e) if e.is_exception() => {
                // The device answered "no such register"; normal in the gaps
                silent += 1;
            }
            Err(e) => {
                eprintln!("\n  ⚠️  Scan aborted at {address}: {e}");
                let _ = client.close().await;
                std::process::exit(1);
            }
        }
        sleep(SCAN_DELAY).await;
    }

    println!("\n📊 Summary");
    println!("  Documented registers:   {documented}");
    println!("  Undocumented registers: {undocumented}");
    println!("  No answer:              {silent}");
    println!("  {}", client.stats());

    if let Err(e) = client.close().await {
        eprintln!("  ⚠️  Close error: {e}");
    }
}

/// Vendor labels both catalogs carry for `address`, family-tagged
fn labels_for(address: u16) -> Vec<String> {
    let mut labels = Vec::new();
    for definition in V1_REGISTERS {
        if definition.address == address {
            labels.push(format!("1.x:{}", definition.label));
        }
    }
    for definition in V2_REGISTERS {
        if definition.address == address {
            labels.push(format!("2.x:{}", definition.label));
        }
    }
    labels
}

fn parse_or_exit(arg: Option<String>, default: u16) -> u16 {
    match arg {
        None => default,
        Some(text) => text.parse().unwrap_or_else(|_| {
            eprintln!("Not a register address: {text}");
            std::process::exit(2);
        }),
    }
}
