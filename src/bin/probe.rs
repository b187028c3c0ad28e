//! Parmair MAC Probe
//!
//! Connects to a unit, resolves which firmware family it runs, and prints
//! the verdict together with the current operating state. Useful for
//! checking a new installation before wiring the poller in.
//!
//! Usage: cargo run --bin probe <host[:port]>
//! Example: cargo run --bin probe 192.168.1.50

use std::time::Duration;

use tracing_subscriber::EnvFilter;

use parmair_modbus::states::{ControlStateV1, ControlStateV2, PowerStateV1, PowerStateV2};
use parmair_modbus::{
    detect_firmware, FirmwareFamily, ParmairTcpClient, UnitIdShim, DEFAULT_TCP_PORT,
    PARMAIR_UNIT_ID,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let target = match std::env::args().nth(1) {
        Some(target) => target,
        None => {
            eprintln!("Usage: probe <host[:port]>");
            std::process::exit(2);
        }
    };
    let addr = if target.contains(':') {
        target
    } else {
        format!("{target}:{DEFAULT_TCP_PORT}")
    };

    println!("🔍 Parmair MAC Probe");
    println!("====================");
    println!("  Connecting to {addr}...");

    let mut client = match ParmairTcpClient::connect(&addr, Duration::from_secs(5)).await {
        Ok(client) => {
            println!("  ✅ Connected");
            client
        }
        Err(e) => {
            eprintln!("  ⚠️  Connection failed: {e}");
            std::process::exit(1);
        }
    };

    let shim = UnitIdShim::new(PARMAIR_UNIT_ID);

    let detected = match detect_firmware(&mut client, &shim).await {
        Ok(detected) => detected,
        Err(e) => {
            eprintln!("  ⚠️  {e}");
            let _ = client.close().await;
            std::process::exit(1);
        }
    };

    println!("\n📋 Unit");
    println!("  Model:      {}", detected.model());
    println!(
        "  Firmware:   {} ({} layout)",
        detected.version_string(),
        detected.family
    );
    if let Some(convention) = shim.convention() {
        println!("  Unit id:    {convention:?}");
    }

    println!("\n🌀 State");
    let catalog = detected.family.catalog();
    for key in ["power", "control_state"] {
        let definition = match catalog.get(key) {
            Ok(definition) => definition,
            Err(e) => {
                eprintln!("  {key}: {e}");
                continue;
            }
        };
        match shim.read_block(&mut client, definition.address, 1).await {
            Ok(words) => {
                let raw = words[0];
                println!(
                    "  {:<15} {} (raw {raw})",
                    format!("{key}:"),
                    describe_state(detected.family, key, raw)
                );
            }
            Err(e) => println!("  {key}: read failed: {e}"),
        }
    }

    println!("\n📊 Statistics");
    println!("  {}", client.stats());

    if let Err(e) = client.close().await {
        eprintln!("  ⚠️  Close error: {e}");
    }

    println!("\n🎉 Probe complete");
}

fn describe_state(family: FirmwareFamily, key: &str, raw: u16) -> String {
    match (family, key) {
        (FirmwareFamily::V1, "power") => PowerStateV1::from(raw).to_string(),
        (FirmwareFamily::V2, "power") => PowerStateV2::from(raw).to_string(),
        (FirmwareFamily::V1, "control_state") => ControlStateV1::from(raw).to_string(),
        (FirmwareFamily::V2, "control_state") => ControlStateV2::from(raw).to_string(),
        _ => raw.to_string(),
    }
}
