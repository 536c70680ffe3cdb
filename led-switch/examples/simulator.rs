//! Serves a simulated LED so the `toggle` example can run without a board.
//!
//! `LED_SIMULATOR_ADDR` sets the listening address (default `127.0.0.1:8080`).

use led_switch::simulator::LedSimulator;
use led_switch::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let addr = std::env::var("LED_SIMULATOR_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());
    let simulator = LedSimulator::from_config(&Config::from_env()?);
    let (addr, _handler) = simulator.clone().spawn(&addr).await?;
    println!("{} on http://{}", simulator, addr);

    tokio::signal::ctrl_c().await?;
    println!("Simulated LED was {} on shutdown", if simulator.is_on() { "ON" } else { "OFF" });
    Ok(())
}
