//! Mirrors a remote LED and flips it once.
//!
//! Configured through the `LED_*` environment variables (see `Config::from_env`), e.g.:
//! `LED_BASE_URL=http://192.168.1.42 cargo run --example toggle`

use led_switch::devices::{PollerEvent, ToggleEvent};
use led_switch::{pause, Config, LedSwitch};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;
    let switch = LedSwitch::from_config(&config)?;

    // Triggered function when the LED state read from the server changes.
    switch
        .get_button()
        .on(ToggleEvent::OnChange, |enabled: bool| async move {
            println!("LED is now {}", if enabled { "ON" } else { "OFF" });
        });

    // Triggered function when the server cannot be reached.
    switch
        .get_poller()
        .on(PollerEvent::OnError, |error: String| async move {
            println!("LED status unavailable: {}", error);
        });

    switch.start()?;

    // Let the first poll happen then flip the LED.
    pause!(2_000);
    println!("Click! (the button will follow on the next poll)");
    switch.click()?;

    tokio::signal::ctrl_c().await?;
    switch.stop();
    Ok(())
}
