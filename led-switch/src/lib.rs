#![doc(html_root_url = "https://docs.rs/led-switch/0.1.0")]

//! <h1 align="center">LED-SWITCH - Remote LED toggle</h1>
//! <div style="text-align:center;font-style:italic;">A toggle switch mirroring and controlling a LED driven by a tiny web server.</div>
//!
//! # Features
//!
//! **LED-Switch** is a Rust library that keeps a [`ToggleButton`](devices::ToggleButton) in sync
//! with a remote LED and lets you flip that LED:
//!
//! - A [`StatusPoller`](devices::StatusPoller) reads the LED status endpoint every 400ms and pushes
//!   it into the button.
//! - A click on the button posts the opposite state ("0" or "1") to the LED control endpoint.
//!   The button state is never updated locally: the next poll is the only source of truth.
//! - Requests go through a [`Transport`](io::Transport) ([`HttpTransport`](io::HttpTransport) for the
//!   moment).
//! - A [`LedSimulator`](simulator::LedSimulator) web server stands in for the real board.
//!
//! # Getting Started
//!
//! The following code demonstrates the simplest program we could imagine: mirror the LED for
//! ten seconds, flipping it once.
//! ```no_run
//! use led_switch::{Config, LedSwitch};
//! use led_switch::devices::ToggleEvent;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::default().with_base_url("http://192.168.1.42");
//!     let switch = LedSwitch::from_config(&config).unwrap();
//!
//!     switch.get_button().on(ToggleEvent::OnChange, |enabled: bool| async move {
//!         println!("LED is now {}", if enabled { "on" } else { "off" });
//!     });
//!
//!     switch.start().unwrap();
//!     switch.click().unwrap();
//!     led_switch::pause!(10_000);
//! }
//! ```
//!
//! # Feature flags
//!
//! - **simulator** -- (enabled by default) Provides the [`LedSimulator`](simulator::LedSimulator) web server.
//! - **serde** -- Enables serialize/deserialize capabilities for the [`Config`].
//! - **mocks** -- Provides mocked entities (useful for tests mostly).

pub mod config;
pub mod devices;
pub mod errors;
pub mod io;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
#[cfg(feature = "simulator")]
pub mod simulator;
pub mod switch;
pub mod utils;

pub use crate::config::Config;
pub use crate::errors::Error;
pub use crate::switch::LedSwitch;
