//! An in-memory LED web server answering the same endpoints as the board firmware:
//! `GET <status>` returns "0\n" or "1\n" and `POST <control>` sets the LED from an integer body.
//!
//! Useful to try the switch without hardware, and to test it end to end.

use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use log::{debug, info};
use parking_lot::RwLock;
use tokio::net::TcpListener;

use crate::config::{Config, DEFAULT_CONTROL_PATH, DEFAULT_STATUS_PATH};
use crate::errors::Error;
use crate::io::{encode_status, parse_status};
use crate::utils::task;
use crate::utils::task::TaskHandler;

#[derive(Clone, Debug)]
pub struct LedSimulator {
    /// The status endpoint path.
    status_path: String,
    /// The control endpoint path.
    control_path: String,
    /// The simulated LED.
    led: Arc<RwLock<bool>>,
    /// When set, every endpoint answers 503.
    failing: Arc<AtomicBool>,
    status_requests: Arc<AtomicUsize>,
    control_requests: Arc<AtomicUsize>,
}

impl Default for LedSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_STATUS_PATH, DEFAULT_CONTROL_PATH)
    }
}

impl LedSimulator {
    /// Creates a simulator (LED off) answering on the given endpoint paths.
    pub fn new<S: Into<String>, C: Into<String>>(status_path: S, control_path: C) -> Self {
        Self {
            status_path: absolute_path(status_path.into()),
            control_path: absolute_path(control_path.into()),
            led: Arc::new(RwLock::new(false)),
            failing: Arc::new(AtomicBool::new(false)),
            status_requests: Arc::new(AtomicUsize::new(0)),
            control_requests: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Creates a simulator using the endpoint paths of a [`Config`].
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.status_path.clone(), config.control_path.clone())
    }

    /// Builds the axum router serving the two endpoints.
    pub fn router(&self) -> Router {
        Router::new()
            .route(&self.status_path, get(read_status))
            .route(&self.control_path, post(write_status))
            .with_state(self.clone())
    }

    /// Serves the endpoints on the given listener until the task is aborted.
    ///
    /// # Errors
    /// * `Io`: the server failed.
    pub async fn serve(self, listener: TcpListener) -> Result<(), Error> {
        info!("LED simulator listening on {}", listener.local_addr()?);
        axum::serve(listener, self.router()).await?;
        Ok(())
    }

    /// Binds the given address and serves the endpoints in a background task.
    /// Use port 0 to let the system pick a free port: the bound address is returned.
    ///
    /// # Errors
    /// * `Io`: the address cannot be bound.
    /// * `Runtime`: no tokio runtime is running.
    pub async fn spawn(self, addr: &str) -> Result<(SocketAddr, TaskHandler), Error> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        let handler = task::run(self.serve(listener))?;
        Ok((local_addr, handler))
    }

    // ########################################
    // Setters and Getters.

    /// Indicates if the simulated LED is on.
    pub fn is_on(&self) -> bool {
        *self.led.read()
    }

    /// Switches the simulated LED, as a physical button on the board would.
    pub fn set_on(&self, on: bool) {
        *self.led.write() = on;
    }

    /// Makes every endpoint fail with 503 (or recover).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of requests received on the status endpoint.
    pub fn get_status_requests(&self) -> usize {
        self.status_requests.load(Ordering::SeqCst)
    }

    /// Number of requests received on the control endpoint.
    pub fn get_control_requests(&self) -> usize {
        self.control_requests.load(Ordering::SeqCst)
    }
}

impl Display for LedSimulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "LedSimulator (status={}, control={}) [led={}, failing={}]",
            self.status_path,
            self.control_path,
            self.is_on(),
            self.failing.load(Ordering::SeqCst),
        )
    }
}

fn absolute_path(path: String) -> String {
    match path.starts_with('/') {
        true => path,
        false => format!("/{}", path),
    }
}

async fn read_status(State(simulator): State<LedSimulator>) -> (StatusCode, String) {
    simulator.status_requests.fetch_add(1, Ordering::SeqCst);
    if simulator.failing.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, String::from("unavailable"));
    }
    (
        StatusCode::OK,
        format!("{}\n", encode_status(simulator.is_on())),
    )
}

async fn write_status(
    State(simulator): State<LedSimulator>,
    body: String,
) -> (StatusCode, String) {
    simulator.control_requests.fetch_add(1, Ordering::SeqCst);
    if simulator.failing.load(Ordering::SeqCst) {
        return (StatusCode::SERVICE_UNAVAILABLE, String::from("unavailable"));
    }
    match parse_status(&body) {
        Ok(on) => {
            debug!("Simulated LED switched {}", if on { "on" } else { "off" });
            simulator.set_on(on);
            (StatusCode::OK, String::new())
        }
        Err(err) => (StatusCode::BAD_REQUEST, err.to_string()),
    }
}
