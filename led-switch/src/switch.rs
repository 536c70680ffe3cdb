//! Wires a [`ToggleButton`] and its [`StatusPoller`] from a [`Config`].

use std::fmt::{Display, Formatter};

use log::info;

use crate::config::Config;
use crate::devices::{Element, StatusPoller, ToggleButton};
use crate::errors::Error;
use crate::io::{HttpTransport, Transport};
use crate::utils::task::TaskHandler;

/// A ready-to-use switch: one button bound to the control endpoint and one poller keeping it in
/// sync with the status endpoint. Both share the same transport.
///
/// # Example
/// ```no_run
/// use led_switch::{Config, LedSwitch};
///
/// #[tokio::main]
/// async fn main() {
///     let switch = LedSwitch::from_config(&Config::default()).unwrap();
///     switch.start().unwrap();
///     switch.click().unwrap();
/// }
/// ```
#[derive(Clone, Debug)]
pub struct LedSwitch {
    button: ToggleButton,
    poller: StatusPoller,
}

impl LedSwitch {
    /// Creates a switch speaking HTTP to the endpoints described by the configuration.
    ///
    /// # Errors
    /// * `InvalidUrl`: the base url cannot be parsed.
    /// * `ClientBuild`: the HTTP client cannot be created.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Creates a switch for the endpoints described by the configuration over any transport.
    pub fn with_transport<T: Transport + Clone + 'static>(config: &Config, transport: T) -> Self {
        let element = Element::link(config.element_id.clone(), config.control_path.clone());
        let button = ToggleButton::new(element, transport.clone());
        let poller = StatusPoller::new(&button, config.status_path.clone(), transport)
            .with_interval(config.poll_interval);
        Self { button, poller }
    }

    /// Starts polling the LED status.
    ///
    /// # Errors
    /// * `Runtime`: no tokio runtime is running.
    pub fn start(&self) -> Result<&Self, Error> {
        info!("Starting {}", self.poller);
        self.poller.start()?;
        Ok(self)
    }

    /// Stops polling the LED status.
    pub fn stop(&self) {
        self.poller.stop();
    }

    /// Clicks the button: see [`ToggleButton::click()`].
    pub fn click(&self) -> Result<TaskHandler, Error> {
        self.button.click()
    }

    pub fn get_button(&self) -> &ToggleButton {
        &self.button
    }

    pub fn get_poller(&self) -> &StatusPoller {
        &self.poller
    }
}

impl Display for LedSwitch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "LedSwitch: {} / {}", self.button, self.poller)
    }
}
