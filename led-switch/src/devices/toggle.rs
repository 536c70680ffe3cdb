use std::fmt::{Display, Formatter};
use std::sync::Arc;

use log::{debug, error};
use parking_lot::RwLock;

use crate::devices::Element;
use crate::errors::Error;
use crate::io::{encode_status, Transport};
use crate::utils::events::{EventHandler, EventManager};
use crate::utils::task;
use crate::utils::task::{TaskHandler, TaskResult};

/// Lists all events a [`ToggleButton`] can emit/listen.
pub enum ToggleEvent {
    /// Triggered when the enabled state changes (payload: `bool`, the new state).
    OnChange,
    /// Triggered when the button is clicked (payload: `bool`, the requested state).
    OnClick,
    /// Triggered when a click request fails (payload: `String`, the error message).
    OnError,
}

/// Convert events to string to facilitate usage with [`EventManager`].
impl From<ToggleEvent> for String {
    fn from(value: ToggleEvent) -> Self {
        let event = match value {
            ToggleEvent::OnChange => "change",
            ToggleEvent::OnClick => "click",
            ToggleEvent::OnError => "error",
        };
        event.into()
    }
}

/// Represents a toggle button mirroring a remote LED: the enabled state is rendered as the
/// `class` attribute of the bound [`Element`] ("on" or "off") and a click asks the LED control
/// endpoint (the element `href`) for the opposite state.
///
/// A click never changes the local state: only [`Self::set_enabled()`] does, usually called by a
/// [`StatusPoller`](crate::devices::StatusPoller).
#[derive(Clone, Debug)]
pub struct ToggleButton {
    /// The element the button renders into.
    element: Element,
    /// The current enabled state.
    state: Arc<RwLock<bool>>,

    // ########################################
    // # Volatile utility data.
    transport: Box<dyn Transport>,
    /// The event manager for the button.
    events: EventManager,
}

impl ToggleButton {
    /// Creates a button bound to the given element. The button starts disabled (class "off").
    ///
    /// # Parameters
    /// * `element`: the [`Element`] to render into; its `href` attribute is the control endpoint.
    /// * `transport`: the [`Transport`] used to post the toggle requests.
    pub fn new<T: Transport + 'static>(element: Element, transport: T) -> Self {
        let button = Self {
            element,
            state: Arc::new(RwLock::new(false)),
            transport: Box::new(transport),
            events: Default::default(),
        };
        button.set_enabled(false);
        button
    }

    /// Sets the enabled state and renders it as the element class. No I/O.
    pub fn set_enabled(&self, enabled: bool) {
        let changed = {
            // The class is written under the state lock so both never disagree.
            let mut state = self.state.write();
            let changed = *state != enabled;
            *state = enabled;
            self.element.set_attr("class", css_class(enabled));
            changed
        };

        if changed {
            self.events.emit(ToggleEvent::OnChange, enabled);
        }
    }

    /// Indicates if the button is enabled.
    pub fn is_enabled(&self) -> bool {
        *self.state.read()
    }

    /// Clicks the button: posts the opposite of the current state to the element `href`.
    ///
    /// The request runs as a background task and the returned handler may be ignored
    /// (fire-and-forget). A failing request is logged and reported through the `error` event;
    /// the button state is left untouched either way.
    ///
    /// # Errors
    /// * `MissingAttribute`: the element has no `href` attribute.
    /// * `Runtime`: no tokio runtime is running.
    pub fn click(&self) -> Result<TaskHandler, Error> {
        let url = self.get_href()?;
        let requested = !self.is_enabled();
        self.events.emit(ToggleEvent::OnClick, requested);

        let transport = self.transport.clone();
        let events = self.events.clone();
        task::run(async move {
            if let Err(err) = request_state(transport.as_ref(), &url, requested).await {
                error!("POST failed: {}", err);
                events.emit(ToggleEvent::OnError, err.to_string());
            }
        })
    }

    /// Awaitable version of [`Self::click()`]: posts the opposite of the current state and returns
    /// the state requested.
    ///
    /// # Errors
    /// * `MissingAttribute`: the element has no `href` attribute.
    /// * `Transport`: the request failed.
    pub async fn toggle_request(&self) -> Result<bool, Error> {
        let url = self.get_href()?;
        let requested = !self.is_enabled();
        request_state(self.transport.as_ref(), &url, requested).await?;
        Ok(requested)
    }

    // ########################################
    // Setters and Getters.

    /// Retrieves the element the button is bound to.
    pub fn get_element(&self) -> &Element {
        &self.element
    }

    /// Retrieves the currently rendered class.
    pub fn get_class(&self) -> String {
        self.element.attr("class").unwrap_or_default()
    }

    /// Retrieves the control endpoint: the element `href` attribute.
    pub fn get_href(&self) -> Result<String, Error> {
        self.element.attr("href").ok_or_else(|| Error::MissingAttribute {
            id: self.element.get_id().to_string(),
            attribute: String::from("href"),
        })
    }

    // ########################################
    // Event related functions

    /// Registers a callback to be executed on a given event on the button.
    ///
    /// Available events for a button are defined by the enum: [`ToggleEvent`].
    pub fn on<S, F, T, Fut>(&self, event: S, callback: F) -> EventHandler
    where
        S: Into<String>,
        T: 'static + Send + Sync + Clone,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: std::future::Future + Send + 'static,
        Fut::Output: Into<TaskResult> + Send + 'static,
    {
        self.events.on(event, callback)
    }

    /// Unregisters a callback registered with [`Self::on()`].
    pub fn unregister(&self, handler: EventHandler) {
        self.events.unregister(handler)
    }
}

impl Display for ToggleButton {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ToggleButton (element={}) [enabled={}, class={}]",
            self.element.get_id(),
            self.is_enabled(),
            self.get_class(),
        )
    }
}

/// The class rendered for a given state.
pub fn css_class(enabled: bool) -> &'static str {
    match enabled {
        true => "on",
        false => "off",
    }
}

async fn request_state(
    transport: &dyn Transport,
    url: &str,
    requested: bool,
) -> Result<(), Error> {
    debug!("Requesting LED state {} on {}", requested, url);
    transport.post(url, encode_status(requested).to_string()).await?;
    Ok(())
}
