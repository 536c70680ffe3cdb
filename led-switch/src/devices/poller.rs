use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::{error, trace, warn};
use parking_lot::RwLock;

use crate::config::DEFAULT_POLL_INTERVAL;
use crate::devices::ToggleButton;
use crate::errors::Error;
use crate::io::{parse_status, Transport};
use crate::pause;
use crate::utils::events::{EventHandler, EventManager};
use crate::utils::task;
use crate::utils::task::{TaskHandler, TaskResult};

/// Lists all events a [`StatusPoller`] can emit/listen.
pub enum PollerEvent {
    /// Triggered after each successful poll (payload: `bool`, the LED state read).
    OnStatus,
    /// Triggered after each failed poll (payload: `String`, the error message).
    OnError,
}

/// Convert events to string to facilitate usage with [`EventManager`].
impl From<PollerEvent> for String {
    fn from(value: PollerEvent) -> Self {
        let event = match value {
            PollerEvent::OnStatus => "status",
            PollerEvent::OnError => "error",
        };
        event.into()
    }
}

/// Represents the loop keeping a [`ToggleButton`] in sync with the remote LED: it reads the
/// status endpoint, pushes the result into the button, waits a fixed delay and starts over.
///
/// The loop never gives up: a failed poll is logged and the next one is still scheduled after
/// the same delay. Polls of one poller never overlap, but nothing prevents several pollers (or
/// clicks) from hitting the server at the same time.
#[derive(Clone, Debug)]
pub struct StatusPoller {
    /// The button receiving the status.
    button: ToggleButton,
    /// The status endpoint.
    url: String,
    /// The delay between two polls (in ms).
    interval: u64,

    // ########################################
    // # Volatile utility data.
    transport: Box<dyn Transport>,
    /// Number of completed poll cycles (successful or not).
    cycles: Arc<AtomicUsize>,
    /// Inner handler to the task running the polling loop.
    handler: Arc<RwLock<Option<TaskHandler>>>,
    /// The event manager for the poller.
    events: EventManager,
}

impl StatusPoller {
    /// Creates a (stopped) poller for the given button and status endpoint, polling every 400ms.
    ///
    /// # Parameters
    /// * `button`: the [`ToggleButton`] to drive (the poller keeps a handle on it)
    /// * `url`: the status endpoint
    /// * `transport`: the [`Transport`] used to read the status
    pub fn new<S: Into<String>, T: Transport + 'static>(
        button: &ToggleButton,
        url: S,
        transport: T,
    ) -> Self {
        Self {
            button: button.clone(),
            url: url.into(),
            interval: DEFAULT_POLL_INTERVAL,
            transport: Box::new(transport),
            cycles: Arc::new(AtomicUsize::new(0)),
            handler: Arc::new(RwLock::new(None)),
            events: Default::default(),
        }
    }

    /// Sets the delay between two polls (in ms).
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval;
        self
    }

    /// Runs a single poll cycle: reads the status and pushes it into the button.
    ///
    /// A body that is not an integer counts as "off" (with a warning): the button is disabled and
    /// the cycle is a success.
    ///
    /// # Errors
    /// * `Transport`: the status could not be read; the button is left untouched.
    pub async fn poll(&self) -> Result<bool, Error> {
        let body = self.transport.get(&self.url).await?;
        trace!("Status {:?} read from {}", body, self.url);

        let enabled = match parse_status(&body) {
            Ok(enabled) => enabled,
            Err(err) => {
                warn!("{} LED considered off.", err);
                false
            }
        };
        self.button.set_enabled(enabled);
        Ok(enabled)
    }

    /// Starts the polling loop in a background task. Starting a running poller does nothing.
    ///
    /// # Errors
    /// * `Runtime`: no tokio runtime is running.
    pub fn start(&self) -> Result<&Self, Error> {
        // Check and store under the same lock so concurrent starts spawn a single loop.
        let mut handler = self.handler.write();
        if handler.as_ref().is_some_and(|running| !running.is_finished()) {
            return Ok(self);
        }

        *handler = Some(task::run(self.clone().run_loop())?);
        Ok(self)
    }

    /// The polling loop itself: never returns, only aborting its task ends it.
    async fn run_loop(self) {
        loop {
            match self.poll().await {
                Ok(enabled) => self.events.emit(PollerEvent::OnStatus, enabled),
                Err(err) => {
                    error!("Getting status failed: {}", err);
                    self.events.emit(PollerEvent::OnError, err.to_string());
                }
            }
            self.cycles.fetch_add(1, Ordering::SeqCst);
            pause!(self.interval);
        }
    }

    /// Stops the polling loop. The button keeps its last state.
    pub fn stop(&self) {
        if let Some(handler) = self.handler.write().take() {
            handler.abort();
        }
    }

    /// Indicates if the polling loop is running.
    pub fn is_running(&self) -> bool {
        self.handler
            .read()
            .as_ref()
            .is_some_and(|handler| !handler.is_finished())
    }

    // ########################################
    // Setters and Getters.

    /// Retrieves the button driven by this poller.
    pub fn get_button(&self) -> &ToggleButton {
        &self.button
    }

    /// Retrieves the status endpoint.
    pub fn get_url(&self) -> &str {
        &self.url
    }

    /// Retrieves the delay between two polls (in ms).
    pub fn get_interval(&self) -> u64 {
        self.interval
    }

    /// Retrieves the number of poll cycles completed by the loop.
    pub fn get_cycles(&self) -> usize {
        self.cycles.load(Ordering::SeqCst)
    }

    // ########################################
    // Event related functions

    /// Registers a callback to be executed on a given event on the poller.
    ///
    /// Available events for a poller are defined by the enum: [`PollerEvent`].
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

impl Display for StatusPoller {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "StatusPoller (url={}) [interval={}ms, running={}, cycles={}]",
            self.url,
            self.interval,
            self.is_running(),
            self.get_cycles(),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use crate::devices::Element;
    use crate::mocks::transport::MockTransport;

    use super::*;

    fn _setup_poller() -> (StatusPoller, MockTransport) {
        let transport = MockTransport::default();
        let button = ToggleButton::new(Element::link("lightbulb", "/led"), transport.clone());
        let poller = StatusPoller::new(&button, "/ledstatus", transport.clone());
        (poller, transport)
    }

    #[test]
    fn test_creation() {
        let (poller, _) = _setup_poller();
        assert_eq!(poller.get_url(), "/ledstatus");
        assert_eq!(poller.get_interval(), 400);
        assert_eq!(poller.get_cycles(), 0);
        assert!(!poller.is_running());

        let poller = poller.with_interval(100);
        assert_eq!(poller.get_interval(), 100);
    }

    #[tokio::test]
    async fn test_poll_sets_button_state() {
        let (poller, transport) = _setup_poller();

        transport.set_status("1\n");
        assert!(poller.poll().await.unwrap());
        assert!(poller.get_button().is_enabled());
        assert_eq!(poller.get_button().get_class(), "on");

        transport.set_status("0");
        assert!(!poller.poll().await.unwrap());
        assert!(!poller.get_button().is_enabled());
        assert_eq!(poller.get_button().get_class(), "off");

        let gets = transport.get_requests_for("GET");
        assert_eq!(gets.len(), 2);
        assert!(gets.iter().all(|request| request.url == "/ledstatus"));
    }

    #[tokio::test]
    async fn test_poll_non_numeric_status_is_off() {
        let (poller, transport) = _setup_poller();
        poller.get_button().set_enabled(true);

        transport.set_status("<html>oops</html>");
        assert!(!poller.poll().await.unwrap());
        assert!(!poller.get_button().is_enabled());
    }

    #[tokio::test]
    async fn test_poll_failure_keeps_state() {
        let (poller, transport) = _setup_poller();
        transport.set_status("1");
        poller.poll().await.unwrap();

        transport.set_failing(true);
        assert!(poller.poll().await.is_err());
        assert!(poller.get_button().is_enabled());
        assert_eq!(poller.get_button().get_class(), "on");
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_issues_one_get_per_interval() {
        let (poller, transport) = _setup_poller();
        transport.set_status("1");
        poller.start().unwrap();
        assert!(poller.is_running());

        // Polls at 0, 400, 800 and 1200ms.
        tokio::time::sleep(Duration::from_millis(1_300)).await;
        poller.stop();

        let gets = transport.get_requests_for("GET");
        assert_eq!(gets.len(), 4);
        assert_eq!(poller.get_cycles(), 4);
        for pair in gets.windows(2) {
            assert_eq!(pair[1].at - pair[0].at, Duration::from_millis(400));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_failures() {
        let (poller, transport) = _setup_poller();
        transport
            .script_status("1")
            .script_failure()
            .script_failure()
            .script_status("0");
        transport.set_status("1");

        let errors = Arc::new(AtomicUsize::new(0));
        let moved_errors = errors.clone();
        poller.on(PollerEvent::OnError, move |_: String| {
            let captured = moved_errors.clone();
            async move {
                captured.fetch_add(1, Ordering::SeqCst);
            }
        });

        poller.start().unwrap();

        // First poll (t=0) turns the button on.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(poller.get_button().is_enabled());

        // Two failures (t=400, t=800): state unchanged, loop still alive.
        tokio::time::sleep(Duration::from_millis(800)).await;
        assert!(poller.get_button().is_enabled());
        assert!(poller.is_running());
        assert_eq!(errors.load(Ordering::SeqCst), 2);

        // Next poll (t=1200) still happens on schedule.
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(!poller.get_button().is_enabled());

        poller.stop();
        let gets = transport.get_requests_for("GET");
        assert_eq!(gets.len(), 4);
        assert_eq!(gets[2].at - gets[1].at, Duration::from_millis(400));
        assert_eq!(gets[3].at - gets[2].at, Duration::from_millis(400));
    }

    #[tokio::test(start_paused = true)]
    async fn test_click_is_eventually_overridden_by_poll() {
        let (poller, transport) = _setup_poller();
        transport.set_status("1");
        poller.start().unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        let button = poller.get_button().clone();
        assert_eq!(button.get_class(), "on");

        // The click asks for OFF but the LED server ignores it (the mock status stays "1").
        button.click().unwrap().await.unwrap().unwrap();
        let posts = transport.get_requests_for("POST");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].body.as_deref(), Some("0"));
        assert!(button.is_enabled());

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(button.get_class(), "on");
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_and_restart() {
        let (poller, transport) = _setup_poller();
        let poller = poller.with_interval(100);

        poller.start().unwrap();
        // Starting twice does not spawn a second loop.
        poller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(250)).await;
        poller.stop();
        tokio::task::yield_now().await;
        assert!(!poller.is_running());
        assert_eq!(transport.get_requests_for("GET").len(), 3);

        // Nothing happens while stopped.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(transport.get_requests_for("GET").len(), 3);

        poller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(transport.get_requests_for("GET").len(), 4);
        poller.stop();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_starts_spawn_a_single_loop() {
        let (poller, transport) = _setup_poller();
        let poller = poller.with_interval(20);

        let starts: Vec<_> = (0..8)
            .map(|_| {
                let poller = poller.clone();
                tokio::spawn(async move {
                    poller.start().unwrap();
                })
            })
            .collect();
        for start in starts {
            start.await.unwrap();
        }

        pause!(100);
        poller.stop();
        pause!(50);
        let requests = transport.get_requests_for("GET").len();

        // A loop whose handler was lost would keep polling after stop().
        pause!(200);
        assert!(!poller.is_running());
        assert_eq!(transport.get_requests_for("GET").len(), requests);
    }

    #[tokio::test]
    async fn test_status_event() {
        let (poller, transport) = _setup_poller();
        transport.set_status("1");

        let status = Arc::new(AtomicBool::new(false));
        let moved_status = status.clone();
        poller.on(PollerEvent::OnStatus, move |enabled: bool| {
            let captured = moved_status.clone();
            async move {
                captured.store(enabled, Ordering::SeqCst);
            }
        });

        poller.start().unwrap();
        pause!(100);
        poller.stop();
        assert!(status.load(Ordering::SeqCst));
    }

    #[test]
    fn test_start_outside_runtime() {
        let (poller, _) = _setup_poller();
        assert!(matches!(poller.start(), Err(Error::Runtime)));
        assert!(!poller.is_running());
    }

    #[test]
    fn test_display_impl() {
        let (poller, _) = _setup_poller();
        assert_eq!(
            format!("{}", poller),
            "StatusPoller (url=/ledstatus) [interval=400ms, running=false, cycles=0]"
        );
    }
}
