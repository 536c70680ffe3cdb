//! Defines the event manager system shared by the switch devices.

use std::any::Any;
use std::collections::HashMap;
use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;
use log::{debug, warn};
use parking_lot::Mutex;

use crate::utils::task;
use crate::utils::task::TaskResult;

type Callback =
    Box<dyn FnMut(Arc<dyn Any + Send + Sync>) -> Option<BoxFuture<'static, TaskResult>> + Send>;
type SyncedCallbackMap = Mutex<HashMap<String, Vec<CallbackWrapper>>>;
pub type EventHandler = usize;

#[derive(Clone, Default)]
pub struct EventManager {
    callbacks: Arc<SyncedCallbackMap>,
    next_id: Arc<AtomicUsize>,
}

struct CallbackWrapper {
    id: EventHandler,
    callback: Callback,
}

impl EventManager {
    /// Registers an event handler for a specific event name.
    ///
    /// # Parameters
    /// * `event` - The event name (any type that matches an Into<String>)
    /// * `callback` - An async moved callback that accepts a single parameter as an argument.
    ///                The argument can be anything that might be both `Send + Sync`.
    ///                You can trick multiple parameters by turning them in a single tuple.
    ///                The callback may return either `()` or `Result<(), Error>`.
    ///
    /// # Return
    /// Returns an EventHandler that can be used by the `unregister()` method.
    ///
    /// # Errors
    /// If the callback parameter type does not match the emitted payload exactly, the callback is
    /// silently skipped.
    ///
    /// # Example
    /// ```
    /// use led_switch::utils::events::EventManager;
    ///
    /// let events = EventManager::default();
    /// events.on("change", |enabled: bool| async move {
    ///     println!("Switch is now {}", enabled);
    /// });
    /// events.on("change", |(name, age): (String, u8)| async move {
    ///     println!("Never called for a bool payload: {} {}", name, age);
    /// });
    /// ```
    pub fn on<S, F, T, Fut>(&self, event: S, mut callback: F) -> EventHandler
    where
        S: Into<String>,
        T: 'static + Send + Sync + Clone,
        F: FnMut(T) -> Fut + Send + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: Into<TaskResult> + Send + 'static,
    {
        let event_name = event.into();
        let callback_event = event_name.clone();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Boxes the callback and downcast its parameter.
        let callback: Callback = Box::new(move |arg: Arc<dyn Any + Send + Sync>| {
            match arg.downcast::<T>() {
                Ok(arg) => {
                    let future = (callback)((*arg).clone());
                    Some(async move { future.await.into() }.boxed())
                }
                Err(_) => {
                    debug!(
                        "Callback for event '{}' skipped: payload type does not match",
                        callback_event
                    );
                    None
                }
            }
        });

        self.callbacks
            .lock()
            .entry(event_name)
            .or_default()
            .push(CallbackWrapper { id, callback });

        id
    }

    /// Invokes all event handlers registered for a specific event name.
    /// Each matching callback runs as its own task: `emit()` does not wait for them.
    ///
    /// # Parameters
    /// * `event`:  The event name (any type that matches an `Into<String>`)
    /// * `payload`: The event payload (must be `'static + Send + Sync`)
    pub fn emit<S, T>(&self, event: S, payload: T)
    where
        S: Into<String>,
        T: 'static + Send + Sync,
    {
        let event = event.into();
        let payload: Arc<dyn Any + Send + Sync> = Arc::new(payload);

        // Futures are built under the lock but spawned outside of it.
        let futures: Vec<BoxFuture<'static, TaskResult>> = {
            let mut callbacks = self.callbacks.lock();
            match callbacks.get_mut(&event) {
                None => return,
                Some(callbacks) => callbacks
                    .iter_mut()
                    .filter_map(|wrapper| (wrapper.callback)(payload.clone()))
                    .collect(),
            }
        };

        for future in futures {
            if let Err(err) = task::run(future) {
                warn!("Event '{}' handler could not be run: {}", event, err);
            }
        }
    }

    /// Unregisters a given handler if found.
    pub fn unregister(&self, handler: EventHandler) {
        self.callbacks
            .lock()
            .values_mut()
            .for_each(|v| v.retain(|cb| cb.id != handler));
    }

    /// Indicates if at least one handler is registered for the given event.
    pub fn has_handlers<S: Into<String>>(&self, event: S) -> bool {
        self.callbacks
            .lock()
            .get(&event.into())
            .is_some_and(|callbacks| !callbacks.is_empty())
    }
}

impl Debug for EventManager {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let callbacks = self.callbacks.lock();
        let mut events: Vec<&String> = callbacks.keys().collect();
        events.sort();
        f.debug_struct("EventManager")
            .field("events", &events)
            .finish()
    }
}
