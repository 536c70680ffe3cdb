use std::any::type_name;
use std::fmt::{Debug, Display};

use async_trait::async_trait;
use dyn_clone::DynClone;

use crate::errors::Error;

// Makes a Box<dyn Transport> clone (used for device cloning).
dyn_clone::clone_trait_object!(Transport);

/// Defines the trait all transports must implement.
///
/// A transport carries the two requests the switch needs: reading the LED status and asking
/// for a new LED state. Urls may be relative: each transport resolves them its own way.
#[async_trait]
pub trait Transport: DynClone + Send + Sync + Debug + Display {
    /// Returns the transport name (used for Display only)
    fn get_transport_name(&self) -> &'static str {
        type_name::<Self>().split("::").last().unwrap_or_default()
    }

    /// Issues a GET request to `url` and returns the response body.
    ///
    /// # Errors
    /// * `RequestFailed`: the request could not be sent or the body could not be read.
    /// * `BadStatus`: the server answered with a non-success status.
    /// * `InvalidUrl`: the url cannot be resolved.
    async fn get(&self, url: &str) -> Result<String, Error>;

    /// Issues a POST request to `url` with a plain text `body` and returns the response body.
    ///
    /// # Errors
    /// Same as [`Transport::get`].
    async fn post(&self, url: &str, body: String) -> Result<String, Error>;
}
