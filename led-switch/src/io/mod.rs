//! Defines the transports used to reach the LED endpoints and the status wire format.

mod http;
mod status;
mod transport;

pub use http::*;
pub use status::*;
pub use transport::*;
