//! Defines the switch devices: the [`ToggleButton`] and the [`StatusPoller`] driving it.

pub use crate::devices::element::Element;
pub use crate::devices::poller::{PollerEvent, StatusPoller};
pub use crate::devices::toggle::{css_class, ToggleButton, ToggleEvent};

mod element;
mod poller;
mod toggle;
