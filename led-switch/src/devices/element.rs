use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use parking_lot::RwLock;

/// Represents a handle to a UI element the [`ToggleButton`](crate::devices::ToggleButton) is
/// bound to: an `id` and a set of named attributes (`href`, `class`, etc.).
///
/// Cloning the handle does not clone the element: all clones read and write the same attributes.
#[derive(Clone, Debug)]
pub struct Element {
    id: String,
    attributes: Arc<RwLock<BTreeMap<String, String>>>,
}

impl Element {
    /// Creates an element with the given id and no attribute.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            attributes: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Creates an element with the given id and `href` attribute: the usual control link.
    pub fn link<S: Into<String>, H: Into<String>>(id: S, href: H) -> Self {
        Self::new(id).with_attr("href", href)
    }

    /// Builder-style version of [`Self::set_attr()`].
    pub fn with_attr<K: Into<String>, V: Into<String>>(self, name: K, value: V) -> Self {
        self.set_attr(name, value);
        self
    }

    // ########################################
    // Setters and Getters.

    /// Retrieves the element id.
    pub fn get_id(&self) -> &str {
        &self.id
    }

    /// Retrieves an attribute value, if set.
    pub fn attr(&self, name: &str) -> Option<String> {
        self.attributes.read().get(name).cloned()
    }

    /// Sets (or replaces) an attribute value.
    pub fn set_attr<K: Into<String>, V: Into<String>>(&self, name: K, value: V) {
        self.attributes.write().insert(name.into(), value.into());
    }
}

impl Display for Element {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let attributes = self
            .attributes
            .read()
            .iter()
            .map(|(name, value)| format!("{}=\"{}\"", name, value))
            .collect::<Vec<String>>()
            .join(", ");
        write!(f, "Element (id={}) [{}]", self.id, attributes)
    }
}
