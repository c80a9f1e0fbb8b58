//! Type-tag registry for event deserialization.
//!
//! Every concrete event type is registered under a unique string tag; the
//! registry dispatches wire mappings to the right constructor and turns
//! unknown tags into explicit errors. The process-wide instance is populated
//! with the built-in types at startup; tests build isolated registries
//! instead of mutating the shared one.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::events::Event;

pub type EventDeserializer = fn(&Value) -> Result<Event>;

pub struct EventRegistry {
    map: BTreeMap<String, EventDeserializer>,
}

const BUILTIN_TAGS: [&str; 12] = [
    "create",
    "delete",
    "move",
    "change",
    "var_create",
    "var_delete",
    "var_rename",
    "click",
    "selected",
    "bubble_open",
    "theme_change",
    "drag",
];

impl EventRegistry {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn with_builtin_events() -> Self {
        let mut registry = Self::new();
        for tag in BUILTIN_TAGS {
            registry.register(tag, Event::from_json);
        }
        registry
    }

    /// Last writer wins; re-registering a tag replaces the prior constructor.
    pub fn register(&mut self, tag: &str, deserializer: EventDeserializer) {
        if self.map.insert(tag.to_string(), deserializer).is_some() {
            log::debug!("event type {tag:?} re-registered");
        }
    }

    /// Removing a tag that was never registered is a no-op.
    pub fn unregister(&mut self, tag: &str) {
        self.map.remove(tag);
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.map.contains_key(tag)
    }

    /// Deserializes through the constructor registered for the mapping's
    /// `type` tag.
    pub fn from_json(&self, value: &Value) -> Result<Event> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedEvent("missing \"type\" tag".to_string()))?;
        let deserializer = self
            .map
            .get(tag)
            .ok_or_else(|| Error::UnknownEventType(tag.to_string()))?;
        deserializer(value)
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::with_builtin_events()
    }
}

static GLOBAL_EVENTS: Lazy<Mutex<EventRegistry>> =
    Lazy::new(|| Mutex::new(EventRegistry::with_builtin_events()));

pub fn global_events() -> &'static Mutex<EventRegistry> {
    &GLOBAL_EVENTS
}
