//! Name-keyed routing for application-level triggers sent by clients

use std::collections::HashMap;

use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::protocol::{Ping, ServerEvent};

/// Handler invoked with the calling connection's id and the trigger payload.
/// A returned event is sent back to that connection only.
pub type TriggerHandler = Box<dyn Fn(Uuid, &Value) -> Option<ServerEvent> + Send + Sync>;

/// Registered trigger handlers, looked up by exact name
#[derive(Default)]
pub struct TriggerRegistry {
    handlers: HashMap<String, TriggerHandler>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in `ping` handler
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("ping", |_, data| match serde_json::from_value::<Ping>(data.clone()) {
            Ok(ping) => Some(ServerEvent::Pong(ping)),
            Err(e) => {
                warn!(error = %e, "Malformed ping payload");
                None
            }
        });
        registry
    }

    /// Register `handler` under `name`, replacing any earlier registration
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F)
    where
        F: Fn(Uuid, &Value) -> Option<ServerEvent> + Send + Sync + 'static,
    {
        self.handlers.insert(name.into(), Box::new(handler));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Invoke the handler for `name`. Unregistered names are ignored.
    pub fn dispatch(&self, caller: Uuid, name: &str, data: &Value) -> Option<ServerEvent> {
        match self.handlers.get(name) {
            Some(handler) => handler(caller, data),
            None => {
                debug!(trigger = name, "Ignoring unregistered trigger");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::protocol::EntityRef;
    use serde_json::json;

    #[test]
    fn ping_is_answered_with_pong() {
        let registry = TriggerRegistry::with_builtins();
        let reply = registry.dispatch(Uuid::new_v4(), "ping", &json!({"t": 1234}));
        assert_eq!(reply, Some(ServerEvent::Pong(Ping { t: 1234 })));
    }

    #[test]
    fn malformed_ping_is_dropped() {
        let registry = TriggerRegistry::with_builtins();
        assert_eq!(registry.dispatch(Uuid::new_v4(), "ping", &json!("soon")), None);
    }

    #[test]
    fn unregistered_names_are_ignored() {
        let registry = TriggerRegistry::with_builtins();
        assert!(!registry.contains("Ping"));
        assert_eq!(registry.dispatch(Uuid::new_v4(), "Ping", &json!({"t": 1})), None);
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = TriggerRegistry::new();
        registry.register("whoami", |_, _| None);
        registry.register("whoami", |caller, _| {
            Some(ServerEvent::PlayerDisconnect(EntityRef { id: caller }))
        });

        let caller = Uuid::new_v4();
        assert_eq!(
            registry.dispatch(caller, "whoami", &Value::Null),
            Some(ServerEvent::PlayerDisconnect(EntityRef { id: caller }))
        );
    }
}
