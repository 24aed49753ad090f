//! Outgoing events collected during a tick and fanned out afterwards

use tracing::warn;
use uuid::Uuid;

use crate::ws::protocol::ServerEvent;

use super::session::Session;

/// Who receives an outgoing event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recipient {
    All,
    One(Uuid),
}

#[derive(Debug, Clone)]
pub struct Outgoing {
    pub recipient: Recipient,
    pub event: ServerEvent,
}

/// Ordered queue of events produced by one simulation step
#[derive(Debug, Default)]
pub struct Outbox {
    messages: Vec<Outgoing>,
}

/// Fan-out counters for one delivery
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryStats {
    pub sent: usize,
    pub dropped: usize,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn broadcast(&mut self, event: ServerEvent) {
        self.messages.push(Outgoing {
            recipient: Recipient::All,
            event,
        });
    }

    pub fn send_to(&mut self, id: Uuid, event: ServerEvent) {
        self.messages.push(Outgoing {
            recipient: Recipient::One(id),
            event,
        });
    }

    pub fn messages(&self) -> &[Outgoing] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Events with the given trigger name, in emission order
    pub fn named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ServerEvent> + 'a {
        self.messages
            .iter()
            .map(|m| &m.event)
            .filter(move |e| e.name() == name)
    }

    /// Encode every event once and queue it on each recipient's connection.
    /// Never waits on a slow connection.
    pub fn deliver(self, sessions: &[Session]) -> DeliveryStats {
        let mut stats = DeliveryStats::default();

        for outgoing in self.messages {
            let frame = match outgoing.event.encode() {
                Ok(frame) => frame,
                Err(e) => {
                    warn!(trigger = outgoing.event.name(), error = %e, "Failed to encode event");
                    continue;
                }
            };

            let targets = sessions.iter().filter(|s| match outgoing.recipient {
                Recipient::All => true,
                Recipient::One(id) => s.id() == id,
            });

            for session in targets {
                if session.send(frame.clone()) {
                    stats.sent += 1;
                } else {
                    stats.dropped += 1;
                }
            }
        }

        stats
    }
}
