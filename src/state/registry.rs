use std::collections::HashMap;

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Live connections of one stream, keyed by connection identifier.
///
/// Each connection is represented by the sending half of its writer channel: pushing never
/// blocks, and the dedicated writer task owned by the socket handler performs the actual network
/// send. A closed channel means the socket is gone.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    connections: HashMap<Uuid, mpsc::UnboundedSender<Message>>,
}

impl SubscriberRegistry {
    /// Register a connection, replacing any previous channel with the same identifier.
    pub fn insert(&mut self, id: Uuid, tx: mpsc::UnboundedSender<Message>) {
        self.connections.insert(id, tx);
    }

    /// Forget a connection; returns whether it was registered.
    pub fn remove(&mut self, id: &Uuid) -> bool {
        self.connections.remove(id).is_some()
    }

    /// Number of registered connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether nobody is listening anymore.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Queue `message` on every connection and prune the ones whose writer is gone.
    ///
    /// Returns the identifiers that were pruned.
    pub fn fan_out(&mut self, message: &Message) -> Vec<Uuid> {
        let mut pruned = Vec::new();
        self.connections.retain(|id, tx| {
            let alive = tx.send(message.clone()).is_ok();
            if !alive {
                pruned.push(*id);
            }
            alive
        });
        pruned
    }
}
