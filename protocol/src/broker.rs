//! In-process publish/subscribe broker.

use std::collections::{BTreeMap, VecDeque};

use crate::{topic_matches, Outbound};

/// Handle identifying a broker client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u32);

impl ClientId {
    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Raw message delivered to a subscriber.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Delivery {
    /// Concrete topic the message was published on.
    pub topic: String,
    /// Payload bytes.
    pub payload: Vec<u8>,
}

/// Broker that fans messages out to wildcard subscriptions.
///
/// Delivery is in publish order per subscriber, and a message matching
/// several filters of one client is queued once. Publishers that
/// subscribed to their own topics receive their own messages.
#[derive(Debug, Default)]
pub struct LocalBroker {
    next_client: u32,
    subscriptions: Vec<(ClientId, String)>,
    queues: BTreeMap<ClientId, VecDeque<Delivery>>,
}

impl LocalBroker {
    /// Creates a broker without clients.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new client with an empty queue.
    pub fn connect(&mut self) -> ClientId {
        let client = ClientId(self.next_client);
        self.next_client = self.next_client.wrapping_add(1);
        let _ = self.queues.insert(client, VecDeque::new());
        client
    }

    /// Adds a topic filter for `client`.
    pub fn subscribe(&mut self, client: ClientId, filter: impl Into<String>) {
        self.subscriptions.push((client, filter.into()));
    }

    /// Publishes an encoded message.
    pub fn publish(&mut self, message: &Outbound) {
        self.publish_raw(&message.topic.to_string(), &message.payload);
    }

    /// Publishes raw bytes on an arbitrary topic string.
    pub fn publish_raw(&mut self, topic: &str, payload: &[u8]) {
        for (client, queue) in &mut self.queues {
            let subscribed = self
                .subscriptions
                .iter()
                .any(|(owner, filter)| owner == client && topic_matches(filter, topic));
            if subscribed {
                queue.push_back(Delivery {
                    topic: topic.to_owned(),
                    payload: payload.to_vec(),
                });
            }
        }
    }

    /// Removes and returns every message queued for `client`.
    pub fn drain(&mut self, client: ClientId) -> Vec<Delivery> {
        self.queues
            .get_mut(&client)
            .map(|queue| queue.drain(..).collect())
            .unwrap_or_default()
    }

    /// Number of messages waiting across all clients.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queues.values().map(VecDeque::len).sum()
    }
}
