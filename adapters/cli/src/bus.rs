//! MQTT transport shared by the networked subcommands.

use std::{thread, time::Duration};

use blastgrid_protocol::{Delivery, Outbound};
use rumqttc::{Client, Connection, Event, MqttOptions, Packet, QoS, RecvTimeoutError};
use serde::Deserialize;
use tracing::{debug, info, warn};

const REQUEST_CAPACITY: usize = 64;

/// `[bus]` section of the configuration file.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct BusConfig {
    /// Broker host name or address.
    pub(crate) host: String,
    /// Broker TCP port.
    pub(crate) port: u16,
    /// MQTT keep-alive interval in seconds.
    pub(crate) keep_alive_secs: u64,
    /// Pause after a failed connection attempt, in milliseconds.
    pub(crate) retry_ms: u64,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_owned(),
            port: 1883,
            keep_alive_secs: 5,
            retry_ms: 1000,
        }
    }
}

/// Connection to the broker with a fixed set of subscriptions.
///
/// Transport failures never end the session: they are logged, the event
/// loop reconnects on the next poll and the filters are subscribed again
/// after every acknowledged connection.
pub(crate) struct Bus {
    client: Client,
    connection: Connection,
    filters: Vec<String>,
    retry: Duration,
    /// Consecutive failed connection attempts.
    failures: u32,
}

impl Bus {
    pub(crate) fn connect(config: &BusConfig, client_id: &str, filters: &[&str]) -> Self {
        let mut options = MqttOptions::new(client_id, config.host.clone(), config.port);
        let _ = options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));
        let (client, connection) = Client::new(options, REQUEST_CAPACITY);
        info!(host = %config.host, port = config.port, client_id, "bus_connecting");
        Self {
            client,
            connection,
            filters: filters.iter().map(|filter| (*filter).to_owned()).collect(),
            retry: Duration::from_millis(config.retry_ms),
            failures: 0,
        }
    }

    /// Queues `message` for publication. Full queues drop the message.
    pub(crate) fn publish(&self, message: &Outbound) {
        let topic = message.topic.to_string();
        if let Err(error) =
            self.client
                .try_publish(topic.as_str(), QoS::AtLeastOnce, false, message.payload.clone())
        {
            warn!(%error, %topic, "bus_publish_failed");
        }
    }

    /// Waits up to `timeout` for the next inbound publish.
    pub(crate) fn poll(&mut self, timeout: Duration) -> Option<Delivery> {
        match self.connection.recv_timeout(timeout) {
            Ok(Ok(Event::Incoming(Packet::Publish(publish)))) => Some(Delivery {
                topic: publish.topic,
                payload: publish.payload.to_vec(),
            }),
            Ok(Ok(Event::Incoming(Packet::ConnAck(_)))) => {
                info!(failures = self.failures, "bus_connected");
                self.failures = 0;
                self.subscribe();
                None
            }
            Ok(Ok(_)) => None,
            Ok(Err(error)) => {
                self.failures = self.failures.saturating_add(1);
                warn!(%error, failures = self.failures, "bus_connection_lost");
                thread::sleep(self.retry);
                None
            }
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                warn!("bus_event_loop_closed");
                thread::sleep(self.retry);
                None
            }
        }
    }

    fn subscribe(&self) {
        for filter in &self.filters {
            match self.client.try_subscribe(filter.as_str(), QoS::AtLeastOnce) {
                Ok(()) => debug!(%filter, "bus_subscribed"),
                Err(error) => warn!(%error, %filter, "bus_subscribe_failed"),
            }
        }
    }
}
