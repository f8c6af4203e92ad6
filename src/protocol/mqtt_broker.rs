// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT broker connection shared by charger switches.
//!
//! # Examples
//!
//! ```no_run
//! use goecharger_mqtt::protocol::MqttBroker;
//!
//! # async fn example() -> goecharger_mqtt::Result<()> {
//! let broker = MqttBroker::builder()
//!     .host("192.168.1.50")
//!     .port(1883)
//!     .credentials("user", "password")
//!     .build()
//!     .await?;
//!
//! // The broker can be cloned and shared between switches
//! let broker_clone = broker.clone();
//!
//! if broker_clone.is_connected() {
//!     println!("Connected to MQTT broker");
//! }
//!
//! broker.disconnect().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, EventLoop, MqttOptions};
use tokio::sync::{Mutex, oneshot};

use crate::error::ProtocolError;
use crate::protocol::{MessageHandler, TopicRouter, TopicSubscription, Transport};
use crate::types::Qos;

/// Global counter for generating unique client IDs.
static BROKER_CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Configuration for an MQTT broker connection.
#[derive(Debug, Clone)]
pub struct MqttBrokerConfig {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
    client_id: Option<String>,
    keep_alive: Duration,
    connection_timeout: Duration,
}

impl Default for MqttBrokerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 1883,
            credentials: None,
            client_id: None,
            keep_alive: Duration::from_secs(30),
            connection_timeout: Duration::from_secs(10),
        }
    }
}

impl MqttBrokerConfig {
    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the keep-alive interval.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    /// Returns the connection timeout.
    #[must_use]
    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }
}

/// An MQTT broker connection that can be shared across switches.
///
/// Inbound publishes are dispatched through a [`TopicRouter`] from the
/// event loop task, one message at a time and in arrival order.
///
/// Subscribe and unsubscribe calls are serialized, so a handler is only
/// reported as subscribed once the broker SUBSCRIBE for its filter has been
/// issued, and a handler stays routed until its filter's UNSUBSCRIBE has.
///
/// `MqttBroker` is cheaply cloneable (via `Arc`).
#[derive(Clone)]
pub struct MqttBroker {
    inner: Arc<MqttBrokerInner>,
}

struct MqttBrokerInner {
    client: AsyncClient,
    router: TopicRouter,
    /// Held across router updates and the matching client requests.
    subscriptions: Mutex<()>,
    config: MqttBrokerConfig,
    connected: AtomicBool,
}

impl MqttBroker {
    /// Creates a new builder for configuring an MQTT broker connection.
    #[must_use]
    pub fn builder() -> MqttBrokerBuilder {
        MqttBrokerBuilder::default()
    }

    fn with_client(client: AsyncClient, config: MqttBrokerConfig) -> Self {
        Self {
            inner: Arc::new(MqttBrokerInner {
                client,
                router: TopicRouter::new(),
                subscriptions: Mutex::new(()),
                config,
                connected: AtomicBool::new(false),
            }),
        }
    }

    /// Returns whether the broker is currently connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Returns the host address of the broker.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.inner.config.host
    }

    /// Returns the port of the broker.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.inner.config.port
    }

    /// Returns whether authentication is configured.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.inner.config.credentials.is_some()
    }

    /// Returns the number of topic filters with registered handlers.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.inner.router.filter_count()
    }

    /// Disconnects from the broker.
    ///
    /// All handlers are dropped; switches subscribed through this broker
    /// stop receiving state messages.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be issued.
    pub async fn disconnect(&self) -> Result<(), ProtocolError> {
        tracing::info!(
            host = %self.inner.config.host,
            port = %self.inner.config.port,
            "Disconnecting from MQTT broker"
        );

        let _subscriptions = self.inner.subscriptions.lock().await;
        for filter in self.inner.router.filters() {
            if let Err(e) = self.inner.client.unsubscribe(&filter).await {
                tracing::warn!(topic = %filter, error = %e, "Failed to unsubscribe from topic");
            }
        }
        self.inner.router.clear();

        self.inner
            .client
            .disconnect()
            .await
            .map_err(ProtocolError::Mqtt)?;

        self.inner.connected.store(false, Ordering::Release);
        Ok(())
    }
}

impl Transport for MqttBroker {
    async fn subscribe(
        &self,
        topic: &str,
        qos: Qos,
        handler: MessageHandler,
    ) -> Result<TopicSubscription, ProtocolError> {
        let _subscriptions = self.inner.subscriptions.lock().await;
        let (subscription, first) = self.inner.router.register(topic, handler);

        if first
            && let Err(e) = self.inner.client.subscribe(topic, qos.into()).await
        {
            self.inner.router.unregister(&subscription);
            return Err(ProtocolError::SubscribeFailed {
                topic: topic.to_string(),
                reason: e.to_string(),
            });
        }

        tracing::debug!(topic = %topic, qos = %qos, first, "Subscribed to topic");
        Ok(subscription)
    }

    async fn unsubscribe(&self, subscription: &TopicSubscription) -> Result<(), ProtocolError> {
        let _subscriptions = self.inner.subscriptions.lock().await;
        let topic = subscription.topic();
        if !self.inner.router.contains(subscription) {
            return Ok(());
        }

        // The handler keeps receiving until the broker has accepted the request
        if self.inner.router.handler_count(topic) == 1 {
            self.inner
                .client
                .unsubscribe(topic)
                .await
                .map_err(|e| ProtocolError::UnsubscribeFailed {
                    topic: topic.to_string(),
                    reason: e.to_string(),
                })?;
            tracing::debug!(topic = %topic, "Unsubscribed from topic");
        }

        self.inner.router.unregister(subscription);
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), ProtocolError> {
        tracing::debug!(
            topic = %topic,
            payload = %String::from_utf8_lossy(payload),
            "Publishing MQTT message"
        );

        self.inner
            .client
            .publish(topic, qos.into(), false, payload.to_vec())
            .await
            .map_err(|e| ProtocolError::PublishFailed {
                topic: topic.to_string(),
                reason: e.to_string(),
            })
    }
}

impl std::fmt::Debug for MqttBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MqttBroker")
            .field("host", &self.inner.config.host)
            .field("port", &self.inner.config.port)
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

/// Builder for creating an MQTT broker connection.
///
/// # Examples
///
/// ```no_run
/// use goecharger_mqtt::protocol::MqttBroker;
/// use std::time::Duration;
///
/// # async fn example() -> goecharger_mqtt::Result<()> {
/// let broker = MqttBroker::builder()
///     .url("mqtt://192.168.1.50:1883")?
///     .credentials("user", "password")
///     .keep_alive(Duration::from_secs(60))
///     .connection_timeout(Duration::from_secs(5))
///     .build()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MqttBrokerBuilder {
    config: MqttBrokerConfig,
}

impl MqttBrokerBuilder {
    /// Sets the broker host address.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the broker port (default: 1883).
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Sets host and port from a broker URL.
    ///
    /// Accepts `mqtt://host:port`, `tcp://host:port` and bare `host[:port]`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidAddress` if the port is not a number.
    pub fn url(mut self, url: &str) -> Result<Self, ProtocolError> {
        let (host, port) = parse_mqtt_url(url)?;
        self.config.host = host;
        self.config.port = port;
        Ok(self)
    }

    /// Sets authentication credentials.
    #[must_use]
    pub fn credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.credentials = Some((username.into(), password.into()));
        self
    }

    /// Sets a custom client ID.
    #[must_use]
    pub fn client_id(mut self, id: impl Into<String>) -> Self {
        self.config.client_id = Some(id.into());
        self
    }

    /// Sets the keep-alive interval (default: 30 seconds).
    #[must_use]
    pub fn keep_alive(mut self, duration: Duration) -> Self {
        self.config.keep_alive = duration;
        self
    }

    /// Sets the connection timeout (default: 10 seconds).
    #[must_use]
    pub fn connection_timeout(mut self, duration: Duration) -> Self {
        self.config.connection_timeout = duration;
        self
    }

    /// Builds and connects to the MQTT broker.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Host is not set
    /// - Connection fails
    /// - Connection times out
    pub async fn build(self) -> Result<MqttBroker, ProtocolError> {
        if self.config.host.is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "MQTT broker host is required".to_string(),
            ));
        }

        let client_id = self.config.client_id.clone().unwrap_or_else(|| {
            let counter = BROKER_CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
            format!("goecharger_{}_{}", std::process::id(), counter)
        });

        let mut mqtt_options = MqttOptions::new(&client_id, &self.config.host, self.config.port);
        mqtt_options.set_keep_alive(self.config.keep_alive);
        mqtt_options.set_clean_session(true);

        if let Some((ref username, ref password)) = self.config.credentials {
            mqtt_options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(mqtt_options, 10);

        let broker = MqttBroker::with_client(client, self.config.clone());

        let broker_clone = broker.clone();
        let (connack_tx, connack_rx) = oneshot::channel();

        tokio::spawn(async move {
            handle_broker_events(event_loop, broker_clone, Some(connack_tx)).await;
        });

        let timeout = self.config.connection_timeout;
        match tokio::time::timeout(timeout, connack_rx).await {
            Ok(Ok(())) => {
                broker.inner.connected.store(true, Ordering::Release);
                tracing::info!(
                    host = %self.config.host,
                    port = %self.config.port,
                    client_id = %client_id,
                    "Connected to MQTT broker"
                );
            }
            Ok(Err(_)) => {
                return Err(ProtocolError::ConnectionFailed(
                    "MQTT event loop terminated unexpectedly".to_string(),
                ));
            }
            Err(_) => {
                return Err(ProtocolError::ConnectionFailed(format!(
                    "MQTT connection timeout after {}s",
                    timeout.as_secs()
                )));
            }
        }

        Ok(broker)
    }
}

/// Parses an MQTT URL into host and port.
fn parse_mqtt_url(url: &str) -> Result<(String, u16), ProtocolError> {
    let url = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    let (host, port) = if let Some((h, p)) = url.rsplit_once(':') {
        let port = p
            .parse()
            .map_err(|_| ProtocolError::InvalidAddress(format!("Invalid port: {p}")))?;
        (h.to_string(), port)
    } else {
        (url.to_string(), 1883)
    };

    if host.is_empty() {
        return Err(ProtocolError::InvalidAddress(format!(
            "Missing host in URL: {url}"
        )));
    }

    Ok((host, port))
}

/// Handles MQTT events for the broker connection.
async fn handle_broker_events(
    mut event_loop: EventLoop,
    broker: MqttBroker,
    connack_tx: Option<oneshot::Sender<()>>,
) {
    use rumqttc::{Event, Packet};

    let mut connack_tx = connack_tx;

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(?connack, "MQTT broker connected");
                broker.inner.connected.store(true, Ordering::Release);
                if let Some(tx) = connack_tx.take() {
                    let _ = tx.send(());
                }
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                tracing::debug!(
                    topic = %publish.topic,
                    payload = %String::from_utf8_lossy(&publish.payload),
                    "MQTT message received"
                );
                broker.inner.router.route(&publish.topic, &publish.payload);
            }
            Ok(Event::Incoming(Packet::Disconnect)) => {
                tracing::info!("MQTT broker disconnected");
                broker.inner.connected.store(false, Ordering::Release);
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::error!(error = %e, "MQTT broker event loop error");
                broker.inner.connected.store(false, Ordering::Release);
                break;
            }
        }
    }
}
