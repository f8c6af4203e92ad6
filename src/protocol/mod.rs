// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT transport abstraction.
//!
//! Switches never talk to an MQTT client directly. They go through the
//! [`Transport`] trait, which covers the three operations a switch needs:
//! subscribing a handler to a state topic, removing that subscription, and
//! publishing a command payload.
//!
//! # Implementations
//!
//! - [`MqttBroker`]: a shared `rumqttc` connection (feature `mqtt`)
//!
//! Session handling, reconnection and retry policy belong to the transport.
//! Switches propagate transport errors unchanged and never retry.

#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "mqtt")]
mod mqtt_broker;
mod topic_router;

#[cfg(feature = "mqtt")]
pub use mqtt_broker::{MqttBroker, MqttBrokerBuilder, MqttBrokerConfig};
pub use topic_router::{TopicRouter, topic_matches};

use std::sync::Arc;

use crate::error::ProtocolError;
use crate::subscription::SubscriptionId;
use crate::types::Qos;

/// Handler invoked once per inbound message with its topic and raw payload.
///
/// Transports call handlers in the order messages arrive and never
/// deduplicate, so a QoS 1 redelivery reaches the handler twice.
pub type MessageHandler = Arc<dyn Fn(&str, &[u8]) + Send + Sync>;

/// A handler registration on a transport.
///
/// Returned by [`Transport::subscribe`] and consumed by
/// [`Transport::unsubscribe`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopicSubscription {
    topic: String,
    id: SubscriptionId,
}

impl TopicSubscription {
    pub(crate) fn new(topic: impl Into<String>, id: SubscriptionId) -> Self {
        Self {
            topic: topic.into(),
            id,
        }
    }

    /// Returns the subscribed topic filter.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the handler registration ID.
    #[must_use]
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

/// Trait for MQTT transports that switches publish and subscribe through.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Subscribes `handler` to `topic` at the given QoS level.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::SubscribeFailed` if the subscription cannot
    /// be issued.
    async fn subscribe(
        &self,
        topic: &str,
        qos: Qos,
        handler: MessageHandler,
    ) -> Result<TopicSubscription, ProtocolError>;

    /// Removes a handler registration.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::UnsubscribeFailed` if the broker
    /// unsubscription cannot be issued.
    async fn unsubscribe(&self, subscription: &TopicSubscription) -> Result<(), ProtocolError>;

    /// Publishes `payload` to `topic` without the retain flag.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::PublishFailed` if the publish cannot be
    /// issued.
    async fn publish(&self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), ProtocolError>;
}

impl<T: Transport> Transport for Arc<T> {
    async fn subscribe(
        &self,
        topic: &str,
        qos: Qos,
        handler: MessageHandler,
    ) -> Result<TopicSubscription, ProtocolError> {
        (**self).subscribe(topic, qos, handler).await
    }

    async fn unsubscribe(&self, subscription: &TopicSubscription) -> Result<(), ProtocolError> {
        (**self).unsubscribe(subscription).await
    }

    async fn publish(&self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), ProtocolError> {
        (**self).publish(topic, payload, qos).await
    }
}
