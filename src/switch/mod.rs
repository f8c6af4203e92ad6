// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Binary switch mirrored over MQTT.
//!
//! A [`BinaryMqttSwitch`] keeps an on/off/unknown state in sync with a
//! device that reports its state on a topic and accepts commands on the
//! same topic suffixed with `/set`.
//!
//! # State machine
//!
//! ```text
//! Unknown/On/Off --message decodes to X-------------------------> X
//! Unknown/On/Off --turn_on(),  optimistic, publish succeeded----> On
//! Unknown/On/Off --turn_off(), optimistic, publish succeeded----> Off
//! ```
//!
//! Without `optimistic`, commands never change the local state; only the
//! device's state report does.
//!
//! # Examples
//!
//! ```no_run
//! use goecharger_mqtt::protocol::MqttBroker;
//! use goecharger_mqtt::switch::{BinaryMqttSwitch, SwitchConfig};
//!
//! # async fn example() -> goecharger_mqtt::Result<()> {
//! let broker = MqttBroker::builder().host("192.168.1.50").build().await?;
//!
//! let config = SwitchConfig::new("go-eCharger/012345/fup");
//! let switch = BinaryMqttSwitch::new(config, broker);
//!
//! switch.on_state_changed(|state| println!("PV surplus charging: {state}"));
//! switch.activate().await?;
//! switch.turn_on().await?;
//! # Ok(())
//! # }
//! ```

mod config;

pub use config::{COMMAND_TOPIC_SUFFIX, DEFAULT_PAYLOAD_OFF, DEFAULT_PAYLOAD_ON, SwitchConfig};

use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::sync::Mutex as AsyncMutex;

use crate::decoder::{EqualityDecoder, StateDecoder};
use crate::error::Result;
use crate::protocol::{MessageHandler, TopicSubscription, Transport};
use crate::subscription::{CallbackRegistry, SubscriptionId};
use crate::types::{Qos, SwitchState};

/// QoS level used for the state topic subscription.
pub const STATE_QOS: Qos = Qos::AtLeastOnce;

/// QoS level used for command publishes.
pub const COMMAND_QOS: Qos = Qos::AtMostOnce;

/// A switch whose state mirrors an MQTT state topic.
///
/// The switch holds no background task of its own. Inbound messages are
/// delivered by the transport through the handler registered in
/// [`activate`](Self::activate), or by the host calling
/// [`on_message`](Self::on_message) directly.
pub struct BinaryMqttSwitch<T> {
    transport: T,
    inner: Arc<SwitchInner>,
}

struct SwitchInner {
    config: SwitchConfig,
    decoder: Arc<dyn StateDecoder>,
    state: RwLock<SwitchState>,
    subscription: Mutex<Option<TopicSubscription>>,
    /// Serializes activate and deactivate across their transport calls.
    lifecycle: AsyncMutex<()>,
    callbacks: CallbackRegistry,
}

impl SwitchInner {
    fn handle_message(&self, payload: &[u8]) {
        let state = self.decoder.decode(payload, self.config.attribute());
        tracing::debug!(
            topic = ?self.config.state_topic(),
            payload = %String::from_utf8_lossy(payload),
            state = %state,
            "Decoded switch state"
        );
        self.write_state(state);
    }

    fn write_state(&self, state: SwitchState) {
        *self.state.write() = state;
        self.callbacks.dispatch(state);
    }
}

impl<T: Transport> BinaryMqttSwitch<T> {
    /// Creates a switch in the `Unknown` state.
    ///
    /// Nothing is subscribed or published until [`activate`](Self::activate)
    /// or a command is called.
    pub fn new(config: SwitchConfig, transport: T) -> Self {
        let decoder: Arc<dyn StateDecoder> = match config.decoder() {
            Some(decoder) => Arc::clone(decoder),
            None => Arc::new(EqualityDecoder::new(
                config.payload_on(),
                config.payload_off(),
            )),
        };

        Self {
            transport,
            inner: Arc::new(SwitchInner {
                config,
                decoder,
                state: RwLock::new(SwitchState::Unknown),
                subscription: Mutex::new(None),
                lifecycle: AsyncMutex::new(()),
                callbacks: CallbackRegistry::new(),
            }),
        }
    }

    /// Subscribes to the state topic at QoS 1.
    ///
    /// Activating an already active switch does nothing. Concurrent calls
    /// are serialized, so at most one subscription is made.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingStateTopic` if no state topic is bound,
    /// or the transport's error if the subscription fails. Nothing is retried.
    pub async fn activate(&self) -> Result<()> {
        let topic = self.inner.config.require_state_topic()?;
        let _lifecycle = self.inner.lifecycle.lock().await;

        if self.is_subscribed() {
            tracing::debug!(topic = %topic, "Switch already active");
            return Ok(());
        }

        let weak: Weak<SwitchInner> = Arc::downgrade(&self.inner);
        let handler: MessageHandler = Arc::new(move |_topic: &str, payload: &[u8]| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_message(payload);
            }
        });

        let subscription = self.transport.subscribe(topic, STATE_QOS, handler).await?;
        *self.inner.subscription.lock() = Some(subscription);

        tracing::debug!(topic = %topic, "Switch activated");
        Ok(())
    }

    /// Removes the state topic subscription.
    ///
    /// The current state is kept. Deactivating an inactive switch does
    /// nothing.
    ///
    /// # Errors
    ///
    /// Returns the transport's error if the unsubscription fails; the switch
    /// then stays active and keeps receiving state messages.
    pub async fn deactivate(&self) -> Result<()> {
        let _lifecycle = self.inner.lifecycle.lock().await;
        let Some(subscription) = self.inner.subscription.lock().clone() else {
            return Ok(());
        };

        self.transport.unsubscribe(&subscription).await?;
        self.inner.subscription.lock().take();

        tracing::debug!(topic = %subscription.topic(), "Switch deactivated");
        Ok(())
    }

    /// Publishes the on payload to the command topic.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingStateTopic` if no state topic is bound,
    /// or the transport's error if the publish fails. The state is left
    /// untouched on failure.
    pub async fn turn_on(&self) -> Result<()> {
        self.send_command(true).await
    }

    /// Publishes the off payload to the command topic.
    ///
    /// # Errors
    ///
    /// Same as [`turn_on`](Self::turn_on).
    pub async fn turn_off(&self) -> Result<()> {
        self.send_command(false).await
    }

    /// Turns the switch off if it is on, otherwise on.
    ///
    /// # Errors
    ///
    /// Same as [`turn_on`](Self::turn_on).
    pub async fn toggle(&self) -> Result<()> {
        if self.state() == SwitchState::On {
            self.turn_off().await
        } else {
            self.turn_on().await
        }
    }

    async fn send_command(&self, on: bool) -> Result<()> {
        let config = &self.inner.config;
        let state_topic = config.require_state_topic()?;
        let command_topic = format!("{state_topic}{COMMAND_TOPIC_SUFFIX}");
        let payload = if on {
            config.payload_on()
        } else {
            config.payload_off()
        };

        self.transport
            .publish(&command_topic, payload.as_bytes(), COMMAND_QOS)
            .await?;

        tracing::debug!(topic = %command_topic, payload = %payload, "Switch command sent");

        if config.optimistic() {
            self.inner.write_state(SwitchState::from(on));
        }
        Ok(())
    }
}

impl<T> BinaryMqttSwitch<T> {
    /// Feeds an inbound state payload to the switch.
    ///
    /// This is what the transport handler calls; hosts delivering messages
    /// themselves call it directly. Observers are notified before returning.
    pub fn on_message(&self, payload: &[u8]) {
        self.inner.handle_message(payload);
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> SwitchState {
        *self.inner.state.read()
    }

    /// Returns `Some(true)`/`Some(false)` for on/off and `None` when unknown.
    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.state().is_on()
    }

    /// Returns `true` if a state topic is bound.
    ///
    /// The result does not depend on the optimistic flag or on whether the
    /// switch is activated.
    #[must_use]
    pub fn available(&self) -> bool {
        if self.inner.config.optimistic() {
            return self.inner.config.state_topic().is_some();
        }

        self.inner.config.state_topic().is_some()
    }

    /// Returns `true` if the displayed state is assumed rather than confirmed.
    #[must_use]
    pub fn assumed_state(&self) -> bool {
        self.inner.config.optimistic()
    }

    /// Returns `true` while the state topic subscription is active.
    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.inner.subscription.lock().is_some()
    }

    /// Returns the switch configuration.
    #[must_use]
    pub fn config(&self) -> &SwitchConfig {
        &self.inner.config
    }

    /// Returns the transport this switch publishes through.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Registers a callback invoked every time the state is written.
    ///
    /// The callback also fires when a message repeats the current state.
    pub fn on_state_changed<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(SwitchState) + Send + Sync + 'static,
    {
        self.inner.callbacks.on_state_changed(callback)
    }

    /// Unsubscribes a callback by its subscription ID.
    ///
    /// Returns `true` if the subscription was found and removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.callbacks.unsubscribe(id)
    }
}

impl<T> std::fmt::Debug for BinaryMqttSwitch<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinaryMqttSwitch")
            .field("config", &self.inner.config)
            .field("state", &self.state())
            .field("subscribed", &self.is_subscribed())
            .finish_non_exhaustive()
    }
}
