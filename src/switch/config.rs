// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch configuration.

use std::sync::Arc;

use crate::decoder::StateDecoder;
use crate::error::ConfigError;

/// Suffix appended to the state topic to form the command topic.
pub const COMMAND_TOPIC_SUFFIX: &str = "/set";

/// Default payload that turns a go-eCharger setting on.
pub const DEFAULT_PAYLOAD_ON: &str = "true";

/// Default payload that turns a go-eCharger setting off.
pub const DEFAULT_PAYLOAD_OFF: &str = "false";

/// Immutable configuration of a [`BinaryMqttSwitch`](super::BinaryMqttSwitch).
///
/// # Examples
///
/// ```
/// use goecharger_mqtt::switch::SwitchConfig;
///
/// let config = SwitchConfig::new("charger/state")
///     .with_payloads("1", "0")
///     .with_optimistic(true);
///
/// assert_eq!(config.state_topic(), Some("charger/state"));
/// assert_eq!(config.command_topic().as_deref(), Some("charger/state/set"));
/// assert!(config.optimistic());
/// ```
#[derive(Clone)]
pub struct SwitchConfig {
    state_topic: Option<String>,
    name: Option<String>,
    payload_on: String,
    payload_off: String,
    optimistic: bool,
    attribute: Option<String>,
    decoder: Option<Arc<dyn StateDecoder>>,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self {
            state_topic: None,
            name: None,
            payload_on: DEFAULT_PAYLOAD_ON.to_string(),
            payload_off: DEFAULT_PAYLOAD_OFF.to_string(),
            optimistic: false,
            attribute: None,
            decoder: None,
        }
    }
}

impl SwitchConfig {
    /// Creates a configuration bound to `state_topic`.
    #[must_use]
    pub fn new(state_topic: impl Into<String>) -> Self {
        Self {
            state_topic: Some(state_topic.into()),
            ..Self::default()
        }
    }

    /// Creates a configuration without a state topic.
    ///
    /// Such a switch reports itself unavailable and cannot be activated.
    #[must_use]
    pub fn unbound() -> Self {
        Self::default()
    }

    /// Sets a display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the payloads published for on/off and matched by the default
    /// decoder.
    #[must_use]
    pub fn with_payloads(mut self, on: impl Into<String>, off: impl Into<String>) -> Self {
        self.payload_on = on.into();
        self.payload_off = off.into();
        self
    }

    /// Enables or disables optimistic state updates.
    #[must_use]
    pub fn with_optimistic(mut self, optimistic: bool) -> Self {
        self.optimistic = optimistic;
        self
    }

    /// Sets the attribute selector passed to the decoder.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Replaces the default equality decoding with a custom decoder.
    #[must_use]
    pub fn with_decoder<D>(mut self, decoder: D) -> Self
    where
        D: StateDecoder + 'static,
    {
        self.decoder = Some(Arc::new(decoder));
        self
    }

    /// Sets an already shared custom decoder.
    #[must_use]
    pub fn with_shared_decoder(mut self, decoder: Arc<dyn StateDecoder>) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Returns the state topic, or `None` if it is unset or empty.
    #[must_use]
    pub fn state_topic(&self) -> Option<&str> {
        self.state_topic.as_deref().filter(|topic| !topic.is_empty())
    }

    /// Returns the command topic derived from the state topic.
    #[must_use]
    pub fn command_topic(&self) -> Option<String> {
        self.state_topic()
            .map(|topic| format!("{topic}{COMMAND_TOPIC_SUFFIX}"))
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the payload that means "on".
    #[must_use]
    pub fn payload_on(&self) -> &str {
        &self.payload_on
    }

    /// Returns the payload that means "off".
    #[must_use]
    pub fn payload_off(&self) -> &str {
        &self.payload_off
    }

    /// Returns whether commands update the state without confirmation.
    #[must_use]
    pub fn optimistic(&self) -> bool {
        self.optimistic
    }

    /// Returns the attribute selector.
    #[must_use]
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Returns the custom decoder, if one is configured.
    #[must_use]
    pub fn decoder(&self) -> Option<&Arc<dyn StateDecoder>> {
        self.decoder.as_ref()
    }

    /// Returns the state topic, failing if none is bound or if it contains
    /// MQTT wildcards.
    pub(crate) fn require_state_topic(&self) -> Result<&str, ConfigError> {
        let topic = self.state_topic().ok_or(ConfigError::MissingStateTopic)?;
        if topic.contains(['+', '#']) {
            return Err(ConfigError::InvalidTopic(topic.to_string()));
        }
        Ok(topic)
    }
}

impl std::fmt::Debug for SwitchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchConfig")
            .field("state_topic", &self.state_topic)
            .field("name", &self.name)
            .field("payload_on", &self.payload_on)
            .field("payload_off", &self.payload_off)
            .field("optimistic", &self.optimistic)
            .field("attribute", &self.attribute)
            .field("custom_decoder", &self.decoder.is_some())
            .finish()
    }
}
