// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Descriptions of the boolean charger settings exposed as switches.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::ChargerConfig;
use crate::decoder::StateDecoder;
use crate::switch::{DEFAULT_PAYLOAD_OFF, DEFAULT_PAYLOAD_ON, SwitchConfig};

fn default_payload_on() -> String {
    DEFAULT_PAYLOAD_ON.to_string()
}

fn default_payload_off() -> String {
    DEFAULT_PAYLOAD_OFF.to_string()
}

/// Static description of one charger switch.
///
/// The state topic of the switch is `<topic_prefix>/<serial_number>/<key>`.
///
/// # Examples
///
/// ```
/// use goecharger_mqtt::charger::{ChargerConfig, SwitchDescription};
///
/// let description = SwitchDescription::new("fup", "Use PV surplus");
/// let charger = ChargerConfig::new("012345");
///
/// let config = description.to_config(&charger);
/// assert_eq!(config.state_topic(), Some("go-eCharger/012345/fup"));
/// assert_eq!(description.unique_id("012345"), "012345-fup");
/// ```
#[derive(Clone, Serialize, Deserialize)]
pub struct SwitchDescription {
    /// API key of the setting, used as the last topic level.
    pub key: String,
    /// Human readable name.
    pub name: String,
    /// Payload meaning "on".
    #[serde(default = "default_payload_on")]
    pub payload_on: String,
    /// Payload meaning "off".
    #[serde(default = "default_payload_off")]
    pub payload_off: String,
    /// Whether commands update the state without waiting for the echo.
    #[serde(default)]
    pub optimistic: bool,
    /// Attribute selector passed to the decoder.
    #[serde(default)]
    pub attribute: Option<String>,
    /// Disabled descriptions are skipped during setup.
    #[serde(default)]
    pub disabled: bool,
    /// Custom decoder replacing the equality check.
    #[serde(skip)]
    pub decoder: Option<Arc<dyn StateDecoder>>,
}

impl SwitchDescription {
    /// Creates an enabled, non-optimistic description with the default
    /// `true`/`false` payloads.
    #[must_use]
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            payload_on: default_payload_on(),
            payload_off: default_payload_off(),
            optimistic: false,
            attribute: None,
            disabled: false,
            decoder: None,
        }
    }

    /// Sets the on/off payloads.
    #[must_use]
    pub fn with_payloads(mut self, on: impl Into<String>, off: impl Into<String>) -> Self {
        self.payload_on = on.into();
        self.payload_off = off.into();
        self
    }

    /// Enables optimistic state updates.
    #[must_use]
    pub fn optimistic(mut self) -> Self {
        self.optimistic = true;
        self
    }

    /// Marks the description as disabled.
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Sets a custom decoder and its attribute selector.
    #[must_use]
    pub fn with_decoder<D>(mut self, decoder: D, attribute: Option<&str>) -> Self
    where
        D: StateDecoder + 'static,
    {
        self.decoder = Some(Arc::new(decoder));
        self.attribute = attribute.map(str::to_string);
        self
    }

    /// Returns the unique ID of the switch on a given charger.
    #[must_use]
    pub fn unique_id(&self, serial_number: &str) -> String {
        format!("{serial_number}-{}", self.key)
    }

    /// Builds the switch configuration for a given charger.
    #[must_use]
    pub fn to_config(&self, charger: &ChargerConfig) -> SwitchConfig {
        let mut config = SwitchConfig::new(charger.topic_for(&self.key))
            .with_name(self.name.clone())
            .with_payloads(self.payload_on.clone(), self.payload_off.clone())
            .with_optimistic(self.optimistic);

        if let Some(attribute) = &self.attribute {
            config = config.with_attribute(attribute.clone());
        }
        if let Some(decoder) = &self.decoder {
            config = config.with_shared_decoder(Arc::clone(decoder));
        }
        config
    }
}

impl std::fmt::Debug for SwitchDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchDescription")
            .field("key", &self.key)
            .field("name", &self.name)
            .field("payload_on", &self.payload_on)
            .field("payload_off", &self.payload_off)
            .field("optimistic", &self.optimistic)
            .field("attribute", &self.attribute)
            .field("disabled", &self.disabled)
            .field("custom_decoder", &self.decoder.is_some())
            .finish()
    }
}

/// Returns the built-in catalogue of go-eCharger boolean settings.
#[must_use]
pub fn default_switches() -> Vec<SwitchDescription> {
    vec![
        SwitchDescription::new("bac", "Allow current change by button"),
        SwitchDescription::new("fup", "Use PV surplus"),
        SwitchDescription::new("acp", "Allow charge pause"),
        SwitchDescription::new("nmo", "Norway mode"),
        SwitchDescription::new("lse", "LED save energy"),
        SwitchDescription::new("su", "Simulate unplugging"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::JsonFieldDecoder;
    use crate::types::SwitchState;

    #[test]
    fn default_catalogue_is_enabled_and_unique() {
        let switches = default_switches();
        assert!(!switches.is_empty());
        assert!(switches.iter().all(|s| !s.disabled));

        let mut keys: Vec<&str> = switches.iter().map(|s| s.key.as_str()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), switches.len());
    }

    #[test]
    fn to_config_carries_settings() {
        let description = SwitchDescription::new("fup", "Use PV surplus")
            .with_payloads("1", "0")
            .optimistic();
        let config = description.to_config(&ChargerConfig::new("012345"));

        assert_eq!(config.state_topic(), Some("go-eCharger/012345/fup"));
        assert_eq!(config.name(), Some("Use PV surplus"));
        assert_eq!(config.payload_on(), "1");
        assert_eq!(config.payload_off(), "0");
        assert!(config.optimistic());
        assert!(config.decoder().is_none());
    }

    #[test]
    fn to_config_carries_decoder() {
        let description = SwitchDescription::new("alw", "Car allowed to charge")
            .with_decoder(JsonFieldDecoder, Some("alw"));
        let config = description.to_config(&ChargerConfig::new("012345"));

        assert_eq!(config.attribute(), Some("alw"));
        let decoder = config.decoder().unwrap();
        assert_eq!(
            decoder.decode(br#"{"alw":true}"#, config.attribute()),
            SwitchState::On
        );
    }

    #[test]
    fn deserialize_with_defaults() {
        let description: SwitchDescription =
            serde_json::from_str(r#"{"key":"fup","name":"Use PV surplus"}"#).unwrap();

        assert_eq!(description.payload_on, "true");
        assert_eq!(description.payload_off, "false");
        assert!(!description.optimistic);
        assert!(!description.disabled);
        assert!(description.attribute.is_none());
        assert!(description.decoder.is_none());
    }

    #[test]
    fn deserialize_full() {
        let description: SwitchDescription = serde_json::from_str(
            r#"{"key":"acs","name":"Access control","payload_on":"1","payload_off":"0","optimistic":true,"disabled":true}"#,
        )
        .unwrap();

        assert_eq!(description.payload_on, "1");
        assert!(description.optimistic);
        assert!(description.disabled);
    }

    #[test]
    fn unique_id_combines_serial_and_key() {
        let description = SwitchDescription::new("lse", "LED save energy");
        assert_eq!(description.unique_id("987654"), "987654-lse");
    }
}
