// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! go-eCharger switch setup.
//!
//! A go-eCharger publishes each of its API keys on
//! `<topic_prefix>/<serial_number>/<key>` and accepts writes on the same
//! topic suffixed with `/set`. [`ChargerSwitches`] builds one
//! [`BinaryMqttSwitch`](crate::switch::BinaryMqttSwitch) per enabled
//! [`SwitchDescription`].
//!
//! ```no_run
//! use goecharger_mqtt::charger::{ChargerConfig, ChargerSwitches, default_switches};
//! use goecharger_mqtt::protocol::MqttBroker;
//!
//! # async fn example() -> goecharger_mqtt::Result<()> {
//! let broker = MqttBroker::builder().host("192.168.1.50").build().await?;
//! let charger = ChargerConfig::new("012345");
//!
//! let switches = ChargerSwitches::new(&charger, broker, default_switches());
//! switches.activate_all().await?;
//! switches.turn_on("fup").await?;
//! # Ok(())
//! # }
//! ```

mod description;
mod setup;

pub use description::{SwitchDescription, default_switches};
pub use setup::ChargerSwitches;

use serde::{Deserialize, Serialize};

/// Default MQTT topic prefix of go-eCharger devices.
pub const DEFAULT_TOPIC_PREFIX: &str = "go-eCharger";

fn default_topic_prefix() -> String {
    DEFAULT_TOPIC_PREFIX.to_string()
}

/// Identity of a charger on the broker.
///
/// # Examples
///
/// ```
/// use goecharger_mqtt::charger::ChargerConfig;
///
/// let config: ChargerConfig = serde_json::from_str(r#"{"serial_number":"012345"}"#).unwrap();
/// assert_eq!(config.topic_for("fup"), "go-eCharger/012345/fup");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargerConfig {
    /// Topic prefix configured on the charger.
    #[serde(default = "default_topic_prefix")]
    pub topic_prefix: String,
    /// Serial number of the charger.
    pub serial_number: String,
}

impl ChargerConfig {
    /// Creates a configuration with the default topic prefix.
    #[must_use]
    pub fn new(serial_number: impl Into<String>) -> Self {
        Self {
            topic_prefix: default_topic_prefix(),
            serial_number: serial_number.into(),
        }
    }

    /// Sets a custom topic prefix.
    #[must_use]
    pub fn with_topic_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.topic_prefix = prefix.into();
        self
    }

    /// Returns `<topic_prefix>/<serial_number>`.
    #[must_use]
    pub fn base_topic(&self) -> String {
        format!("{}/{}", self.topic_prefix, self.serial_number)
    }

    /// Returns the state topic of an API key.
    #[must_use]
    pub fn topic_for(&self, key: &str) -> String {
        format!("{}/{key}", self.base_topic())
    }
}
