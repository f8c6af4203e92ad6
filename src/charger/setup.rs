// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switch set of one charger.

use super::{ChargerConfig, SwitchDescription};
use crate::error::{Error, Result};
use crate::protocol::Transport;
use crate::switch::BinaryMqttSwitch;

/// The switches of one charger, keyed by API key.
///
/// Switches keep the order of the descriptions they were built from.
pub struct ChargerSwitches<T> {
    charger: ChargerConfig,
    switches: Vec<(String, BinaryMqttSwitch<T>)>,
}

impl<T: Transport + Clone> ChargerSwitches<T> {
    /// Builds one switch per description that is not disabled.
    ///
    /// Nothing is subscribed until [`activate_all`](Self::activate_all).
    pub fn new(
        charger: &ChargerConfig,
        transport: T,
        descriptions: impl IntoIterator<Item = SwitchDescription>,
    ) -> Self {
        let switches = descriptions
            .into_iter()
            .filter(|description| {
                if description.disabled {
                    tracing::debug!(key = %description.key, "Skipping disabled switch");
                }
                !description.disabled
            })
            .map(|description| {
                let switch = BinaryMqttSwitch::new(description.to_config(charger), transport.clone());
                (description.key, switch)
            })
            .collect();

        Self {
            charger: charger.clone(),
            switches,
        }
    }

    /// Activates every switch in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failure and returns it. Switches activated before
    /// the failure stay active.
    pub async fn activate_all(&self) -> Result<()> {
        for (key, switch) in &self.switches {
            switch.activate().await.inspect_err(|e| {
                tracing::warn!(key = %key, error = %e, "Failed to activate switch");
            })?;
        }

        tracing::debug!(
            charger = %self.charger.serial_number,
            count = self.switches.len(),
            "Charger switches activated"
        );
        Ok(())
    }

    /// Deactivates every switch in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failure and returns it.
    pub async fn deactivate_all(&self) -> Result<()> {
        for (_, switch) in &self.switches {
            switch.deactivate().await?;
        }
        Ok(())
    }

    /// Turns on the switch registered under `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::SwitchNotFound` for an unknown key, otherwise the
    /// switch's command error.
    pub async fn turn_on(&self, key: &str) -> Result<()> {
        self.require(key)?.turn_on().await
    }

    /// Turns off the switch registered under `key`.
    ///
    /// # Errors
    ///
    /// Returns `Error::SwitchNotFound` for an unknown key, otherwise the
    /// switch's command error.
    pub async fn turn_off(&self, key: &str) -> Result<()> {
        self.require(key)?.turn_off().await
    }
}

impl<T> ChargerSwitches<T> {
    /// Returns the charger this set belongs to.
    #[must_use]
    pub fn charger(&self) -> &ChargerConfig {
        &self.charger
    }

    /// Returns the switch registered under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&BinaryMqttSwitch<T>> {
        self.switches
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, switch)| switch)
    }

    /// Returns the switch registered under `key`, or `Error::SwitchNotFound`.
    ///
    /// # Errors
    ///
    /// Returns `Error::SwitchNotFound` if no switch uses `key`.
    pub fn require(&self, key: &str) -> Result<&BinaryMqttSwitch<T>> {
        self.get(key)
            .ok_or_else(|| Error::SwitchNotFound(key.to_string()))
    }

    /// Iterates over `(key, switch)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BinaryMqttSwitch<T>)> {
        self.switches
            .iter()
            .map(|(key, switch)| (key.as_str(), switch))
    }

    /// Returns the keys of all switches.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.switches.iter().map(|(key, _)| key.as_str()).collect()
    }

    /// Returns the number of switches.
    #[must_use]
    pub fn len(&self) -> usize {
        self.switches.len()
    }

    /// Returns `true` if no switch was built.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.switches.is_empty()
    }
}

impl<T> std::fmt::Debug for ChargerSwitches<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChargerSwitches")
            .field("charger", &self.charger)
            .field("keys", &self.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charger::default_switches;
    use crate::error::ProtocolError;
    use crate::protocol::mock::MockTransport;
    use crate::types::{Qos, SwitchState};

    fn charger() -> ChargerConfig {
        ChargerConfig::new("012345")
    }

    #[test]
    fn skips_disabled_descriptions() {
        let descriptions = vec![
            SwitchDescription::new("fup", "Use PV surplus"),
            SwitchDescription::new("su", "Simulate unplugging").disabled(),
            SwitchDescription::new("lse", "LED save energy"),
        ];

        let switches = ChargerSwitches::new(&charger(), MockTransport::new(), descriptions);

        assert_eq!(switches.keys(), vec!["fup", "lse"]);
        assert_eq!(switches.len(), 2);
        assert!(switches.get("su").is_none());
    }

    #[test]
    fn default_catalogue_builds_all() {
        let switches = ChargerSwitches::new(&charger(), MockTransport::new(), default_switches());
        assert_eq!(switches.len(), default_switches().len());
        assert!(switches.iter().all(|(_, switch)| switch.available()));
    }

    #[test]
    fn empty_set() {
        let switches = ChargerSwitches::new(&charger(), MockTransport::new(), Vec::new());
        assert!(switches.is_empty());
    }

    #[tokio::test]
    async fn activate_all_subscribes_each_topic() {
        let transport = MockTransport::new();
        let descriptions = vec![
            SwitchDescription::new("fup", "Use PV surplus"),
            SwitchDescription::new("bac", "Allow current change by button"),
        ];
        let switches = ChargerSwitches::new(&charger(), transport.clone(), descriptions);

        switches.activate_all().await.unwrap();

        assert_eq!(
            transport.subscribed(),
            vec![
                ("go-eCharger/012345/fup".to_string(), Qos::AtLeastOnce),
                ("go-eCharger/012345/bac".to_string(), Qos::AtLeastOnce),
            ]
        );

        transport.deliver("go-eCharger/012345/fup", b"true");
        transport.deliver("go-eCharger/012345/bac", b"false");
        assert_eq!(switches.get("fup").unwrap().state(), SwitchState::On);
        assert_eq!(switches.get("bac").unwrap().state(), SwitchState::Off);

        switches.deactivate_all().await.unwrap();
        assert!(switches.iter().all(|(_, switch)| !switch.is_subscribed()));
    }

    #[tokio::test]
    async fn activate_all_propagates_failure() {
        let transport = MockTransport::new();
        transport.set_fail_subscribe(true);
        let switches = ChargerSwitches::new(&charger(), transport, default_switches());

        let result = switches.activate_all().await;

        assert!(matches!(
            result,
            Err(Error::Protocol(ProtocolError::SubscribeFailed { .. }))
        ));
    }

    #[tokio::test]
    async fn turn_on_by_key() {
        let transport = MockTransport::new();
        let switches = ChargerSwitches::new(&charger(), transport.clone(), default_switches());

        switches.turn_on("fup").await.unwrap();
        switches.turn_off("fup").await.unwrap();

        let published = transport.published();
        assert_eq!(published.len(), 2);
        assert_eq!(published[0].topic, "go-eCharger/012345/fup/set");
        assert_eq!(published[0].payload, b"true");
        assert_eq!(published[1].payload, b"false");
    }

    #[tokio::test]
    async fn unknown_key_fails() {
        let switches = ChargerSwitches::new(&charger(), MockTransport::new(), default_switches());

        let result = switches.turn_on("nope").await;

        assert!(matches!(result, Err(Error::SwitchNotFound(key)) if key == "nope"));
    }
}
