// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! go-eCharger MQTT switches.
//!
//! This library mirrors the boolean settings of a go-eCharger wallbox as
//! on/off switches over MQTT. Each switch follows the charger's state topic
//! and sends commands to the same topic suffixed with `/set`.
//!
//! # Features
//!
//! - **Tri-state mirroring**: `On`, `Off` or `Unknown` until the charger reports
//! - **Optimistic mode**: assume a commanded state without waiting for the echo
//! - **Custom decoders**: map structured payloads (e.g. JSON fields) to a state
//! - **Observers**: synchronous callbacks on every state write
//!
//! # Quick Start
//!
//! ```no_run
//! use goecharger_mqtt::{BinaryMqttSwitch, MqttBroker, SwitchConfig};
//!
//! #[tokio::main]
//! async fn main() -> goecharger_mqtt::Result<()> {
//!     let broker = MqttBroker::builder()
//!         .host("192.168.1.50")
//!         .credentials("user", "password")
//!         .build()
//!         .await?;
//!
//!     let switch = BinaryMqttSwitch::new(
//!         SwitchConfig::new("go-eCharger/012345/fup"),
//!         broker,
//!     );
//!
//!     switch.on_state_changed(|state| println!("PV surplus charging: {state}"));
//!     switch.activate().await?;
//!
//!     switch.turn_on().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Whole charger
//!
//! ```no_run
//! use goecharger_mqtt::charger::{ChargerConfig, ChargerSwitches, default_switches};
//! use goecharger_mqtt::MqttBroker;
//!
//! #[tokio::main]
//! async fn main() -> goecharger_mqtt::Result<()> {
//!     let broker = MqttBroker::builder().url("mqtt://192.168.1.50:1883")?.build().await?;
//!
//!     let switches = ChargerSwitches::new(
//!         &ChargerConfig::new("012345"),
//!         broker,
//!         default_switches(),
//!     );
//!     switches.activate_all().await?;
//!
//!     for (key, switch) in switches.iter() {
//!         println!("{key}: {}", switch.state());
//!     }
//!     Ok(())
//! }
//! ```

pub mod charger;
pub mod decoder;
pub mod error;
pub mod protocol;
pub mod subscription;
pub mod switch;
pub mod types;

pub use charger::{ChargerConfig, ChargerSwitches, SwitchDescription};
pub use decoder::{EqualityDecoder, JsonFieldDecoder, StateDecoder};
pub use error::{ConfigError, Error, ProtocolError, Result};
#[cfg(feature = "mqtt")]
pub use protocol::{MqttBroker, MqttBrokerBuilder, MqttBrokerConfig};
pub use protocol::{MessageHandler, TopicRouter, TopicSubscription, Transport};
pub use subscription::{CallbackRegistry, SubscriptionId};
pub use switch::{BinaryMqttSwitch, SwitchConfig};
pub use types::{Qos, SwitchState};
