// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Observer subscriptions for switch state changes.
//!
//! Every time a switch writes its state (after a decoded MQTT message or an
//! optimistic command) the registered callbacks are called synchronously
//! with the new [`SwitchState`](crate::types::SwitchState).
//!
//! ```ignore
//! let sub_id = switch.on_state_changed(|state| {
//!     println!("charger switch is now {state}");
//! });
//!
//! // Later, unsubscribe
//! switch.unsubscribe(sub_id);
//! ```

mod callback;

pub use callback::{CallbackRegistry, SubscriptionId};
