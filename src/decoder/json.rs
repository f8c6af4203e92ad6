// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Decoder for structured JSON state payloads.

use serde_json::Value;

use super::StateDecoder;
use crate::types::SwitchState;

/// Extracts a boolean-like field from a JSON payload.
///
/// With an attribute selector the field of that name is read from the
/// top-level object; without one the whole document is interpreted.
/// Recognized values:
///
/// - booleans
/// - numbers (`0` is off, anything else is on)
/// - the strings `on`/`off`, `true`/`false`, `1`/`0` (case-insensitive)
///
/// Everything else, including invalid JSON and missing fields, decodes to
/// [`SwitchState::Unknown`].
///
/// # Examples
///
/// ```
/// use goecharger_mqtt::decoder::{JsonFieldDecoder, StateDecoder};
/// use goecharger_mqtt::types::SwitchState;
///
/// let decoder = JsonFieldDecoder;
/// assert_eq!(decoder.decode(br#"{"state":"on"}"#, Some("state")), SwitchState::On);
/// assert_eq!(decoder.decode(b"false", None), SwitchState::Off);
/// assert_eq!(decoder.decode(b"not json", None), SwitchState::Unknown);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JsonFieldDecoder;

impl StateDecoder for JsonFieldDecoder {
    fn decode(&self, payload: &[u8], attribute: Option<&str>) -> SwitchState {
        let Ok(document) = serde_json::from_slice::<Value>(payload) else {
            return SwitchState::Unknown;
        };

        let value = match attribute {
            Some(key) => document.get(key),
            None => Some(&document),
        };

        value.map_or(SwitchState::Unknown, value_to_state)
    }
}

fn value_to_state(value: &Value) -> SwitchState {
    match value {
        Value::Bool(b) => SwitchState::from(*b),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => SwitchState::Off,
            Some(_) => SwitchState::On,
            None => SwitchState::Unknown,
        },
        Value::String(s) => match s.to_ascii_lowercase().as_str() {
            "on" | "true" | "1" => SwitchState::On,
            "off" | "false" | "0" => SwitchState::Off,
            _ => SwitchState::Unknown,
        },
        Value::Null | Value::Array(_) | Value::Object(_) => SwitchState::Unknown,
    }
}
