// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Payload decoders turning raw MQTT payloads into a [`SwitchState`].
//!
//! A switch always decodes through exactly one [`StateDecoder`]. Unless a
//! custom decoder is configured, it uses an [`EqualityDecoder`] built from
//! the configured on/off payloads.
//!
//! # Custom decoders
//!
//! Any closure with the signature `Fn(&[u8], Option<&str>) -> SwitchState`
//! is a decoder. The second argument is the switch's attribute selector,
//! passed through untouched.
//!
//! ```
//! use goecharger_mqtt::decoder::StateDecoder;
//! use goecharger_mqtt::types::SwitchState;
//!
//! let decoder = |payload: &[u8], _attribute: Option<&str>| {
//!     SwitchState::from(payload.first() == Some(&b'1'))
//! };
//!
//! assert_eq!(decoder.decode(b"1", None), SwitchState::On);
//! assert_eq!(decoder.decode(b"0", None), SwitchState::Off);
//! ```

mod json;

pub use json::JsonFieldDecoder;

use crate::types::SwitchState;

/// Strategy for decoding an inbound state payload.
///
/// Implementations must be deterministic: decoding the same payload twice
/// yields the same state, which makes duplicate QoS 1 deliveries harmless.
/// Unrecognized input maps to [`SwitchState::Unknown`] rather than an error.
pub trait StateDecoder: Send + Sync {
    /// Decodes `payload`, optionally guided by the attribute selector.
    fn decode(&self, payload: &[u8], attribute: Option<&str>) -> SwitchState;
}

impl<F> StateDecoder for F
where
    F: Fn(&[u8], Option<&str>) -> SwitchState + Send + Sync,
{
    fn decode(&self, payload: &[u8], attribute: Option<&str>) -> SwitchState {
        self(payload, attribute)
    }
}

/// Default decoder comparing the payload byte-for-byte.
///
/// No trimming, case folding or partial matching is performed.
///
/// # Examples
///
/// ```
/// use goecharger_mqtt::decoder::{EqualityDecoder, StateDecoder};
/// use goecharger_mqtt::types::SwitchState;
///
/// let decoder = EqualityDecoder::new("true", "false");
/// assert_eq!(decoder.decode(b"true", None), SwitchState::On);
/// assert_eq!(decoder.decode(b"TRUE", None), SwitchState::Unknown);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EqualityDecoder {
    payload_on: String,
    payload_off: String,
}

impl EqualityDecoder {
    /// Creates a decoder for the given on/off payloads.
    #[must_use]
    pub fn new(payload_on: impl Into<String>, payload_off: impl Into<String>) -> Self {
        Self {
            payload_on: payload_on.into(),
            payload_off: payload_off.into(),
        }
    }

    /// Returns the payload that decodes to `On`.
    #[must_use]
    pub fn payload_on(&self) -> &str {
        &self.payload_on
    }

    /// Returns the payload that decodes to `Off`.
    #[must_use]
    pub fn payload_off(&self) -> &str {
        &self.payload_off
    }
}

impl StateDecoder for EqualityDecoder {
    fn decode(&self, payload: &[u8], _attribute: Option<&str>) -> SwitchState {
        if payload == self.payload_on.as_bytes() {
            SwitchState::On
        } else if payload == self.payload_off.as_bytes() {
            SwitchState::Off
        } else {
            SwitchState::Unknown
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_decoder_exact_matches() {
        let decoder = EqualityDecoder::new("1", "0");
        assert_eq!(decoder.decode(b"1", None), SwitchState::On);
        assert_eq!(decoder.decode(b"0", None), SwitchState::Off);
        assert_eq!(decoder.decode(b"x", None), SwitchState::Unknown);
    }

    #[test]
    fn equality_decoder_no_normalization() {
        let decoder = EqualityDecoder::new("on", "off");
        assert_eq!(decoder.decode(b" on", None), SwitchState::Unknown);
        assert_eq!(decoder.decode(b"on\n", None), SwitchState::Unknown);
        assert_eq!(decoder.decode(b"ON", None), SwitchState::Unknown);
        assert_eq!(decoder.decode(b"o", None), SwitchState::Unknown);
        assert_eq!(decoder.decode(b"", None), SwitchState::Unknown);
    }

    #[test]
    fn equality_decoder_ignores_attribute() {
        let decoder = EqualityDecoder::new("true", "false");
        assert_eq!(decoder.decode(b"true", Some("state")), SwitchState::On);
    }

    #[test]
    fn equality_decoder_non_utf8_payload() {
        let decoder = EqualityDecoder::new("true", "false");
        assert_eq!(decoder.decode(&[0xff, 0xfe], None), SwitchState::Unknown);
    }

    #[test]
    fn closure_receives_attribute() {
        let decoder = |_payload: &[u8], attribute: Option<&str>| {
            if attribute == Some("alw") {
                SwitchState::On
            } else {
                SwitchState::Off
            }
        };
        assert_eq!(decoder.decode(b"", Some("alw")), SwitchState::On);
        assert_eq!(decoder.decode(b"", None), SwitchState::Off);
    }
}
