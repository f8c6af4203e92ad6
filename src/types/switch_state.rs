// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tri-valued switch state.

use std::fmt;

/// The mirrored state of a binary switch.
///
/// A switch starts out [`Unknown`](SwitchState::Unknown) and only becomes
/// `On` or `Off` once a state message was decoded or an optimistic command
/// succeeded. Payloads that cannot be decoded also yield `Unknown`.
///
/// # Examples
///
/// ```
/// use goecharger_mqtt::types::SwitchState;
///
/// assert_eq!(SwitchState::default(), SwitchState::Unknown);
/// assert_eq!(SwitchState::from(true), SwitchState::On);
/// assert_eq!(SwitchState::Off.is_on(), Some(false));
/// assert_eq!(SwitchState::Unknown.is_on(), None);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    /// The switch is on.
    On,
    /// The switch is off.
    Off,
    /// No valid state has been observed.
    #[default]
    Unknown,
}

impl SwitchState {
    /// Returns the lowercase name of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
            Self::Unknown => "unknown",
        }
    }

    /// Returns `Some(true)` for `On`, `Some(false)` for `Off` and `None`
    /// while the state is unknown.
    #[must_use]
    pub const fn is_on(&self) -> Option<bool> {
        match self {
            Self::On => Some(true),
            Self::Off => Some(false),
            Self::Unknown => None,
        }
    }

    /// Returns `true` if the state is `Unknown`.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for SwitchState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}

impl From<Option<bool>> for SwitchState {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Self::Unknown, Self::from)
    }
}
