// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the go-eCharger MQTT library.
//!
//! Transport failures (subscribe, publish, unsubscribe) and configuration
//! problems are the only failures surfaced to callers. Payloads that cannot
//! be decoded are never errors: they resolve to
//! [`SwitchState::Unknown`](crate::types::SwitchState::Unknown).

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred while talking to the MQTT transport.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The switch configuration does not allow the requested operation.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No switch is registered under the given key.
    #[error("switch not found: {0}")]
    SwitchNotFound(String),
}

/// Errors related to the MQTT transport.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The subscribe call was rejected by the transport.
    #[error("failed to subscribe to {topic}: {reason}")]
    SubscribeFailed {
        /// The topic filter that could not be subscribed.
        topic: String,
        /// Description of the failure.
        reason: String,
    },

    /// The publish call was rejected by the transport.
    #[error("failed to publish to {topic}: {reason}")]
    PublishFailed {
        /// The topic the payload was destined for.
        topic: String,
        /// Description of the failure.
        reason: String,
    },

    /// The unsubscribe call was rejected by the transport.
    #[error("failed to unsubscribe from {topic}: {reason}")]
    UnsubscribeFailed {
        /// The topic filter that could not be unsubscribed.
        topic: String,
        /// Description of the failure.
        reason: String,
    },

    /// MQTT client request failed.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    /// Connection to the broker failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The broker connection is not established.
    #[error("not connected to the broker")]
    NotConnected,
}

/// Errors related to switch configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The switch has no state topic bound.
    #[error("state topic is not set")]
    MissingStateTopic,

    /// The state topic cannot be used for publishing.
    #[error("invalid state topic: {0}")]
    InvalidTopic(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
