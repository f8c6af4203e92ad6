// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory transport for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::error::ProtocolError;
use crate::protocol::{MessageHandler, TopicRouter, TopicSubscription, Transport};
use crate::types::Qos;

/// A payload recorded by [`MockTransport::publish`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Published {
    pub topic: String,
    pub payload: Vec<u8>,
    pub qos: Qos,
}

#[derive(Default)]
struct MockInner {
    router: TopicRouter,
    published: Mutex<Vec<Published>>,
    subscribed: Mutex<Vec<(String, Qos)>>,
    unsubscribed: Mutex<Vec<String>>,
    fail_subscribe: AtomicBool,
    fail_unsubscribe: AtomicBool,
    fail_publish: AtomicBool,
}

/// Transport that records publishes and routes injected messages locally.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    inner: Arc<MockInner>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a message as if it arrived from the broker.
    pub fn deliver(&self, topic: &str, payload: &[u8]) -> usize {
        self.inner.router.route(topic, payload)
    }

    pub fn published(&self) -> Vec<Published> {
        self.inner.published.lock().clone()
    }

    pub fn subscribed(&self) -> Vec<(String, Qos)> {
        self.inner.subscribed.lock().clone()
    }

    pub fn unsubscribed(&self) -> Vec<String> {
        self.inner.unsubscribed.lock().clone()
    }

    pub fn handler_count(&self, topic: &str) -> usize {
        self.inner.router.handler_count(topic)
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        self.inner.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_unsubscribe(&self, fail: bool) {
        self.inner.fail_unsubscribe.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_publish(&self, fail: bool) {
        self.inner.fail_publish.store(fail, Ordering::SeqCst);
    }
}

impl Transport for MockTransport {
    async fn subscribe(
        &self,
        topic: &str,
        qos: Qos,
        handler: MessageHandler,
    ) -> Result<TopicSubscription, ProtocolError> {
        // Suspend like a real client does while the request is queued
        tokio::task::yield_now().await;
        if self.inner.fail_subscribe.load(Ordering::SeqCst) {
            return Err(ProtocolError::SubscribeFailed {
                topic: topic.to_string(),
                reason: "mock failure".to_string(),
            });
        }
        self.inner.subscribed.lock().push((topic.to_string(), qos));
        let (subscription, _) = self.inner.router.register(topic, handler);
        Ok(subscription)
    }

    async fn unsubscribe(&self, subscription: &TopicSubscription) -> Result<(), ProtocolError> {
        if self.inner.fail_unsubscribe.load(Ordering::SeqCst) {
            return Err(ProtocolError::UnsubscribeFailed {
                topic: subscription.topic().to_string(),
                reason: "mock failure".to_string(),
            });
        }
        self.inner.router.unregister(subscription);
        self.inner
            .unsubscribed
            .lock()
            .push(subscription.topic().to_string());
        Ok(())
    }

    async fn publish(&self, topic: &str, payload: &[u8], qos: Qos) -> Result<(), ProtocolError> {
        if self.inner.fail_publish.load(Ordering::SeqCst) {
            return Err(ProtocolError::PublishFailed {
                topic: topic.to_string(),
                reason: "mock failure".to_string(),
            });
        }
        self.inner.published.lock().push(Published {
            topic: topic.to_string(),
            payload: payload.to_vec(),
            qos,
        });
        Ok(())
    }
}
