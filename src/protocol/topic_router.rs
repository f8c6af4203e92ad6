// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT topic routing for message handlers.
//!
//! The [`TopicRouter`] maps topic filters to the handlers registered on
//! them and dispatches incoming messages synchronously.
//!
//! ```text
//! MQTT Message: go-eCharger/012345/fup → true
//!                     ↓
//!             TopicRouter.route()
//!                     ↓
//!     Match "go-eCharger/012345/fup" against filters
//!                     ↓
//!        Clone matching handlers, release lock
//!                     ↓
//!           handler(topic, payload)
//!                     ↓
//!           Switch decodes and notifies observers
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::protocol::{MessageHandler, TopicSubscription};
use crate::subscription::SubscriptionId;

/// Routes MQTT messages to registered handlers.
#[derive(Default)]
pub struct TopicRouter {
    next_id: AtomicU64,
    /// Map from topic filter to its handlers.
    routes: RwLock<HashMap<String, HashMap<SubscriptionId, MessageHandler>>>,
}

impl TopicRouter {
    /// Creates a new empty topic router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for the given topic filter.
    ///
    /// Returns the registration and whether it is the first handler on that
    /// filter, in which case the broker subscription still has to be made.
    pub fn register(
        &self,
        filter: impl Into<String>,
        handler: MessageHandler,
    ) -> (TopicSubscription, bool) {
        let filter = filter.into();
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);

        let mut routes = self.routes.write();
        let handlers = routes.entry(filter.clone()).or_default();
        let first = handlers.is_empty();
        handlers.insert(id, handler);

        tracing::debug!(filter = %filter, id = %id, first, "Registering topic handler");
        (TopicSubscription::new(filter, id), first)
    }

    /// Unregisters a handler.
    ///
    /// Returns `true` if the handler was previously registered. Filters
    /// without any handler left are removed.
    pub fn unregister(&self, subscription: &TopicSubscription) -> bool {
        let mut routes = self.routes.write();
        let Some(handlers) = routes.get_mut(subscription.topic()) else {
            return false;
        };

        let removed = handlers.remove(&subscription.id()).is_some();
        if handlers.is_empty() {
            routes.remove(subscription.topic());
        }

        tracing::debug!(
            filter = %subscription.topic(),
            id = %subscription.id(),
            removed,
            "Unregistering topic handler"
        );
        removed
    }

    /// Routes a message to every handler whose filter matches `topic`.
    ///
    /// Handlers are invoked synchronously after the routing table lock is
    /// released. Returns the number of handlers invoked.
    pub fn route(&self, topic: &str, payload: &[u8]) -> usize {
        let handlers: Vec<MessageHandler> = {
            let routes = self.routes.read();
            routes
                .iter()
                .filter(|(filter, _)| topic_matches(filter, topic))
                .flat_map(|(_, handlers)| handlers.values().cloned())
                .collect()
        };

        if handlers.is_empty() {
            tracing::trace!(topic = %topic, "No handler registered for topic");
            return 0;
        }

        for handler in &handlers {
            handler(topic, payload);
        }
        handlers.len()
    }

    /// Returns `true` if the registration is still present.
    #[must_use]
    pub fn contains(&self, subscription: &TopicSubscription) -> bool {
        self.routes
            .read()
            .get(subscription.topic())
            .is_some_and(|handlers| handlers.contains_key(&subscription.id()))
    }

    /// Returns the number of handlers registered on a filter.
    #[must_use]
    pub fn handler_count(&self, filter: &str) -> usize {
        self.routes.read().get(filter).map_or(0, HashMap::len)
    }

    /// Returns the number of filters with at least one handler.
    #[must_use]
    pub fn filter_count(&self) -> usize {
        self.routes.read().len()
    }

    /// Returns all filters with at least one handler.
    #[must_use]
    pub fn filters(&self) -> Vec<String> {
        self.routes.read().keys().cloned().collect()
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.routes.write().clear();
    }
}

impl std::fmt::Debug for TopicRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicRouter")
            .field("filter_count", &self.filter_count())
            .finish()
    }
}

/// Returns `true` if the MQTT topic filter matches the topic name.
///
/// Supports the `+` single-level and `#` multi-level wildcards. Topics
/// starting with `$` are reserved for the broker and never match.
///
/// # Examples
///
/// ```
/// use goecharger_mqtt::protocol::topic_matches;
///
/// assert!(topic_matches("go-eCharger/+/fup", "go-eCharger/012345/fup"));
/// assert!(topic_matches("go-eCharger/#", "go-eCharger/012345/fup"));
/// assert!(!topic_matches("go-eCharger/+", "go-eCharger/012345/fup"));
/// ```
#[cfg(feature = "mqtt")]
#[must_use]
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    rumqttc::matches(topic, filter)
}

/// Returns `true` if the MQTT topic filter matches the topic name.
///
/// Supports the `+` single-level and `#` multi-level wildcards. Topics
/// starting with `$` are reserved for the broker and never match.
#[cfg(not(feature = "mqtt"))]
#[must_use]
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    if topic.starts_with('$') {
        return false;
    }

    let mut filter_levels = filter.split('/');
    let mut topic_levels = topic.split('/');

    loop {
        match (filter_levels.next(), topic_levels.next()) {
            (Some("#"), _) | (None, None) => return true,
            (Some("+"), Some(_)) => {}
            (Some(f), Some(t)) if f == t => {}
            _ => return false,
        }
    }
}
