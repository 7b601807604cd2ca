//! Tracing-backed vendor client.
//!
//! Emits every vendor call as a structured `tracing` event instead of
//! sending it over the network. Keeps just enough identity state to answer
//! [`VendorClient::distinct_id`] the way a real client would.

use crate::traits::{ClientFactory, GroupHandle, PeopleProfile, VendorClient};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};
use tally_protocol::ValueMap;
use tracing::info;

/// Counter for ensuring unique anonymous ids within the same nanosecond.
static ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate an anonymous distinct id.
fn generate_distinct_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    let counter = ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("anon_{:x}", timestamp.wrapping_add(counter))
}

/// A vendor client that logs calls.
#[derive(Debug)]
pub struct TracingClient {
    token: String,
    distinct_id: Mutex<String>,
}

impl TracingClient {
    /// Create a client for the given project token.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            distinct_id: Mutex::new(generate_distinct_id()),
        }
    }

    /// The project token.
    #[must_use]
    pub fn token(&self) -> &str {
        &self.token
    }

    fn set_distinct_id(&self, id: String) {
        *self.distinct_id.lock().unwrap_or_else(PoisonError::into_inner) = id;
    }
}

impl VendorClient for TracingClient {
    fn identify(&self, distinct_id: &str) {
        self.set_distinct_id(distinct_id.to_string());
        info!(token = %self.token, distinct_id, "identify");
    }

    fn alias(&self, alias: &str, original: Option<&str>) {
        info!(token = %self.token, alias, original = ?original, "alias");
    }

    fn distinct_id(&self) -> String {
        self.distinct_id
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn register_super_properties(&self, properties: &ValueMap) {
        info!(token = %self.token, %properties, "register_super_properties");
    }

    fn track(&self, event: &str, properties: &ValueMap) {
        info!(token = %self.token, event, %properties, "track");
    }

    fn flush(&self) {
        info!(token = %self.token, "flush");
    }

    fn reset(&self) {
        self.set_distinct_id(generate_distinct_id());
        info!(token = %self.token, "reset");
    }

    fn group(&self, group_key: &str, group_id: &str) -> Box<dyn GroupHandle> {
        Box::new(TracingGroup {
            token: self.token.clone(),
            group_key: group_key.to_string(),
            group_id: group_id.to_string(),
        })
    }

    fn set_group(&self, group_key: &str, group_id: &str) {
        info!(token = %self.token, group_key, group_id, "set_group");
    }

    fn people(&self) -> Arc<dyn PeopleProfile> {
        Arc::new(TracingPeople {
            token: self.token.clone(),
        })
    }
}

/// People handle of a [`TracingClient`].
#[derive(Debug)]
struct TracingPeople {
    token: String,
}

impl PeopleProfile for TracingPeople {
    fn identify(&self, distinct_id: &str) {
        info!(token = %self.token, distinct_id, "people.identify");
    }

    fn set(&self, properties: &ValueMap) {
        info!(token = %self.token, %properties, "people.set");
    }

    fn increment(&self, name: &str, amount: f64) {
        info!(token = %self.token, name, amount, "people.increment");
    }

    fn track_charge(&self, amount: f64, properties: &ValueMap) {
        info!(token = %self.token, amount, %properties, "people.track_charge");
    }
}

/// Group handle of a [`TracingClient`].
#[derive(Debug)]
struct TracingGroup {
    token: String,
    group_key: String,
    group_id: String,
}

impl GroupHandle for TracingGroup {
    fn set_once(&self, properties: &ValueMap) {
        info!(
            token = %self.token,
            group_key = %self.group_key,
            group_id = %self.group_id,
            %properties,
            "group.set_once"
        );
    }
}

/// Factory caching one [`TracingClient`] per token.
#[derive(Debug, Default)]
pub struct TracingFactory {
    instances: DashMap<String, Arc<TracingClient>>,
}

impl TracingFactory {
    /// Create an empty factory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct clients created so far.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

impl ClientFactory for TracingFactory {
    fn instance(&self, token: &str) -> Arc<dyn VendorClient> {
        self.instances
            .entry(token.to_string())
            .or_insert_with(|| {
                info!(token, "Creating vendor client");
                Arc::new(TracingClient::new(token))
            })
            .clone()
    }
}
