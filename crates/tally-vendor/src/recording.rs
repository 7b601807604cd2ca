//! Recording vendor client.
//!
//! Every call made on the client, its people handle, its group handles and
//! its factory is appended to a shared [`Journal`] in call order.

use crate::traits::{ClientFactory, GroupHandle, PeopleProfile, VendorClient};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tally_protocol::ValueMap;

/// Distinct id reported by a recording client unless configured otherwise.
pub const DEFAULT_DISTINCT_ID: &str = "vendor-distinct-id";

/// A single recorded vendor call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    GetInstance { token: String },
    Identify { distinct_id: String },
    Alias { alias: String, original: Option<String> },
    GetDistinctId,
    RegisterSuperProperties(ValueMap),
    Track { event: String, properties: ValueMap },
    Flush,
    Reset,
    GetGroup { group_key: String, group_id: String },
    SetGroup { group_key: String, group_id: String },
    GroupSetOnce { group_key: String, group_id: String, properties: ValueMap },
    GetPeople,
    PeopleIdentify { distinct_id: String },
    PeopleSet(ValueMap),
    PeopleIncrement { name: String, amount: f64 },
    PeopleTrackCharge { amount: f64, properties: ValueMap },
}

/// Shared, ordered log of calls.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<Call>>>);

impl Journal {
    /// Create an empty journal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a call.
    pub fn record(&self, call: Call) {
        self.lock().push(call);
    }

    /// Snapshot of all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().clone()
    }

    /// The most recent call.
    #[must_use]
    pub fn last(&self) -> Option<Call> {
        self.lock().last().cloned()
    }

    /// Remove and return all recorded calls.
    pub fn take(&self) -> Vec<Call> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// A vendor client that records calls instead of sending them.
#[derive(Debug, Clone)]
pub struct RecordingClient {
    journal: Journal,
    distinct_id: String,
}

impl RecordingClient {
    /// Create a client with its own journal.
    #[must_use]
    pub fn new() -> Self {
        Self::with_journal(Journal::new())
    }

    /// Create a client recording into an existing journal.
    #[must_use]
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            distinct_id: DEFAULT_DISTINCT_ID.to_string(),
        }
    }

    /// Set the distinct id reported by [`VendorClient::distinct_id`].
    #[must_use]
    pub fn with_distinct_id(mut self, distinct_id: impl Into<String>) -> Self {
        self.distinct_id = distinct_id.into();
        self
    }

    /// The journal this client records into.
    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }
}

impl Default for RecordingClient {
    fn default() -> Self {
        Self::new()
    }
}

impl VendorClient for RecordingClient {
    fn identify(&self, distinct_id: &str) {
        self.journal.record(Call::Identify {
            distinct_id: distinct_id.to_string(),
        });
    }

    fn alias(&self, alias: &str, original: Option<&str>) {
        self.journal.record(Call::Alias {
            alias: alias.to_string(),
            original: original.map(str::to_string),
        });
    }

    fn distinct_id(&self) -> String {
        self.journal.record(Call::GetDistinctId);
        self.distinct_id.clone()
    }

    fn register_super_properties(&self, properties: &ValueMap) {
        self.journal
            .record(Call::RegisterSuperProperties(properties.clone()));
    }

    fn track(&self, event: &str, properties: &ValueMap) {
        self.journal.record(Call::Track {
            event: event.to_string(),
            properties: properties.clone(),
        });
    }

    fn flush(&self) {
        self.journal.record(Call::Flush);
    }

    fn reset(&self) {
        self.journal.record(Call::Reset);
    }

    fn group(&self, group_key: &str, group_id: &str) -> Box<dyn GroupHandle> {
        self.journal.record(Call::GetGroup {
            group_key: group_key.to_string(),
            group_id: group_id.to_string(),
        });
        Box::new(RecordingGroup {
            journal: self.journal.clone(),
            group_key: group_key.to_string(),
            group_id: group_id.to_string(),
        })
    }

    fn set_group(&self, group_key: &str, group_id: &str) {
        self.journal.record(Call::SetGroup {
            group_key: group_key.to_string(),
            group_id: group_id.to_string(),
        });
    }

    fn people(&self) -> Arc<dyn PeopleProfile> {
        self.journal.record(Call::GetPeople);
        Arc::new(RecordingPeople {
            journal: self.journal.clone(),
        })
    }
}

/// People handle of a [`RecordingClient`].
#[derive(Debug, Clone)]
pub struct RecordingPeople {
    journal: Journal,
}

impl PeopleProfile for RecordingPeople {
    fn identify(&self, distinct_id: &str) {
        self.journal.record(Call::PeopleIdentify {
            distinct_id: distinct_id.to_string(),
        });
    }

    fn set(&self, properties: &ValueMap) {
        self.journal.record(Call::PeopleSet(properties.clone()));
    }

    fn increment(&self, name: &str, amount: f64) {
        self.journal.record(Call::PeopleIncrement {
            name: name.to_string(),
            amount,
        });
    }

    fn track_charge(&self, amount: f64, properties: &ValueMap) {
        self.journal.record(Call::PeopleTrackCharge {
            amount,
            properties: properties.clone(),
        });
    }
}

/// Group handle of a [`RecordingClient`].
#[derive(Debug, Clone)]
pub struct RecordingGroup {
    journal: Journal,
    group_key: String,
    group_id: String,
}

impl GroupHandle for RecordingGroup {
    fn set_once(&self, properties: &ValueMap) {
        self.journal.record(Call::GroupSetOnce {
            group_key: self.group_key.clone(),
            group_id: self.group_id.clone(),
            properties: properties.clone(),
        });
    }
}

/// Factory handing out a single shared [`RecordingClient`].
#[derive(Debug, Clone)]
pub struct RecordingFactory {
    client: Arc<RecordingClient>,
}

impl RecordingFactory {
    /// Create a factory with a fresh client and journal.
    #[must_use]
    pub fn new() -> Self {
        Self::with_client(RecordingClient::new())
    }

    /// Create a factory around an existing client.
    #[must_use]
    pub fn with_client(client: RecordingClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// The journal shared by the factory and its client.
    #[must_use]
    pub fn journal(&self) -> &Journal {
        self.client.journal()
    }
}

impl Default for RecordingFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientFactory for RecordingFactory {
    fn instance(&self, token: &str) -> Arc<dyn VendorClient> {
        self.client.journal().record(Call::GetInstance {
            token: token.to_string(),
        });
        self.client.clone()
    }
}
