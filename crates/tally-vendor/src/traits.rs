//! Vendor client traits for Tally.
//!
//! These traits define the interface a vendor client library must present,
//! allowing the router to be vendor-implementation agnostic. Calls return
//! nothing: network and storage failures are the client's own concern.

use std::sync::Arc;
use tally_protocol::ValueMap;

/// A vendor analytics client bound to one project token.
pub trait VendorClient: Send + Sync {
    /// Associate all future events with the given distinct id.
    fn identify(&self, distinct_id: &str);

    /// Create an alias from `alias` to `original`.
    ///
    /// A `None` original means the client's current distinct id.
    fn alias(&self, alias: &str, original: Option<&str>);

    /// The distinct id the client currently tracks.
    fn distinct_id(&self) -> String;

    /// Register properties sent with every subsequent event.
    fn register_super_properties(&self, properties: &ValueMap);

    /// Track a named event.
    fn track(&self, event: &str, properties: &ValueMap);

    /// Push queued events to the vendor.
    fn flush(&self);

    /// Clear the stored identity and super properties.
    fn reset(&self);

    /// Get or create the group profile for `(group_key, group_id)`.
    fn group(&self, group_key: &str, group_id: &str) -> Box<dyn GroupHandle>;

    /// Add the current user to the group `(group_key, group_id)`.
    fn set_group(&self, group_key: &str, group_id: &str);

    /// The people-profile handle of this client.
    fn people(&self) -> Arc<dyn PeopleProfile>;
}

/// Per-user profile operations.
pub trait PeopleProfile: Send + Sync {
    /// Associate profile updates with the given distinct id.
    ///
    /// Must be called before any `set` for that user.
    fn identify(&self, distinct_id: &str);

    /// Set profile properties, overwriting existing values.
    fn set(&self, properties: &ValueMap);

    /// Add `amount` to a numeric profile property.
    fn increment(&self, name: &str, amount: f64);

    /// Record a revenue charge on the profile.
    fn track_charge(&self, amount: f64, properties: &ValueMap);
}

/// A group profile.
pub trait GroupHandle: Send {
    /// Set properties that are not already present on the group.
    fn set_once(&self, properties: &ValueMap);
}

/// Produces vendor clients for a project token.
///
/// Implementations cache instances, so repeated calls with the same token
/// hand back the same client.
pub trait ClientFactory: Send + Sync {
    /// Get the client for `token`.
    fn instance(&self, token: &str) -> Arc<dyn VendorClient>;
}
