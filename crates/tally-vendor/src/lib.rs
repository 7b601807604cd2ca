//! # tally-vendor
//!
//! Vendor client abstraction layer for the Tally analytics relay.
//!
//! The router never talks to an analytics vendor directly. It drives the
//! traits in this crate, which mirror the surface of a Mixpanel-style client
//! library:
//!
//! - **VendorClient** - identify, alias, track, super properties, groups
//! - **PeopleProfile** - per-user profile sets, increments and charges
//! - **GroupHandle** - group profile properties
//! - **ClientFactory** - cached client instances keyed by project token
//!
//! Two implementations ship with the crate:
//!
//! - [`TracingClient`] logs every call as a structured event
//! - [`RecordingClient`] keeps an ordered journal of calls for inspection
//!
//! ```rust
//! use tenvis_tally_vendor::{Call, ClientFactory, RecordingFactory, VendorClient};
//!
//! let factory = RecordingFactory::new();
//! let client = factory.instance("token");
//! client.flush();
//!
//! assert_eq!(factory.journal().last(), Some(Call::Flush));
//! ```

pub mod logging;
pub mod recording;
pub mod traits;

pub use logging::{TracingClient, TracingFactory};
pub use recording::{Call, Journal, RecordingClient, RecordingFactory};
pub use traits::{ClientFactory, GroupHandle, PeopleProfile, VendorClient};
