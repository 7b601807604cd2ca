//! # tally-protocol
//!
//! Event payload definitions for the Tally analytics relay.
//!
//! This crate defines the vendor-neutral events a host analytics SDK hands
//! to Tally, the property/trait maps they carry, and the codec used when the
//! host streams events to the `tally` process.
//!
//! ## Event Types
//!
//! - `Identify` - Attach traits to a user
//! - `Track` - Record a named action with properties
//! - `Screen` - Record a screen view
//! - `Alias` - Link a new user id to a previous identity
//! - `Group` - Associate a user with a group
//!
//! ## Example
//!
//! ```rust
//! use tally_protocol::{codec, Event, Format, ValueMap};
//!
//! let event = Event::track("Signed Up", ValueMap::new());
//!
//! let encoded = codec::encode(&event, Format::Json).unwrap();
//! let decoded = codec::decode(&encoded, Format::Json).unwrap();
//! assert_eq!(event, decoded);
//! ```

pub mod codec;
pub mod event;
pub mod value;

pub use codec::{decode, encode, Format, ProtocolError};
pub use event::{
    AliasPayload, Event, EventType, GroupPayload, IdentifyPayload, ScreenPayload, TrackPayload,
};
pub use value::ValueMap;
