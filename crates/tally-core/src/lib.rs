//! # tally-core
//!
//! Settings resolution, trait mapping, and event routing for the Tally
//! analytics relay.
//!
//! This crate provides the decision logic between a host analytics SDK and a
//! vendor client library:
//!
//! - **Settings** - Integration settings resolved once from the host bundle
//! - **Mapper** - Renames generic trait keys to the vendor's reserved keys
//! - **Router** - Turns each event into zero or more vendor calls
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────┐
//! │  Host SDK   │────▶│   Router    │────▶│ VendorClient │
//! └─────────────┘     └─────────────┘     └──────────────┘
//!                       │         │
//!                       ▼         ▼
//!               ┌──────────┐ ┌──────────┐
//!               │ Settings │ │  Mapper  │
//!               └──────────┘ └──────────┘
//! ```

pub mod mapper;
pub mod router;
pub mod settings;

pub use mapper::{map_traits, TRAIT_MAPPING};
pub use router::{Lifecycle, Router, INTEGRATION_KEY};
pub use settings::Settings;
