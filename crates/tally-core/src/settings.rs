//! Integration settings.
//!
//! Settings are resolved once from the host's settings bundle and are
//! immutable afterwards. Malformed values never fail resolution: they fall
//! back to the documented default.

use serde_json::Value;
use std::collections::HashSet;
use tally_protocol::ValueMap;
use tracing::warn;

/// Settings bundle keys.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const PEOPLE: &str = "people";
    pub const CONSOLIDATED_PAGE_CALLS: &str = "consolidatedPageCalls";
    pub const TRACK_ALL_PAGES: &str = "trackAllPages";
    pub const TRACK_CATEGORIZED_PAGES: &str = "trackCategorizedPages";
    pub const TRACK_NAMED_PAGES: &str = "trackNamedPages";
    pub const SET_ALL_TRAITS_BY_DEFAULT: &str = "setAllTraitsByDefault";
    pub const INCREMENTS: &str = "increments";
    pub const PEOPLE_PROPERTIES: &str = "peopleProperties";
    pub const SUPER_PROPERTIES: &str = "superProperties";
}

/// Resolved integration settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Vendor project token.
    pub token: String,
    /// Whether people profiles are maintained.
    pub people: bool,
    /// Collapse every screen into one `"Loaded a Screen"` event.
    pub consolidated_page_calls: bool,
    /// Emit `"Viewed {label} Screen"` for every screen.
    pub track_all_pages: bool,
    /// Emit `"Viewed {category} Screen"` for categorized screens.
    pub track_categorized_pages: bool,
    /// Emit `"Viewed {name} Screen"` for named screens.
    pub track_named_pages: bool,
    /// Track events whose names bump a people-profile counter.
    pub increments: HashSet<String>,
    /// Forward every trait to both super properties and the people profile.
    pub set_all_traits_by_default: bool,
    /// Traits forwarded to the people profile when not forwarding all.
    pub people_properties: HashSet<String>,
    /// Traits forwarded as super properties when not forwarding all.
    pub super_properties: HashSet<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            token: String::new(),
            people: false,
            consolidated_page_calls: true,
            track_all_pages: false,
            track_categorized_pages: false,
            track_named_pages: false,
            increments: HashSet::new(),
            set_all_traits_by_default: true,
            people_properties: HashSet::new(),
            super_properties: HashSet::new(),
        }
    }
}

impl Settings {
    /// Resolve settings from a host settings bundle.
    ///
    /// Unrecognized keys are ignored.
    #[must_use]
    pub fn from_bundle(bundle: &ValueMap) -> Self {
        let defaults = Self::default();

        let token = match bundle.get(keys::TOKEN) {
            Some(Value::String(token)) => token.clone(),
            _ => {
                warn!("Settings bundle has no string token, using an empty token");
                String::new()
            }
        };

        Self {
            token,
            people: get_bool(bundle, keys::PEOPLE, defaults.people),
            consolidated_page_calls: get_bool(
                bundle,
                keys::CONSOLIDATED_PAGE_CALLS,
                defaults.consolidated_page_calls,
            ),
            track_all_pages: get_bool(bundle, keys::TRACK_ALL_PAGES, defaults.track_all_pages),
            track_categorized_pages: get_bool(
                bundle,
                keys::TRACK_CATEGORIZED_PAGES,
                defaults.track_categorized_pages,
            ),
            track_named_pages: get_bool(
                bundle,
                keys::TRACK_NAMED_PAGES,
                defaults.track_named_pages,
            ),
            increments: get_string_set(bundle, keys::INCREMENTS),
            set_all_traits_by_default: get_bool(
                bundle,
                keys::SET_ALL_TRAITS_BY_DEFAULT,
                defaults.set_all_traits_by_default,
            ),
            people_properties: get_string_set(bundle, keys::PEOPLE_PROPERTIES),
            super_properties: get_string_set(bundle, keys::SUPER_PROPERTIES),
        }
    }
}

/// Read a boolean, accepting `"true"`/`"false"` strings.
fn get_bool(bundle: &ValueMap, key: &str, default: bool) -> bool {
    match bundle.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => true,
        Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => false,
        None | Some(Value::Null) => default,
        Some(other) => {
            warn!(key, value = %other, "Ignoring non-boolean setting");
            default
        }
    }
}

/// Read a list of strings as a set.
///
/// Anything but an array made only of strings yields the empty set.
fn get_string_set(bundle: &ValueMap, key: &str) -> HashSet<String> {
    let Some(value) = bundle.get(key) else {
        return HashSet::new();
    };

    let Value::Array(items) = value else {
        warn!(key, value = %value, "Ignoring non-list setting");
        return HashSet::new();
    };

    let set: Option<HashSet<String>> = items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect();

    set.unwrap_or_else(|| {
        warn!(key, "Ignoring list setting with non-string entries");
        HashSet::new()
    })
}
