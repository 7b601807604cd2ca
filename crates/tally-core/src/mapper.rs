//! Trait key mapping.
//!
//! The vendor reserves `$`-prefixed keys for well-known profile fields.

use tally_protocol::ValueMap;

/// Generic trait keys and their vendor counterparts, in lookup order.
pub const TRAIT_MAPPING: [(&str, &str); 7] = [
    ("email", "$email"),
    ("phone", "$phone"),
    ("firstName", "$first_name"),
    ("lastName", "$last_name"),
    ("name", "$name"),
    ("username", "$username"),
    ("createdAt", "$created"),
];

/// Rename the well-known keys of `traits`; other keys pass through.
#[must_use]
pub fn map_traits(traits: &ValueMap) -> ValueMap {
    traits.transform(&TRAIT_MAPPING)
}

/// The vendor key for a single trait key.
#[must_use]
pub fn mapped_key(key: &str) -> &str {
    TRAIT_MAPPING
        .iter()
        .find(|(from, _)| *from == key)
        .map_or(key, |(_, to)| *to)
}
