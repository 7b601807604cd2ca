//! Event types for the Tally relay.
//!
//! Events are the unit handed over by the host analytics SDK. Each event is
//! immutable once built and is consumed exactly once by the router.

use crate::value::ValueMap;
use serde::{Deserialize, Serialize};

/// Event type identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    Identify,
    Track,
    Screen,
    Alias,
    Group,
}

impl EventType {
    /// Lowercase wire name of the event type.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EventType::Identify => "identify",
            EventType::Track => "track",
            EventType::Screen => "screen",
            EventType::Alias => "alias",
            EventType::Group => "group",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attach traits to a user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous_id: Option<String>,
    #[serde(default)]
    pub traits: ValueMap,
}

/// A named user action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous_id: Option<String>,
    /// Event name.
    pub event: String,
    /// Event properties; an optional `revenue` figure lives here.
    #[serde(default)]
    pub properties: ValueMap,
}

/// A screen view.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub properties: ValueMap,
}

impl ScreenPayload {
    /// The screen's display label.
    ///
    /// This is the name when non-empty, otherwise the category, otherwise
    /// the empty string.
    #[must_use]
    pub fn label(&self) -> &str {
        non_empty(self.name.as_deref())
            .or_else(|| non_empty(self.category.as_deref()))
            .unwrap_or_default()
    }
}

/// Link a new user id to a previous identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasPayload {
    /// The new user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_id: Option<String>,
}

/// Associate a user with a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anonymous_id: Option<String>,
    pub group_id: String,
    #[serde(default)]
    pub traits: ValueMap,
}

/// An analytics event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Event {
    Identify(IdentifyPayload),
    Track(TrackPayload),
    Screen(ScreenPayload),
    Alias(AliasPayload),
    Group(GroupPayload),
}

impl Event {
    /// Get the event type.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Identify(_) => EventType::Identify,
            Event::Track(_) => EventType::Track,
            Event::Screen(_) => EventType::Screen,
            Event::Alias(_) => EventType::Alias,
            Event::Group(_) => EventType::Group,
        }
    }

    /// The user id carried by the event, if any.
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Event::Identify(p) => p.user_id.as_deref(),
            Event::Track(p) => p.user_id.as_deref(),
            Event::Screen(p) => p.user_id.as_deref(),
            Event::Alias(p) => p.user_id.as_deref(),
            Event::Group(p) => p.user_id.as_deref(),
        }
    }

    /// The anonymous id carried by the event, if any.
    #[must_use]
    pub fn anonymous_id(&self) -> Option<&str> {
        match self {
            Event::Identify(p) => p.anonymous_id.as_deref(),
            Event::Track(p) => p.anonymous_id.as_deref(),
            Event::Screen(p) => p.anonymous_id.as_deref(),
            Event::Alias(p) => p.anonymous_id.as_deref(),
            Event::Group(p) => p.anonymous_id.as_deref(),
        }
    }

    /// Create a new Identify event.
    #[must_use]
    pub fn identify(user_id: Option<String>, traits: ValueMap) -> Self {
        Event::Identify(IdentifyPayload {
            user_id,
            anonymous_id: None,
            traits,
        })
    }

    /// Create a new Track event.
    #[must_use]
    pub fn track(event: impl Into<String>, properties: ValueMap) -> Self {
        Event::Track(TrackPayload {
            event: event.into(),
            properties,
            ..Default::default()
        })
    }

    /// Create a new Screen event.
    #[must_use]
    pub fn screen(name: Option<String>, category: Option<String>, properties: ValueMap) -> Self {
        Event::Screen(ScreenPayload {
            name,
            category,
            properties,
            ..Default::default()
        })
    }

    /// Create a new Alias event.
    #[must_use]
    pub fn alias(
        user_id: impl Into<String>,
        previous_id: impl Into<String>,
        anonymous_id: Option<String>,
    ) -> Self {
        Event::Alias(AliasPayload {
            user_id: Some(user_id.into()),
            anonymous_id,
            previous_id: Some(previous_id.into()),
        })
    }

    /// Create a new Group event.
    #[must_use]
    pub fn group(user_id: Option<String>, group_id: impl Into<String>, traits: ValueMap) -> Self {
        Event::Group(GroupPayload {
            user_id,
            anonymous_id: None,
            group_id: group_id.into(),
            traits,
        })
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}
