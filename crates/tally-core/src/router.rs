//! Event router for Tally.
//!
//! The router turns each host event into zero or more vendor client calls.
//! It holds no mutable state of its own: everything it consults is fixed at
//! construction, so its methods can be called from several threads at once.

use crate::mapper::map_traits;
use crate::settings::Settings;
use chrono::{SecondsFormat, Utc};
use std::sync::Arc;
use tally_protocol::value::NAME_KEY;
use tally_protocol::{
    AliasPayload, Event, GroupPayload, IdentifyPayload, ScreenPayload, TrackPayload, ValueMap,
};
use tenvis_tally_vendor::{ClientFactory, PeopleProfile, VendorClient};
use tracing::{debug, info, trace};

/// Key of this integration in the host's settings.
pub const INTEGRATION_KEY: &str = "Mixpanel";

/// Event name used for every screen when screen calls are consolidated.
pub const CONSOLIDATED_SCREEN_EVENT: &str = "Loaded a Screen";

/// Group key used when the group traits carry no name.
pub const DEFAULT_GROUP_KEY: &str = "[Segment] Group";

/// Host activity lifecycle notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Started,
    Resumed,
    Paused,
    Stopped,
    SaveInstanceState,
    Destroyed,
}

/// Routes analytics events to a vendor client.
pub struct Router {
    settings: Settings,
    client: Arc<dyn VendorClient>,
    /// Present exactly when `settings.people` is set.
    people: Option<Arc<dyn PeopleProfile>>,
    factory: Arc<dyn ClientFactory>,
}

impl Router {
    /// Create a router from a host settings bundle.
    ///
    /// The vendor client is obtained once from `factory` using the resolved
    /// token.
    #[must_use]
    pub fn from_settings(bundle: &ValueMap, factory: Arc<dyn ClientFactory>) -> Self {
        let settings = Settings::from_bundle(bundle);
        let client = factory.instance(&settings.token);
        debug!(token = %settings.token, "Obtained vendor client instance");
        Self::new(settings, client, factory)
    }

    /// Create a router around an existing client.
    ///
    /// The people-profile handle is requested from the client only when
    /// people profiles are enabled.
    #[must_use]
    pub fn new(
        settings: Settings,
        client: Arc<dyn VendorClient>,
        factory: Arc<dyn ClientFactory>,
    ) -> Self {
        let people = settings.people.then(|| client.people());
        info!(
            people = settings.people,
            consolidated_page_calls = settings.consolidated_page_calls,
            set_all_traits_by_default = settings.set_all_traits_by_default,
            "Creating {} router",
            INTEGRATION_KEY
        );
        Self {
            settings,
            client,
            people,
            factory,
        }
    }

    /// The resolved settings.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The underlying vendor client.
    #[must_use]
    pub fn client(&self) -> &Arc<dyn VendorClient> {
        &self.client
    }

    /// Route one event.
    pub fn dispatch(&self, event: &Event) {
        trace!(event_type = %event.event_type(), "Dispatching event");
        match event {
            Event::Identify(identify) => self.identify(identify),
            Event::Track(track) => self.track(track),
            Event::Screen(screen) => self.screen(screen),
            Event::Alias(alias) => self.alias(alias),
            Event::Group(group) => self.group(group),
        }
    }

    /// Identify the user and forward their traits.
    ///
    /// A missing user id skips only the `identify` calls; traits are still
    /// forwarded against whatever identity the client already holds.
    pub fn identify(&self, identify: &IdentifyPayload) {
        let user_id = identify.user_id.as_deref();
        if let Some(user_id) = user_id {
            self.client.identify(user_id);
            debug!(user_id, "identify");
        }

        if self.settings.set_all_traits_by_default {
            let traits = map_traits(&identify.traits);
            self.client.register_super_properties(&traits);
            debug!(%traits, "register_super_properties");

            if let Some(people) = self.people.as_deref() {
                set_people_properties(people, user_id, &traits);
            }
            return;
        }

        let super_traits = identify.traits.filter(&self.settings.super_properties);
        if !super_traits.is_empty() {
            let traits = map_traits(&super_traits);
            self.client.register_super_properties(&traits);
            debug!(%traits, "register_super_properties");
        }

        if let Some(people) = self.people.as_deref() {
            let people_traits = identify.traits.filter(&self.settings.people_properties);
            if !people_traits.is_empty() {
                set_people_properties(people, user_id, &map_traits(&people_traits));
            }
        }
    }

    /// Track an event and bump its people-profile counter if configured.
    pub fn track(&self, track: &TrackPayload) {
        let event = track.event.as_str();
        self.forward(event, &track.properties);

        let Some(people) = self.people.as_deref() else {
            return;
        };
        if !self.settings.increments.contains(event) {
            return;
        }

        people.increment(event, 1.0);
        debug!(name = event, amount = 1.0, "people.increment");

        let last_seen = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let properties = ValueMap::new().with(format!("Last {event}"), last_seen);
        people.set(&properties);
        debug!(%properties, "people.set");
    }

    /// Translate a screen view into at most one vendor event.
    pub fn screen(&self, screen: &ScreenPayload) {
        match self.screen_event(screen) {
            Some((event, properties)) => self.forward(&event, &properties),
            None => trace!(label = screen.label(), "Screen not tracked"),
        }
    }

    /// Pick the vendor event for a screen. The first matching rule wins.
    ///
    /// The consolidated event carries the screen's `name` attribute, and
    /// omits the `name` property when the screen has none. A screen with
    /// neither name nor category is never tracked as `"Viewed ... Screen"`.
    fn screen_event(&self, screen: &ScreenPayload) -> Option<(String, ValueMap)> {
        let settings = &self.settings;

        if settings.consolidated_page_calls {
            let mut properties = screen.properties.clone();
            if let Some(name) = &screen.name {
                properties.insert(NAME_KEY, name.clone());
            }
            return Some((CONSOLIDATED_SCREEN_EVENT.to_string(), properties));
        }

        let category = screen.category.as_deref();
        let name = screen.name.as_deref();
        let subject = if settings.track_all_pages {
            let label = screen.label();
            if label.is_empty() {
                return None;
            }
            label
        } else if settings.track_categorized_pages && is_present(category) {
            category.unwrap_or_default()
        } else if settings.track_named_pages && is_present(name) {
            name.unwrap_or_default()
        } else {
            return None;
        };

        Some((viewed_event(subject), screen.properties.clone()))
    }

    /// Link a new user id to the previous identity.
    ///
    /// When the previous id is the event's own anonymous id, the vendor never
    /// saw it, so the client's own distinct id is aliased instead.
    pub fn alias(&self, alias: &AliasPayload) {
        let Some(user_id) = alias.user_id.as_deref() else {
            debug!("Alias without user id, skipping");
            return;
        };

        let previous_id = match alias.previous_id.as_deref() {
            Some(previous) if Some(previous) == alias.anonymous_id.as_deref() => {
                Some(self.client.distinct_id())
            }
            other => other.map(str::to_string),
        };

        self.client.alias(user_id, previous_id.as_deref());
        debug!(user_id, previous_id = ?previous_id, "alias");
    }

    /// Add the user to a group, seeding the group's profile.
    pub fn group(&self, group: &GroupPayload) {
        let group_key = group
            .traits
            .name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_GROUP_KEY);
        let group_id = group.group_id.as_str();

        let traits = map_traits(&group.traits);
        self.client.group(group_key, group_id).set_once(&traits);
        debug!(group_key, group_id, %traits, "group.set_once");

        self.client.set_group(group_key, group_id);
        debug!(group_key, group_id, "set_group");
    }

    /// Send a vendor event, recording revenue on the people profile.
    pub fn forward(&self, event: &str, properties: &ValueMap) {
        self.client.track(event, properties);
        debug!(event, %properties, "track");

        let Some(people) = self.people.as_deref() else {
            return;
        };
        let revenue = properties.revenue();
        if revenue == 0.0 {
            return;
        }

        people.track_charge(revenue, properties);
        debug!(revenue, %properties, "people.track_charge");
    }

    /// Flush the vendor client.
    pub fn flush(&self) {
        self.client.flush();
        debug!("flush");
    }

    /// Reset the vendor client's identity.
    pub fn reset(&self) {
        self.client.reset();
        debug!("reset");
    }

    /// Forward a host lifecycle notification.
    ///
    /// Only `Created` reaches the vendor: requesting the cached instance again
    /// lets the client inspect the new activity for inbound app links.
    pub fn lifecycle(&self, event: Lifecycle) {
        match event {
            Lifecycle::Created => {
                let _ = self.factory.instance(&self.settings.token);
                debug!(token = %self.settings.token, "Re-obtained vendor client instance");
            }
            Lifecycle::Started
            | Lifecycle::Resumed
            | Lifecycle::Paused
            | Lifecycle::Stopped
            | Lifecycle::SaveInstanceState
            | Lifecycle::Destroyed => {}
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("settings", &self.settings)
            .field("people", &self.people.is_some())
            .finish_non_exhaustive()
    }
}

/// Identify the profile, then set properties on it.
fn set_people_properties(people: &dyn PeopleProfile, user_id: Option<&str>, traits: &ValueMap) {
    if let Some(user_id) = user_id {
        people.identify(user_id);
        debug!(user_id, "people.identify");
    }
    people.set(traits);
    debug!(%traits, "people.set");
}

fn is_present(s: Option<&str>) -> bool {
    s.is_some_and(|s| !s.is_empty())
}

fn viewed_event(subject: &str) -> String {
    format!("Viewed {subject} Screen")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tenvis_tally_vendor::{Call, Journal, RecordingClient, RecordingFactory};

    /// Build a router over a recording client and clear construction calls.
    fn router_with(settings: Settings) -> (Router, Journal) {
        router_with_client(settings, RecordingClient::new())
    }

    fn router_with_client(settings: Settings, client: RecordingClient) -> (Router, Journal) {
        let factory = RecordingFactory::with_client(client);
        let journal = factory.journal().clone();
        let client = factory.instance(&settings.token);
        let router = Router::new(settings, client, Arc::new(factory));
        journal.take();
        (router, journal)
    }

    fn people_settings() -> Settings {
        Settings {
            token: "foo".into(),
            people: true,
            ..Settings::default()
        }
    }

    fn map(value: serde_json::Value) -> ValueMap {
        ValueMap::from_json(value).unwrap()
    }

    fn track_call(event: &str, properties: ValueMap) -> Call {
        Call::Track {
            event: event.into(),
            properties,
        }
    }

    #[test]
    fn test_from_settings_without_people() {
        let factory = RecordingFactory::new();
        let journal = factory.journal().clone();
        let router = Router::from_settings(
            &map(json!({
                "token": "foo",
                "trackAllPages": true,
                "trackCategorizedPages": false,
                "trackNamedPages": true,
                "setAllTraitsByDefault": true
            })),
            Arc::new(factory),
        );

        assert_eq!(journal.calls(), vec![Call::GetInstance { token: "foo".into() }]);
        assert_eq!(router.settings().token, "foo");
        assert!(router.settings().track_all_pages);
        assert!(!router.settings().track_categorized_pages);
        assert!(router.settings().track_named_pages);
        assert!(router.settings().increments.is_empty());
        assert!(router.people.is_none());
    }

    #[test]
    fn test_from_settings_with_people_and_increments() {
        let factory = RecordingFactory::new();
        let journal = factory.journal().clone();
        let router = Router::from_settings(
            &map(json!({
                "token": "foo",
                "people": true,
                "increments": ["baz", "qaz", "qux"]
            })),
            Arc::new(factory),
        );

        assert_eq!(
            journal.calls(),
            vec![Call::GetInstance { token: "foo".into() }, Call::GetPeople]
        );
        assert!(router.people.is_some());
        assert_eq!(router.settings().increments.len(), 3);
    }

    #[test]
    fn test_lifecycle_created_requests_instance_only() {
        let (router, journal) = router_with(people_settings());

        router.lifecycle(Lifecycle::Created);
        assert_eq!(journal.take(), vec![Call::GetInstance { token: "foo".into() }]);

        for event in [
            Lifecycle::Started,
            Lifecycle::Resumed,
            Lifecycle::Paused,
            Lifecycle::Stopped,
            Lifecycle::SaveInstanceState,
            Lifecycle::Destroyed,
        ] {
            router.lifecycle(event);
        }
        assert!(journal.is_empty());
    }

    #[test]
    fn test_screen_not_tracked() {
        let (router, journal) = router_with(Settings {
            consolidated_page_calls: false,
            ..people_settings()
        });

        router.screen(&ScreenPayload {
            name: Some("foo".into()),
            ..Default::default()
        });
        assert!(journal.is_empty());
    }

    #[test]
    fn test_screen_all_pages() {
        let (router, journal) = router_with(Settings {
            consolidated_page_calls: false,
            track_all_pages: true,
            ..Settings::default()
        });

        router.screen(&ScreenPayload {
            name: Some("foo".into()),
            ..Default::default()
        });
        assert_eq!(journal.take(), vec![track_call("Viewed foo Screen", ValueMap::new())]);
    }

    #[test]
    fn test_screen_consolidated_wins_over_other_flags() {
        let (router, journal) = router_with(Settings {
            track_all_pages: true,
            track_named_pages: true,
            ..people_settings()
        });

        router.screen(&ScreenPayload {
            name: Some("foo".into()),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![track_call("Loaded a Screen", map(json!({"name": "foo"})))]
        );
    }

    #[test]
    fn test_screen_consolidated_keeps_properties() {
        let (router, journal) = router_with(Settings::default());

        router.screen(&ScreenPayload {
            name: Some("Checkout".into()),
            category: Some("Store".into()),
            properties: map(json!({"step": 2})),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![track_call(
                "Loaded a Screen",
                map(json!({"name": "Checkout", "step": 2}))
            )]
        );
    }

    #[test]
    fn test_screen_all_pages_without_label() {
        let (router, journal) = router_with(Settings {
            consolidated_page_calls: false,
            track_all_pages: true,
            ..Settings::default()
        });

        router.screen(&ScreenPayload::default());
        router.screen(&ScreenPayload {
            name: Some(String::new()),
            category: Some(String::new()),
            ..Default::default()
        });
        assert!(journal.is_empty());

        router.screen(&ScreenPayload {
            category: Some("Store".into()),
            ..Default::default()
        });
        assert_eq!(journal.take(), vec![track_call("Viewed Store Screen", ValueMap::new())]);
    }

    #[test]
    fn test_screen_consolidated_without_name() {
        let (router, journal) = router_with(Settings::default());

        router.screen(&ScreenPayload {
            category: Some("Store".into()),
            properties: map(json!({"step": 1})),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![track_call("Loaded a Screen", map(json!({"step": 1})))]
        );
    }

    #[test]
    fn test_screen_named_pages() {
        let (router, journal) = router_with(Settings {
            consolidated_page_calls: false,
            track_named_pages: true,
            ..people_settings()
        });

        router.screen(&ScreenPayload {
            name: Some("foo".into()),
            ..Default::default()
        });
        assert_eq!(journal.take(), vec![track_call("Viewed foo Screen", ValueMap::new())]);

        router.screen(&ScreenPayload {
            category: Some("foo".into()),
            ..Default::default()
        });
        assert!(journal.is_empty());
    }

    #[test]
    fn test_screen_categorized_pages() {
        let (router, journal) = router_with(Settings {
            consolidated_page_calls: false,
            track_categorized_pages: true,
            ..people_settings()
        });

        router.screen(&ScreenPayload {
            category: Some("foo".into()),
            ..Default::default()
        });
        assert_eq!(journal.take(), vec![track_call("Viewed foo Screen", ValueMap::new())]);

        router.screen(&ScreenPayload {
            name: Some("foo".into()),
            ..Default::default()
        });
        assert!(journal.is_empty());
    }

    #[test]
    fn test_screen_category_preferred_over_name() {
        let (router, journal) = router_with(Settings {
            consolidated_page_calls: false,
            track_categorized_pages: true,
            track_named_pages: true,
            ..Settings::default()
        });

        router.screen(&ScreenPayload {
            name: Some("Home".into()),
            category: Some("Main".into()),
            ..Default::default()
        });
        assert_eq!(journal.take(), vec![track_call("Viewed Main Screen", ValueMap::new())]);

        router.screen(&ScreenPayload {
            name: Some("Home".into()),
            category: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(journal.take(), vec![track_call("Viewed Home Screen", ValueMap::new())]);
    }

    #[test]
    fn test_screen_revenue_is_charged() {
        let (router, journal) = router_with(people_settings());

        router.screen(&ScreenPayload {
            name: Some("Receipt".into()),
            properties: map(json!({"revenue": 5})),
            ..Default::default()
        });

        let properties = map(json!({"name": "Receipt", "revenue": 5}));
        assert_eq!(
            journal.take(),
            vec![
                track_call("Loaded a Screen", properties.clone()),
                Call::PeopleTrackCharge {
                    amount: 5.0,
                    properties
                },
            ]
        );
    }

    #[test]
    fn test_track() {
        let (router, journal) = router_with(Settings::default());

        router.track(&TrackPayload {
            event: "foo".into(),
            ..Default::default()
        });
        assert_eq!(journal.take(), vec![track_call("foo", ValueMap::new())]);
    }

    #[test]
    fn test_track_increment() {
        let (router, journal) = router_with(Settings {
            consolidated_page_calls: false,
            track_all_pages: true,
            track_categorized_pages: true,
            track_named_pages: true,
            increments: ["baz".to_string()].into(),
            ..people_settings()
        });

        router.track(&TrackPayload {
            event: "baz".into(),
            ..Default::default()
        });

        let calls = journal.take();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0], track_call("baz", ValueMap::new()));
        assert_eq!(
            calls[1],
            Call::PeopleIncrement {
                name: "baz".into(),
                amount: 1.0
            }
        );
        match &calls[2] {
            Call::PeopleSet(properties) => {
                assert_eq!(properties.len(), 1);
                let last = properties.get_str("Last baz").unwrap();
                assert!(chrono::DateTime::parse_from_rfc3339(last).is_ok());
            }
            other => panic!("Expected PeopleSet, got {:?}", other),
        }
    }

    #[test]
    fn test_track_increment_without_people() {
        let (router, journal) = router_with(Settings {
            increments: ["baz".to_string()].into(),
            ..Settings::default()
        });

        router.track(&TrackPayload {
            event: "baz".into(),
            ..Default::default()
        });
        assert_eq!(journal.take(), vec![track_call("baz", ValueMap::new())]);
    }

    #[test]
    fn test_screen_names_never_increment() {
        let (router, journal) = router_with(Settings {
            increments: ["Loaded a Screen".to_string()].into(),
            ..people_settings()
        });

        router.screen(&ScreenPayload {
            name: Some("foo".into()),
            ..Default::default()
        });
        assert_eq!(journal.take().len(), 1);
    }

    #[test]
    fn test_alias() {
        let (router, journal) = router_with(Settings::default());

        router.alias(&AliasPayload {
            user_id: Some("bar".into()),
            anonymous_id: Some("anon".into()),
            previous_id: Some("foo".into()),
        });
        assert_eq!(
            journal.take(),
            vec![Call::Alias {
                alias: "bar".into(),
                original: Some("foo".into())
            }]
        );
    }

    #[test]
    fn test_alias_with_anonymous_previous_id() {
        let (router, journal) = router_with_client(
            Settings::default(),
            RecordingClient::new().with_distinct_id("mpDistinctId"),
        );

        router.alias(&AliasPayload {
            user_id: Some("qux".into()),
            anonymous_id: Some("qaz".into()),
            previous_id: Some("qaz".into()),
        });
        assert_eq!(
            journal.take(),
            vec![
                Call::GetDistinctId,
                Call::Alias {
                    alias: "qux".into(),
                    original: Some("mpDistinctId".into())
                },
            ]
        );
    }

    #[test]
    fn test_alias_without_user_id() {
        let (router, journal) = router_with(Settings::default());

        router.alias(&AliasPayload {
            previous_id: Some("foo".into()),
            ..Default::default()
        });
        assert!(journal.is_empty());
    }

    #[test]
    fn test_identify() {
        let (router, journal) = router_with(Settings::default());

        router.identify(&IdentifyPayload {
            user_id: Some("prateek".into()),
            traits: map(json!({"age": 25})),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![
                Call::Identify {
                    distinct_id: "prateek".into()
                },
                Call::RegisterSuperProperties(map(json!({"age": 25}))),
            ]
        );
    }

    #[test]
    fn test_identify_without_user_id() {
        let (router, journal) = router_with(people_settings());

        router.identify(&IdentifyPayload {
            anonymous_id: Some("anonymousId".into()),
            traits: map(json!({"age": 25})),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![
                Call::RegisterSuperProperties(map(json!({"age": 25}))),
                Call::PeopleSet(map(json!({"age": 25}))),
            ]
        );
    }

    #[test]
    fn test_identify_with_people() {
        let (router, journal) = router_with(people_settings());

        router.identify(&IdentifyPayload {
            user_id: Some("prateek".into()),
            traits: map(json!({"age": 25})),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![
                Call::Identify {
                    distinct_id: "prateek".into()
                },
                Call::RegisterSuperProperties(map(json!({"age": 25}))),
                Call::PeopleIdentify {
                    distinct_id: "prateek".into()
                },
                Call::PeopleSet(map(json!({"age": 25}))),
            ]
        );
    }

    #[test]
    fn test_identify_renames_traits() {
        let (router, journal) = router_with(people_settings());

        router.identify(&IdentifyPayload {
            user_id: Some("prateek".into()),
            traits: map(json!({
                "email": "friends@segment.com",
                "phone": "1-844-611-0621",
                "firstName": "Prateek",
                "lastName": "Srivastava",
                "name": "Prateek Srivastava",
                "username": "segmentio",
                "createdAt": "15th Feb, 2015"
            })),
            ..Default::default()
        });

        let expected = map(json!({
            "$email": "friends@segment.com",
            "$phone": "1-844-611-0621",
            "$first_name": "Prateek",
            "$last_name": "Srivastava",
            "$name": "Prateek Srivastava",
            "$username": "segmentio",
            "$created": "15th Feb, 2015"
        }));
        let calls = journal.take();
        assert_eq!(calls[1], Call::RegisterSuperProperties(expected.clone()));
        assert_eq!(calls[3], Call::PeopleSet(expected));
    }

    #[test]
    fn test_identify_with_super_properties() {
        let (router, journal) = router_with(Settings {
            set_all_traits_by_default: false,
            super_properties: ["parasite".to_string(), "email".to_string()].into(),
            ..people_settings()
        });

        router.identify(&IdentifyPayload {
            user_id: Some("foo".into()),
            traits: map(json!({
                "email": "Raptor@segment.com",
                "parasite": "Photography Raptor",
                "age": 3
            })),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![
                Call::Identify {
                    distinct_id: "foo".into()
                },
                Call::RegisterSuperProperties(map(json!({
                    "$email": "Raptor@segment.com",
                    "parasite": "Photography Raptor"
                }))),
            ]
        );
    }

    #[test]
    fn test_identify_with_people_properties() {
        let (router, journal) = router_with(Settings {
            set_all_traits_by_default: false,
            people_properties: ["parasite".to_string()].into(),
            ..people_settings()
        });

        router.identify(&IdentifyPayload {
            user_id: Some("foo".into()),
            traits: map(json!({
                "email": "Pencilvester@segment.com",
                "parasite": "Pencilvester"
            })),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![
                Call::Identify {
                    distinct_id: "foo".into()
                },
                Call::PeopleIdentify {
                    distinct_id: "foo".into()
                },
                Call::PeopleSet(map(json!({"parasite": "Pencilvester"}))),
            ]
        );
    }

    #[test]
    fn test_identify_with_super_and_people_properties() {
        let (router, journal) = router_with(Settings {
            set_all_traits_by_default: false,
            super_properties: ["plan".to_string()].into(),
            people_properties: ["email".to_string()].into(),
            ..people_settings()
        });

        router.identify(&IdentifyPayload {
            user_id: Some("foo".into()),
            traits: map(json!({"plan": "pro", "email": "a@b.c"})),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![
                Call::Identify {
                    distinct_id: "foo".into()
                },
                Call::RegisterSuperProperties(map(json!({"plan": "pro"}))),
                Call::PeopleIdentify {
                    distinct_id: "foo".into()
                },
                Call::PeopleSet(map(json!({"$email": "a@b.c"}))),
            ]
        );
    }

    #[test]
    fn test_identify_selected_traits_without_user_id() {
        let (router, journal) = router_with(Settings {
            set_all_traits_by_default: false,
            people_properties: ["email".to_string()].into(),
            ..people_settings()
        });

        router.identify(&IdentifyPayload {
            anonymous_id: Some("anonymousId".into()),
            traits: map(json!({"email": "a@b.c", "age": 3})),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![Call::PeopleSet(map(json!({"$email": "a@b.c"})))]
        );
    }

    #[test]
    fn test_identify_with_no_selected_traits() {
        let (router, journal) = router_with(Settings {
            set_all_traits_by_default: false,
            ..people_settings()
        });

        router.identify(&IdentifyPayload {
            user_id: Some("foo".into()),
            traits: map(json!({"email": "a@b.c", "age": 3})),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![Call::Identify {
                distinct_id: "foo".into()
            }]
        );
    }

    #[test]
    fn test_identify_people_properties_ignored_without_people() {
        let (router, journal) = router_with(Settings {
            set_all_traits_by_default: false,
            people_properties: ["email".to_string()].into(),
            ..Settings::default()
        });

        router.identify(&IdentifyPayload {
            traits: map(json!({"email": "a@b.c"})),
            ..Default::default()
        });
        assert!(journal.is_empty());
    }

    #[test]
    fn test_group() {
        let (router, journal) = router_with(Settings::default());

        router.group(&GroupPayload {
            user_id: Some("foo".into()),
            group_id: "testGroupId".into(),
            traits: map(json!({"plan": "enterprise"})),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![
                Call::GetGroup {
                    group_key: "[Segment] Group".into(),
                    group_id: "testGroupId".into()
                },
                Call::GroupSetOnce {
                    group_key: "[Segment] Group".into(),
                    group_id: "testGroupId".into(),
                    properties: map(json!({"plan": "enterprise"}))
                },
                Call::SetGroup {
                    group_key: "[Segment] Group".into(),
                    group_id: "testGroupId".into()
                },
            ]
        );
    }

    #[test]
    fn test_group_with_group_name() {
        let (router, journal) = router_with(Settings::default());

        router.group(&GroupPayload {
            user_id: Some("foo".into()),
            group_id: "testGroupId".into(),
            traits: map(json!({"name": "someGroup"})),
            ..Default::default()
        });
        assert_eq!(
            journal.take(),
            vec![
                Call::GetGroup {
                    group_key: "someGroup".into(),
                    group_id: "testGroupId".into()
                },
                Call::GroupSetOnce {
                    group_key: "someGroup".into(),
                    group_id: "testGroupId".into(),
                    properties: map(json!({"$name": "someGroup"}))
                },
                Call::SetGroup {
                    group_key: "someGroup".into(),
                    group_id: "testGroupId".into()
                },
            ]
        );
    }

    #[test]
    fn test_forward() {
        let (router, journal) = router_with(Settings::default());

        let properties = map(json!({"revenue": 20}));
        router.forward("foo", &properties);
        assert_eq!(journal.take(), vec![track_call("foo", properties)]);
    }

    #[test]
    fn test_forward_with_people() {
        let (router, journal) = router_with(people_settings());

        router.forward("foo", &ValueMap::new());
        assert_eq!(journal.take(), vec![track_call("foo", ValueMap::new())]);
    }

    #[test]
    fn test_forward_with_people_and_revenue() {
        let (router, journal) = router_with(people_settings());

        let properties = map(json!({"revenue": 20}));
        router.forward("foo", &properties);
        assert_eq!(
            journal.take(),
            vec![
                track_call("foo", properties.clone()),
                Call::PeopleTrackCharge {
                    amount: 20.0,
                    properties
                },
            ]
        );
    }

    #[test]
    fn test_flush_and_reset_forward_every_time() {
        let (router, journal) = router_with(Settings::default());

        router.flush();
        router.flush();
        router.reset();
        router.reset();
        assert_eq!(
            journal.take(),
            vec![Call::Flush, Call::Flush, Call::Reset, Call::Reset]
        );
    }

    #[test]
    fn test_dispatch_routes_every_kind() {
        let (router, journal) = router_with(Settings::default());

        router.dispatch(&Event::track("foo", ValueMap::new()));
        router.dispatch(&Event::screen(Some("home".into()), None, ValueMap::new()));
        router.dispatch(&Event::identify(Some("u".into()), ValueMap::new()));
        router.dispatch(&Event::alias("u", "old", None));
        router.dispatch(&Event::group(None, "g", ValueMap::new()));

        assert_eq!(
            journal.take(),
            vec![
                track_call("foo", ValueMap::new()),
                track_call("Loaded a Screen", map(json!({"name": "home"}))),
                Call::Identify {
                    distinct_id: "u".into()
                },
                Call::RegisterSuperProperties(ValueMap::new()),
                Call::Alias {
                    alias: "u".into(),
                    original: Some("old".into())
                },
                Call::GetGroup {
                    group_key: "[Segment] Group".into(),
                    group_id: "g".into()
                },
                Call::GroupSetOnce {
                    group_key: "[Segment] Group".into(),
                    group_id: "g".into(),
                    properties: ValueMap::new()
                },
                Call::SetGroup {
                    group_key: "[Segment] Group".into(),
                    group_id: "g".into()
                },
            ]
        );
    }

    #[test]
    fn test_router_is_shareable_across_threads() {
        let (router, journal) = router_with(Settings::default());
        let router = Arc::new(router);

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let router = Arc::clone(&router);
                std::thread::spawn(move || router.forward(&format!("event-{i}"), &ValueMap::new()))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(journal.len(), 4);
    }
}
