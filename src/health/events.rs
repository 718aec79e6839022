use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle events recorded by the routing state manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterEvent {
    ConfigCheck,
    ConfigChange,
    CacheStateCheck,
    CacheStateChange,
}

impl RouterEvent {
    pub const ALL: [RouterEvent; 4] = [
        RouterEvent::ConfigCheck,
        RouterEvent::ConfigChange,
        RouterEvent::CacheStateCheck,
        RouterEvent::CacheStateChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RouterEvent::ConfigCheck => "lastConfigCheck",
            RouterEvent::ConfigChange => "lastConfigChange",
            RouterEvent::CacheStateCheck => "lastCacheStateCheck",
            RouterEvent::CacheStateChange => "lastCacheStateChange",
        }
    }
}

impl AsRef<str> for RouterEvent {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for RouterEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Last-occurrence time of named events.
///
/// Created once per process and shared as `Arc<EventTimeTracker>`. Entries are
/// overwritten, never removed.
#[derive(Debug, Default)]
pub struct EventTimeTracker {
    events: DashMap<String, DateTime<Utc>>,
}

impl EventTimeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set now as the event's timestamp.
    pub fn record(&self, event: impl AsRef<str>) -> DateTime<Utc> {
        let now = Utc::now();
        self.record_at(event, now);
        now
    }

    pub(crate) fn record_at(&self, event: impl AsRef<str>, at: DateTime<Utc>) {
        self.events.insert(event.as_ref().to_string(), at);
    }

    pub fn last(&self, event: impl AsRef<str>) -> Option<DateTime<Utc>> {
        self.events.get(event.as_ref()).map(|entry| *entry.value())
    }

    pub fn age(&self, event: impl AsRef<str>) -> Option<Duration> {
        self.last(event).map(|at| Utc::now() - at)
    }

    /// Point-in-time copy for diagnostics.
    pub fn snapshot(&self) -> BTreeMap<String, DateTime<Utc>> {
        self.events
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
