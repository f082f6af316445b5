//! Decision Engine v1: Resource Store.
//!
//! Four bounded resources, one per `ResourceType`, held in a fixed-size
//! array. Values clamp into `[min, max]` after every mutation; trend is the
//! sign of the last applied delta.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::arithmetic::truncated_mean;
use crate::error::EngineError;
use crate::events::GameEvent;

pub const RESOURCE_COUNT: usize = 4;

pub const DEFAULT_MIN: i32 = 0;
pub const DEFAULT_MAX: i32 = 100;
pub const INITIAL_VALUE: i32 = 50;

pub const CRITICAL_THRESHOLD: i32 = 20;
pub const HEALTHY_THRESHOLD: i32 = 70;
pub const DEPLETED_THRESHOLD: i32 = 0;

// ── Resource type ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ResourceType {
    Popularity,
    Stability,
    MediaTrust,
    EconomicHealth,
}

impl ResourceType {
    /// Every resource type, in store order.
    pub const ALL: [ResourceType; RESOURCE_COUNT] = [
        ResourceType::Popularity,
        ResourceType::Stability,
        ResourceType::MediaTrust,
        ResourceType::EconomicHealth,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ResourceType::Popularity => "Popularity",
            ResourceType::Stability => "Stability",
            ResourceType::MediaTrust => "Media Trust",
            ResourceType::EconomicHealth => "Economic Health",
        }
    }

    /// Snake-case key used in flat text formats.
    pub fn key(self) -> &'static str {
        match self {
            ResourceType::Popularity => "popularity",
            ResourceType::Stability => "stability",
            ResourceType::MediaTrust => "media_trust",
            ResourceType::EconomicHealth => "economic_health",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ResourceType {
    type Err = EngineError;

    /// Accepts the snake-case key or the variant name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceType::ALL
            .into_iter()
            .find(|kind| kind.key() == s || format!("{:?}", kind) == s)
            .ok_or_else(|| EngineError::UnknownResource(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Trend {
    Increasing,
    #[default]
    Stable,
    Decreasing,
}

impl Trend {
    pub fn from_delta(delta: i32) -> Self {
        match delta.signum() {
            1 => Trend::Increasing,
            -1 => Trend::Decreasing,
            _ => Trend::Stable,
        }
    }
}

/// Severity of the store as a whole, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CrisisLevel {
    Normal,
    Warning,
    Severe,
    Critical,
    GameOver,
}

// ── Resource ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resource {
    kind: ResourceType,
    value: i32,
    min: i32,
    max: i32,
    trend: Trend,
}

impl Resource {
    pub fn new(kind: ResourceType, initial: i32) -> Self {
        Self::with_bounds(kind, initial, DEFAULT_MIN, DEFAULT_MAX)
    }

    /// `min` must not exceed `max`.
    pub fn with_bounds(kind: ResourceType, initial: i32, min: i32, max: i32) -> Self {
        debug_assert!(min <= max, "resource bounds inverted: {} > {}", min, max);
        Self {
            kind,
            value: initial.clamp(min, max),
            min,
            max,
            trend: Trend::Stable,
        }
    }

    pub fn kind(&self) -> ResourceType {
        self.kind
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn min(&self) -> i32 {
        self.min
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    /// Apply `amount`, clamp, and return the delta actually applied.
    pub fn modify(&mut self, amount: i32) -> i32 {
        let old = self.value;
        self.value = old.saturating_add(amount).clamp(self.min, self.max);
        let actual = self.value - old;
        self.trend = Trend::from_delta(actual);
        actual
    }

    /// Clamp-and-set. Leaves the trend alone.
    pub fn set_value(&mut self, value: i32) {
        self.value = value.clamp(self.min, self.max);
    }

    pub fn is_critical(&self) -> bool {
        self.value <= CRITICAL_THRESHOLD
    }

    pub fn is_healthy(&self) -> bool {
        self.value >= HEALTHY_THRESHOLD
    }

    pub fn is_depleted(&self) -> bool {
        self.value <= DEPLETED_THRESHOLD
    }
}

// ── ResourceMap ────────────────────────────────────────────────────

/// Partially populated map keyed by the closed resource set.
///
/// Serialized as a JSON object keyed by variant name; iteration follows
/// `ResourceType::ALL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMap<T> {
    slots: [Option<T>; RESOURCE_COUNT],
}

impl<T> Default for ResourceMap<T> {
    fn default() -> Self {
        Self {
            slots: [None, None, None, None],
        }
    }
}

impl<T> ResourceMap<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of `insert`.
    pub fn with(mut self, kind: ResourceType, value: T) -> Self {
        self.insert(kind, value);
        self
    }

    pub fn insert(&mut self, kind: ResourceType, value: T) -> Option<T> {
        self.slots[kind.index()].replace(value)
    }

    pub fn get(&self, kind: ResourceType) -> Option<&T> {
        self.slots[kind.index()].as_ref()
    }

    pub fn contains(&self, kind: ResourceType) -> bool {
        self.slots[kind.index()].is_some()
    }

    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ResourceType, &T)> + '_ {
        ResourceType::ALL
            .into_iter()
            .filter_map(move |kind| self.slots[kind.index()].as_ref().map(|v| (kind, v)))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().flatten()
    }
}

impl<T> FromIterator<(ResourceType, T)> for ResourceMap<T> {
    fn from_iter<I: IntoIterator<Item = (ResourceType, T)>>(iter: I) -> Self {
        let mut map = Self::default();
        for (kind, value) in iter {
            map.insert(kind, value);
        }
        map
    }
}

impl<T: Serialize> Serialize for ResourceMap<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ResourceMap<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = BTreeMap::<ResourceType, T>::deserialize(deserializer)?;
        Ok(entries.into_iter().collect())
    }
}

// ── ResourceStore ──────────────────────────────────────────────────

/// Exactly one `Resource` per type, for the lifetime of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceStore {
    resources: [Resource; RESOURCE_COUNT],
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceStore {
    /// All four resources at `INITIAL_VALUE`.
    pub fn new() -> Self {
        Self::with_values([INITIAL_VALUE; RESOURCE_COUNT])
    }

    /// Values in `ResourceType::ALL` order, clamped into default bounds.
    pub fn with_values(values: [i32; RESOURCE_COUNT]) -> Self {
        Self {
            resources: ResourceType::ALL.map(|kind| Resource::new(kind, values[kind.index()])),
        }
    }

    pub fn get(&self, kind: ResourceType) -> &Resource {
        &self.resources[kind.index()]
    }

    pub fn value(&self, kind: ResourceType) -> i32 {
        self.get(kind).value()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> + '_ {
        self.resources.iter()
    }

    /// Current values of all four resources.
    pub fn values(&self) -> ResourceMap<i32> {
        self.resources.iter().map(|r| (r.kind(), r.value())).collect()
    }

    pub fn modify(&mut self, kind: ResourceType, amount: i32) -> i32 {
        self.resources[kind.index()].modify(amount)
    }

    pub fn set_value(&mut self, kind: ResourceType, value: i32) {
        self.resources[kind.index()].set_value(value);
    }

    /// Apply every effect via `modify`, in store order.
    ///
    /// Per applied entry, queues `ResourceChanged`, then `CrisisTriggered`
    /// if the resource is critical, then `GameOver` if it is depleted.
    /// Returns the deltas actually applied, one entry per effect key.
    pub fn apply_changes(
        &mut self,
        effects: &ResourceMap<i32>,
        events: &mut Vec<GameEvent>,
    ) -> ResourceMap<i32> {
        let mut applied = ResourceMap::new();
        for (kind, &amount) in effects.iter() {
            let change = self.modify(kind, amount);
            applied.insert(kind, change);

            let resource = self.get(kind);
            events.push(GameEvent::ResourceChanged {
                kind,
                new_value: resource.value(),
                change,
            });
            if resource.is_critical() {
                events.push(GameEvent::CrisisTriggered {
                    kind,
                    level: CrisisLevel::Critical,
                });
            }
            if resource.is_depleted() {
                events.push(GameEvent::GameOver);
            }
        }
        applied
    }

    /// Truncated mean of the four values.
    pub fn overall_health(&self) -> i32 {
        let values: Vec<i32> = self.resources.iter().map(Resource::value).collect();
        truncated_mean(&values)
    }

    pub fn is_critical(&self, kind: ResourceType) -> bool {
        self.get(kind).is_critical()
    }

    pub fn is_depleted(&self, kind: ResourceType) -> bool {
        self.get(kind).is_depleted()
    }

    pub fn is_healthy(&self, kind: ResourceType) -> bool {
        self.get(kind).is_healthy()
    }

    pub fn is_in_crisis(&self) -> bool {
        self.resources.iter().any(Resource::is_critical)
    }

    pub fn crisis_level(&self) -> CrisisLevel {
        if self.resources.iter().any(Resource::is_depleted) {
            return CrisisLevel::GameOver;
        }
        match self.resources.iter().filter(|r| r.is_critical()).count() {
            0 => CrisisLevel::Normal,
            1 => CrisisLevel::Warning,
            2 => CrisisLevel::Severe,
            _ => CrisisLevel::Critical,
        }
    }
}
