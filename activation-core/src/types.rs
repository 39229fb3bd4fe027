//! Entity model and operation reports

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::fanout::CallFailure;

/// Opaque entity identifier.
///
/// The store may hand out numeric or string ids; both decode to the same
/// textual form. Ordering is lexicographic on that text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => EntityId(text),
            RawId::Number(number) => EntityId(number.to_string()),
        })
    }
}

/// An activatable item as the remote store reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identifier
    pub id: EntityId,
    /// Whether this entity is the current selection
    #[serde(rename = "isActive", default, deserialize_with = "flag_or_false")]
    pub active: bool,
    /// Creation time; only used to pick a reconciliation winner
    #[serde(
        rename = "createdAt",
        default,
        deserialize_with = "timestamp_or_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    /// Business fields, carried through untouched
    #[serde(flatten)]
    pub payload: serde_json::Map<String, serde_json::Value>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, active: bool) -> Self {
        Self {
            id: id.into(),
            active,
            created_at: None,
            payload: serde_json::Map::new(),
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.payload.insert(key.into(), value);
        self
    }
}

fn flag_or_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Accepts RFC 3339, a zone-less datetime taken as UTC, or epoch millis.
/// Anything else decodes as unknown rather than failing the record.
fn timestamp_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(parse_timestamp))
}

fn parse_timestamp(value: &serde_json::Value) -> Option<DateTime<Utc>> {
    match value {
        serde_json::Value::String(text) => {
            let text = text.trim();
            DateTime::parse_from_rfc3339(text)
                .map(|ts| ts.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                        .iter()
                        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
                        .map(|naive| naive.and_utc())
                })
        }
        serde_json::Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|millis| millis as i64))
            .and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

/// Counters over the cached collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionStatus {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub active_ids: Vec<EntityId>,
}

impl CollectionStatus {
    /// More than one entity is active.
    pub fn violation(&self) -> bool {
        self.active > 1
    }
}

/// What an activation would do, computed from the cache without I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationPlan {
    pub target: EntityId,
    /// Target is already believed active, so no activation call is needed
    pub already_active: bool,
    /// Other active entities that will be switched off
    pub to_deactivate: Vec<EntityId>,
}

impl ActivationPlan {
    pub fn is_noop(&self) -> bool {
        self.already_active && self.to_deactivate.is_empty()
    }

    pub fn call_count(&self) -> usize {
        self.to_deactivate.len() + usize::from(!self.already_active)
    }
}

/// Outcome of an activation.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationReport {
    pub activated_id: EntityId,
    /// Target is confirmed active, either already or by a successful call
    pub activated: bool,
    /// Entities whose deactivation was confirmed
    pub deactivated_ids: BTreeSet<EntityId>,
    /// Calls that did not apply, keyed by entity
    pub failures: BTreeMap<EntityId, CallFailure>,
    pub calls_issued: usize,
}

impl ActivationReport {
    pub fn failed_ids(&self) -> BTreeSet<EntityId> {
        self.failures.keys().cloned().collect()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Outcome of a single deactivation.
#[derive(Debug, Clone, PartialEq)]
pub struct DeactivationReport {
    pub deactivated_id: EntityId,
    pub failed: bool,
    pub failure: Option<CallFailure>,
}

/// Outcome of a reconciliation sweep.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReconcileReport {
    pub kept_active_id: Option<EntityId>,
    pub deactivated_ids: BTreeSet<EntityId>,
    /// Deactivations that did not apply; these entities are still violations
    pub failures: BTreeMap<EntityId, CallFailure>,
    pub violation_found: bool,
    pub calls_issued: usize,
}

impl ReconcileReport {
    pub fn failed_ids(&self) -> BTreeSet<EntityId> {
        self.failures.keys().cloned().collect()
    }

    /// Violation remains after this sweep.
    pub fn has_residue(&self) -> bool {
        !self.failures.is_empty()
    }
}
