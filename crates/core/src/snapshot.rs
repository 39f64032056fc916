//! Read-only entity snapshot passed into rule evaluation.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::{EntityId, TenantId};

const NULL: Value = Value::Null;

/// A fully-resolved, read-only record of a business entity.
///
/// Snapshots include the relations rule conditions may traverse (e.g. the
/// order's client). They are never mutated in place: all effects flow through
/// explicit store updates, and re-evaluating the same snapshot against the
/// same rule set always yields the same result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    entity_type: String,
    entity_id: EntityId,
    tenant_id: Option<TenantId>,
    fields: Map<String, Value>,
}

impl EntitySnapshot {
    pub fn new(
        entity_type: impl Into<String>,
        entity_id: EntityId,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_id,
            tenant_id: None,
            fields,
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn entity_id(&self) -> EntityId {
        self.entity_id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Resolve a dotted field path by sequential key lookup.
    ///
    /// Supports relation traversal (e.g. `client.nom_entreprise`). A missing
    /// key, or traversal through a non-object value, resolves to `Null` — the
    /// "absent" value the condition evaluator treats as empty.
    pub fn field(&self, path: &str) -> &Value {
        let mut segments = path.split('.');

        let first = match segments.next() {
            Some(s) if !s.is_empty() => s,
            _ => return &NULL,
        };

        let mut current = match self.fields.get(first) {
            Some(v) => v,
            None => return &NULL,
        };

        for segment in segments {
            current = match current {
                Value::Object(map) => match map.get(segment) {
                    Some(v) => v,
                    None => return &NULL,
                },
                _ => return &NULL,
            };
        }

        current
    }
}
