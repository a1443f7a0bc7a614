//! Join composer: relation descriptors to engine joins
//!
//! [`apply_joins`] folds over a [`JoinMap`] in insertion order, returning a
//! new query value at each step. Each applied join also yields a
//! `relation.*` select expression; the output is purely additive and never
//! removes root columns.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use tracing::warn;

use authbridge_core::{
    resolve_entity, validate_columns, EntityQuery, JoinClause, JoinStrategy, RelationSelect,
    Result,
};

/// Per-root-row bound for lateral joins when the descriptor sets none
pub const DEFAULT_JOIN_LIMIT: usize = 100;

/// Declared cardinality of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    /// At most one related row, exposed as an object (or null)
    OneToOne,
    /// Related rows exposed as an array
    #[default]
    OneToMany,
    /// Related rows exposed as an array
    ManyToMany,
}

/// Join key: `target.to = root.from`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOn {
    /// Column on the root entity
    pub from: String,
    /// Column on the related entity
    pub to: String,
}

/// How one related entity is attached
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinDescriptor {
    /// Join key
    pub on: JoinOn,
    /// Per-root-row bound; `None` or `0` means [`DEFAULT_JOIN_LIMIT`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    /// Cardinality, one-to-many when omitted
    #[serde(default)]
    pub relation: Cardinality,
}

impl JoinDescriptor {
    /// One-to-many descriptor with the default limit
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            on: JoinOn {
                from: from.into(),
                to: to.into(),
            },
            limit: None,
            relation: Cardinality::default(),
        }
    }

    /// Set the cardinality
    pub fn relation(mut self, relation: Cardinality) -> Self {
        self.relation = relation;
        self
    }

    /// Set the per-root-row bound
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn effective_limit(&self) -> usize {
        self.limit.filter(|&l| l > 0).unwrap_or(DEFAULT_JOIN_LIMIT)
    }

    fn strategy(&self) -> JoinStrategy {
        match self.relation {
            Cardinality::OneToOne => JoinStrategy::Left,
            Cardinality::OneToMany | Cardinality::ManyToMany => JoinStrategy::LeftLateral {
                limit: self.effective_limit(),
            },
        }
    }
}

/// Insertion-ordered map from related model name to descriptor
///
/// Serialized as a JSON/TOML map; key order is preserved in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinMap(Vec<(String, JoinDescriptor)>);

impl JoinMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert. A repeated key replaces the earlier descriptor
    /// in place.
    pub fn with(mut self, model: impl Into<String>, descriptor: JoinDescriptor) -> Self {
        self.insert(model, descriptor);
        self
    }

    /// Insert or replace
    pub fn insert(&mut self, model: impl Into<String>, descriptor: JoinDescriptor) {
        let model = model.into();
        match self.0.iter_mut().find(|(k, _)| *k == model) {
            Some((_, existing)) => *existing = descriptor,
            None => self.0.push((model, descriptor)),
        }
    }

    /// Entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &JoinDescriptor)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no entries
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, JoinDescriptor)> for JoinMap {
    fn from_iter<I: IntoIterator<Item = (String, JoinDescriptor)>>(iter: I) -> Self {
        let mut map = JoinMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for JoinMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for JoinMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct JoinMapVisitor;

        impl<'de> Visitor<'de> for JoinMapVisitor {
            type Value = JoinMap;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of model name to join descriptor")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<JoinMap, A::Error> {
                let mut map = JoinMap::new();
                while let Some((k, v)) = access.next_entry::<String, JoinDescriptor>()? {
                    map.insert(k, v);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(JoinMapVisitor)
    }
}

/// Result of [`apply_joins`]
#[derive(Debug, Clone)]
pub struct JoinedQuery {
    /// Query with every resolvable join attached
    pub query: EntityQuery,
    /// `relation.*` select expressions, in application order
    pub select_fields: Vec<RelationSelect>,
}

/// Attach every resolvable join of `joins` to `query`.
///
/// Unresolvable target models are skipped with a warning.
///
/// # Errors
///
/// Returns `UnknownColumn` if `on.from` is not a root column or `on.to` is not
/// a column of the target.
pub fn apply_joins(query: EntityQuery, joins: Option<&JoinMap>) -> Result<JoinedQuery> {
    let Some(joins) = joins else {
        return Ok(JoinedQuery {
            query,
            select_fields: Vec::new(),
        });
    };

    let root = query.entity();
    joins.iter().try_fold(
        JoinedQuery {
            query,
            select_fields: Vec::with_capacity(joins.len()),
        },
        |mut acc, (model, descriptor)| {
            let Some(target) = resolve_entity(model) else {
                warn!(target: "authbridge::join", model, "Model not found in schema, skipping join");
                return Ok(acc);
            };
            validate_columns(root, [descriptor.on.from.as_str()])?;
            validate_columns(target, [descriptor.on.to.as_str()])?;

            acc.query = acc.query.join(JoinClause {
                relation: model.to_string(),
                target,
                from: descriptor.on.from.clone(),
                to: descriptor.on.to.clone(),
                strategy: descriptor.strategy(),
            });
            acc.select_fields.push(RelationSelect {
                relation: model.to_string(),
            });
            Ok(acc)
        },
    )
}
