//! Query fragments handed from the adapter to a query executor
//!
//! [`EntityQuery`] is an immutable builder: every method consumes the query
//! and returns a new value, so callers fold over filters and joins without
//! sharing mutable state. Nothing here executes; an [`crate::QueryExecutor`]
//! interprets the finished fragment.

use serde::{Deserialize, Serialize};

use crate::schema::{EntityName, Selection};
use crate::value::Value;

/// Native comparison operators understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOp {
    /// `=` (`IS NULL` when the operand is null)
    Eq,
    /// `<>` (`IS NOT NULL` when the operand is null)
    Not,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `IN (..)`
    In,
    /// `NOT IN (..)`
    NotIn,
    /// case-insensitive `%value%`
    Contains,
    /// case-insensitive `value%`
    StartsWith,
    /// case-insensitive `%value`
    EndsWith,
}

/// One `{field: {op: value}}` condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Column the condition applies to
    pub field: String,
    /// Operator
    pub op: ComparisonOp,
    /// Operand
    pub value: Value,
}

impl Condition {
    /// Direct key/value equality
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, ComparisonOp::Eq, value)
    }

    /// Condition with an explicit operator
    pub fn new(field: impl Into<String>, op: ComparisonOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

/// Boolean predicate tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Predicate {
    /// Leaf condition
    Condition(Condition),
    /// All children must hold
    And(Vec<Predicate>),
    /// At least one child must hold
    Or(Vec<Predicate>),
}

impl Predicate {
    /// Conjoin, flattening nested `And`s
    pub fn and(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::And(mut left), Predicate::And(right)) => {
                left.extend(right);
                Predicate::And(left)
            }
            (Predicate::And(mut left), right) => {
                left.push(right);
                Predicate::And(left)
            }
            (left, right) => Predicate::And(vec![left, right]),
        }
    }

    /// Disjoin, flattening nested `Or`s
    pub fn or(self, other: Predicate) -> Predicate {
        match (self, other) {
            (Predicate::Or(mut left), Predicate::Or(right)) => {
                left.extend(right);
                Predicate::Or(left)
            }
            (Predicate::Or(mut left), right) => {
                left.push(right);
                Predicate::Or(left)
            }
            (left, right) => Predicate::Or(vec![left, right]),
        }
    }
}

impl From<Condition> for Predicate {
    fn from(c: Condition) -> Self {
        Predicate::Condition(c)
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    /// Ascending, nulls last
    Asc,
    /// Descending, nulls first
    Desc,
}

impl SortDirection {
    /// Map a direction token: `asc` in any case is ascending, anything else
    /// is descending.
    pub fn from_token(token: &str) -> Self {
        if token.eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }
}

/// Ordering on one column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    /// Column
    pub field: String,
    /// Direction
    pub direction: SortDirection,
}

/// How a relation is attached to each root row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinStrategy {
    /// Plain left join; at most one related row is kept per root row
    Left,
    /// Lateral left join bounded to `limit` related rows per root row
    LeftLateral {
        /// Per-root-row bound
        limit: usize,
    },
}

/// A join of a related entity onto the root query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinClause {
    /// Name the relation is exposed under in result rows
    pub relation: String,
    /// Related entity
    pub target: EntityName,
    /// Column on the root entity
    pub from: String,
    /// Column on the related entity matched against `from`
    pub to: String,
    /// Join strategy
    pub strategy: JoinStrategy,
}

/// Select expression `relation.*` registered by a join
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationSelect {
    /// Relation name (key in the output row)
    pub relation: String,
}

impl RelationSelect {
    /// Render as the engine's `{relation: "relation.*"}` expression
    pub fn expression(&self) -> String {
        format!("{}.*", self.relation)
    }
}

/// Projection of a query: root columns plus relation select expressions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projection {
    /// Root-entity columns
    pub columns: Selection,
    /// Relations to include, in registration order
    pub relations: Vec<RelationSelect>,
}

impl Default for Projection {
    fn default() -> Self {
        Self {
            columns: Selection::All,
            relations: Vec::new(),
        }
    }
}

/// A composed query against one root entity
#[derive(Debug, Clone, PartialEq)]
pub struct EntityQuery {
    entity: EntityName,
    filter: Option<Predicate>,
    order: Vec<OrderBy>,
    limit: Option<usize>,
    offset: Option<usize>,
    joins: Vec<JoinClause>,
    projection: Projection,
}

impl EntityQuery {
    /// Unfiltered query over every row of `entity`
    pub fn new(entity: EntityName) -> Self {
        Self {
            entity,
            filter: None,
            order: Vec::new(),
            limit: None,
            offset: None,
            joins: Vec::new(),
            projection: Projection::default(),
        }
    }

    /// AND a predicate onto the existing filter
    pub fn and_where(mut self, predicate: impl Into<Predicate>) -> Self {
        let predicate = predicate.into();
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// OR a predicate against the existing filter.
    ///
    /// On an unfiltered query this is simply the predicate.
    pub fn or_where(mut self, predicate: impl Into<Predicate>) -> Self {
        let predicate = predicate.into();
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.or(predicate),
            None => predicate,
        });
        self
    }

    /// Append an ordering term
    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Bound the number of root rows
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Skip root rows
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Attach a join
    pub fn join(mut self, clause: JoinClause) -> Self {
        self.joins.push(clause);
        self
    }

    /// Replace the root-column projection
    pub fn select(mut self, columns: Selection) -> Self {
        self.projection.columns = columns;
        self
    }

    /// Append relation select expressions to the projection
    pub fn select_relations(mut self, relations: impl IntoIterator<Item = RelationSelect>) -> Self {
        self.projection.relations.extend(relations);
        self
    }

    /// Root entity
    pub fn entity(&self) -> EntityName {
        self.entity
    }

    /// Composed filter, `None` matches every row
    pub fn filter(&self) -> Option<&Predicate> {
        self.filter.as_ref()
    }

    /// Ordering terms
    pub fn ordering(&self) -> &[OrderBy] {
        &self.order
    }

    /// Root-row limit
    pub fn row_limit(&self) -> Option<usize> {
        self.limit
    }

    /// Root-row offset
    pub fn row_offset(&self) -> Option<usize> {
        self.offset
    }

    /// Joins in application order
    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    /// Projection
    pub fn projection(&self) -> &Projection {
        &self.projection
    }
}

/// Right-hand side of an update assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Assignment {
    /// Literal value
    Value(Value),
    /// The engine's current time (`CURRENT_TIMESTAMP`)
    CurrentTimestamp,
}

impl From<Value> for Assignment {
    fn from(v: Value) -> Self {
        Assignment::Value(v)
    }
}

/// Ordered set of column assignments for an update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changeset {
    assignments: Vec<(String, Assignment)>,
}

impl Changeset {
    /// Empty changeset
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style assignment
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Assignment>) -> Self {
        self.assignments.push((column.into(), value.into()));
        self
    }

    /// Assignments in order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.assignments.iter().map(|(c, a)| (c.as_str(), a))
    }

    /// Column names touched
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(c, _)| c.as_str())
    }

    /// Whether the changeset assigns `column`
    pub fn touches(&self, column: &str) -> bool {
        self.columns().any(|c| c == column)
    }

    /// Whether nothing is assigned
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl From<crate::row::Row> for Changeset {
    fn from(row: crate::row::Row) -> Self {
        Self {
            assignments: row
                .into_iter()
                .map(|(c, v)| (c, Assignment::Value(v)))
                .collect(),
        }
    }
}
