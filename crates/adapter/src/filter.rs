//! Filter compiler: abstract where-clauses to engine predicates
//!
//! Clauses are applied in list order. `AND` clauses accumulate on the running
//! query. An `OR` clause is applied against the query that was passed in, not
//! the accumulator, so a later `OR` replaces everything compiled before it
//! and sequential `OR`s do not compound:
//!
//! ```text
//! [a AND, b AND]       => a AND b
//! [a AND, b OR]        => base OR b        (a is dropped)
//! [a OR,  b OR]        => base OR b        (a is dropped)
//! [a OR,  b AND]       => (base OR a) AND b
//! ```
//!
//! This mirrors the behavior callers were built against and is kept as-is.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use authbridge_core::{ComparisonOp, Condition, EntityQuery, Value};

/// Operator token of a where-clause
///
/// Serialized as its wire token (`"eq"`, `"not_in"`, ...). Unrecognized
/// tokens are kept verbatim in [`Operator::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Operator {
    /// `eq`
    #[default]
    Eq,
    /// `ne`
    Ne,
    /// `lt`
    Lt,
    /// `lte`
    Lte,
    /// `gt`
    Gt,
    /// `gte`
    Gte,
    /// `in`
    In,
    /// `not_in`
    NotIn,
    /// `contains`
    Contains,
    /// `starts_with`
    StartsWith,
    /// `ends_with`
    EndsWith,
    /// Any token outside the table
    Other(String),
}

impl Operator {
    /// Wire token
    pub fn as_str(&self) -> &str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::Contains => "contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::Other(token) => token,
        }
    }

    /// Look the operator up in the native operator table.
    pub fn resolve(&self) -> OperatorResolution {
        let op = match self {
            Operator::Eq => ComparisonOp::Eq,
            Operator::Ne => ComparisonOp::Not,
            Operator::Lt => ComparisonOp::Lt,
            Operator::Lte => ComparisonOp::Lte,
            Operator::Gt => ComparisonOp::Gt,
            Operator::Gte => ComparisonOp::Gte,
            Operator::In => ComparisonOp::In,
            Operator::NotIn => ComparisonOp::NotIn,
            Operator::Contains => ComparisonOp::Contains,
            Operator::StartsWith => ComparisonOp::StartsWith,
            Operator::EndsWith => ComparisonOp::EndsWith,
            Operator::Other(token) => {
                return OperatorResolution::Fallback {
                    token: token.clone(),
                }
            }
        };
        OperatorResolution::Mapped(op)
    }
}

impl From<String> for Operator {
    fn from(token: String) -> Self {
        match token.as_str() {
            "eq" => Operator::Eq,
            "ne" => Operator::Ne,
            "lt" => Operator::Lt,
            "lte" => Operator::Lte,
            "gt" => Operator::Gt,
            "gte" => Operator::Gte,
            "in" => Operator::In,
            "not_in" => Operator::NotIn,
            "contains" => Operator::Contains,
            "starts_with" => Operator::StartsWith,
            "ends_with" => Operator::EndsWith,
            _ => Operator::Other(token),
        }
    }
}

impl From<&str> for Operator {
    fn from(token: &str) -> Self {
        Operator::from(token.to_string())
    }
}

impl From<Operator> for String {
    fn from(op: Operator) -> Self {
        match op {
            Operator::Other(token) => token,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How an operator token was compiled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorResolution {
    /// Found in the operator table
    Mapped(ComparisonOp),
    /// Not in the table; compiled as equality
    Fallback {
        /// The unrecognized token
        token: String,
    },
}

impl OperatorResolution {
    /// Engine operator actually used
    pub fn op(&self) -> ComparisonOp {
        match self {
            OperatorResolution::Mapped(op) => *op,
            OperatorResolution::Fallback { .. } => ComparisonOp::Eq,
        }
    }

    /// Whether the equality fallback was taken
    pub fn is_fallback(&self) -> bool {
        matches!(self, OperatorResolution::Fallback { .. })
    }
}

/// Boolean connector of a where-clause
///
/// Only the exact token `"OR"` selects [`Connector::Or`]; any other token
/// reads as `AND`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Connector {
    /// Accumulate on the running query
    #[default]
    And,
    /// Alternative against the original query
    Or,
}

impl Connector {
    /// Wire token
    pub fn as_str(&self) -> &'static str {
        match self {
            Connector::And => "AND",
            Connector::Or => "OR",
        }
    }
}

impl From<String> for Connector {
    fn from(token: String) -> Self {
        if token == "OR" {
            Connector::Or
        } else {
            Connector::And
        }
    }
}

impl From<Connector> for String {
    fn from(connector: Connector) -> Self {
        connector.as_str().to_string()
    }
}

/// One abstract where-clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    /// Column name
    pub field: String,
    /// Operator token, `eq` when omitted
    #[serde(default)]
    pub operator: Operator,
    /// Operand
    pub value: Value,
    /// Connector, `AND` when omitted
    #[serde(default)]
    pub connector: Connector,
}

impl FilterClause {
    /// `field = value`, AND-connected
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(field, Operator::Eq, value)
    }

    /// AND-connected clause with an explicit operator
    pub fn new(field: impl Into<String>, operator: impl Into<Operator>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operator: operator.into(),
            value: value.into(),
            connector: Connector::And,
        }
    }

    /// Switch the connector to `OR`
    pub fn or(mut self) -> Self {
        self.connector = Connector::Or;
        self
    }
}

/// Result of [`compile_where`]
#[derive(Debug, Clone)]
pub struct CompiledWhere {
    /// Filtered query, not executed
    pub query: EntityQuery,
    /// Per-clause operator resolution, in clause order
    pub resolutions: Vec<OperatorResolution>,
}

/// Compile `clauses` onto `query`.
///
/// An empty clause list returns `query` unmodified. Never fails: unknown
/// operators compile as equality and are reported in `resolutions`.
pub fn compile_where(query: EntityQuery, clauses: &[FilterClause]) -> CompiledWhere {
    let base = query.clone();
    let mut acc = query;
    let mut resolutions = Vec::with_capacity(clauses.len());

    for clause in clauses {
        let resolution = clause.operator.resolve();
        if let OperatorResolution::Fallback { token } = &resolution {
            debug!(
                target: "authbridge::filter",
                field = %clause.field,
                operator = %token,
                "Unknown operator, falling back to equality"
            );
        }

        let condition = Condition::new(clause.field.clone(), resolution.op(), clause.value.clone());
        acc = match clause.connector {
            Connector::And => acc.and_where(condition),
            Connector::Or => base.clone().or_where(condition),
        };
        resolutions.push(resolution);
    }

    CompiledWhere {
        query: acc,
        resolutions,
    }
}
