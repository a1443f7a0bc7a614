//! CRUD adapter: the eight persistence operations
//!
//! Every operation validates the model name (and any column names it was
//! handed) before building a query, so validation errors surface before the
//! engine sees anything. Constraint errors from the engine are returned
//! unchanged.
//!
//! # Operations
//!
//! | Operation | Result | Notes |
//! |-----------|--------|-------|
//! | `create` | row | projected through `select` |
//! | `find_one` | row or none | joins merged into the projection |
//! | `find_many` | rows | sort, limit/offset on root rows, joins |
//! | `update` | row or none | at most one row, all columns |
//! | `update_many` | rows | all columns |
//! | `count` | integer | no row fetch |
//! | `delete` | unit | always physical |
//! | `delete_many` | affected rows | sessions are marked invalid instead |

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use authbridge_core::{
    validate_columns, validate_model, validate_select, Assignment, Changeset, EntityName,
    EntityQuery, QueryExecutor, Result, Row, Selection, SortDirection, Value,
};

use crate::command::Command;
use crate::config::AdapterConfig;
use crate::filter::{compile_where, FilterClause};
use crate::join::{apply_joins, JoinMap};
use crate::options::AuthOptions;
use crate::output::Output;

/// Column set on sessions by `delete_many` instead of removing the row
pub const SESSION_INVALIDATION_COLUMN: &str = "markedInvalidAt";

/// Sort request: `direction` is `asc` in any case for ascending, anything
/// else sorts descending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Column to sort by
    pub field: String,
    /// Direction token
    pub direction: String,
}

impl SortSpec {
    /// Sort spec from a field and direction token
    pub fn new(field: impl Into<String>, direction: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: direction.into(),
        }
    }
}

/// Adapter bound to one executor (the store, or a transaction)
pub struct CrudAdapter<'a, E: QueryExecutor + ?Sized> {
    executor: &'a E,
    config: &'a AdapterConfig,
    options: Arc<AuthOptions>,
}

impl<'a, E: QueryExecutor + ?Sized> CrudAdapter<'a, E> {
    /// Bind an adapter to `executor`
    pub fn new(executor: &'a E, config: &'a AdapterConfig, options: Arc<AuthOptions>) -> Self {
        Self {
            executor,
            config,
            options,
        }
    }

    /// Adapter configuration
    pub fn config(&self) -> &AdapterConfig {
        self.config
    }

    /// Runtime options
    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    /// Insert one row and return it projected through `select`.
    ///
    /// # Errors
    ///
    /// `UnknownModel`, `UnknownColumn` (data keys or select list), or
    /// `ConstraintViolation` from the engine.
    pub fn create(&self, model: &str, data: Row, select: Option<&[String]>) -> Result<Row> {
        let entity = validate_model(model)?;
        validate_columns(entity, data.names())?;
        let selection = validate_select(entity, select)?;

        let data = self.fill_defaults(entity, data);
        let row = self.executor.insert(entity, data)?;
        let row = project(row, &selection);
        self.log_op(entity, "create", 1);
        Ok(row)
    }

    /// First row matching `where_`, with joined relations.
    ///
    /// Zero matches is `Ok(None)`, never an error.
    pub fn find_one(
        &self,
        model: &str,
        where_: &[FilterClause],
        select: Option<&[String]>,
        join: Option<&JoinMap>,
    ) -> Result<Option<Row>> {
        let entity = validate_model(model)?;
        let selection = validate_select(entity, select)?;
        let query = compile_where(EntityQuery::new(entity), where_).query;
        let joined = apply_joins(query, self.joins(join))?;

        let query = joined
            .query
            .select(selection)
            .select_relations(joined.select_fields)
            .limit(1);
        let row = self.executor.select(&query)?.into_iter().next();
        self.log_op(entity, "findOne", usize::from(row.is_some()));
        Ok(row)
    }

    /// Rows matching `where_`, all root columns plus joined relations.
    ///
    /// `limit` and `offset` bound root rows only.
    pub fn find_many(
        &self,
        model: &str,
        where_: &[FilterClause],
        sort_by: Option<&SortSpec>,
        limit: Option<usize>,
        offset: Option<usize>,
        join: Option<&JoinMap>,
    ) -> Result<Vec<Row>> {
        let entity = validate_model(model)?;
        let mut query = compile_where(EntityQuery::new(entity), where_).query;

        if let Some(sort) = sort_by {
            validate_columns(entity, [sort.field.as_str()])?;
            query = query.order_by(sort.field.clone(), SortDirection::from_token(&sort.direction));
        }
        if let Some(limit) = limit {
            query = query.limit(limit);
        }
        if let Some(offset) = offset {
            query = query.offset(offset);
        }

        let joined = apply_joins(query, self.joins(join))?;
        let query = joined
            .query
            .select(Selection::All)
            .select_relations(joined.select_fields);
        let rows = self.executor.select(&query)?;
        self.log_op(entity, "findMany", rows.len());
        Ok(rows)
    }

    /// Update at most one matching row, returning it with all columns.
    pub fn update(&self, model: &str, where_: &[FilterClause], values: Row) -> Result<Option<Row>> {
        let entity = validate_model(model)?;
        validate_columns(entity, values.names())?;
        let query = compile_where(EntityQuery::new(entity), where_).query.limit(1);

        let row = self
            .executor
            .update(&query, &Changeset::from(values))?
            .into_iter()
            .next();
        self.log_op(entity, "update", usize::from(row.is_some()));
        Ok(row)
    }

    /// Update every matching row, returning them with all columns.
    pub fn update_many(&self, model: &str, where_: &[FilterClause], values: Row) -> Result<Vec<Row>> {
        let entity = validate_model(model)?;
        validate_columns(entity, values.names())?;
        let query = compile_where(EntityQuery::new(entity), where_).query;

        let rows = self.executor.update(&query, &Changeset::from(values))?;
        self.log_op(entity, "updateMany", rows.len());
        Ok(rows)
    }

    /// Number of matching rows.
    pub fn count(&self, model: &str, where_: &[FilterClause]) -> Result<u64> {
        let entity = validate_model(model)?;
        let query = compile_where(EntityQuery::new(entity), where_).query;
        let n = self.executor.count(&query)?;
        self.log_op(entity, "count", 1);
        Ok(n)
    }

    /// Physically remove matching rows.
    pub fn delete(&self, model: &str, where_: &[FilterClause]) -> Result<()> {
        let entity = validate_model(model)?;
        let query = compile_where(EntityQuery::new(entity), where_).query;
        let removed = self.executor.delete(&query)?;
        self.log_op(entity, "delete", removed as usize);
        Ok(())
    }

    /// Remove matching rows and return how many were affected.
    ///
    /// Sessions are never removed here: matching sessions get
    /// `markedInvalidAt` set to the engine's current time.
    pub fn delete_many(&self, model: &str, where_: &[FilterClause]) -> Result<u64> {
        let entity = validate_model(model)?;
        let query = compile_where(EntityQuery::new(entity), where_).query;

        let affected = if entity == EntityName::Session {
            let changes = Changeset::new().set(SESSION_INVALIDATION_COLUMN, Assignment::CurrentTimestamp);
            self.executor.update(&query, &changes)?.len() as u64
        } else {
            self.executor.delete(&query)?
        };
        self.log_op(entity, "deleteMany", affected as usize);
        Ok(affected)
    }

    /// Run one serialized command.
    ///
    /// Each [`Command`] variant maps to exactly one [`Output`] variant.
    pub fn execute(&self, command: Command) -> Result<Output> {
        match command {
            Command::Create {
                model,
                data,
                select,
            } => self
                .create(&model, data, select.as_deref())
                .map(Output::Row),
            Command::FindOne {
                model,
                where_,
                select,
                join,
            } => self
                .find_one(&model, &where_, select.as_deref(), join.as_ref())
                .map(Output::MaybeRow),
            Command::FindMany {
                model,
                where_,
                sort_by,
                limit,
                offset,
                join,
            } => self
                .find_many(&model, &where_, sort_by.as_ref(), limit, offset, join.as_ref())
                .map(Output::Rows),
            Command::Update {
                model,
                where_,
                update,
            } => self.update(&model, &where_, update).map(Output::MaybeRow),
            Command::UpdateMany {
                model,
                where_,
                update,
            } => self.update_many(&model, &where_, update).map(Output::Rows),
            Command::Count { model, where_ } => self.count(&model, &where_).map(Output::Count),
            Command::Delete { model, where_ } => self.delete(&model, &where_).map(|()| Output::Unit),
            Command::DeleteMany { model, where_ } => {
                self.delete_many(&model, &where_).map(Output::Count)
            }
        }
    }

    fn joins<'j>(&self, join: Option<&'j JoinMap>) -> Option<&'j JoinMap> {
        join.filter(|_| self.options.experimental_joins)
    }

    /// Adapter-side id generation. Every other column is left to the caller
    /// and the engine's defaults.
    fn fill_defaults(&self, entity: EntityName, mut data: Row) -> Row {
        if !self.config.disable_id_generation
            && self.options.generate_id
            && entity.has_column("id")
            && data.get("id").map_or(true, Value::is_null)
        {
            data.insert("id", Value::String(uuid::Uuid::new_v4().to_string()));
        }
        data
    }

    fn log_op(&self, entity: EntityName, op: &'static str, rows: usize) {
        if self.config.debug_logs {
            debug!(
                target: "authbridge::adapter",
                adapter = %self.config.adapter_id,
                model = self.config.model_label(entity),
                op,
                rows,
                "Adapter operation"
            );
        }
    }
}

fn project(row: Row, selection: &Selection) -> Row {
    match selection {
        Selection::All => row,
        Selection::Columns(names) => row
            .into_iter()
            .filter(|(name, _)| names.iter().any(|n| *n == name.as_str()))
            .collect(),
    }
}
