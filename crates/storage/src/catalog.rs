//! Catalog: one table per registered entity, plus query evaluation
//!
//! Reads run in four steps:
//! 1. filter root rows
//! 2. stable sort, then offset and limit
//! 3. attach every projected relation (joins read unprojected root rows)
//! 4. project root columns
//!
//! Joins whose relation is not in the projection are not evaluated at all.

use std::collections::BTreeMap;

use authbridge_core::{
    Changeset, Condition, EntityName, EntityQuery, Error, JoinClause, JoinStrategy, Predicate,
    Result, Row, Selection, Timestamp, Value,
};

use crate::eval::{compare_rows, matches, sql_eq, NULL};
use crate::table::Table;

#[derive(Debug, Clone)]
pub(crate) struct Catalog {
    tables: BTreeMap<EntityName, Table>,
}

impl Catalog {
    pub(crate) fn new() -> Self {
        Self {
            tables: EntityName::ALL
                .into_iter()
                .map(|entity| (entity, Table::new(entity)))
                .collect(),
        }
    }

    pub(crate) fn table(&self, entity: EntityName) -> Result<&Table> {
        self.tables
            .get(&entity)
            .ok_or_else(|| Error::internal(format!("no table for {entity}")))
    }

    pub(crate) fn table_mut(&mut self, entity: EntityName) -> Result<&mut Table> {
        self.tables
            .get_mut(&entity)
            .ok_or_else(|| Error::internal(format!("no table for {entity}")))
    }

    /// Per-table write versions, used to detect concurrent commits
    pub(crate) fn version(&self, entity: EntityName) -> u64 {
        self.tables.get(&entity).map_or(0, Table::version)
    }

    pub(crate) fn take_table(&mut self, entity: EntityName) -> Option<Table> {
        self.tables.remove(&entity)
    }

    /// Replace one table with another catalog's copy
    pub(crate) fn install(&mut self, entity: EntityName, table: Table) {
        self.tables.insert(entity, table);
    }

    pub(crate) fn select(&self, query: &EntityQuery) -> Result<Vec<Row>> {
        check_query(query)?;
        let root = self.table(query.entity())?;

        let mut rows: Vec<&Row> = root
            .rows()
            .iter()
            .filter(|row| matches(query.filter(), row))
            .collect();
        if !query.ordering().is_empty() {
            rows.sort_by(|a, b| compare_rows(a, b, query.ordering()));
        }
        let rows = rows
            .into_iter()
            .skip(query.row_offset().unwrap_or(0))
            .take(query.row_limit().unwrap_or(usize::MAX));

        let projection = query.projection();
        let relations: Vec<&JoinClause> = projection
            .relations
            .iter()
            .filter_map(|sel| query.joins().iter().find(|j| j.relation == sel.relation))
            .collect();

        let mut out = Vec::new();
        for row in rows {
            let mut projected = project(row, &projection.columns);
            for join in &relations {
                let related = self.related(row, join)?;
                projected.insert(join.relation.clone(), related);
            }
            out.push(projected);
        }
        Ok(out)
    }

    pub(crate) fn count(&self, query: &EntityQuery) -> Result<u64> {
        check_query(query)?;
        let root = self.table(query.entity())?;
        let n = root
            .rows()
            .iter()
            .filter(|row| matches(query.filter(), row))
            .count();
        Ok(n as u64)
    }

    pub(crate) fn insert(&mut self, entity: EntityName, values: Row) -> Result<Row> {
        self.table_mut(entity)?.insert(values, Timestamp::now())
    }

    pub(crate) fn update(&mut self, query: &EntityQuery, changes: &Changeset) -> Result<Vec<Row>> {
        check_filter(query.entity(), query.filter())?;
        self.table_mut(query.entity())?.update(
            query.filter(),
            query.row_limit(),
            changes,
            Timestamp::now(),
        )
    }

    pub(crate) fn delete(&mut self, query: &EntityQuery) -> Result<u64> {
        check_filter(query.entity(), query.filter())?;
        Ok(self.table_mut(query.entity())?.delete(query.filter()))
    }

    /// Rows of the join target whose `to` column equals the root row's `from`
    fn related(&self, root: &Row, join: &JoinClause) -> Result<Value> {
        let key = root.get(&join.from).unwrap_or(&NULL);
        let mut hits = self
            .table(join.target)?
            .rows()
            .iter()
            .filter(|target| sql_eq(target.get(&join.to).unwrap_or(&NULL), key));

        Ok(match join.strategy {
            JoinStrategy::Left => hits
                .next()
                .map_or(Value::Null, |row| row.clone().into_value()),
            JoinStrategy::LeftLateral { limit } => Value::Array(
                hits.take(limit)
                    .map(|row| row.clone().into_value())
                    .collect(),
            ),
        })
    }
}

fn project(row: &Row, columns: &Selection) -> Row {
    match columns {
        Selection::All => row.clone(),
        Selection::Columns(names) => names
            .iter()
            .map(|name| {
                let value = row.get(name).cloned().unwrap_or(Value::Null);
                (name.to_string(), value)
            })
            .collect(),
    }
}

/// Reject references to columns the engine does not have
fn check_query(query: &EntityQuery) -> Result<()> {
    let entity = query.entity();
    check_filter(entity, query.filter())?;
    authbridge_core::validate_columns(entity, query.ordering().iter().map(|o| o.field.as_str()))?;
    for join in query.joins() {
        authbridge_core::validate_columns(entity, [join.from.as_str()])?;
        authbridge_core::validate_columns(join.target, [join.to.as_str()])?;
    }
    Ok(())
}

fn check_filter(entity: EntityName, filter: Option<&Predicate>) -> Result<()> {
    let mut fields = Vec::new();
    if let Some(p) = filter {
        collect_fields(p, &mut fields);
    }
    authbridge_core::validate_columns(entity, fields.iter().map(|c| c.field.as_str()))
}

fn collect_fields<'a>(predicate: &'a Predicate, out: &mut Vec<&'a Condition>) {
    match predicate {
        Predicate::Condition(c) => out.push(c),
        Predicate::And(children) | Predicate::Or(children) => {
            for child in children {
                collect_fields(child, out);
            }
        }
    }
}
