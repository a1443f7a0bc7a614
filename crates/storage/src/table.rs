//! Table: rows of one entity plus the constraints that guard them
//!
//! Every mutating method is all-or-nothing: the new state is staged and only
//! swapped in after every constraint passed, so a failed statement never
//! leaves a partially applied write behind.
//!
//! # Constraints
//!
//! - unknown columns are rejected
//! - NOT NULL columns without a default must be supplied
//! - values must match the column kind
//! - primary key and unique keys may not collide (NULL components never collide)

use authbridge_core::{
    Assignment, Changeset, ColumnDef, ColumnDefault, ColumnKind, EntityName, Error, Predicate,
    Result, Row, Timestamp, Value,
};

use crate::eval::{matches, sql_eq, NULL};

/// Rows of a single entity
#[derive(Debug, Clone)]
pub(crate) struct Table {
    entity: EntityName,
    rows: Vec<Row>,
    /// Bumped on every successful write; used for commit validation
    version: u64,
    /// Next value handed out by `ColumnDefault::Serial`
    next_serial: i64,
}

impl Table {
    pub(crate) fn new(entity: EntityName) -> Self {
        Self {
            entity,
            rows: Vec::new(),
            version: 0,
            next_serial: 1,
        }
    }

    pub(crate) fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub(crate) fn version(&self) -> u64 {
        self.version
    }

    /// Insert one row, filling defaults.
    pub(crate) fn insert(&mut self, values: Row, now: Timestamp) -> Result<Row> {
        authbridge_core::validate_columns(self.entity, values.names())?;

        let mut row = Row::new();
        let mut next_serial = self.next_serial;
        for def in self.entity.columns() {
            let value = match values.get(def.name) {
                Some(v) => v.clone(),
                None => match def.default {
                    Some(ColumnDefault::GeneratedId) => Value::String(uuid::Uuid::new_v4().to_string()),
                    Some(ColumnDefault::Serial) => {
                        let v = next_serial;
                        next_serial = next_serial
                            .checked_add(1)
                            .ok_or_else(|| Error::constraint(format!("{} serial sequence exhausted", self.entity)))?;
                        Value::Int(v)
                    }
                    Some(ColumnDefault::Bool(b)) => Value::Bool(b),
                    Some(ColumnDefault::Now) => now.into(),
                    None => Value::Null,
                },
            };
            self.check_value(def, &value)?;
            if let (Some(ColumnDefault::Serial), Value::Int(explicit)) = (def.default, &value) {
                next_serial = next_serial.max(explicit.saturating_add(1));
            }
            row.insert(def.name, value);
        }

        self.check_unique(&row, None)?;

        self.rows.push(row.clone());
        self.next_serial = next_serial;
        self.version += 1;
        Ok(row)
    }

    /// Apply `changes` to matching rows (at most `limit` of them).
    ///
    /// `updatedAt` is refreshed unless the changeset sets it explicitly.
    pub(crate) fn update(
        &mut self,
        filter: Option<&Predicate>,
        limit: Option<usize>,
        changes: &Changeset,
        now: Timestamp,
    ) -> Result<Vec<Row>> {
        authbridge_core::validate_columns(self.entity, changes.columns())?;

        let targets: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches(filter, row))
            .map(|(i, _)| i)
            .take(limit.unwrap_or(usize::MAX))
            .collect();

        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let touch_updated_at = self.entity.has_column("updatedAt") && !changes.touches("updatedAt");
        let mut staged = self.rows.clone();
        for &i in &targets {
            let row = &mut staged[i];
            for (column, assignment) in changes.iter() {
                let value = match assignment {
                    Assignment::Value(v) => v.clone(),
                    Assignment::CurrentTimestamp => now.into(),
                };
                row.insert(column, value);
            }
            if touch_updated_at {
                row.insert("updatedAt", now.into());
            }
            for def in self.entity.columns() {
                self.check_value(def, row.get(def.name).unwrap_or(&NULL))?;
            }
        }

        for &i in &targets {
            check_unique_in(self.entity, &staged, &staged[i], Some(i))?;
        }

        let updated = targets.iter().map(|&i| staged[i].clone()).collect();
        self.rows = staged;
        self.version += 1;
        Ok(updated)
    }

    /// Remove matching rows, returning how many were removed.
    pub(crate) fn delete(&mut self, filter: Option<&Predicate>) -> u64 {
        let before = self.rows.len();
        self.rows.retain(|row| !matches(filter, row));
        let removed = (before - self.rows.len()) as u64;
        if removed > 0 {
            self.version += 1;
        }
        removed
    }

    fn check_value(&self, def: &ColumnDef, value: &Value) -> Result<()> {
        if value.is_null() {
            if def.nullable {
                return Ok(());
            }
            return Err(Error::constraint(format!(
                "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                def.name, self.entity
            )));
        }

        let ok = match def.kind {
            // uuid format is not enforced; ids arrive from external providers too
            ColumnKind::Text | ColumnKind::Uuid => matches!(value, Value::String(_)),
            ColumnKind::Bool => matches!(value, Value::Bool(_)),
            ColumnKind::Integer | ColumnKind::Timestamp => matches!(value, Value::Int(_)),
        };
        if ok {
            Ok(())
        } else {
            Err(Error::constraint(format!(
                "column \"{}\" of relation \"{}\" is {:?} but value is {}",
                def.name,
                self.entity,
                def.kind,
                value.type_name()
            )))
        }
    }

    fn check_unique(&self, row: &Row, skip: Option<usize>) -> Result<()> {
        check_unique_in(self.entity, &self.rows, row, skip)
    }
}

/// Check `row` against every other row of `rows` on each key of `entity`.
fn check_unique_in(
    entity: EntityName,
    rows: &[Row],
    row: &Row,
    skip: Option<usize>,
) -> Result<()> {
    let keys = std::iter::once(entity.primary_key()).chain(entity.unique_keys().iter().copied());
    for key in keys {
        let collides = rows.iter().enumerate().any(|(i, other)| {
            Some(i) != skip
                && key.iter().all(|col| {
                    let a = row.get(col).unwrap_or(&NULL);
                    let b = other.get(col).unwrap_or(&NULL);
                    sql_eq(a, b)
                })
        });
        if collides {
            return Err(Error::constraint(format!(
                "duplicate key value violates unique constraint \"{}_{}_key\"",
                entity,
                key.join("_")
            )));
        }
    }
    Ok(())
}
