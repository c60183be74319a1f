//! Create, read, update and delete helpers for any [`Model`].

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde::Serialize;
use sqlkit_common::{Error, Result};

use crate::model::{check_column, Model};
use crate::query::Query;
use crate::scope::Scope;

fn insert_sql<M: Model>(with_key: bool) -> String {
    let mut columns: Vec<&str> = Vec::with_capacity(M::COLUMNS.len() + 1);
    if with_key {
        columns.push(M::PRIMARY_KEY);
    }
    columns.extend_from_slice(M::COLUMNS);
    let placeholders = vec!["?"; columns.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        M::TABLE,
        columns.join(", "),
        placeholders
    )
}

fn insert_row<M: Model>(conn: &Connection, model: &M) -> Result<i64> {
    let mut values = model.values();
    let sql = match model.id() {
        Some(id) => {
            values.insert(0, Value::Integer(id));
            insert_sql::<M>(true)
        }
        None => insert_sql::<M>(false),
    };
    conn.execute(&sql, params_from_iter(values.iter()))?;
    Ok(model.id().unwrap_or_else(|| conn.last_insert_rowid()))
}

/// Insert `model` and return it with its primary key set.
pub fn create<M: Model>(conn: &Connection, mut model: M) -> Result<M> {
    let id = insert_row(conn, &model)?;
    model.set_id(Some(id));
    tracing::debug!(table = M::TABLE, id, "created row");
    Ok(model)
}

/// Insert `model` if it has no key yet, update it otherwise.
pub fn save<M: Model>(conn: &Connection, model: M) -> Result<M> {
    match model.id() {
        None => create(conn, model),
        Some(_) => {
            if update(conn, &model)? {
                Ok(model)
            } else {
                create(conn, model)
            }
        }
    }
}

/// Look a live (not soft-deleted) row up by primary key.
pub fn get<M: Model>(conn: &Connection, id: i64) -> Result<Option<M>> {
    Query::<M>::new(conn).filter(M::PRIMARY_KEY, id).first()
}

/// Like [`get`] but fails with [`Error::NotFound`].
pub fn get_or_error<M: Model>(conn: &Connection, id: i64) -> Result<M> {
    get(conn, id)?.ok_or_else(|| Error::not_found(format!("{} {id}", M::TABLE)))
}

/// Every live row of the table, in key order.
pub fn all<M: Model>(conn: &Connection) -> Result<Vec<M>> {
    Query::<M>::new(conn).all()
}

/// Return the single row matching every `(column, value)` pair, creating it
/// with `build` when none exists. The flag is `true` when a row was created.
///
/// Several matching rows are an [`Error::MultipleResults`].
pub fn get_or_create<M, F>(
    conn: &Connection,
    filters: &[(&str, Value)],
    build: F,
) -> Result<(M, bool)>
where
    M: Model,
    F: FnOnce() -> M,
{
    let scope = Scope::begin(conn)?;
    let query = filters
        .iter()
        .fold(Query::<M>::new(conn), |q, (column, value)| {
            q.filter(column, value.clone())
        });
    let result = match query.one_or_none()? {
        Some(found) => (found, false),
        None => (create(conn, build())?, true),
    };
    scope.commit()?;
    Ok(result)
}

/// Write every column of `model` to its row. Returns `false` if no row has
/// the model's key.
pub fn update<M: Model>(conn: &Connection, model: &M) -> Result<bool> {
    let id = model.id().ok_or_else(|| {
        Error::invalid_input(format!("cannot update unsaved {} row", M::TABLE))
    })?;
    let assignments: Vec<String> = M::COLUMNS.iter().map(|c| format!("{c} = ?")).collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        M::TABLE,
        assignments.join(", "),
        M::PRIMARY_KEY
    );
    let mut values = model.values();
    values.push(Value::Integer(id));
    let n = conn.execute(&sql, params_from_iter(values.iter()))?;
    Ok(n > 0)
}

/// Set individual columns of the row with key `id`.
pub fn update_columns<M: Model>(
    conn: &Connection,
    id: i64,
    changes: &[(&str, Value)],
) -> Result<bool> {
    if changes.is_empty() {
        return Ok(false);
    }
    for (column, _) in changes {
        check_column::<M>(column)?;
    }
    let assignments: Vec<String> = changes.iter().map(|(c, _)| format!("{c} = ?")).collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        M::TABLE,
        assignments.join(", "),
        M::PRIMARY_KEY
    );
    let mut values: Vec<Value> = changes.iter().map(|(_, v)| v.clone()).collect();
    values.push(Value::Integer(id));
    let n = conn.execute(&sql, params_from_iter(values.iter()))?;
    Ok(n > 0)
}

/// Permanently delete the row with key `id`.
pub fn delete<M: Model>(conn: &Connection, id: i64) -> Result<bool> {
    let sql = format!("DELETE FROM {} WHERE {} = ?1", M::TABLE, M::PRIMARY_KEY);
    let n = conn.execute(&sql, [id])?;
    Ok(n > 0)
}

fn set_deleted_flag<M: Model>(conn: &Connection, id: i64, deleted: bool) -> Result<bool> {
    let flag = M::SOFT_DELETE.ok_or_else(|| {
        Error::invalid_input(format!("{} does not support soft delete", M::TABLE))
    })?;
    let sql = format!("UPDATE {} SET {flag} = ?1 WHERE {} = ?2", M::TABLE, M::PRIMARY_KEY);
    let n = conn.execute(&sql, rusqlite::params![deleted, id])?;
    Ok(n > 0)
}

/// Hide the row with key `id` from queries without removing it.
pub fn soft_delete<M: Model>(conn: &Connection, id: i64) -> Result<bool> {
    set_deleted_flag::<M>(conn, id, true)
}

/// Undo [`soft_delete`].
pub fn restore<M: Model>(conn: &Connection, id: i64) -> Result<bool> {
    set_deleted_flag::<M>(conn, id, false)
}

/// Check whether `model` could be inserted without violating a constraint.
///
/// The insert runs inside a scope that is always rolled back, so nothing is
/// ever committed and other connections never see the row.
pub fn is_valid<M: Model>(conn: &Connection, model: &M) -> Result<bool> {
    if let Some(id) = model.id() {
        if Query::<M>::new(conn)
            .with_deleted()
            .filter(M::PRIMARY_KEY, id)
            .exists()?
        {
            return Err(Error::invalid_input(format!(
                "cannot validate existing {} row {id}",
                M::TABLE
            )));
        }
    }

    let scope = Scope::begin(conn)?;
    let outcome = match insert_row(conn, model) {
        Ok(_) => Ok(true),
        Err(Error::Conflict(reason)) => {
            tracing::debug!(table = M::TABLE, %reason, "row failed validation");
            Ok(false)
        }
        Err(e) => Err(e),
    };
    scope.rollback()?;
    outcome
}

/// Insert all `models` in one scope. Either every row is inserted or none.
pub fn bulk_insert<M: Model>(conn: &Connection, models: &[M]) -> Result<usize> {
    let scope = Scope::begin(conn)?;
    {
        let mut without_key = conn.prepare(&insert_sql::<M>(false))?;
        let mut with_key = conn.prepare(&insert_sql::<M>(true))?;
        for model in models {
            let mut values = model.values();
            match model.id() {
                Some(id) => {
                    values.insert(0, Value::Integer(id));
                    with_key.execute(params_from_iter(values.iter()))?;
                }
                None => {
                    without_key.execute(params_from_iter(values.iter()))?;
                }
            }
        }
    }
    scope.commit()?;
    tracing::debug!(table = M::TABLE, rows = models.len(), "bulk insert");
    Ok(models.len())
}

/// Serialize a model to a JSON object.
pub fn to_json<M: Serialize>(model: &M) -> Result<String> {
    Ok(serde_json::to_string(model)?)
}
