//! The [`Model`] trait mapping a Rust struct to a table.
//!
//! Rows are read with the primary key first, followed by [`Model::COLUMNS`]
//! in declaration order, which is also the order [`Model::values`] must
//! yield them in.

use rusqlite::types::Value;
use rusqlite::Connection;
use sqlkit_common::{Error, Result};

use crate::query::Query;

/// A struct stored as one row of `TABLE`.
pub trait Model: Sized {
    /// Table name.
    const TABLE: &'static str;

    /// Integer primary key column.
    const PRIMARY_KEY: &'static str = "id";

    /// Non-key columns.
    const COLUMNS: &'static [&'static str];

    /// Flag column marking soft-deleted rows (`0` live, `1` deleted). Not
    /// part of [`Model::COLUMNS`]; the schema should default it to `0`.
    const SOFT_DELETE: Option<&'static str> = None;

    /// Build the model from a row laid out as primary key, then `COLUMNS`.
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self>;

    /// Values for `COLUMNS`, in order.
    fn values(&self) -> Vec<Value>;

    /// Primary key, `None` until the row is inserted.
    fn id(&self) -> Option<i64>;

    fn set_id(&mut self, id: Option<i64>);

    /// Start a query over this model's table.
    fn query(conn: &Connection) -> Query<'_, Self> {
        Query::new(conn)
    }
}

/// `pk, col1, col2, ...`
pub(crate) fn select_list<M: Model>() -> String {
    std::iter::once(M::PRIMARY_KEY)
        .chain(M::COLUMNS.iter().copied())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Reject column names the model does not declare, so that only known
/// identifiers are ever spliced into SQL.
pub(crate) fn check_column<M: Model>(column: &str) -> Result<()> {
    let known = column == M::PRIMARY_KEY
        || M::COLUMNS.contains(&column)
        || M::SOFT_DELETE == Some(column);
    if known {
        Ok(())
    } else {
        Err(Error::invalid_input(format!(
            "unknown column '{column}' for table {}",
            M::TABLE
        )))
    }
}

/// Render a [`Value`] for log and error messages.
pub(crate) fn describe(value: &Value) -> String {
    match value {
        Value::Null => "NULL".into(),
        Value::Integer(n) => n.to_string(),
        Value::Real(f) => f.to_string(),
        Value::Text(s) => format!("'{s}'"),
        Value::Blob(b) => format!("<{} bytes>", b.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::User;

    #[test]
    fn select_list_puts_key_first() {
        assert_eq!(select_list::<User>(), "id, name, email, age");
    }

    #[test]
    fn check_column_accepts_declared_columns() {
        assert!(check_column::<User>("id").is_ok());
        assert!(check_column::<User>("email").is_ok());
        assert!(check_column::<User>("is_deleted").is_ok());
        assert!(check_column::<User>("email; DROP TABLE users").is_err());
    }

    #[test]
    fn describe_values() {
        assert_eq!(describe(&Value::Null), "NULL");
        assert_eq!(describe(&Value::Integer(3)), "3");
        assert_eq!(describe(&Value::Text("a".into())), "'a'");
        assert_eq!(describe(&Value::Blob(vec![0; 4])), "<4 bytes>");
    }
}
