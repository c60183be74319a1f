//! Query builder over a [`Model`] table.
//!
//! A [`Query`] is also a [`QuerySource`], so it can be handed straight to a
//! [`Paginator`]: the paginator issues one `SELECT COUNT(*)` (unless the
//! request carries a total) and one `LIMIT`/`OFFSET` select.

use std::marker::PhantomData;

use rusqlite::types::{ToSqlOutput, Value};
use rusqlite::{params_from_iter, Connection, ToSql};
use sqlkit_common::{Error, Result};
use sqlkit_paginate::{PageRequest, Paginator, QuerySource};

use crate::model::{check_column, describe, select_list, Model};

/// Comparison used by [`Query::filter_cmp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl Cmp {
    fn as_sql(self) -> &'static str {
        match self {
            Cmp::Eq => "=",
            Cmp::Ne => "<>",
            Cmp::Lt => "<",
            Cmp::Le => "<=",
            Cmp::Gt => ">",
            Cmp::Ge => ">=",
            Cmp::Like => "LIKE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

#[derive(Debug, Clone)]
enum Filter {
    Cmp(String, Cmp, Value),
    IsNull(String),
    NotNull(String),
}

/// Filtered, ordered selection of `M` rows.
pub struct Query<'c, M> {
    conn: &'c Connection,
    filters: Vec<Filter>,
    order: Vec<(String, Order)>,
    include_deleted: bool,
    invalid: Option<String>,
    _model: PhantomData<fn() -> M>,
}

impl<'c, M: Model> Query<'c, M> {
    pub fn new(conn: &'c Connection) -> Self {
        Self {
            conn,
            filters: Vec::new(),
            order: Vec::new(),
            include_deleted: false,
            invalid: None,
            _model: PhantomData,
        }
    }

    /// `column = value`.
    pub fn filter(self, column: &str, value: impl ToSql) -> Self {
        self.filter_cmp(column, Cmp::Eq, value)
    }

    pub fn filter_cmp(mut self, column: &str, cmp: Cmp, value: impl ToSql) -> Self {
        if !self.accept(column) {
            return self;
        }
        match to_value(&value) {
            Ok(value) => self.filters.push(Filter::Cmp(column.to_string(), cmp, value)),
            Err(e) => self.reject(format!("bad value for column '{column}': {e}")),
        }
        self
    }

    pub fn filter_null(mut self, column: &str) -> Self {
        if self.accept(column) {
            self.filters.push(Filter::IsNull(column.to_string()));
        }
        self
    }

    pub fn filter_not_null(mut self, column: &str) -> Self {
        if self.accept(column) {
            self.filters.push(Filter::NotNull(column.to_string()));
        }
        self
    }

    /// Add a sort key. Without any, rows are ordered by primary key.
    pub fn order_by(mut self, column: &str, order: Order) -> Self {
        if self.accept(column) {
            self.order.push((column.to_string(), order));
        }
        self
    }

    /// Include soft-deleted rows.
    pub fn with_deleted(mut self) -> Self {
        self.include_deleted = true;
        self
    }

    /// Builder errors are kept and reported when the query runs.
    fn accept(&mut self, column: &str) -> bool {
        match check_column::<M>(column) {
            Ok(()) => true,
            Err(e) => {
                self.reject(e.to_string());
                false
            }
        }
    }

    fn reject(&mut self, message: String) {
        if self.invalid.is_none() {
            self.invalid = Some(message);
        }
    }

    fn where_clause(&self) -> Result<(String, Vec<Value>)> {
        if let Some(message) = &self.invalid {
            return Err(Error::invalid_input(message.clone()));
        }

        let mut clauses = Vec::new();
        let mut params = Vec::new();
        if let (Some(flag), false) = (M::SOFT_DELETE, self.include_deleted) {
            clauses.push(format!("{flag} = 0"));
        }
        for filter in &self.filters {
            match filter {
                Filter::Cmp(column, cmp, value) => {
                    clauses.push(format!("{column} {} ?", cmp.as_sql()));
                    params.push(value.clone());
                }
                Filter::IsNull(column) => clauses.push(format!("{column} IS NULL")),
                Filter::NotNull(column) => clauses.push(format!("{column} IS NOT NULL")),
            }
        }

        if clauses.is_empty() {
            Ok((String::new(), params))
        } else {
            Ok((format!(" WHERE {}", clauses.join(" AND ")), params))
        }
    }

    fn order_clause(&self) -> String {
        if self.order.is_empty() {
            return format!(" ORDER BY {}", M::PRIMARY_KEY);
        }
        let keys: Vec<String> = self
            .order
            .iter()
            .map(|(column, order)| match order {
                Order::Asc => format!("{column} ASC"),
                Order::Desc => format!("{column} DESC"),
            })
            .collect();
        format!(" ORDER BY {}", keys.join(", "))
    }

    fn fetch(&self, window: Option<(u64, u64)>) -> Result<Vec<M>> {
        let (where_sql, mut params) = self.where_clause()?;
        let mut sql = format!(
            "SELECT {} FROM {}{}{}",
            select_list::<M>(),
            M::TABLE,
            where_sql,
            self.order_clause()
        );
        if let Some((offset, limit)) = window {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(to_i64(limit)));
            params.push(Value::Integer(to_i64(offset)));
        }
        tracing::debug!(%sql, "select");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(params.iter()), M::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn fetch_count(&self) -> Result<u64> {
        let (where_sql, params) = self.where_clause()?;
        let sql = format!("SELECT COUNT(*) FROM {}{}", M::TABLE, where_sql);
        tracing::debug!(%sql, "count");

        let n: i64 = self
            .conn
            .query_row(&sql, params_from_iter(params.iter()), |row| row.get(0))?;
        Ok(n.max(0) as u64)
    }

    /// Human-readable description used in error messages.
    fn describe(&self) -> String {
        let conditions: Vec<String> = self
            .filters
            .iter()
            .map(|filter| match filter {
                Filter::Cmp(column, cmp, value) => {
                    format!("{column} {} {}", cmp.as_sql(), describe(value))
                }
                Filter::IsNull(column) => format!("{column} IS NULL"),
                Filter::NotNull(column) => format!("{column} IS NOT NULL"),
            })
            .collect();
        if conditions.is_empty() {
            M::TABLE.to_string()
        } else {
            format!("{} where {}", M::TABLE, conditions.join(" and "))
        }
    }

    /// Every matching row.
    pub fn all(&self) -> Result<Vec<M>> {
        self.fetch(None)
    }

    /// Number of matching rows.
    pub fn count(&self) -> Result<u64> {
        self.fetch_count()
    }

    pub fn exists(&self) -> Result<bool> {
        Ok(!self.fetch(Some((0, 1)))?.is_empty())
    }

    /// First matching row in query order.
    pub fn first(&self) -> Result<Option<M>> {
        Ok(self.fetch(Some((0, 1)))?.into_iter().next())
    }

    /// Like [`Query::first`] but fails with [`Error::NotFound`].
    pub fn first_or_error(&self) -> Result<M> {
        self.first()?
            .ok_or_else(|| Error::not_found(self.describe()))
    }

    /// The single matching row, `None` if there is none.
    pub fn one_or_none(&self) -> Result<Option<M>> {
        let mut rows = self.fetch(Some((0, 2)))?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(rows.pop()),
            _ => Err(Error::multiple_results(self.describe())),
        }
    }

    /// The single matching row.
    pub fn one(&self) -> Result<M> {
        self.one_or_none()?
            .ok_or_else(|| Error::not_found(self.describe()))
    }

    /// Paginate the matching rows.
    pub fn paginate(&self, request: PageRequest) -> Result<Paginator<M>> {
        Paginator::new(self, request)
    }
}

impl<M: Model> QuerySource<M> for Query<'_, M> {
    type Error = Error;

    fn count(&self) -> Result<u64> {
        self.fetch_count()
    }

    fn slice(&self, offset: u64, limit: u64) -> Result<Vec<M>> {
        self.fetch(Some((offset, limit)))
    }

    fn fetch_all(&self, _total: u64) -> Result<Vec<M>> {
        self.fetch(None)
    }
}

fn to_value(value: &dyn ToSql) -> rusqlite::Result<Value> {
    match value.to_sql()? {
        ToSqlOutput::Borrowed(v) => Ok(v.into()),
        ToSqlOutput::Owned(v) => Ok(v),
        #[allow(unreachable_patterns)]
        _ => Err(rusqlite::Error::ToSqlConversionFailure(
            "unsupported parameter type".into(),
        )),
    }
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
