//! Parameterized statement assembly.
//!
//! # Invariants
//! - WHERE parameters bind first, in the order supplied; `LIMIT` then
//!   `OFFSET` bind last.
//! - `offset > 0` without a positive `limit` binds [`UNBOUNDED_LIMIT`] as the limit
//!   because SQLite only accepts `OFFSET` after `LIMIT`.

use super::{QueryOptions, SortColumn, SortOrder};
use log::debug;
use rusqlite::types::Value;
use std::marker::PhantomData;

/// SQLite's "no row cap" sentinel.
pub const UNBOUNDED_LIMIT: i64 = -1;

/// Statement text plus its bind values, ready for `prepare`.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Builds one `SELECT` from a base statement for entity columns `C`.
///
/// ```
/// use curriculum_core::query::{CourseColumn, QueryBuilder, QueryOptions, SortOrder};
/// use rusqlite::types::Value;
///
/// let options = QueryOptions::sorted_by("name", SortOrder::Desc).page(10, 20);
/// let query = QueryBuilder::<CourseColumn>::new("SELECT * FROM course WHERE type LIKE ?")
///     .bind(Value::Text("Core".to_string()))
///     .options(Some(&options))
///     .build();
/// assert_eq!(
///     query.sql,
///     "SELECT * FROM course WHERE type LIKE ? ORDER BY name DESC LIMIT ? OFFSET ?"
/// );
/// assert_eq!(query.params.len(), 3);
/// ```
#[derive(Debug)]
pub struct QueryBuilder<C: SortColumn> {
    base: String,
    params: Vec<Value>,
    sort: Option<(C, SortOrder)>,
    limit: i64,
    offset: i64,
    _columns: PhantomData<C>,
}

impl<C: SortColumn> QueryBuilder<C> {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            params: Vec::new(),
            sort: None,
            limit: 0,
            offset: 0,
            _columns: PhantomData,
        }
    }

    /// Appends one WHERE parameter.
    pub fn bind(mut self, value: Value) -> Self {
        self.params.push(value);
        self
    }

    /// Applies sort and pagination. `None` leaves the statement untouched.
    pub fn options(mut self, options: Option<&QueryOptions>) -> Self {
        let Some(options) = options else {
            return self;
        };

        self.sort = match options.order_by.as_deref() {
            Some(name) => match C::parse(name) {
                Some(column) => Some((column, options.order)),
                None => {
                    debug!(
                        "event=query_build module=query status=ignored reason=order_by_not_whitelisted"
                    );
                    None
                }
            },
            None => None,
        };
        self.limit = options.limit;
        self.offset = options.offset;
        self
    }

    pub fn build(self) -> BuiltQuery {
        let mut sql = self.base.trim_end().trim_end_matches(';').to_string();
        let mut params = self.params;

        if let Some((column, order)) = self.sort {
            sql.push_str(" ORDER BY ");
            sql.push_str(column.column());
            sql.push(' ');
            sql.push_str(order.as_sql());
        }

        if self.limit > 0 {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(self.limit));
            if self.offset > 0 {
                sql.push_str(" OFFSET ?");
                params.push(Value::Integer(self.offset));
            }
        } else if self.offset > 0 {
            sql.push_str(" LIMIT ? OFFSET ?");
            params.push(Value::Integer(UNBOUNDED_LIMIT));
            params.push(Value::Integer(self.offset));
        }

        BuiltQuery { sql, params }
    }
}
