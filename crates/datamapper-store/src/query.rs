//! Select descriptors and SQL rendering
//!
//! A `Select` is a plain value: building it runs nothing. Lazy collections
//! keep one unexecuted and derive windowed selects and the count query from it.

use datamapper_core::Value;
use std::collections::BTreeMap;

/// Quote an identifier for SQLite, doubling embedded quotes
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// A single WHERE condition
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(column.into(), value.into())
    }

    pub fn is_in(column: impl Into<String>, values: Vec<Value>) -> Self {
        Filter::In(column.into(), values)
    }

    fn render(&self, sql: &mut String, params: &mut Vec<Value>) {
        match self {
            // NULL never compares equal, so match it explicitly
            Filter::Eq(column, Value::Null) => {
                sql.push_str(&format!("{} IS NULL", quote_identifier(column)));
            }
            Filter::Eq(column, value) => {
                params.push(value.clone());
                sql.push_str(&format!("{} = ?{}", quote_identifier(column), params.len()));
            }
            Filter::In(_, values) if values.is_empty() => sql.push('0'),
            Filter::In(column, values) => {
                let placeholders: Vec<String> = values
                    .iter()
                    .map(|v| {
                        params.push(v.clone());
                        format!("?{}", params.len())
                    })
                    .collect();
                sql.push_str(&format!(
                    "{} IN ({})",
                    quote_identifier(column),
                    placeholders.join(", ")
                ));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    fn keyword(self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// Select descriptor over one table
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    table: String,
    filters: Vec<Filter>,
    order_by: Vec<(String, Direction)>,
    limit: Option<usize>,
    offset: usize,
}

impl Select {
    pub fn from_table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: 0,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push((column.into(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Same select restricted to `[offset, offset + length)`
    pub fn window(&self, offset: usize, length: usize) -> Self {
        self.clone().offset(offset).limit(length)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn has_ordering(&self) -> bool {
        !self.order_by.is_empty()
    }

    /// Render to SQL with numbered placeholders and their bound values
    pub fn to_sql(&self) -> (String, Vec<Value>) {
        let (mut sql, params) = self.base_sql();

        if !self.order_by.is_empty() {
            let terms: Vec<String> = self
                .order_by
                .iter()
                .map(|(column, dir)| format!("{} {}", quote_identifier(column), dir.keyword()))
                .collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&terms.join(", "));
        }

        match (self.limit, self.offset) {
            (Some(limit), 0) => sql.push_str(&format!(" LIMIT {}", limit)),
            (Some(limit), offset) => sql.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset)),
            // SQLite only accepts OFFSET after a LIMIT
            (None, 0) => {}
            (None, offset) => sql.push_str(&format!(" LIMIT -1 OFFSET {}", offset)),
        }

        (sql, params)
    }

    /// Row count for the same filters, ignoring ordering and windowing
    pub fn count_sql(&self) -> (String, Vec<Value>) {
        let (sql, params) = self.base_sql();
        (format!("SELECT COUNT(*) FROM ({})", sql), params)
    }

    fn base_sql(&self) -> (String, Vec<Value>) {
        let mut sql = format!("SELECT * FROM {}", quote_identifier(&self.table));
        let mut params = Vec::new();

        for (i, filter) in self.filters.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            filter.render(&mut sql, &mut params);
        }

        (sql, params)
    }
}

/// One find criterion: a scalar means equality, a list means set membership
#[derive(Debug, Clone, PartialEq)]
pub enum Criterion {
    Eq(Value),
    In(Vec<Value>),
}

impl From<Value> for Criterion {
    fn from(value: Value) -> Self {
        Criterion::Eq(value)
    }
}

impl From<i64> for Criterion {
    fn from(value: i64) -> Self {
        Criterion::Eq(value.into())
    }
}

impl From<&str> for Criterion {
    fn from(value: &str) -> Self {
        Criterion::Eq(value.into())
    }
}

impl From<String> for Criterion {
    fn from(value: String) -> Self {
        Criterion::Eq(value.into())
    }
}

impl From<Vec<Value>> for Criterion {
    fn from(values: Vec<Value>) -> Self {
        Criterion::In(values)
    }
}

/// Column name -> criterion, combined with AND
pub type Criteria = BTreeMap<String, Criterion>;

/// Build criteria from literal pairs
///
/// ```
/// use datamapper_store::query::{criteria, Criterion};
/// use datamapper_core::Value;
///
/// let c = criteria([
///     ("email", Criterion::from("ada@example.org")),
///     ("id", Criterion::In(vec![Value::Integer(1), Value::Integer(2)])),
/// ]);
/// assert_eq!(c.len(), 2);
/// ```
pub fn criteria<K: Into<String>>(pairs: impl IntoIterator<Item = (K, Criterion)>) -> Criteria {
    pairs.into_iter().map(|(k, c)| (k.into(), c)).collect()
}

impl Criterion {
    pub fn into_filter(self, column: impl Into<String>) -> Filter {
        match self {
            Criterion::Eq(value) => Filter::Eq(column.into(), value),
            Criterion::In(values) => Filter::In(column.into(), values),
        }
    }
}
