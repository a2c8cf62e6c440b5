//! # Query Builder Module
//!
//! The draft query owned by one [`Record`](crate::Record) chain, and the
//! predicate builder that composes its `WHERE` clause.
//!
//! Statements are parameterized with positional `?` placeholders. Bound values
//! are collected in call order and the builder keeps its own count of the
//! placeholders it emitted, so the two can be checked against each other
//! before anything reaches the database.
//!
//! Finalization order is fixed: template, `WHERE`, `ORDER BY`, pagination,
//! trailing `;`.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Value, database::Dialect};

// ============================================================================
// Operators
// ============================================================================

/// Comparison operator for `and_where_op` / `or_where_op`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    NotLike,
}

impl Op {
    pub fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::Lt => "<",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
        }
    }
}

impl FromStr for Op {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "=" | "==" => Ok(Op::Eq),
            "!=" | "<>" => Ok(Op::Ne),
            "<" => Ok(Op::Lt),
            "<=" => Ok(Op::Le),
            ">" => Ok(Op::Gt),
            ">=" => Ok(Op::Ge),
            "LIKE" => Ok(Op::Like),
            "NOT LIKE" => Ok(Op::NotLike),
            other => Err(Error::InvalidArgument(format!("Unsupported comparison operator `{}`", other))),
        }
    }
}

/// Sort direction for `order_by`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Asc => f.write_str("ASC"),
            Order::Desc => f.write_str("DESC"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Connective {
    And,
    Or,
}

impl Connective {
    fn as_sql(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

// ============================================================================
// Predicate Builder
// ============================================================================

#[derive(Debug, Clone)]
struct WhereEntry {
    connective: Connective,
    fragment: String,
    placeholders: usize,
}

/// Composes `WHERE` fragments and their bound values.
///
/// The first entry's connective is never rendered, so a group opened as the
/// very first predicate produces a bare `(`.
#[derive(Debug, Clone)]
pub struct Predicates {
    dialect: Dialect,
    table: &'static str,
    entries: Vec<WhereEntry>,
    values: Vec<Value>,
}

impl Predicates {
    pub fn new(dialect: Dialect, table: &'static str) -> Self {
        Self { dialect, table, entries: Vec::new(), values: Vec::new() }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Number of `?` placeholders emitted so far.
    pub fn placeholders(&self) -> usize {
        self.entries.iter().map(|e| e.placeholders).sum()
    }

    fn column(&self, column: &str) -> String {
        self.dialect.column(self.table, column)
    }

    fn push(&mut self, connective: Connective, fragment: String, placeholders: usize, values: Vec<Value>) -> &mut Self {
        self.entries.push(WhereEntry { connective, fragment, placeholders });
        self.values.extend(values);
        self
    }

    fn compare(&mut self, connective: Connective, column: &str, op: Op, value: Value) -> &mut Self {
        let fragment = format!("{} {} ?", self.column(column), op.as_sql());
        self.push(connective, fragment, 1, vec![value])
    }

    fn null_check(&mut self, connective: Connective, column: &str, negate: bool) -> &mut Self {
        let fragment = format!("{} IS {}NULL", self.column(column), if negate { "NOT " } else { "" });
        self.push(connective, fragment, 0, Vec::new())
    }

    fn within(&mut self, connective: Connective, column: &str, values: Vec<Value>) -> &mut Self {
        if values.is_empty() {
            // An empty IN-list matches nothing.
            return self.push(connective, "1 = 0".to_string(), 0, Vec::new());
        }
        let marks = vec!["?"; values.len()].join(", ");
        let fragment = format!("{} IN ({})", self.column(column), marks);
        let count = values.len();
        self.push(connective, fragment, count, values)
    }

    fn between(&mut self, connective: Connective, column: &str, low: Value, high: Value) -> &mut Self {
        let fragment = format!("{} BETWEEN ? AND ?", self.column(column));
        self.push(connective, fragment, 2, vec![low, high])
    }

    fn raw(&mut self, connective: Connective, sql: &str, values: Vec<Value>) -> &mut Self {
        let placeholders = sql.matches('?').count();
        self.push(connective, sql.trim().to_string(), placeholders, values)
    }

    fn group(&mut self, connective: Connective, build: impl FnOnce(&mut Predicates)) -> &mut Self {
        let mut nested = Predicates::new(self.dialect, self.table);
        build(&mut nested);
        if nested.is_empty() {
            return self;
        }
        let fragment = format!("({})", nested.render());
        let placeholders = nested.placeholders();
        self.push(connective, fragment, placeholders, nested.values)
    }

    /// `column = value`.
    pub fn and_where(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.compare(Connective::And, column, Op::Eq, value.into())
    }

    pub fn and_where_op(&mut self, column: &str, op: Op, value: impl Into<Value>) -> &mut Self {
        self.compare(Connective::And, column, op, value.into())
    }

    pub fn or_where(&mut self, column: &str, value: impl Into<Value>) -> &mut Self {
        self.compare(Connective::Or, column, Op::Eq, value.into())
    }

    pub fn or_where_op(&mut self, column: &str, op: Op, value: impl Into<Value>) -> &mut Self {
        self.compare(Connective::Or, column, op, value.into())
    }

    pub fn where_null(&mut self, column: &str) -> &mut Self {
        self.null_check(Connective::And, column, false)
    }

    pub fn or_where_null(&mut self, column: &str) -> &mut Self {
        self.null_check(Connective::Or, column, false)
    }

    pub fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.null_check(Connective::And, column, true)
    }

    pub fn or_where_not_null(&mut self, column: &str) -> &mut Self {
        self.null_check(Connective::Or, column, true)
    }

    pub fn where_in<V: Into<Value>>(&mut self, column: &str, values: impl IntoIterator<Item = V>) -> &mut Self {
        self.within(Connective::And, column, values.into_iter().map(Into::into).collect())
    }

    pub fn or_where_in<V: Into<Value>>(&mut self, column: &str, values: impl IntoIterator<Item = V>) -> &mut Self {
        self.within(Connective::Or, column, values.into_iter().map(Into::into).collect())
    }

    pub fn where_between(&mut self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> &mut Self {
        self.between(Connective::And, column, low.into(), high.into())
    }

    pub fn or_where_between(&mut self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> &mut Self {
        self.between(Connective::Or, column, low.into(), high.into())
    }

    /// Raw SQL fragment; `values` bind to its `?` placeholders in order.
    pub fn where_raw<V: Into<Value>>(&mut self, sql: &str, values: impl IntoIterator<Item = V>) -> &mut Self {
        self.raw(Connective::And, sql, values.into_iter().map(Into::into).collect())
    }

    pub fn or_where_raw<V: Into<Value>>(&mut self, sql: &str, values: impl IntoIterator<Item = V>) -> &mut Self {
        self.raw(Connective::Or, sql, values.into_iter().map(Into::into).collect())
    }

    /// Parenthesized sub-predicate joined with `AND`.
    pub fn where_group(&mut self, build: impl FnOnce(&mut Predicates)) -> &mut Self {
        self.group(Connective::And, build)
    }

    /// Parenthesized sub-predicate joined with `OR`.
    pub fn or_where_group(&mut self, build: impl FnOnce(&mut Predicates)) -> &mut Self {
        self.group(Connective::Or, build)
    }

    /// Appends an `AND` scope that must hold for every row, such as the
    /// soft-delete filter. When the existing list contains an `OR`, it is
    /// wrapped in parentheses first so the scope covers the whole disjunction.
    pub(crate) fn and_scope(&mut self, fragment: String) -> &mut Self {
        if self.entries.iter().skip(1).any(|e| e.connective == Connective::Or) {
            let wrapped = WhereEntry {
                connective: Connective::And,
                fragment: format!("({})", self.render()),
                placeholders: self.placeholders(),
            };
            self.entries = vec![wrapped];
        }
        self.push(Connective::And, fragment, 0, Vec::new())
    }

    /// Renders the entries joined by their connectives.
    pub fn render(&self) -> String {
        let mut sql = String::new();
        for (idx, entry) in self.entries.iter().enumerate() {
            if idx > 0 {
                sql.push(' ');
                sql.push_str(entry.connective.as_sql());
                sql.push(' ');
            }
            sql.push_str(&entry.fragment);
        }
        sql
    }
}

// ============================================================================
// Statement
// ============================================================================

/// A finalized statement and the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, values: Vec<Value>) -> Self {
        Self { sql: sql.into(), values }
    }
}

// ============================================================================
// Query State
// ============================================================================

/// The mutable draft query of one chain.
#[derive(Debug, Clone)]
pub struct QueryState {
    dialect: Dialect,
    table: &'static str,
    template: String,
    template_values: Vec<Value>,
    template_placeholders: usize,
    pub(crate) predicates: Predicates,
    order_by: Vec<String>,
    limit: Option<(u64, u64)>,
    projection: Vec<String>,
    with_trashed: bool,
}

impl QueryState {
    pub fn new(dialect: Dialect, table: &'static str) -> Self {
        Self {
            dialect,
            table,
            template: String::new(),
            template_values: Vec::new(),
            template_placeholders: 0,
            predicates: Predicates::new(dialect, table),
            order_by: Vec::new(),
            limit: None,
            projection: Vec::new(),
            with_trashed: false,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn has_template(&self) -> bool {
        !self.template.is_empty()
    }

    /// Sets the base statement. `values` bind to placeholders in `sql`.
    pub fn set_template(&mut self, sql: String, values: Vec<Value>) {
        self.template_placeholders = sql.matches('?').count();
        self.template = sql;
        self.template_values = values;
    }

    pub fn order_by(&mut self, column: &str, order: Order) {
        let column = self.dialect.column(self.table, column);
        self.order_by.push(format!("{} {}", column, order));
    }

    pub fn has_order(&self) -> bool {
        !self.order_by.is_empty()
    }

    pub fn limit(&mut self, count: u64, offset: u64) {
        self.limit = Some((offset, count));
    }

    /// Drops ordering and pagination, e.g. for a `COUNT` over the same predicates.
    pub fn clear_order_and_limit(&mut self) {
        self.order_by.clear();
        self.limit = None;
    }

    pub fn select(&mut self, columns: &[&str]) {
        self.projection = columns.iter().map(|c| self.dialect.column(self.table, c)).collect();
    }

    /// `SELECT` list: the projection, or every column of the table.
    pub fn projection(&self) -> String {
        if self.projection.is_empty() {
            format!("{}.*", self.dialect.quote(self.table))
        } else {
            self.projection.join(", ")
        }
    }

    pub fn set_with_trashed(&mut self) {
        self.with_trashed = true;
    }

    pub fn with_trashed(&self) -> bool {
        self.with_trashed
    }

    /// Adds `column IS NULL` unless trashed rows were requested.
    pub fn scope_soft_delete(&mut self, column: &str) {
        if !self.with_trashed {
            let fragment = format!("{} IS NULL", self.dialect.column(self.table, column));
            self.predicates.and_scope(fragment);
        }
    }

    /// Assembles the statement text and its values.
    pub fn finalize(&self) -> Result<Statement, Error> {
        let mut sql = self.template.clone();

        if !self.predicates.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.predicates.render());
        }

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        if let Some((offset, count)) = self.limit {
            self.dialect.paginate(&mut sql, offset, count, self.has_order());
        }

        sql.push(';');

        let mut values = self.template_values.clone();
        values.extend(self.predicates.values().iter().cloned());

        let placeholders = self.template_placeholders + self.predicates.placeholders();
        if placeholders != values.len() {
            return Err(Error::PlaceholderMismatch { placeholders, values: values.len() });
        }

        Ok(Statement { sql, values })
    }

    /// Clears everything, including the trashed flag.
    pub fn reset(&mut self) {
        *self = QueryState::new(self.dialect, self.table);
    }
}

// ============================================================================
// Tests
// ============================================================================
