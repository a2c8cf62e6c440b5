//! # Record Module
//!
//! The active-record facade: one [`Record`] is a chain of shaping calls that
//! ends in a terminal operation, or a located row that can be mutated.
//!
//! ## Chains
//!
//! Shaping methods take the record by value and hand it back, so chains read
//! naturally and a rejected call simply ends the chain with an error:
//!
//! ```rust,ignore
//! let adults = db
//!     .model::<User>()?
//!     .and_where_op("age", Op::Ge, 18)?
//!     .or_where_group(|q| {
//!         q.where_null("age").and_where("verified", true);
//!     })?
//!     .order_by("name", Order::Asc)?
//!     .limit(10, 0)?
//!     .get()
//!     .await?;
//! ```
//!
//! Read terminals consume the chain. Rows come back as located records, which
//! only accept single-row mutators:
//!
//! ```rust,ignore
//! if let Some(mut user) = db.model::<User>()?.find(5).await? {
//!     user.update([("name", "Ann")]).await?;
//!     user.increment("logins").await?;
//! }
//! ```
//!
//! Deletion and the soft-delete overlay are described in
//! [`soft_delete`](crate::soft_delete).

// ============================================================================
// External Crate Imports
// ============================================================================

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::{Serialize, Serializer};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    Attributes, Error, FromValue, Model, Value,
    database::{ConnectionRegistry, Database, Dialect},
    gate::{GateState, Method, MethodGate},
    model::TableMeta,
    pagination::{Paginated, Pagination},
    query_builder::{Op, Order, Predicates, QueryState, Statement},
    soft_delete::DeletePolicy,
};

// ============================================================================
// Record Structure
// ============================================================================

/// A query chain or a located row of model `M`.
pub struct Record<'a, M: Model> {
    pub(crate) registry: &'a ConnectionRegistry,
    pub(crate) meta: Arc<TableMeta>,
    pub(crate) query: QueryState,
    pub(crate) gate: MethodGate,
    pub(crate) attributes: Attributes,
    _model: PhantomData<fn() -> M>,
}

impl<M: Model> fmt::Debug for Record<'_, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("table", &self.meta.table)
            .field("state", &self.gate.state())
            .field("attributes", &self.attributes)
            .finish()
    }
}

impl<M: Model> Serialize for Record<'_, M> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.attributes.visible(&self.meta.hidden).serialize(serializer)
    }
}

impl<'a, M: Model> Record<'a, M> {
    pub(crate) fn new(registry: &'a ConnectionRegistry, dialect: Dialect) -> Self {
        let meta = TableMeta::of::<M>();
        let query = QueryState::new(dialect, meta.table);
        Self {
            registry,
            meta: Arc::new(meta),
            query,
            gate: MethodGate::default(),
            attributes: Attributes::new(),
            _model: PhantomData,
        }
    }

    /// A located record around a row read from the database.
    fn hydrate(&self, row: Attributes) -> Result<Self, Error> {
        Ok(Self {
            registry: self.registry,
            meta: Arc::clone(&self.meta),
            query: self.new_query(),
            gate: MethodGate::located(),
            attributes: self.meta.decode(row)?,
            _model: PhantomData,
        })
    }

    // ========================================================================
    // Attribute Access
    // ========================================================================

    /// Reads an attribute; columns that were never set read as `Null`.
    pub fn attr(&self, name: &str) -> &Value {
        self.attributes.get(name)
    }

    /// Typed read of one attribute.
    pub fn attr_as<T: FromValue>(&self, name: &str) -> Result<T, Error> {
        T::from_value(self.attributes.get(name))
    }

    /// Sets an attribute, applying the column's cast. Not limited to fillable columns.
    pub fn set_attr(&mut self, name: &str, value: impl Into<Value>) -> Result<(), Error> {
        let value = self.coerce(name, value.into())?;
        self.attributes.set(name, value);
        Ok(())
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Attributes without the hidden columns.
    pub fn visible(&self) -> Attributes {
        self.attributes.visible(&self.meta.hidden)
    }

    /// Builds the typed model from the current attributes.
    pub fn to_model(&self) -> Result<M, Error> {
        M::from_attributes(&self.attributes)
    }

    pub fn meta(&self) -> &TableMeta {
        &self.meta
    }

    pub fn state(&self) -> GateState {
        self.gate.state()
    }

    /// Copies the fillable columns of `values` into the attributes.
    ///
    /// Other columns are ignored. Empty strings are kept as `Null`.
    pub fn fill<K, V, I>(&mut self, values: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (column, value) in values {
            let column = column.as_ref();
            if !self.meta.is_fillable(column) {
                log::debug!("Ignoring non-fillable column `{}` on `{}`", column, self.meta.table);
                continue;
            }
            let value = match value.into() {
                Value::Text(s) if s.is_empty() => Value::Null,
                other => self.coerce(column, other)?,
            };
            self.attributes.set(column, value);
        }
        Ok(())
    }

    /// Fills the fillable columns from a typed model.
    pub fn fill_model(&mut self, model: &M) -> Result<(), Error> {
        self.fill(model.to_attributes().iter().map(|(k, v)| (k.as_str(), v.clone())))
    }

    fn coerce(&self, column: &str, value: Value) -> Result<Value, Error> {
        match self.meta.cast_of(column) {
            Some(cast) => cast.coerce(value),
            None => Ok(value),
        }
    }

    /// Storage form of one attribute, as bound to a placeholder.
    fn storage_value(&self, column: &str) -> Result<Value, Error> {
        match self.attributes.get(column) {
            Value::Text(s) if s.is_empty() => Ok(Value::Null),
            value => match self.meta.cast_of(column) {
                Some(cast) => cast.encode(value),
                None => Ok(value.clone()),
            },
        }
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    pub(crate) fn dialect(&self) -> Dialect {
        self.query.dialect()
    }

    pub(crate) fn quoted_table(&self) -> String {
        self.dialect().quote(self.meta.table)
    }

    pub(crate) fn new_query(&self) -> QueryState {
        QueryState::new(self.dialect(), self.meta.table)
    }

    pub(crate) fn policy(&self) -> DeletePolicy {
        DeletePolicy::of(&self.meta)
    }

    pub(crate) async fn db(&self) -> Result<Database, Error> {
        self.registry.connection(self.meta.connection).await
    }

    /// Primary key of a located row.
    pub(crate) fn primary_key_value(&self, method: Method) -> Result<Value, Error> {
        match self.attributes.get(self.meta.primary_key) {
            Value::Null => Err(Error::InvalidArgument(format!(
                "`{}` on `{}` needs a located row or an explicit id",
                method.as_str(),
                self.meta.table
            ))),
            id => Ok(id.clone()),
        }
    }

    /// Turns `query` into a `SELECT` over its projection, scoped by the delete policy.
    fn select_from(&self, mut query: QueryState) -> QueryState {
        let template = format!("SELECT {} FROM {}", query.projection(), self.quoted_table());
        query.set_template(template, Vec::new());
        self.policy().scope_reads(&mut query);
        query
    }

    /// The `SELECT` statement `get` would run.
    pub fn to_statement(&self) -> Result<Statement, Error> {
        self.select_from(self.query.clone()).finalize()
    }

    /// Runs a write built from `template` and the predicates added by `build`.
    pub(crate) async fn execute_with(
        &self,
        template: String,
        build: impl FnOnce(&mut Predicates),
    ) -> Result<u64, Error> {
        let mut query = self.new_query();
        query.set_template(template, Vec::new());
        build(&mut query.predicates);
        let statement = query.finalize()?;

        Ok(self.db().await?.execute(&statement).await?.rows_affected)
    }

    /// Reads the row where `column = value`.
    pub(crate) async fn locate(
        &self,
        column: &str,
        value: Value,
        include_trashed: bool,
    ) -> Result<Option<Attributes>, Error> {
        let mut query = self.new_query();
        if include_trashed {
            query.set_with_trashed();
        }
        query.predicates.and_where(column, value);
        let statement = self.select_from(query).finalize()?;

        let row = self.db().await?.fetch_optional(&statement).await?;
        row.map(|r| self.meta.decode(r)).transpose()
    }

    async fn fetch(&self, query: QueryState) -> Result<Vec<Self>, Error> {
        let statement = self.select_from(query).finalize()?;
        let rows = self.db().await?.fetch_all(&statement).await?;
        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    async fn fetch_one(&self, query: QueryState) -> Result<Option<Self>, Error> {
        let statement = self.select_from(query).finalize()?;
        let row = self.db().await?.fetch_optional(&statement).await?;
        row.map(|r| self.hydrate(r)).transpose()
    }

    pub(crate) async fn count_rows(&self, column: &str) -> Result<i64, Error> {
        let mut query = self.query.clone();
        query.clear_order_and_limit();

        let expr = if column == "*" { "*".to_string() } else { self.dialect().column(self.meta.table, column) };
        query.set_template(format!("SELECT COUNT({}) AS count FROM {}", expr, self.quoted_table()), Vec::new());
        self.policy().scope_reads(&mut query);

        let statement = query.finalize()?;
        let row = self.db().await?.fetch_optional(&statement).await?;
        match row {
            Some(row) => {
                let count = row.get("count");
                count.as_i64().ok_or_else(|| Error::Conversion(format!("COUNT returned {} value", count.kind())))
            }
            None => Ok(0),
        }
    }

    pub(crate) async fn fetch_page(&self, count: u64, offset: u64) -> Result<Vec<Self>, Error> {
        let mut query = self.query.clone();
        query.limit(count, offset);
        self.fetch(query).await
    }

    // ========================================================================
    // Query Shaping
    // ========================================================================

    fn shape(mut self, method: Method, apply: impl FnOnce(&mut QueryState)) -> Result<Self, Error> {
        self.gate.check(method)?;
        apply(&mut self.query);
        self.gate.advance(method);
        Ok(self)
    }

    /// `column = value`.
    pub fn and_where(self, column: &str, value: impl Into<Value>) -> Result<Self, Error> {
        let value = value.into();
        self.shape(Method::Where, |q| {
            q.predicates.and_where(column, value);
        })
    }

    /// `column <op> value`.
    pub fn and_where_op(self, column: &str, op: Op, value: impl Into<Value>) -> Result<Self, Error> {
        let value = value.into();
        self.shape(Method::Where, |q| {
            q.predicates.and_where_op(column, op, value);
        })
    }

    pub fn or_where(self, column: &str, value: impl Into<Value>) -> Result<Self, Error> {
        let value = value.into();
        self.shape(Method::Where, |q| {
            q.predicates.or_where(column, value);
        })
    }

    pub fn or_where_op(self, column: &str, op: Op, value: impl Into<Value>) -> Result<Self, Error> {
        let value = value.into();
        self.shape(Method::Where, |q| {
            q.predicates.or_where_op(column, op, value);
        })
    }

    pub fn where_null(self, column: &str) -> Result<Self, Error> {
        self.shape(Method::Where, |q| {
            q.predicates.where_null(column);
        })
    }

    pub fn or_where_null(self, column: &str) -> Result<Self, Error> {
        self.shape(Method::Where, |q| {
            q.predicates.or_where_null(column);
        })
    }

    pub fn where_not_null(self, column: &str) -> Result<Self, Error> {
        self.shape(Method::Where, |q| {
            q.predicates.where_not_null(column);
        })
    }

    pub fn or_where_not_null(self, column: &str) -> Result<Self, Error> {
        self.shape(Method::Where, |q| {
            q.predicates.or_where_not_null(column);
        })
    }

    pub fn where_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Result<Self, Error> {
        self.shape(Method::Where, |q| {
            q.predicates.where_in(column, values);
        })
    }

    pub fn or_where_in<V: Into<Value>>(self, column: &str, values: impl IntoIterator<Item = V>) -> Result<Self, Error> {
        self.shape(Method::Where, |q| {
            q.predicates.or_where_in(column, values);
        })
    }

    pub fn where_between(self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Result<Self, Error> {
        let (low, high) = (low.into(), high.into());
        self.shape(Method::Where, |q| {
            q.predicates.where_between(column, low, high);
        })
    }

    pub fn or_where_between(self, column: &str, low: impl Into<Value>, high: impl Into<Value>) -> Result<Self, Error> {
        let (low, high) = (low.into(), high.into());
        self.shape(Method::Where, |q| {
            q.predicates.or_where_between(column, low, high);
        })
    }

    /// Raw fragment; `values` bind to its `?` placeholders in order.
    pub fn where_raw<V: Into<Value>>(self, sql: &str, values: impl IntoIterator<Item = V>) -> Result<Self, Error> {
        self.shape(Method::Where, |q| {
            q.predicates.where_raw(sql, values);
        })
    }

    pub fn or_where_raw<V: Into<Value>>(self, sql: &str, values: impl IntoIterator<Item = V>) -> Result<Self, Error> {
        self.shape(Method::Where, |q| {
            q.predicates.or_where_raw(sql, values);
        })
    }

    /// Parenthesized group joined with `AND`.
    pub fn where_group(self, build: impl FnOnce(&mut Predicates)) -> Result<Self, Error> {
        self.shape(Method::Where, |q| {
            q.predicates.where_group(build);
        })
    }

    /// Parenthesized group joined with `OR`.
    pub fn or_where_group(self, build: impl FnOnce(&mut Predicates)) -> Result<Self, Error> {
        self.shape(Method::Where, |q| {
            q.predicates.or_where_group(build);
        })
    }

    pub fn order_by(self, column: &str, order: Order) -> Result<Self, Error> {
        self.shape(Method::OrderBy, |q| q.order_by(column, order))
    }

    /// Newest rows first, by the created-at column.
    pub fn latest(self) -> Result<Self, Error> {
        let column = self.meta.created_at.unwrap_or("created_at");
        self.order_by(column, Order::Desc)
    }

    /// Oldest rows first, by the created-at column.
    pub fn oldest(self) -> Result<Self, Error> {
        let column = self.meta.created_at.unwrap_or("created_at");
        self.order_by(column, Order::Asc)
    }

    /// At most `count` rows, skipping `offset`.
    pub fn limit(self, count: u64, offset: u64) -> Result<Self, Error> {
        self.shape(Method::Limit, |q| q.limit(count, offset))
    }

    /// Restricts the columns read by `get`, `first`, `last` and `find`.
    pub fn select(self, columns: &[&str]) -> Result<Self, Error> {
        self.shape(Method::Select, |q| q.select(columns))
    }

    /// Includes soft-deleted rows for the rest of this chain.
    pub fn with_trashed(self) -> Result<Self, Error> {
        self.shape(Method::WithTrashed, QueryState::set_with_trashed)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Every row matching the accumulated predicates.
    pub async fn get(self) -> Result<Vec<Self>, Error> {
        self.gate.check(Method::Get)?;
        self.fetch(self.query.clone()).await
    }

    /// Every row of the table.
    pub async fn all(self) -> Result<Vec<Self>, Error> {
        self.gate.check(Method::All)?;
        self.fetch(self.query.clone()).await
    }

    pub async fn first(self) -> Result<Option<Self>, Error> {
        self.gate.check(Method::First)?;
        let mut query = self.query.clone();
        query.limit(1, 0);
        self.fetch_one(query).await
    }

    /// Last row by primary key.
    pub async fn last(self) -> Result<Option<Self>, Error> {
        self.gate.check(Method::Last)?;
        let mut query = self.query.clone();
        query.order_by(self.meta.primary_key, Order::Desc);
        query.limit(1, 0);
        self.fetch_one(query).await
    }

    /// `COUNT(*)` over the accumulated predicates.
    pub async fn count(self) -> Result<i64, Error> {
        self.gate.check(Method::Count)?;
        self.count_rows("*").await
    }

    /// `COUNT(column)`: rows where `column` is not null.
    pub async fn count_column(self, column: &str) -> Result<i64, Error> {
        self.gate.check(Method::Count)?;
        self.count_rows(column).await
    }

    /// Row by primary key, or `None`.
    pub async fn find(self, id: impl Into<Value>) -> Result<Option<Self>, Error> {
        self.gate.check(Method::Find)?;
        let mut query = self.query.clone();
        query.predicates.and_where(self.meta.primary_key, id);
        self.fetch_one(query).await
    }

    /// First row where `column = value`, or `None`.
    pub async fn find_from(self, column: &str, value: impl Into<Value>) -> Result<Option<Self>, Error> {
        self.gate.check(Method::FindFrom)?;
        let mut query = self.query.clone();
        query.predicates.and_where(column, value);
        self.fetch_one(query).await
    }

    /// One page of rows (0-indexed) plus the total count.
    pub async fn paginate(self, page: usize, per_page: usize) -> Result<Paginated<Self>, Error> {
        Pagination::new(page, per_page).paginate(self).await
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Fills the fillable columns of `values` and inserts the row.
    pub async fn create<K, V, I>(&mut self, values: I) -> Result<u64, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.gate.check(Method::Create)?;
        self.fill(values)?;
        let affected = self.persist(&[]).await?;
        self.gate.advance(Method::Create);
        Ok(affected)
    }

    /// Inserts a typed model. Only its fillable fields are written.
    pub async fn create_model(&mut self, model: &M) -> Result<u64, Error> {
        self.gate.check(Method::Create)?;
        self.fill_model(model)?;
        let affected = self.persist(&[]).await?;
        self.gate.advance(Method::Create);
        Ok(affected)
    }

    /// Fills the fillable columns of `values` and saves the located row.
    pub async fn update<K, V, I>(&mut self, values: I) -> Result<u64, Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.gate.check(Method::Update)?;
        self.fill(values)?;
        let affected = self.persist(&[]).await?;
        self.gate.advance(Method::Update);
        Ok(affected)
    }

    /// Inserts the row when it has no primary key yet, updates it otherwise.
    ///
    /// Afterwards the attributes hold the row as persisted, including
    /// server-computed columns.
    pub async fn save(&mut self) -> Result<u64, Error> {
        self.gate.check(Method::Save)?;
        let affected = self.persist(&[]).await?;
        self.gate.advance(Method::Save);
        Ok(affected)
    }

    pub async fn increment(&mut self, column: &str) -> Result<u64, Error> {
        self.adjust(Method::Increment, column, 1).await
    }

    pub async fn increment_by(&mut self, column: &str, by: i64) -> Result<u64, Error> {
        self.adjust(Method::Increment, column, by).await
    }

    pub async fn decrement(&mut self, column: &str) -> Result<u64, Error> {
        self.adjust(Method::Decrement, column, -1).await
    }

    pub async fn decrement_by(&mut self, column: &str, by: i64) -> Result<u64, Error> {
        let delta = by.checked_neg().ok_or_else(|| Error::invalid_argument("decrement step is out of range"))?;
        self.adjust(Method::Decrement, column, delta).await
    }

    async fn adjust(&mut self, method: Method, column: &str, delta: i64) -> Result<u64, Error> {
        self.gate.check(method)?;

        let next = match self.attributes.get(column) {
            Value::Null => Value::Int(delta),
            Value::Float(v) => Value::Float(v + delta as f64),
            other => match other.as_i64() {
                Some(v) => match v.checked_add(delta) {
                    Some(sum) => Value::Int(sum),
                    None => {
                        return Err(Error::InvalidArgument(format!(
                            "Cannot {} `{}`: {} {:+} overflows",
                            method.as_str(),
                            column,
                            v,
                            delta
                        )));
                    }
                },
                None => {
                    return Err(Error::Conversion(format!(
                        "Cannot {} non-numeric column `{}` ({})",
                        method.as_str(),
                        column,
                        other.kind()
                    )));
                }
            },
        };
        self.attributes.set(column, next);

        let affected = self.persist(&[column]).await?;
        self.gate.advance(method);
        Ok(affected)
    }

    /// Writes the fillable attributes (plus `extra` columns) as an insert or an update.
    async fn persist(&mut self, extra: &[&str]) -> Result<u64, Error> {
        let meta = Arc::clone(&self.meta);
        let dialect = self.dialect();
        let now = dialect.now();

        let managed = [meta.created_at, meta.updated_at, meta.soft_delete];
        let mut columns: Vec<&str> = Vec::new();
        for &column in meta.fillable.iter().chain(extra) {
            if column == meta.primary_key || managed.contains(&Some(column)) || columns.contains(&column) {
                continue;
            }
            if self.attributes.contains(column) {
                columns.push(column);
            }
        }

        let mut assignments: Vec<(String, String)> = Vec::new();
        let mut values = Vec::new();
        for column in &columns {
            assignments.push((dialect.quote(column), "?".to_string()));
            values.push(self.storage_value(column)?);
        }

        let db = self.db().await?;
        let pk = meta.primary_key;

        let (affected, id) = if self.attributes.get(pk).is_null() {
            for column in [meta.created_at, meta.updated_at].into_iter().flatten() {
                assignments.push((dialect.quote(column), now.to_string()));
            }

            let mut query = self.new_query();
            query.set_template(insert_sql(dialect, &self.quoted_table(), &assignments), values);
            let executed = db.execute(&query.finalize()?).await?;

            let id = match executed.last_insert_id {
                Some(id) if id > 0 => Value::Int(id),
                _ => Value::Null,
            };
            (executed.rows_affected, id)
        } else {
            if columns.is_empty() {
                return Ok(0);
            }
            if let Some(column) = meta.updated_at {
                assignments.push((dialect.quote(column), now.to_string()));
            }

            let id = self.attributes.get(pk).clone();
            let set = assignments.iter().map(|(c, e)| format!("{} = {}", c, e)).collect::<Vec<_>>().join(", ");

            let mut query = self.new_query();
            query.set_template(format!("UPDATE {} SET {}", self.quoted_table(), set), values);
            query.predicates.and_where(pk, id.clone());
            let executed = db.execute(&query.finalize()?).await?;
            (executed.rows_affected, id)
        };

        if !id.is_null() {
            if let Some(row) = self.locate(pk, id.clone(), true).await? {
                self.attributes = row;
            } else {
                self.attributes.set(pk, id);
            }
        }

        Ok(affected)
    }

    // ========================================================================
    // Deletes
    // ========================================================================

    /// Deletes the located row. Soft-deletes when the model has a soft-delete column.
    pub async fn delete(&mut self) -> Result<u64, Error> {
        self.gate.check(Method::Delete)?;
        self.delete_located().await
    }

    /// Locates the row by primary key, then deletes it. Returns `0` when no
    /// visible row has that id. After `with_trashed()` trashed rows are
    /// visible too.
    pub async fn delete_id(&mut self, id: impl Into<Value>) -> Result<u64, Error> {
        self.gate.check(Method::Delete)?;
        match self.locate(self.meta.primary_key, id.into(), self.query.with_trashed()).await? {
            Some(row) => {
                self.attributes = row;
                self.delete_located().await
            }
            None => Ok(0),
        }
    }

    async fn delete_located(&mut self) -> Result<u64, Error> {
        let id = self.primary_key_value(Method::Delete)?;
        let template = self.policy().delete_sql(self.dialect(), &self.quoted_table());
        let pk = self.meta.primary_key;

        let affected = self
            .execute_with(template, |p| {
                p.and_where(pk, id);
            })
            .await?;

        self.finish(Method::Delete);
        Ok(affected)
    }

    /// Advances the gate after a chain-ending write and clears the query.
    pub(crate) fn finish(&mut self, method: Method) {
        self.gate.advance(method);
        self.query.reset();
    }
}

/// `INSERT` statement text for the given `(quoted column, expression)` pairs.
fn insert_sql(dialect: Dialect, table: &str, assignments: &[(String, String)]) -> String {
    match dialect {
        Dialect::MySql if assignments.is_empty() => format!("INSERT INTO {} () VALUES ()", table),
        Dialect::MySql => {
            let set = assignments.iter().map(|(c, e)| format!("{} = {}", c, e)).collect::<Vec<_>>().join(", ");
            format!("INSERT INTO {} SET {}", table, set)
        }
        _ if assignments.is_empty() => format!("INSERT INTO {} DEFAULT VALUES", table),
        _ => {
            let (columns, exprs): (Vec<&str>, Vec<&str>) =
                assignments.iter().map(|(c, e)| (c.as_str(), e.as_str())).unzip();
            format!("INSERT INTO {} ({}) VALUES ({})", table, columns.join(", "), exprs.join(", "))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
