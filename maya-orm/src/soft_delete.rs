//! # Soft Delete
//!
//! Models with a `#[orm(soft_delete)]` column never lose rows through
//! [`Record::delete`]: the column is stamped with the current time instead,
//! and every read (`get`, `all`, `first`, `last`, `find`, `find_from`,
//! `count`, `paginate`) only sees rows where it is `NULL`.
//!
//! `with_trashed()` lifts the filter for the rest of one chain. Rows can be
//! brought back with the `restore*` family or removed for good with the
//! `force_delete*` family; both bypass the filter.
//!
//! ```rust,ignore
//! db.model::<Post>()?.delete_id(5).await?;
//! assert!(db.model::<Post>()?.find(5).await?.is_none());
//! assert!(db.model::<Post>()?.with_trashed()?.find(5).await?.is_some());
//!
//! db.model::<Post>()?.restore_id(5).await?;
//! ```

use crate::{
    Error, Model, Value,
    database::Dialect,
    gate::Method,
    model::TableMeta,
    query_builder::QueryState,
    record::Record,
};

// ============================================================================
// Delete Policy
// ============================================================================

/// How a model's rows are deleted and which rows its reads see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletePolicy {
    /// Rows are removed.
    Hard,
    /// Rows are stamped in the given column and hidden from reads.
    Soft(&'static str),
}

impl DeletePolicy {
    pub fn of(meta: &TableMeta) -> Self {
        match meta.soft_delete {
            Some(column) => DeletePolicy::Soft(column),
            None => DeletePolicy::Hard,
        }
    }

    pub fn column(self) -> Option<&'static str> {
        match self {
            DeletePolicy::Soft(column) => Some(column),
            DeletePolicy::Hard => None,
        }
    }

    /// Hides trashed rows unless the query asked for them.
    pub fn scope_reads(self, query: &mut QueryState) {
        if let DeletePolicy::Soft(column) = self {
            query.scope_soft_delete(column);
        }
    }

    /// Statement text, without predicates, that deletes rows of `table`.
    pub fn delete_sql(self, dialect: Dialect, table: &str) -> String {
        match self {
            DeletePolicy::Hard => format!("DELETE FROM {}", table),
            DeletePolicy::Soft(column) => format!("UPDATE {} SET {} = {}", table, dialect.quote(column), dialect.now()),
        }
    }
}

// ============================================================================
// Restore and Force Delete
// ============================================================================

impl<M: Model> Record<'_, M> {
    fn soft_column(&self, method: Method) -> Result<&'static str, Error> {
        self.policy().column().ok_or_else(|| {
            Error::InvalidArgument(format!(
                "`{}` needs a soft-delete column, `{}` has none",
                method.as_str(),
                self.meta.table
            ))
        })
    }

    fn restore_sql(&self, column: &str) -> String {
        format!("UPDATE {} SET {} = NULL", self.quoted_table(), self.dialect().quote(column))
    }

    /// Clears the soft-delete column of the located row.
    pub async fn restore(&mut self) -> Result<u64, Error> {
        self.gate.check(Method::Restore)?;
        let column = self.soft_column(Method::Restore)?;
        self.restore_located(column).await
    }

    /// Locates the row by primary key, trashed or not, and restores it.
    pub async fn restore_id(&mut self, id: impl Into<Value>) -> Result<u64, Error> {
        self.gate.check(Method::Restore)?;
        let column = self.soft_column(Method::Restore)?;

        match self.locate(self.meta.primary_key, id.into(), true).await? {
            Some(row) => {
                self.attributes = row;
                self.restore_located(column).await
            }
            None => Ok(0),
        }
    }

    async fn restore_located(&mut self, column: &'static str) -> Result<u64, Error> {
        let id = self.primary_key_value(Method::Restore)?;
        let pk = self.meta.primary_key;

        let affected = self
            .execute_with(self.restore_sql(column), |p| {
                p.and_where(pk, id);
            })
            .await?;

        self.attributes.set(column, Value::Null);
        self.finish(Method::Restore);
        Ok(affected)
    }

    /// Restores every trashed row.
    pub async fn restore_all(&mut self) -> Result<u64, Error> {
        self.gate.check(Method::RestoreAll)?;
        let column = self.soft_column(Method::RestoreAll)?;

        let affected = self
            .execute_with(self.restore_sql(column), |p| {
                p.where_not_null(column);
            })
            .await?;

        log::info!("Restored {} row(s) of `{}`", affected, self.meta.table);
        self.finish(Method::RestoreAll);
        Ok(affected)
    }

    /// Restores the trashed rows where `column = value`.
    pub async fn restore_from(&mut self, column: &str, value: impl Into<Value>) -> Result<u64, Error> {
        self.gate.check(Method::RestoreFrom)?;
        let soft = self.soft_column(Method::RestoreFrom)?;
        let value = value.into();

        let affected = self
            .execute_with(self.restore_sql(soft), |p| {
                p.and_where(column, value).where_not_null(soft);
            })
            .await?;

        self.finish(Method::RestoreFrom);
        Ok(affected)
    }

    /// Removes the located row for good.
    pub async fn force_delete(&mut self) -> Result<u64, Error> {
        self.gate.check(Method::ForceDelete)?;
        self.soft_column(Method::ForceDelete)?;
        self.force_delete_located().await
    }

    /// Locates the row by primary key, trashed or not, and removes it for good.
    pub async fn force_delete_id(&mut self, id: impl Into<Value>) -> Result<u64, Error> {
        self.gate.check(Method::ForceDelete)?;
        self.soft_column(Method::ForceDelete)?;

        match self.locate(self.meta.primary_key, id.into(), true).await? {
            Some(row) => {
                self.attributes = row;
                self.force_delete_located().await
            }
            None => Ok(0),
        }
    }

    async fn force_delete_located(&mut self) -> Result<u64, Error> {
        let id = self.primary_key_value(Method::ForceDelete)?;
        let pk = self.meta.primary_key;
        let template = DeletePolicy::Hard.delete_sql(self.dialect(), &self.quoted_table());

        let affected = self
            .execute_with(template, |p| {
                p.and_where(pk, id);
            })
            .await?;

        self.finish(Method::ForceDelete);
        Ok(affected)
    }

    /// Purges every trashed row. Live rows are kept.
    pub async fn force_delete_all(&mut self) -> Result<u64, Error> {
        self.gate.check(Method::ForceDeleteAll)?;
        let column = self.soft_column(Method::ForceDeleteAll)?;

        let template = DeletePolicy::Hard.delete_sql(self.dialect(), &self.quoted_table());
        let affected = self
            .execute_with(template, |p| {
                p.where_not_null(column);
            })
            .await?;

        log::info!("Purged {} trashed row(s) of `{}`", affected, self.meta.table);
        self.finish(Method::ForceDeleteAll);
        Ok(affected)
    }

    /// Removes every row where `column = value`, trashed or not.
    pub async fn force_delete_from(&mut self, column: &str, value: impl Into<Value>) -> Result<u64, Error> {
        self.gate.check(Method::ForceDeleteFrom)?;
        self.soft_column(Method::ForceDeleteFrom)?;
        let value = value.into();

        let template = DeletePolicy::Hard.delete_sql(self.dialect(), &self.quoted_table());
        let affected = self
            .execute_with(template, |p| {
                p.and_where(column, value);
            })
            .await?;

        self.finish(Method::ForceDeleteFrom);
        Ok(affected)
    }
}
