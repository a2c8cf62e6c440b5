//! # Schema Module
//!
//! A small table blueprint for programmatic migrations, rendered per dialect.
//!
//! ```rust,ignore
//! db.create_table("posts", |t| {
//!     t.id();
//!     t.string("title", 200);
//!     t.text("body").nullable();
//!     t.boolean("published").default("0");
//!     t.integer("author_id");
//!     t.foreign("author_id", "users", "id");
//!     t.timestamps();
//!     t.soft_deletes();
//!     t.index(&["author_id"]);
//! })
//! .await?;
//! ```
//!
//! Existing tables are changed with the same builder:
//!
//! ```rust,ignore
//! db.alter_table("posts", |t| {
//!     t.string("slug", 120).nullable();
//!     t.index(&["slug"]);
//! })
//! .await?;
//! db.rename_table("posts", "articles").await?;
//! ```
//!
//! Timestamps are declared as `TEXT` on sqlite, which stores them as
//! `YYYY-MM-DD HH:MM:SS` strings.

use crate::{
    Error, Value,
    database::{Database, Dialect},
    query_builder::Statement,
};

// ============================================================================
// Column Definitions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum ColumnType {
    Id,
    String(u32),
    Integer,
    BigInteger,
    Float,
    Boolean,
    Text,
    Timestamp,
}

impl ColumnType {
    fn sql(&self, dialect: Dialect) -> String {
        match (self, dialect) {
            (ColumnType::Id, Dialect::MySql) => "BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY".into(),
            (ColumnType::Id, Dialect::Sqlite) => "INTEGER PRIMARY KEY AUTOINCREMENT".into(),
            (ColumnType::Id, Dialect::SqlServer) => "BIGINT IDENTITY(1,1) PRIMARY KEY".into(),
            (ColumnType::String(len), Dialect::SqlServer) => format!("NVARCHAR({})", len),
            (ColumnType::String(len), _) => format!("VARCHAR({})", len),
            (ColumnType::Integer, Dialect::Sqlite) => "INTEGER".into(),
            (ColumnType::Integer, _) => "INT".into(),
            (ColumnType::BigInteger, Dialect::Sqlite) => "INTEGER".into(),
            (ColumnType::BigInteger, _) => "BIGINT".into(),
            (ColumnType::Float, Dialect::MySql) => "DOUBLE".into(),
            (ColumnType::Float, Dialect::Sqlite) => "REAL".into(),
            (ColumnType::Float, Dialect::SqlServer) => "FLOAT".into(),
            (ColumnType::Boolean, Dialect::MySql) => "TINYINT(1)".into(),
            (ColumnType::Boolean, Dialect::Sqlite) => "INTEGER".into(),
            (ColumnType::Boolean, Dialect::SqlServer) => "BIT".into(),
            (ColumnType::Text, Dialect::SqlServer) => "NVARCHAR(MAX)".into(),
            (ColumnType::Text, _) => "TEXT".into(),
            (ColumnType::Timestamp, Dialect::MySql) => "TIMESTAMP".into(),
            (ColumnType::Timestamp, Dialect::Sqlite) => "TEXT".into(),
            (ColumnType::Timestamp, Dialect::SqlServer) => "DATETIME2".into(),
        }
    }
}

/// One column of a [`Blueprint`]. Modifiers chain on the returned reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    name: String,
    kind: ColumnType,
    nullable: bool,
    default: Option<String>,
    unique: bool,
}

impl ColumnDef {
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    /// Raw SQL default expression, e.g. `"0"` or `"'draft'"`.
    pub fn default(&mut self, expr: &str) -> &mut Self {
        self.default = Some(expr.to_string());
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    fn sql(&self, dialect: Dialect) -> String {
        let mut def = format!("{} {}", dialect.quote(&self.name), self.kind.sql(dialect));
        if self.kind != ColumnType::Id {
            def.push_str(if self.nullable { " NULL" } else { " NOT NULL" });
        }
        if let Some(expr) = &self.default {
            def.push_str(" DEFAULT ");
            def.push_str(expr);
        }
        if self.unique {
            def.push_str(" UNIQUE");
        }
        def
    }
}

// ============================================================================
// Blueprint
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
struct Index {
    columns: Vec<String>,
    unique: bool,
}

/// Table definition collected by [`Database::create_table`].
#[derive(Debug, Clone)]
pub struct Blueprint {
    table: String,
    columns: Vec<ColumnDef>,
    constraints: Vec<(Vec<String>, String, String)>,
    indexes: Vec<Index>,
    custom: Vec<String>,
}

impl Blueprint {
    pub fn new(table: &str) -> Self {
        Self { table: table.to_string(), columns: Vec::new(), constraints: Vec::new(), indexes: Vec::new(), custom: Vec::new() }
    }

    fn column(&mut self, name: &str, kind: ColumnType) -> &mut ColumnDef {
        self.columns.push(ColumnDef { name: name.to_string(), kind, nullable: false, default: None, unique: false });
        let last = self.columns.len() - 1;
        &mut self.columns[last]
    }

    /// Auto-incrementing `id` primary key.
    pub fn id(&mut self) -> &mut ColumnDef {
        self.column("id", ColumnType::Id)
    }

    pub fn string(&mut self, name: &str, length: u32) -> &mut ColumnDef {
        self.column(name, ColumnType::String(length))
    }

    pub fn integer(&mut self, name: &str) -> &mut ColumnDef {
        self.column(name, ColumnType::Integer)
    }

    pub fn big_integer(&mut self, name: &str) -> &mut ColumnDef {
        self.column(name, ColumnType::BigInteger)
    }

    pub fn float(&mut self, name: &str) -> &mut ColumnDef {
        self.column(name, ColumnType::Float)
    }

    pub fn boolean(&mut self, name: &str) -> &mut ColumnDef {
        self.column(name, ColumnType::Boolean)
    }

    pub fn text(&mut self, name: &str) -> &mut ColumnDef {
        self.column(name, ColumnType::Text)
    }

    pub fn timestamp(&mut self, name: &str) -> &mut ColumnDef {
        self.column(name, ColumnType::Timestamp)
    }

    /// Nullable `created_at` and `updated_at`.
    pub fn timestamps(&mut self) {
        self.timestamp("created_at").nullable();
        self.timestamp("updated_at").nullable();
    }

    /// Nullable `deleted_at`.
    pub fn soft_deletes(&mut self) -> &mut ColumnDef {
        self.timestamp("deleted_at").nullable()
    }

    /// Unique index over `columns`.
    pub fn unique(&mut self, columns: &[&str]) {
        self.indexes.push(Index { columns: columns.iter().map(|c| c.to_string()).collect(), unique: true });
    }

    pub fn index(&mut self, columns: &[&str]) {
        self.indexes.push(Index { columns: columns.iter().map(|c| c.to_string()).collect(), unique: false });
    }

    /// `FOREIGN KEY (column) REFERENCES table (references)`.
    pub fn foreign(&mut self, column: &str, table: &str, references: &str) {
        self.constraints.push((vec![column.to_string()], table.to_string(), references.to_string()));
    }

    /// Raw statement run after the table and its indexes are created.
    pub fn custom(&mut self, sql: &str) {
        self.custom.push(sql.to_string());
    }

    /// Every statement needed to create the table.
    pub fn to_sql(&self, dialect: Dialect) -> Vec<String> {
        let mut defs: Vec<String> = self.columns.iter().map(|c| c.sql(dialect)).collect();
        for (columns, table, references) in &self.constraints {
            defs.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                quote_all(dialect, columns),
                dialect.quote(table),
                dialect.quote(references)
            ));
        }

        let mut statements = vec![format!("CREATE TABLE {} ({})", dialect.quote(&self.table), defs.join(", "))];
        statements.extend(self.indexes.iter().map(|index| index_sql(dialect, &self.table, &index.columns, index.unique)));
        statements.extend(self.custom.iter().cloned());
        statements
    }

    /// Statements that add the collected columns, keys and indexes to an
    /// existing table.
    pub fn to_alter_sql(&self, dialect: Dialect) -> Result<Vec<String>, Error> {
        let table = dialect.quote(&self.table);
        let add = match dialect {
            Dialect::SqlServer => "ADD",
            Dialect::MySql | Dialect::Sqlite => "ADD COLUMN",
        };

        let mut statements: Vec<String> =
            self.columns.iter().map(|c| format!("ALTER TABLE {} {} {}", table, add, c.sql(dialect))).collect();

        for (columns, references_table, references) in &self.constraints {
            let [column] = columns.as_slice() else { continue };
            statements.push(foreign_sql(dialect, &self.table, column, references_table, references)?);
        }

        statements.extend(self.indexes.iter().map(|index| index_sql(dialect, &self.table, &index.columns, index.unique)));
        statements.extend(self.custom.iter().cloned());
        Ok(statements)
    }
}

fn quote_all(dialect: Dialect, columns: &[String]) -> String {
    columns.iter().map(|c| dialect.quote(c)).collect::<Vec<_>>().join(", ")
}

/// Conventional index name: `{table}_{columns}_{index|unique}`.
pub fn index_name(table: &str, columns: &[String], unique: bool) -> String {
    format!("{}_{}_{}", table, columns.join("_"), if unique { "unique" } else { "index" })
}

/// Conventional foreign key name: `{table}_{column}_foreign`.
pub fn foreign_name(table: &str, column: &str) -> String {
    format!("{}_{}_foreign", table, column)
}

fn index_sql(dialect: Dialect, table: &str, columns: &[String], unique: bool) -> String {
    format!(
        "CREATE {}INDEX {} ON {} ({})",
        if unique { "UNIQUE " } else { "" },
        dialect.quote(&index_name(table, columns, unique)),
        dialect.quote(table),
        quote_all(dialect, columns)
    )
}

fn drop_index_sql(dialect: Dialect, table: &str, name: &str) -> String {
    match dialect {
        Dialect::MySql => format!("ALTER TABLE {} DROP INDEX {}", dialect.quote(table), dialect.quote(name)),
        Dialect::SqlServer => format!("DROP INDEX {} ON {}", dialect.quote(name), dialect.quote(table)),
        Dialect::Sqlite => format!("DROP INDEX {}", dialect.quote(name)),
    }
}

fn foreign_sql(dialect: Dialect, table: &str, column: &str, references_table: &str, references: &str) -> Result<String, Error> {
    if dialect == Dialect::Sqlite {
        return Err(Error::invalid_argument("sqlite cannot add a foreign key to an existing table"));
    }
    Ok(format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
        dialect.quote(table),
        dialect.quote(&foreign_name(table, column)),
        dialect.quote(column),
        dialect.quote(references_table),
        dialect.quote(references)
    ))
}

fn drop_foreign_sql(dialect: Dialect, table: &str, name: &str) -> Result<String, Error> {
    match dialect {
        Dialect::MySql => Ok(format!("ALTER TABLE {} DROP FOREIGN KEY {}", dialect.quote(table), dialect.quote(name))),
        Dialect::SqlServer => Ok(format!("ALTER TABLE {} DROP CONSTRAINT {}", dialect.quote(table), dialect.quote(name))),
        Dialect::Sqlite => Err(Error::invalid_argument("sqlite cannot drop a foreign key from an existing table")),
    }
}

fn rename_sql(dialect: Dialect, from: &str, to: &str) -> String {
    match dialect {
        Dialect::MySql => format!("RENAME TABLE {} TO {}", dialect.quote(from), dialect.quote(to)),
        Dialect::Sqlite => format!("ALTER TABLE {} RENAME TO {}", dialect.quote(from), dialect.quote(to)),
        Dialect::SqlServer => format!("EXEC sp_rename '{}', '{}'", from.replace('\'', "''"), to.replace('\'', "''")),
    }
}

fn truncate_sql(dialect: Dialect, table: &str) -> String {
    match dialect {
        Dialect::Sqlite => format!("DELETE FROM {}", dialect.quote(table)),
        Dialect::MySql | Dialect::SqlServer => format!("TRUNCATE TABLE {}", dialect.quote(table)),
    }
}

fn table_exists_sql(dialect: Dialect) -> &'static str {
    match dialect {
        Dialect::MySql => {
            "SELECT COUNT(*) AS count FROM information_schema.tables WHERE table_schema = DATABASE() AND table_name = ?;"
        }
        Dialect::SqlServer => "SELECT COUNT(*) AS count FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = ?;",
        Dialect::Sqlite => "SELECT COUNT(*) AS count FROM sqlite_master WHERE type = 'table' AND name = ?;",
    }
}

// ============================================================================
// Schema Helpers
// ============================================================================

impl Database {
    /// Creates `table` from the blueprint filled in by `build`.
    pub async fn create_table(&self, table: &str, build: impl FnOnce(&mut Blueprint)) -> Result<(), Error> {
        let mut blueprint = Blueprint::new(table);
        build(&mut blueprint);

        for statement in blueprint.to_sql(self.dialect()) {
            self.raw(&statement).await?;
        }
        Ok(())
    }

    pub async fn drop_table(&self, table: &str) -> Result<(), Error> {
        self.raw(&format!("DROP TABLE {}", self.dialect().quote(table))).await?;
        Ok(())
    }

    pub async fn drop_table_if_exists(&self, table: &str) -> Result<(), Error> {
        self.raw(&format!("DROP TABLE IF EXISTS {}", self.dialect().quote(table))).await?;
        Ok(())
    }

    /// Adds the columns, keys and indexes declared by `build` to `table`.
    pub async fn alter_table(&self, table: &str, build: impl FnOnce(&mut Blueprint)) -> Result<(), Error> {
        let mut blueprint = Blueprint::new(table);
        build(&mut blueprint);

        for statement in blueprint.to_alter_sql(self.dialect())? {
            self.raw(&statement).await?;
        }
        Ok(())
    }

    pub async fn drop_column(&self, table: &str, column: &str) -> Result<(), Error> {
        let dialect = self.dialect();
        self.raw(&format!("ALTER TABLE {} DROP COLUMN {}", dialect.quote(table), dialect.quote(column))).await?;
        Ok(())
    }

    pub async fn rename_table(&self, from: &str, to: &str) -> Result<(), Error> {
        self.raw(&rename_sql(self.dialect(), from, to)).await?;
        Ok(())
    }

    /// Removes every row of `table`.
    pub async fn truncate(&self, table: &str) -> Result<(), Error> {
        self.raw(&truncate_sql(self.dialect(), table)).await?;
        Ok(())
    }

    /// Creates an index over `columns` and returns its name.
    pub async fn add_index(&self, table: &str, columns: &[&str], unique: bool) -> Result<String, Error> {
        let columns: Vec<String> = columns.iter().map(|c| c.to_string()).collect();
        self.raw(&index_sql(self.dialect(), table, &columns, unique)).await?;
        Ok(index_name(table, &columns, unique))
    }

    pub async fn drop_index(&self, table: &str, name: &str) -> Result<(), Error> {
        self.raw(&drop_index_sql(self.dialect(), table, name)).await?;
        Ok(())
    }

    /// Adds `FOREIGN KEY (column) REFERENCES references_table (references)`
    /// and returns the constraint name. Not available on sqlite.
    pub async fn add_foreign(
        &self,
        table: &str,
        column: &str,
        references_table: &str,
        references: &str,
    ) -> Result<String, Error> {
        self.raw(&foreign_sql(self.dialect(), table, column, references_table, references)?).await?;
        Ok(foreign_name(table, column))
    }

    pub async fn drop_foreign(&self, table: &str, name: &str) -> Result<(), Error> {
        self.raw(&drop_foreign_sql(self.dialect(), table, name)?).await?;
        Ok(())
    }

    pub async fn table_exists(&self, table: &str) -> Result<bool, Error> {
        let statement = Statement::new(table_exists_sql(self.dialect()), vec![Value::from(table)]);
        let row = self.fetch_optional(&statement).await?;
        Ok(row.and_then(|r| r.get("count").as_i64()).is_some_and(|count| count > 0))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn posts() -> Blueprint {
        let mut t = Blueprint::new("posts");
        t.id();
        t.string("title", 200).unique();
        t.boolean("published").default("0");
        t.integer("author_id");
        t.foreign("author_id", "users", "id");
        t.soft_deletes();
        t.index(&["author_id"]);
        t
    }

    #[test]
    fn test_sqlite_blueprint() {
        let sql = posts().to_sql(Dialect::Sqlite);
        assert_eq!(
            sql[0],
            "CREATE TABLE `posts` (`id` INTEGER PRIMARY KEY AUTOINCREMENT, `title` VARCHAR(200) NOT NULL UNIQUE, \
             `published` INTEGER NOT NULL DEFAULT 0, `author_id` INTEGER NOT NULL, `deleted_at` TEXT NULL, \
             FOREIGN KEY (`author_id`) REFERENCES `users` (`id`))"
        );
        assert_eq!(sql[1], "CREATE INDEX `posts_author_id_index` ON `posts` (`author_id`)");
    }

    #[test]
    fn test_sqlsrv_types() {
        let sql = posts().to_sql(Dialect::SqlServer);
        assert!(sql[0].starts_with("CREATE TABLE [posts] ([id] BIGINT IDENTITY(1,1) PRIMARY KEY, [title] NVARCHAR(200)"));
        assert!(sql[0].contains("[published] BIT NOT NULL DEFAULT 0"));
        assert!(sql[0].contains("[deleted_at] DATETIME2 NULL"));
    }

    #[test]
    fn test_unique_index_and_custom_statement() {
        let mut t = Blueprint::new("tags");
        t.string("slug", 64);
        t.unique(&["slug"]);
        t.custom("INSERT INTO tags (slug) VALUES ('general')");

        let sql = t.to_sql(Dialect::MySql);
        assert_eq!(sql[1], "CREATE UNIQUE INDEX `tags_slug_unique` ON `tags` (`slug`)");
        assert_eq!(sql[2], "INSERT INTO tags (slug) VALUES ('general')");
    }

    #[test]
    fn test_alter_statements_per_dialect() {
        let mut t = Blueprint::new("posts");
        t.string("slug", 80).nullable();
        t.foreign("author_id", "users", "id");
        t.index(&["slug"]);

        let mysql = t.to_alter_sql(Dialect::MySql).unwrap();
        assert_eq!(mysql[0], "ALTER TABLE `posts` ADD COLUMN `slug` VARCHAR(80) NULL");
        assert_eq!(
            mysql[1],
            "ALTER TABLE `posts` ADD CONSTRAINT `posts_author_id_foreign` FOREIGN KEY (`author_id`) REFERENCES `users` (`id`)"
        );
        assert_eq!(mysql[2], "CREATE INDEX `posts_slug_index` ON `posts` (`slug`)");

        let sqlsrv = t.to_alter_sql(Dialect::SqlServer).unwrap();
        assert_eq!(sqlsrv[0], "ALTER TABLE [posts] ADD [slug] NVARCHAR(80) NULL");

        assert!(matches!(t.to_alter_sql(Dialect::Sqlite), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn test_table_level_statements() {
        assert_eq!(rename_sql(Dialect::MySql, "a", "b"), "RENAME TABLE `a` TO `b`");
        assert_eq!(rename_sql(Dialect::Sqlite, "a", "b"), "ALTER TABLE `a` RENAME TO `b`");
        assert_eq!(rename_sql(Dialect::SqlServer, "a", "b"), "EXEC sp_rename 'a', 'b'");

        assert_eq!(truncate_sql(Dialect::MySql, "a"), "TRUNCATE TABLE `a`");
        assert_eq!(truncate_sql(Dialect::Sqlite, "a"), "DELETE FROM `a`");

        assert_eq!(drop_index_sql(Dialect::MySql, "a", "a_x_index"), "ALTER TABLE `a` DROP INDEX `a_x_index`");
        assert_eq!(drop_index_sql(Dialect::SqlServer, "a", "a_x_index"), "DROP INDEX [a_x_index] ON [a]");
        assert_eq!(drop_foreign_sql(Dialect::MySql, "a", "fk").unwrap(), "ALTER TABLE `a` DROP FOREIGN KEY `fk`");
        assert_eq!(drop_foreign_sql(Dialect::SqlServer, "a", "fk").unwrap(), "ALTER TABLE [a] DROP CONSTRAINT [fk]");
        assert!(drop_foreign_sql(Dialect::Sqlite, "a", "fk").is_err());
    }
}
