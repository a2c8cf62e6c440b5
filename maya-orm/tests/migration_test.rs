use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use maya_orm::{
    ConnectionConfig, ConnectionRegistry, Database, DatabaseConfig, Error, Ledger, MigrationOutcome, MigrationStatus,
};
use tempfile::TempDir;

type Trace = Arc<Mutex<Vec<String>>>;

fn registry() -> ConnectionRegistry {
    let _ = env_logger::builder().is_test(true).try_init();
    ConnectionRegistry::new(DatabaseConfig::new().with("default", ConnectionConfig::sqlite_memory()))
}

/// A migration step that only appends `label` to `trace`.
fn step(label: &'static str, trace: &Trace) -> impl Fn(Database) -> BoxFuture<'static, Result<(), Error>> + Send + Sync + use<> {
    let trace = Arc::clone(trace);
    move |_db| {
        let trace = Arc::clone(&trace);
        Box::pin(async move {
            trace.lock().unwrap().push(label.to_string());
            Ok(())
        })
    }
}

fn failing(_db: Database) -> BoxFuture<'static, Result<(), Error>> {
    Box::pin(async { Err(Error::invalid_argument("boom")) })
}

fn write_sql(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(format!("{}.sql", name)), body).unwrap();
}

fn names(outcome: &MigrationOutcome) -> Vec<String> {
    match outcome {
        MigrationOutcome::Applied { migrations, .. } => migrations.clone(),
        MigrationOutcome::NothingToMigrate => Vec::new(),
    }
}

#[tokio::test]
async fn test_sql_migrations_apply_once() -> Result<(), Error> {
    let tmp = TempDir::new()?;
    let dir = tmp.path().join("migrations");
    fs::create_dir_all(&dir)?;
    write_sql(&dir, "002_create_comments", "-- up\nCREATE TABLE comments (id INTEGER PRIMARY KEY);\n-- down\nDROP TABLE comments;");
    write_sql(&dir, "001_create_posts", "-- up\nCREATE TABLE posts (id INTEGER PRIMARY KEY);\n-- down\nDROP TABLE posts;");

    let db = registry();
    let ledger_path = tmp.path().join("storage").join("migrations.json");
    let migrator = db.migrator(&ledger_path).directory(&dir);

    let outcome = migrator.up("default").await?;
    assert_eq!(
        outcome,
        MigrationOutcome::Applied {
            batch: 1,
            migrations: vec!["001_create_posts".to_string(), "002_create_comments".to_string()],
        }
    );
    assert_eq!(migrator.up("default").await?, MigrationOutcome::NothingToMigrate);

    let ledger = Ledger::load(&ledger_path)?;
    assert_eq!(ledger.entries().len(), 2);
    assert_eq!(ledger.batch_of("002_create_comments"), Some(1));

    let conn = db.connection("default").await?;
    conn.raw("INSERT INTO posts (id) VALUES (1)").await?;

    let rolled_back = migrator.down("default", None).await?;
    assert_eq!(rolled_back, vec!["002_create_comments", "001_create_posts"]);
    assert!(conn.raw("INSERT INTO posts (id) VALUES (2)").await.is_err());
    assert!(Ledger::load(&ledger_path)?.entries().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_batches_roll_back_in_reverse_order() -> Result<(), Error> {
    let tmp = TempDir::new()?;
    let ledger_path = tmp.path().join("migrations.json");
    let trace: Trace = Arc::default();
    let db = registry();

    let first = db
        .migrator(&ledger_path)
        .register("001_a", step("001_a.up", &trace), step("001_a.down", &trace))
        .register("002_b", step("002_b.up", &trace), step("002_b.down", &trace));
    assert_eq!(names(&first.up("default").await?), vec!["001_a", "002_b"]);

    let second = db
        .migrator(&ledger_path)
        .register("001_a", step("001_a.up", &trace), step("001_a.down", &trace))
        .register("002_b", step("002_b.up", &trace), step("002_b.down", &trace))
        .register("003_c", step("003_c.up", &trace), step("003_c.down", &trace));
    assert_eq!(second.up("default").await?, MigrationOutcome::Applied { batch: 2, migrations: vec!["003_c".into()] });

    assert_eq!(
        second.status()?,
        vec![
            MigrationStatus { migration: "001_a".into(), batch: Some(1) },
            MigrationStatus { migration: "002_b".into(), batch: Some(1) },
            MigrationStatus { migration: "003_c".into(), batch: Some(2) },
        ]
    );

    assert_eq!(second.rollback_steps("default", 1).await?, vec!["003_c"]);
    assert_eq!(second.down("default", Some(1)).await?, vec!["002_b", "001_a"]);
    assert!(second.down("default", None).await?.is_empty());

    assert_eq!(
        *trace.lock().unwrap(),
        vec!["001_a.up", "002_b.up", "003_c.up", "003_c.down", "002_b.down", "001_a.down"]
    );
    Ok(())
}

#[tokio::test]
async fn test_failed_step_keeps_earlier_progress() -> Result<(), Error> {
    let tmp = TempDir::new()?;
    let ledger_path = tmp.path().join("migrations.json");
    let trace: Trace = Arc::default();
    let db = registry();

    let migrator = db
        .migrator(&ledger_path)
        .register("001_ok", step("001_ok.up", &trace), step("001_ok.down", &trace))
        .register("002_broken", failing, step("002_broken.down", &trace))
        .register("003_never", step("003_never.up", &trace), step("003_never.down", &trace));

    let err = migrator.up("default").await.unwrap_err();
    assert!(matches!(err, Error::Migration { context: "Migration failed", .. }));
    assert_eq!(err.to_string(), "Migration failed: Invalid argument: boom");

    let ledger = Ledger::load(&ledger_path)?;
    assert!(ledger.contains("001_ok"));
    assert!(!ledger.contains("002_broken"));

    let pending: Vec<String> =
        migrator.status()?.into_iter().filter(|s| s.batch.is_none()).map(|s| s.migration).collect();
    assert_eq!(pending, vec!["002_broken", "003_never"]);
    assert_eq!(*trace.lock().unwrap(), vec!["001_ok.up"]);
    Ok(())
}

#[tokio::test]
async fn test_reset_and_missing_units() -> Result<(), Error> {
    let tmp = TempDir::new()?;
    let ledger_path = tmp.path().join("migrations.json");
    let trace: Trace = Arc::default();
    let db = registry();

    let full = db
        .migrator(&ledger_path)
        .register("001_a", step("001_a.up", &trace), step("001_a.down", &trace))
        .register("002_b", step("002_b.up", &trace), step("002_b.down", &trace));
    full.up("default").await?;

    let partial = db.migrator(&ledger_path).register("001_a", step("001_a.up", &trace), step("001_a.down", &trace));
    let err = partial.down("default", None).await.unwrap_err();
    assert!(matches!(err, Error::Migration { context: "Rollback failed", .. }));
    assert_eq!(Ledger::load(&ledger_path)?.entries().len(), 2);

    assert_eq!(full.reset("default").await?, vec!["002_b", "001_a"]);
    assert!(Ledger::load(&ledger_path)?.entries().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_names_are_rejected() -> Result<(), Error> {
    let tmp = TempDir::new()?;
    let trace: Trace = Arc::default();
    write_sql(tmp.path(), "001_a", "-- up\nSELECT 1;\n-- down\nSELECT 1;");

    let db = registry();
    let migrator = db
        .migrator(tmp.path().join("migrations.json"))
        .directory(tmp.path())
        .register("001_a", step("001_a.up", &trace), step("001_a.down", &trace));

    assert!(matches!(migrator.up("default").await, Err(Error::InvalidArgument(_))));
    Ok(())
}

#[tokio::test]
async fn test_schema_operations_on_existing_tables() -> Result<(), Error> {
    let db = registry();
    let conn = db.connection("default").await?;

    assert!(!conn.table_exists("drafts").await?);
    conn.create_table("drafts", |t| {
        t.id();
        t.string("title", 100);
    })
    .await?;
    assert!(conn.table_exists("drafts").await?);

    conn.alter_table("drafts", |t| {
        t.string("slug", 100).nullable();
        t.integer("views").default("0");
    })
    .await?;
    conn.raw("INSERT INTO drafts (title, slug) VALUES ('a', 'a-1')").await?;

    let index = conn.add_index("drafts", &["slug"], true).await?;
    assert_eq!(index, "drafts_slug_unique");
    assert!(conn.raw("INSERT INTO drafts (title, slug) VALUES ('b', 'a-1')").await.is_err());
    conn.drop_index("drafts", &index).await?;
    conn.raw("INSERT INTO drafts (title, slug) VALUES ('b', 'a-1')").await?;

    conn.rename_table("drafts", "posts").await?;
    assert!(!conn.table_exists("drafts").await?);
    assert!(conn.table_exists("posts").await?);
    assert_eq!(conn.raw("UPDATE posts SET views = views + 1").await?, 2);
    conn.drop_column("posts", "slug").await?;
    assert!(conn.raw("UPDATE posts SET slug = 'x'").await.is_err());

    conn.truncate("posts").await?;
    assert_eq!(conn.raw("UPDATE posts SET views = 0").await?, 0);

    assert!(matches!(conn.add_foreign("posts", "views", "users", "id").await, Err(Error::InvalidArgument(_))));

    conn.drop_table_if_exists("posts").await?;
    assert!(!conn.table_exists("posts").await?);
    Ok(())
}
