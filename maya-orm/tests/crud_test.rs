use chrono::NaiveDateTime;
use maya_orm::{ConnectionConfig, ConnectionRegistry, DatabaseConfig, Error, GateState, Model, Op, Order, Value};

#[derive(Model, Debug, Clone, PartialEq)]
#[orm(table = "users")]
struct User {
    #[orm(primary_key)]
    id: Option<i64>,

    #[orm(fillable)]
    name: String,

    #[orm(fillable)]
    age: Option<i32>,

    #[orm(fillable, cast = "json")]
    settings: Option<serde_json::Value>,

    #[orm(fillable, hidden)]
    password: Option<String>,

    #[orm(create_time)]
    created_at: Option<NaiveDateTime>,

    #[orm(update_time)]
    updated_at: Option<NaiveDateTime>,
}

#[derive(Model, Debug, Clone)]
#[orm(table = "legacy_rows", connection = "legacy")]
struct LegacyRow {
    #[orm(primary_key)]
    id: Option<i64>,
    name: String,
}

#[derive(Model, Debug, Clone)]
#[orm(table = "events", connection = "reporting")]
struct Event {
    #[orm(primary_key)]
    id: Option<i64>,
}

#[derive(Model, Debug, Clone)]
#[orm(connection = "missing")]
struct Orphan {
    #[orm(primary_key)]
    id: Option<i64>,
}

fn registry() -> ConnectionRegistry {
    let _ = env_logger::builder().is_test(true).try_init();

    let legacy = ConnectionConfig { driver: "sqlsrv".into(), host: "mssql.local".into(), ..Default::default() };
    let reporting = ConnectionConfig { driver: "mysql".into(), host: "mysql.local".into(), ..Default::default() };

    ConnectionRegistry::new(
        DatabaseConfig::new()
            .with("default", ConnectionConfig::sqlite_memory())
            .with("legacy", legacy)
            .with("reporting", reporting),
    )
}

async fn setup() -> Result<ConnectionRegistry, Error> {
    let db = registry();
    db.connection("default")
        .await?
        .create_table("users", |t| {
            t.id();
            t.string("name", 100);
            t.integer("age").nullable();
            t.text("settings").nullable();
            t.string("password", 100).nullable();
            t.timestamps();
        })
        .await?;
    Ok(db)
}

async fn seed(db: &ConnectionRegistry) -> Result<(), Error> {
    for (name, age) in [("Ann", 31), ("Ben", 17), ("Cid", 45), ("Dee", 17)] {
        db.model::<User>()?.create([("name", Value::from(name)), ("age", Value::from(age))]).await?;
    }
    Ok(())
}

fn names(rows: &[maya_orm::Record<'_, User>]) -> Vec<String> {
    rows.iter().map(|r| r.attr_as::<String>("name").unwrap()).collect()
}

// ============================================================================
// Round Trip
// ============================================================================

#[tokio::test]
async fn test_create_then_find_round_trip() -> Result<(), Error> {
    let db = setup().await?;

    let mut user = db.model::<User>()?;
    user.create([("name", Value::from("Ann")), ("age", Value::from(31)), ("id", Value::from(99))]).await?;
    assert_eq!(user.state(), GateState::Located);

    let id = db.last_insert_id("default").await?.expect("insert id");
    assert_eq!(id, 1);
    assert_eq!(user.attr("id"), &Value::Int(id));
    assert!(!user.attr("created_at").is_null());

    let found = db.model::<User>()?.find(id).await?.expect("row");
    assert_eq!(found.attr("name"), &Value::from("Ann"));
    assert_eq!(found.attr("age"), &Value::Int(31));
    assert!(!found.attr("created_at").is_null());
    assert!(!found.attr("updated_at").is_null());

    let typed: User = found.to_model()?;
    assert_eq!(typed.id, Some(1));
    assert_eq!(typed.name, "Ann");
    assert!(typed.created_at.is_some());
    Ok(())
}

#[tokio::test]
async fn test_casts_and_empty_strings() -> Result<(), Error> {
    let db = setup().await?;

    let mut user = db.model::<User>()?;
    user.create([
        ("name", Value::from("Ann")),
        ("settings", Value::from(r#"{"theme":"dark"}"#)),
        ("password", Value::from("")),
    ])
    .await?;

    let found = db.model::<User>()?.find(1).await?.expect("row");
    assert_eq!(found.attr("settings"), &Value::Json(serde_json::json!({"theme": "dark"})));
    assert!(found.attr("password").is_null());
    assert!(found.attr("nickname").is_null());
    Ok(())
}

#[tokio::test]
async fn test_hidden_columns_are_not_serialized() -> Result<(), Error> {
    let db = setup().await?;
    db.model::<User>()?.create([("name", "Ann"), ("password", "secret")]).await?;

    let found = db.model::<User>()?.find(1).await?.expect("row");
    assert_eq!(found.attr("password"), &Value::from("secret"));

    let json = serde_json::to_value(&found)?;
    assert_eq!(json["name"], "Ann");
    assert!(json.get("password").is_none());
    Ok(())
}

#[tokio::test]
async fn test_create_from_typed_model() -> Result<(), Error> {
    let db = setup().await?;
    let draft = User {
        id: Some(42),
        name: "Zoe".into(),
        age: Some(28),
        settings: Some(serde_json::json!({"lang": "pt"})),
        password: None,
        created_at: None,
        updated_at: None,
    };

    let mut user = db.model::<User>()?;
    assert_eq!(user.create_model(&draft).await?, 1);
    assert_eq!(user.state(), GateState::Located);
    assert_eq!(user.attr("id"), &Value::Int(1));

    let stored: User = db.model::<User>()?.find(1).await?.expect("row").to_model()?;
    assert_eq!(stored.name, "Zoe");
    assert_eq!(stored.age, Some(28));
    assert_eq!(stored.settings, Some(serde_json::json!({"lang": "pt"})));
    assert!(stored.created_at.is_some());

    let mut other = db.model::<User>()?;
    other.fill_model(&User { name: "Yan".into(), ..draft })?;
    assert!(other.attr("id").is_null());
    assert_eq!(other.attr("name"), &Value::from("Yan"));
    Ok(())
}

// ============================================================================
// Updates
// ============================================================================

#[tokio::test]
async fn test_update_increment_decrement() -> Result<(), Error> {
    let db = setup().await?;
    seed(&db).await?;

    let mut user = db.model::<User>()?.find(1).await?.expect("row");
    assert_eq!(user.update([("name", "Bea")]).await?, 1);
    assert_eq!(user.attr("name"), &Value::from("Bea"));

    user.increment("age").await?;
    user.decrement_by("age", 3).await?;
    assert_eq!(user.attr("age"), &Value::Int(29));

    let fresh = db.model::<User>()?.find(1).await?.expect("row");
    assert_eq!(fresh.attr("name"), &Value::from("Bea"));
    assert_eq!(fresh.attr("age"), &Value::Int(29));
    Ok(())
}

#[tokio::test]
async fn test_counter_overflow_is_rejected() -> Result<(), Error> {
    let db = setup().await?;
    seed(&db).await?;

    let mut user = db.model::<User>()?.find(1).await?.expect("row");
    assert!(matches!(user.increment_by("age", i64::MAX).await, Err(Error::InvalidArgument(_))));
    assert!(matches!(user.decrement_by("age", i64::MIN).await, Err(Error::InvalidArgument(_))));
    assert_eq!(user.attr("age"), &Value::Int(31));

    let fresh = db.model::<User>()?.find(1).await?.expect("row");
    assert_eq!(fresh.attr("age"), &Value::Int(31));
    Ok(())
}

#[tokio::test]
async fn test_save_inserts_then_updates() -> Result<(), Error> {
    let db = setup().await?;

    let mut user = db.model::<User>()?;
    user.set_attr("name", "Eve")?;
    user.save().await?;
    assert_eq!(user.attr("id"), &Value::Int(1));

    user.set_attr("name", "Eva")?;
    assert_eq!(user.save().await?, 1);
    assert_eq!(db.model::<User>()?.count().await?, 1);
    assert_eq!(db.model::<User>()?.find(1).await?.expect("row").attr("name"), &Value::from("Eva"));
    Ok(())
}

// ============================================================================
// Reads
// ============================================================================

#[tokio::test]
async fn test_filters_order_and_limits() -> Result<(), Error> {
    let db = setup().await?;
    seed(&db).await?;

    let minors = db.model::<User>()?.and_where("age", 17)?.order_by("name", Order::Desc)?.get().await?;
    assert_eq!(names(&minors), vec!["Dee", "Ben"]);

    let some = db.model::<User>()?.where_in("name", ["Ann", "Cid"])?.or_where_op("age", Op::Gt, 40)?.get().await?;
    assert_eq!(some.len(), 2);

    let between = db.model::<User>()?.where_between("age", 18, 50)?.count().await?;
    assert_eq!(between, 2);

    let raw = db.model::<User>()?.where_raw("age > ? AND age < ?", [16, 18])?.count().await?;
    assert_eq!(raw, 2);

    let grouped = db
        .model::<User>()?
        .where_group(|q| {
            q.and_where("name", "Ann").or_where("name", "Ben");
        })?
        .and_where_op("age", Op::Lt, 18)?
        .get()
        .await?;
    assert_eq!(names(&grouped), vec!["Ben"]);

    let page = db.model::<User>()?.order_by("id", Order::Asc)?.limit(2, 1)?.get().await?;
    assert_eq!(names(&page), vec!["Ben", "Cid"]);

    assert_eq!(db.model::<User>()?.all().await?.len(), 4);
    assert_eq!(db.model::<User>()?.where_null("settings")?.count().await?, 4);
    assert_eq!(db.model::<User>()?.count_column("settings").await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_first_last_find_from_and_select() -> Result<(), Error> {
    let db = setup().await?;
    seed(&db).await?;

    let first = db.model::<User>()?.and_where("age", 17)?.first().await?.expect("row");
    assert_eq!(first.attr("name"), &Value::from("Ben"));
    assert_eq!(first.state(), GateState::Located);

    let last = db.model::<User>()?.last().await?.expect("row");
    assert_eq!(last.attr("name"), &Value::from("Dee"));

    let cid = db.model::<User>()?.select(&["id", "name"])?.find_from("name", "Cid").await?.expect("row");
    assert_eq!(cid.attr("id"), &Value::Int(3));
    assert!(!cid.attributes().contains("age"));

    assert!(db.model::<User>()?.find(42).await?.is_none());
    assert!(db.model::<User>()?.and_where("name", "Zed")?.first().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_paginate() -> Result<(), Error> {
    let db = setup().await?;
    seed(&db).await?;

    let page = db.model::<User>()?.order_by("id", Order::Asc)?.paginate(1, 3).await?;
    assert_eq!(page.total, 4);
    assert_eq!(page.total_pages, 2);
    assert_eq!(names(&page.data), vec!["Dee"]);

    let json = serde_json::to_value(&page)?;
    assert_eq!(json["data"][0]["name"], "Dee");
    Ok(())
}

// ============================================================================
// Deletes
// ============================================================================

#[tokio::test]
async fn test_delete_paths() -> Result<(), Error> {
    let db = setup().await?;
    seed(&db).await?;

    let mut user = db.model::<User>()?.find(1).await?.expect("row");
    assert_eq!(user.delete().await?, 1);
    assert_eq!(user.state(), GateState::Fresh);
    assert!(db.model::<User>()?.find(1).await?.is_none());

    assert_eq!(db.model::<User>()?.delete_id(2).await?, 1);
    assert_eq!(db.model::<User>()?.delete_id(2).await?, 0);
    assert_eq!(db.model::<User>()?.count().await?, 2);

    let predicate_less = db.model::<User>()?.delete().await;
    assert!(matches!(predicate_less, Err(Error::InvalidArgument(_))));
    assert_eq!(db.model::<User>()?.count().await?, 2);
    Ok(())
}

// ============================================================================
// Chain Gating
// ============================================================================

#[tokio::test]
async fn test_method_gate() -> Result<(), Error> {
    let db = setup().await?;
    seed(&db).await?;

    let save_after_where = db.model::<User>()?.and_where("name", "Ann")?.save().await;
    assert!(matches!(save_after_where, Err(Error::MethodNotAllowed { method: "save", state: GateState::Filtered })));

    let find_after_where = db.model::<User>()?.order_by("name", Order::Asc)?.find(1).await;
    assert!(matches!(find_after_where, Err(Error::MethodNotAllowed { method: "find", .. })));

    let found = db.model::<User>()?.find(5).await?;
    assert!(found.is_none());

    let found = db.model::<User>()?.find(1).await?.expect("row");
    let where_after_find = found.and_where("name", "Ann");
    assert!(matches!(where_after_find, Err(Error::MethodNotAllowed { method: "where", state: GateState::Located })));

    let found = db.model::<User>()?.find(1).await?.expect("row");
    assert!(matches!(found.get().await, Err(Error::MethodNotAllowed { method: "get", .. })));
    Ok(())
}

// ============================================================================
// SQL Assembly
// ============================================================================

#[test]
fn test_predicate_ordering_and_leading_group() -> Result<(), Error> {
    let db = registry();

    let stmt = db.model::<User>()?.and_where_op("x", Op::Eq, 1)?.or_where_op("y", Op::Eq, 2)?.to_statement()?;
    assert_eq!(stmt.sql, "SELECT `users`.* FROM `users` WHERE `users`.`x` = ? OR `users`.`y` = ?;");
    assert_eq!(stmt.values, vec![Value::Int(1), Value::Int(2)]);

    let stmt = db
        .model::<User>()?
        .where_group(|q| {
            q.and_where("x", 1);
        })?
        .to_statement()?;
    assert!(stmt.sql.contains("WHERE (`users`.`x` = ?"));
    assert!(!stmt.sql.contains("AND (") && !stmt.sql.contains("OR ("));
    Ok(())
}

#[test]
fn test_pagination_dialects() -> Result<(), Error> {
    let db = registry();

    let mysql = db.model::<Event>()?.limit(10, 0)?.to_statement()?;
    assert_eq!(mysql.sql, "SELECT `events`.* FROM `events` LIMIT 0, 10;");

    let sqlsrv = db.model::<LegacyRow>()?.limit(10, 0)?.to_statement()?;
    assert_eq!(
        sqlsrv.sql,
        "SELECT [legacy_rows].* FROM [legacy_rows] ORDER BY (SELECT NULL) OFFSET 0 ROWS FETCH NEXT 10 ROWS ONLY;"
    );
    Ok(())
}

#[tokio::test]
async fn test_configuration_errors() {
    let db = registry();

    assert!(matches!(db.model::<Orphan>(), Err(Error::Configuration(_))));
    assert!(matches!(db.connection("legacy").await, Err(Error::Configuration(_))));
}

// ============================================================================
// Execution Log
// ============================================================================

#[tokio::test]
async fn test_every_statement_is_logged() -> Result<(), Error> {
    let db = setup().await?;
    db.query_log().clear();

    db.model::<User>()?.and_where("name", "Ann")?.get().await?;

    let entry = db.query_log().last().expect("entry");
    assert_eq!(entry.connection, "default");
    assert_eq!(entry.sql, "SELECT `users`.* FROM `users` WHERE `users`.`name` = ?;");
    assert_eq!(entry.bindings, vec![Value::from("Ann")]);
    assert_eq!(db.query_log().len(), 1);

    db.query_log().clear();
    db.model::<User>()?.create([("name", "Zed")]).await?;
    let entries = db.query_log().entries();
    assert_eq!(
        entries[0].sql,
        "INSERT INTO `users` (`name`, `created_at`, `updated_at`) VALUES (?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP);"
    );
    assert_eq!(entries[0].bindings, vec![Value::from("Zed")]);

    db.close_all().await;
    Ok(())
}
