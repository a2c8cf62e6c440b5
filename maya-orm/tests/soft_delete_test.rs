use chrono::NaiveDateTime;
use maya_orm::{ConnectionConfig, ConnectionRegistry, DatabaseConfig, Error, GateState, Model, Value};

#[derive(Model, Debug, Clone)]
#[orm(table = "posts")]
struct Post {
    #[orm(primary_key)]
    id: Option<i64>,

    #[orm(fillable)]
    title: String,

    #[orm(fillable)]
    author: Option<String>,

    #[orm(create_time)]
    created_at: Option<NaiveDateTime>,

    #[orm(update_time)]
    updated_at: Option<NaiveDateTime>,

    #[orm(soft_delete)]
    deleted_at: Option<NaiveDateTime>,
}

#[derive(Model, Debug, Clone)]
#[orm(table = "tags")]
struct Tag {
    #[orm(primary_key)]
    id: Option<i64>,

    #[orm(fillable)]
    label: String,
}

async fn setup() -> Result<ConnectionRegistry, Error> {
    let _ = env_logger::builder().is_test(true).try_init();

    let db = ConnectionRegistry::new(DatabaseConfig::new().with("default", ConnectionConfig::sqlite_memory()));
    db.connection("default")
        .await?
        .create_table("posts", |t| {
            t.id();
            t.string("title", 200);
            t.string("author", 100).nullable();
            t.timestamps();
            t.soft_deletes();
        })
        .await?;

    let authors = ["ann", "ben", "ann", "cid", "ben"];
    for (i, author) in authors.iter().enumerate() {
        db.model::<Post>()?.create([("title", format!("post {}", i + 1)), ("author", author.to_string())]).await?;
    }
    Ok(db)
}

#[tokio::test]
async fn test_soft_delete_lifecycle() -> Result<(), Error> {
    let db = setup().await?;

    assert_eq!(db.model::<Post>()?.delete_id(5).await?, 1);
    assert!(db.model::<Post>()?.find(5).await?.is_none());
    assert_eq!(db.model::<Post>()?.count().await?, 4);

    let trashed = db.model::<Post>()?.with_trashed()?.find(5).await?.expect("trashed row");
    assert!(!trashed.attr("deleted_at").is_null());
    assert_eq!(db.model::<Post>()?.with_trashed()?.count().await?, 5);

    assert_eq!(db.model::<Post>()?.restore_id(5).await?, 1);
    let restored = db.model::<Post>()?.find(5).await?.expect("restored row");
    assert!(restored.attr("deleted_at").is_null());
    assert_eq!(db.model::<Post>()?.count().await?, 5);
    Ok(())
}

#[tokio::test]
async fn test_delete_located_row_is_soft() -> Result<(), Error> {
    let db = setup().await?;

    let mut post = db.model::<Post>()?.find(1).await?.expect("row");
    assert_eq!(post.delete().await?, 1);
    assert_eq!(post.state(), GateState::Fresh);

    assert!(db.model::<Post>()?.find_from("title", "post 1").await?.is_none());
    assert!(db.model::<Post>()?.with_trashed()?.find_from("title", "post 1").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_scope_keeps_or_predicates_grouped() -> Result<(), Error> {
    let db = setup().await?;
    db.model::<Post>()?.delete_id(3).await?;

    let chain = db.model::<Post>()?.and_where("author", "ann")?.or_where("author", "ben")?;
    let stmt = chain.to_statement()?;
    assert_eq!(
        stmt.sql,
        "SELECT `posts`.* FROM `posts` WHERE (`posts`.`author` = ? OR `posts`.`author` = ?) AND `posts`.`deleted_at` IS NULL;"
    );

    let rows = chain.get().await?;
    let ids: Vec<i64> = rows.iter().map(|r| r.attr_as::<i64>("id").unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 5]);

    let stmt = db.model::<Post>()?.with_trashed()?.and_where("author", "ann")?.to_statement()?;
    assert!(!stmt.sql.contains("deleted_at"));
    Ok(())
}

#[tokio::test]
async fn test_restore_all_and_restore_from() -> Result<(), Error> {
    let db = setup().await?;
    for id in [1, 2, 3] {
        db.model::<Post>()?.delete_id(id).await?;
    }
    assert_eq!(db.model::<Post>()?.count().await?, 2);

    assert_eq!(db.model::<Post>()?.restore_from("author", "ann").await?, 2);
    assert_eq!(db.model::<Post>()?.count().await?, 4);

    assert_eq!(db.model::<Post>()?.restore_all().await?, 1);
    assert_eq!(db.model::<Post>()?.count().await?, 5);

    assert_eq!(db.model::<Post>()?.restore_all().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_force_delete_variants() -> Result<(), Error> {
    let db = setup().await?;
    db.model::<Post>()?.delete_id(2).await?;

    assert_eq!(db.model::<Post>()?.force_delete_id(2).await?, 1);
    assert!(db.model::<Post>()?.with_trashed()?.find(2).await?.is_none());

    let mut post = db.model::<Post>()?.find(4).await?.expect("row");
    assert_eq!(post.force_delete().await?, 1);
    assert_eq!(db.model::<Post>()?.with_trashed()?.count().await?, 3);

    assert_eq!(db.model::<Post>()?.force_delete_from("author", "ann").await?, 2);
    assert_eq!(db.model::<Post>()?.with_trashed()?.count().await?, 1);

    assert_eq!(db.model::<Post>()?.force_delete_all().await?, 0);
    assert_eq!(db.model::<Post>()?.count().await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_force_delete_all_purges_only_trash() -> Result<(), Error> {
    let db = setup().await?;
    db.model::<Post>()?.delete_id(1).await?;
    db.model::<Post>()?.delete_id(3).await?;

    db.query_log().clear();
    assert_eq!(db.model::<Post>()?.force_delete_all().await?, 2);
    assert_eq!(
        db.query_log().last().expect("entry").sql,
        "DELETE FROM `posts` WHERE `posts`.`deleted_at` IS NOT NULL;"
    );

    assert_eq!(db.model::<Post>()?.count().await?, 3);
    assert_eq!(db.model::<Post>()?.with_trashed()?.count().await?, 3);
    assert!(db.model::<Post>()?.with_trashed()?.find(1).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_delete_id_sees_trashed_rows_after_with_trashed() -> Result<(), Error> {
    let db = setup().await?;
    assert_eq!(db.model::<Post>()?.delete_id(1).await?, 1);

    assert_eq!(db.model::<Post>()?.delete_id(1).await?, 0);
    assert_eq!(db.model::<Post>()?.with_trashed()?.delete_id(1).await?, 1);

    let trashed = db.model::<Post>()?.with_trashed()?.find(1).await?.expect("trashed row");
    assert!(!trashed.attr("deleted_at").is_null());
    assert_eq!(db.model::<Post>()?.count().await?, 4);
    Ok(())
}

#[tokio::test]
async fn test_overlay_requires_soft_delete_column() -> Result<(), Error> {
    let db = ConnectionRegistry::new(DatabaseConfig::new().with("default", ConnectionConfig::sqlite_memory()));

    assert!(matches!(db.model::<Tag>()?.restore_all().await, Err(Error::InvalidArgument(_))));
    assert!(matches!(db.model::<Tag>()?.force_delete_id(1).await, Err(Error::InvalidArgument(_))));
    assert!(matches!(
        db.model::<Tag>()?.restore_from("label", Value::from("x")).await,
        Err(Error::InvalidArgument(_))
    ));

    let stmt = db.model::<Tag>()?.and_where("label", "x")?.to_statement()?;
    assert_eq!(stmt.sql, "SELECT `tags`.* FROM `tags` WHERE `tags`.`label` = ?;");
    Ok(())
}
