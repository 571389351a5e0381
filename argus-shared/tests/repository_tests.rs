/// Integration tests for the generic repository and the policy store
///
/// Skipped unless `DATABASE_URL` is set.

use argus_shared::{
    auth::authorization::PolicyAuthorizer,
    db::{
        error::RepoError,
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
        repository::Repository,
        value::{Filters, Patch},
    },
    models::{
        task::{NewTask, Task, TaskChanges, TaskPriority, TaskStatus},
        user::{NewUser, User, UserChanges, UserRole},
    },
};
use sqlx::PgPool;
use uuid::Uuid;

async fn pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let pool = create_pool(DatabaseConfig::from_url(&url).expect("DATABASE_URL parses"))
        .await
        .expect("Failed to create pool");
    run_migrations(&pool).await.expect("migrations");
    Some(pool)
}

fn new_user(role: UserRole) -> NewUser {
    let tag = Uuid::new_v4();
    NewUser {
        first_name: "Repo".to_string(),
        last_name: "Test".to_string(),
        role,
        email: format!("repo-{}@example.com", tag.simple()),
        phone: format!("+998{:09}", tag.as_u128() % 1_000_000_000),
        photo_url: None,
        bio: Some("initial".to_string()),
        hashed_password: "not-a-real-hash".to_string(),
    }
}

fn new_task(admin_id: i64, title: &str) -> NewTask {
    NewTask {
        admin_id,
        assigned_to: None,
        title: title.to_string(),
        description: Some(format!("{} details", title)),
        status: TaskStatus::Pending,
        priority: TaskPriority::Low,
        due_date: None,
    }
}

#[tokio::test]
async fn test_user_crud_roundtrip() {
    let Some(pool) = pool().await else { return };
    let users = Repository::<User>::new(pool.clone());

    let created = users.create(new_user(UserRole::Admin)).await.expect("create");
    assert_eq!(created.role, UserRole::Admin);

    let by_email = users
        .get(&Filters::new().eq("email", created.email.as_str()))
        .await
        .expect("get by email");
    assert_eq!(by_email.id, created.id);

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    let updated = users
        .update(
            created.id,
            UserChanges {
                first_name: Some("Renamed".to_string()),
                bio: Patch::Null,
                ..Default::default()
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.first_name, "Renamed");
    assert!(updated.bio.is_none());
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);

    let null_only = users
        .update(
            created.id,
            UserChanges {
                photo_url: Patch::Null,
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(null_only, Err(RepoError::NoFieldsToUpdate)));

    users.delete(created.id).await.expect("delete");
    assert!(matches!(users.find_by_id(created.id).await, Err(RepoError::NotFound(_))));
    assert!(matches!(users.delete(created.id).await, Err(RepoError::NotFound(_))));
}

#[tokio::test]
async fn test_unique_violation_is_conflict() {
    let Some(pool) = pool().await else { return };
    let users = Repository::<User>::new(pool);

    let first = users.create(new_user(UserRole::User)).await.expect("create");
    let mut duplicate = new_user(UserRole::User);
    duplicate.email = first.email.clone();

    let err = users.create(duplicate).await.unwrap_err();
    assert!(matches!(err, RepoError::Conflict { .. }), "{:?}", err);

    users.delete(first.id).await.expect("cleanup");
}

#[tokio::test]
async fn test_list_filter_search_and_order() {
    let Some(pool) = pool().await else { return };
    let users = Repository::<User>::new(pool.clone());
    let tasks = Repository::<Task>::new(pool);

    let admin = users.create(new_user(UserRole::Admin)).await.expect("admin");
    let marker = Uuid::new_v4().simple().to_string();
    for i in 0..3 {
        tasks
            .create(new_task(admin.id, &format!("{} task {}", marker, i)))
            .await
            .expect("task");
    }

    let filters = Filters::new().eq("admin_id", admin.id);
    let page = tasks.list(2, 0, &filters, None).await.expect("list");
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    // newest first
    assert!(page.items[0].id > page.items[1].id);

    let term = format!("{} TASK 1", marker);
    let searched = tasks
        .list(10, 0, &filters, Some(term.as_str()))
        .await
        .expect("search");
    assert_eq!(searched.total, 1);

    let bad = tasks.list(10, 0, &Filters::new().eq("hashed_password", "x"), None).await;
    assert!(matches!(bad, Err(RepoError::InvalidArgument(_))));

    let empty = tasks.update(page.items[0].id, TaskChanges::default()).await;
    assert!(matches!(empty, Err(RepoError::NoFieldsToUpdate)));

    users.delete(admin.id).await.expect("cleanup cascades");
    assert_eq!(tasks.list(10, 0, &filters, None).await.expect("list").total, 0);
}

#[tokio::test]
async fn test_policy_store_roundtrip() {
    let Some(pool) = pool().await else { return };
    let resource = format!("/v1/probe-{}/", Uuid::new_v4().simple());

    let writer = PolicyAuthorizer::with_store(pool.clone());
    writer.add_policy("admin", &resource, "get").await.expect("add");
    // duplicates are accepted
    writer.add_policy("admin", &resource, "GET").await.expect("add again");

    let reader = PolicyAuthorizer::with_store(pool.clone());
    assert!(!reader.enforce(Some("admin"), &resource, "GET"));
    reader.load().await.expect("load");
    assert!(reader.enforce(Some("admin"), &resource, "GET"));
    assert!(!reader.enforce(Some("user"), &resource, "GET"));

    sqlx::query("DELETE FROM auth_policies WHERE resource = $1")
        .bind(&resource)
        .execute(&pool)
        .await
        .expect("cleanup");
}
