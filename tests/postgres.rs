//! Runs against a real database: `DATABASE_URL=postgres://... cargo test -- --ignored`.

use dotenv::dotenv;
use serde_json::json;

use teamflow::models::{MemberRole, NewUser, ProjectCreate, ProjectUpdate, TaskCreate, TaskUpdate};
use teamflow::store::{PgStore, Store, StoreError};

async fn connect() -> PgStore {
    dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
    let store = PgStore::connect(&database_url)
        .await
        .expect("Failed to connect to test DB");
    store.migrate().await.expect("migrations failed");
    store
}

/// Usernames are unique per run so tests can share one database.
fn unique(prefix: &str) -> String {
    format!("{prefix}_{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

async fn new_user(store: &PgStore, prefix: &str) -> i64 {
    let name = unique(prefix);
    store
        .insert_user(NewUser {
            email: format!("{name}@example.com"),
            username: name,
            full_name: None,
            hashed_password: "hash".into(),
        })
        .await
        .unwrap()
        .id
}

#[actix_rt::test]
#[ignore]
async fn test_pg_project_with_owner_and_counts() {
    let store = connect().await;
    let alice = new_user(&store, "alice").await;
    let bob = new_user(&store, "bob").await;

    let input: ProjectCreate = serde_json::from_value(json!({ "name": "Capstone" })).unwrap();
    let project = store.insert_project_with_owner(alice, &input).await.unwrap();
    let owner = store.membership(project.id, alice).await.unwrap().unwrap();
    assert_eq!(owner.role, MemberRole::Owner);

    store
        .insert_member(project.id, bob, MemberRole::Member)
        .await
        .unwrap();
    let dup = store.insert_member(project.id, bob, MemberRole::Viewer).await;
    assert!(matches!(dup, Err(StoreError::UniqueViolation(_))));

    // partial unique index on the owner role
    let member = store.membership(project.id, bob).await.unwrap().unwrap();
    let second_owner = store.update_member_role(member.id, MemberRole::Owner).await;
    assert!(matches!(second_owner, Err(StoreError::UniqueViolation(_))));

    let counts = store.project_counts(project.id).await.unwrap();
    assert_eq!(counts.member_count, 2);
    let listed = store.projects_for_member(bob, 0, 100).await.unwrap();
    assert!(listed.iter().any(|p| p.project.id == project.id));

    let roster = store.members_with_users(project.id).await.unwrap();
    assert_eq!(roster.len(), 2);

    assert!(store.delete_project(project.id).await.unwrap());
    assert!(store.membership(project.id, alice).await.unwrap().is_none());
}

#[actix_rt::test]
#[ignore]
async fn test_pg_failed_owner_insert_rolls_back() {
    let store = connect().await;
    let input: ProjectCreate = serde_json::from_value(json!({ "name": unique("orphan") })).unwrap();
    let err = store.insert_project_with_owner(-1, &input).await.unwrap_err();
    assert!(matches!(err, StoreError::ForeignKeyViolation(_)));

    let leftover: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects WHERE name = $1")
        .bind(&input.name)
        .fetch_one(store.pool())
        .await
        .unwrap();
    assert_eq!(leftover.0, 0);
}

#[actix_rt::test]
#[ignore]
async fn test_pg_partial_updates() {
    let store = connect().await;
    let alice = new_user(&store, "alice").await;
    let input: ProjectCreate = serde_json::from_value(json!({
        "name": "Capstone",
        "description": "Senior design"
    }))
    .unwrap();
    let project = store.insert_project_with_owner(alice, &input).await.unwrap();

    let patch: ProjectUpdate = serde_json::from_value(json!({ "status": "completed" })).unwrap();
    let updated = store.update_project(project.id, &patch).await.unwrap().unwrap();
    assert_eq!(updated.name, project.name);
    assert_eq!(updated.description, project.description);
    assert!(updated.updated_at.is_some());

    let task: TaskCreate = serde_json::from_value(json!({
        "title": "Outline",
        "project_id": project.id,
        "assignee_id": alice
    }))
    .unwrap();
    let task = store.insert_task(alice, &task).await.unwrap();
    let patch: TaskUpdate = serde_json::from_value(json!({ "assignee_id": null })).unwrap();
    let task = store.update_task(task.id, &patch).await.unwrap().unwrap();
    assert!(task.assignee_id.is_none());
    assert_eq!(task.title, "Outline");

    store.delete_project(project.id).await.unwrap();
}
