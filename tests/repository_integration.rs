//! Integration tests for the PostgreSQL repositories
//!
//! These tests need a database with `schema/store.sql` applied and
//! `DATABASE_URL` pointing at it, so they are ignored by default:
//!
//! ```text
//! cargo test --test repository_integration -- --ignored
//! ```

use std::sync::Arc;

use sqlx::{PgPool, Row};
use storefront_backoffice::auth::password::BcryptHasher;
use storefront_backoffice::domain::address::Address;
use storefront_backoffice::domain::category::Category;
use storefront_backoffice::domain::contact::Contact;
use storefront_backoffice::domain::errors::StoreError;
use storefront_backoffice::domain::owner::OwnerRef;
use storefront_backoffice::domain::repositories::Repositories;
use storefront_backoffice::domain::services::OnboardingService;
use storefront_backoffice::domain::status::EntityStatus;
use storefront_backoffice::domain::user::User;
use storefront_backoffice::domain::user_full::UserFull;
use storefront_backoffice::infrastructure::repositories::{
    postgres_repositories, PostgresTransaction,
};
use uuid::Uuid;

/// Set up test database connection pool
async fn setup_test_db() -> PgPool {
    let database_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for integration tests");

    PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database")
}

/// Create a category for the test to join against
async fn create_test_category(pool: &PgPool) -> i64 {
    sqlx::query("INSERT INTO categories (name) VALUES ($1) RETURNING id")
        .bind(format!("category-{}", Uuid::new_v4()))
        .fetch_one(pool)
        .await
        .expect("Failed to create test category")
        .get("id")
}

/// Unique username so concurrent runs do not collide
fn unique_name() -> String {
    format!("u{}", &Uuid::new_v4().simple().to_string()[..12])
}

fn onboarding(username: &str, categories: &[i64]) -> UserFull {
    UserFull::new(
        User::new(username, format!("{}@test.com", username), "testpass123"),
        Address {
            street: "Rua A".to_string(),
            city: "Curitiba".to_string(),
            state: "PR".to_string(),
            country: "Brasil".to_string(),
            postal_code: "80000000".to_string(),
            ..Default::default()
        },
        Contact::named("Test Contact"),
        categories.iter().copied().map(Category::with_id).collect(),
    )
}

fn service(repos: &Repositories<PostgresTransaction>) -> OnboardingService<PostgresTransaction> {
    OnboardingService::new(repos.clone(), Arc::new(BcryptHasher::new(4)))
}

/// Clean up everything owned by a test user
async fn cleanup_user(pool: &PgPool, user_id: i64) {
    for sql in [
        "DELETE FROM user_contacts WHERE user_id = $1",
        "DELETE FROM user_categories WHERE user_id = $1",
        "DELETE FROM contacts WHERE user_id = $1",
        "DELETE FROM addresses WHERE user_id = $1",
        "DELETE FROM users WHERE id = $1",
    ] {
        sqlx::query(sql)
            .bind(user_id)
            .execute(pool)
            .await
            .expect("Failed to cleanup test user");
    }
}

async fn count_users_named(pool: &PgPool, username: &str) -> i64 {
    sqlx::query("SELECT COUNT(*) AS n FROM users WHERE username = $1")
        .bind(username)
        .fetch_one(pool)
        .await
        .expect("count users")
        .get("n")
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_full_commits_every_row() {
    let pool = setup_test_db().await;
    let category = create_test_category(&pool).await;
    let repos = postgres_repositories(pool.clone());
    let username = unique_name();

    let full = service(&repos)
        .create_full(onboarding(&username, &[category]))
        .await
        .expect("onboarding succeeds");

    let user = full.user.expect("user");
    let contact = full.contact.expect("contact");
    assert_eq!(user.version, 0);
    assert_eq!(contact.owner, Some(OwnerRef::User(user.id)));

    let stored = repos.users.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.username, username);
    assert!(BcryptHasher::new(4)
        .verify("testpass123", &stored.password)
        .unwrap());

    let categories = repos.category_relations.find_by_user(user.id).await.unwrap();
    assert_eq!(categories.len(), 1);
    assert_eq!(categories[0].category_id, category);

    let contacts = repos.contact_relations.find_by_user(user.id).await.unwrap();
    assert_eq!(contacts[0].contact_id, contact.id);

    cleanup_user(&pool, user.id).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_create_full_rolls_back_on_missing_category() {
    let pool = setup_test_db().await;
    let category = create_test_category(&pool).await;
    let repos = postgres_repositories(pool.clone());
    let username = unique_name();

    let err = service(&repos)
        .create_full(onboarding(&username, &[category, i64::MAX]))
        .await
        .unwrap_err();

    assert!(matches!(err.root_cause(), StoreError::Create { .. }));
    assert_eq!(count_users_named(&pool, &username).await, 0);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_update_version_protocol() {
    let pool = setup_test_db().await;
    let category = create_test_category(&pool).await;
    let repos = postgres_repositories(pool.clone());

    let full = service(&repos)
        .create_full(onboarding(&unique_name(), &[category]))
        .await
        .unwrap();
    let user = full.user.unwrap();

    let renamed = User {
        username: unique_name(),
        ..user.clone()
    };
    let updated = repos.users.update(&renamed).await.unwrap();
    assert_eq!(updated.version, 1);

    let stale = User {
        username: unique_name(),
        ..user.clone()
    };
    let err = repos.users.update(&stale).await.unwrap_err();
    assert!(err.is_version_conflict());

    let missing = User {
        id: i64::MAX,
        ..stale
    };
    let err = repos.users.update(&missing).await.unwrap_err();
    assert!(err.is_not_found());

    cleanup_user(&pool, user.id).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_status_toggles_are_idempotent() {
    let pool = setup_test_db().await;
    let category = create_test_category(&pool).await;
    let repos = postgres_repositories(pool.clone());

    let full = service(&repos)
        .create_full(onboarding(&unique_name(), &[category]))
        .await
        .unwrap();
    let user_id = full.user.unwrap().id;
    let address = full.address.unwrap();

    let first = repos.addresses.disable(address.id).await.unwrap();
    assert!(first.changed);
    assert_eq!(first.status, EntityStatus::Disabled);
    assert_eq!(first.version, 1);

    let second = repos.addresses.disable(address.id).await.unwrap();
    assert!(!second.changed);
    assert_eq!(second.version, 1);

    let stored = repos.addresses.find_by_id(address.id).await.unwrap().unwrap();
    assert_eq!(stored.status, EntityStatus::Disabled);
    assert_eq!(stored.version, 1);

    assert!(repos.contacts.enable(i64::MAX).await.unwrap_err().is_not_found());

    cleanup_user(&pool, user_id).await;
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_returns_the_persisted_row() {
    let pool = setup_test_db().await;
    let category = create_test_category(&pool).await;
    let repos = postgres_repositories(pool.clone());

    let full = service(&repos)
        .create_full(onboarding(&unique_name(), &[category]))
        .await
        .unwrap();
    let user = full.user.unwrap();
    let contact = full.contact.unwrap();

    let updated = repos
        .users
        .update(&User {
            username: unique_name(),
            status: EntityStatus::Disabled,
            uid: Uuid::new_v4(),
            created_at: None,
            ..user.clone()
        })
        .await
        .unwrap();
    assert_eq!(updated.status, EntityStatus::Enabled);
    assert_eq!(updated.uid, user.uid);
    assert_eq!(updated.created_at, user.created_at);
    assert_eq!(updated.password, user.password);
    assert_eq!(repos.users.find_by_id(user.id).await.unwrap().unwrap(), updated);

    repos.contacts.disable(contact.id).await.unwrap();
    let current = repos.contacts.find_by_id(contact.id).await.unwrap().unwrap();
    let renamed = repos
        .contacts
        .update(&Contact {
            contact_name: "Billing".to_string(),
            status: EntityStatus::Enabled,
            ..current.clone()
        })
        .await
        .unwrap();
    assert_eq!(renamed.status, EntityStatus::Disabled);
    assert_eq!(renamed.version, 2);
    assert_eq!(renamed.created_at, current.created_at);

    cleanup_user(&pool, user.id).await;
}
