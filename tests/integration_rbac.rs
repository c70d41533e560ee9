//! RBAC truth-table and provisioning scenarios against a real database.
//! Each test skips itself when `DATABASE_URL` is not set.

mod common;

use uuid::Uuid;

use lectern::modules::roles::model::CreatePermissionDto;
use lectern::modules::roles::service as roles_service;
use lectern::modules::users::model::CreateUserDto;
use lectern::modules::users::service::{BASELINE_PERMISSIONS, DEFAULT_ROLE, UserService};

fn unique(name: &str) -> String {
    format!("{}-{}", name, Uuid::new_v4())
}

fn new_user_dto() -> CreateUserDto {
    CreateUserDto {
        username: common::generate_unique_username(),
        email: common::generate_unique_email(),
        password: "correct-horse-battery".to_string(),
        is_admin: false,
    }
}

#[tokio::test]
async fn test_viewer_scenario_grants_exactly_the_named_permission() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let read_permission = unique("read");
    let absent_permission = unique("write");
    let viewer_role = unique("Viewer");

    roles_service::create_permission(
        &db,
        CreatePermissionDto {
            name: read_permission.clone(),
            description: "Read access".to_string(),
        },
    )
    .await
    .unwrap();

    roles_service::create_role(
        &db,
        &viewer_role,
        "Read-only viewers",
        &[read_permission.clone()],
    )
    .await
    .unwrap();

    let user = UserService::create_user(&db, new_user_dto()).await.unwrap();
    roles_service::assign_role_to_user(&db, user.user.id, &viewer_role)
        .await
        .unwrap();

    assert!(
        roles_service::check_permission(&db, user.user.id, &read_permission)
            .await
            .unwrap()
    );
    assert!(
        !roles_service::check_permission(&db, user.user.id, &absent_permission)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_permission_holds_through_any_one_role() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    // Default role grants the baseline; an extra role grants one more.
    // Holding a permission through either role suffices.
    let extra_permission = unique("publish");
    let extra_role = unique("Publisher");

    roles_service::create_permission(
        &db,
        CreatePermissionDto {
            name: extra_permission.clone(),
            description: "Publishing".to_string(),
        },
    )
    .await
    .unwrap();
    roles_service::create_role(&db, &extra_role, "", &[extra_permission.clone()])
        .await
        .unwrap();

    let user = UserService::create_user(&db, new_user_dto()).await.unwrap();
    roles_service::assign_role_to_user(&db, user.user.id, &extra_role)
        .await
        .unwrap();

    // From the default role
    assert!(
        roles_service::check_permission(&db, user.user.id, "read")
            .await
            .unwrap()
    );
    // From the extra role
    assert!(
        roles_service::check_permission(&db, user.user.id, &extra_permission)
            .await
            .unwrap()
    );

    // Conjunctive guard list: every named permission must hold
    for permission in ["read", extra_permission.as_str()] {
        assert!(
            roles_service::check_permission(&db, user.user.id, permission)
                .await
                .unwrap()
        );
    }
    assert!(
        !roles_service::check_permission(&db, user.user.id, &unique("manage_roles"))
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_duplicate_permission_name_is_rejected_once() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let name = unique("duplicate");

    roles_service::create_permission(
        &db,
        CreatePermissionDto {
            name: name.clone(),
            description: "first".to_string(),
        },
    )
    .await
    .unwrap();

    let second = roles_service::create_permission(
        &db,
        CreatePermissionDto {
            name: name.clone(),
            description: "second".to_string(),
        },
    )
    .await;
    assert!(second.is_err());

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM permissions WHERE name = $1")
        .bind(&name)
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_role_creation_rejects_unknown_permission() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let result = roles_service::create_role(
        &db,
        &unique("Ghost"),
        "",
        &[unique("does-not-exist")],
    )
    .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_role_assignment_is_idempotent() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let user = UserService::create_user(&db, new_user_dto()).await.unwrap();

    // The default role is already held; assigning it again must not duplicate
    roles_service::assign_role_to_user(&db, user.user.id, DEFAULT_ROLE)
        .await
        .unwrap();
    roles_service::assign_role_to_user(&db, user.user.id, DEFAULT_ROLE)
        .await
        .unwrap();

    let roles = roles_service::get_user_roles(&db, user.user.id).await.unwrap();
    let held: Vec<_> = roles.iter().filter(|r| r.role.name == DEFAULT_ROLE).collect();
    assert_eq!(held.len(), 1);
}

#[tokio::test]
async fn test_assigning_missing_role_fails() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let user = UserService::create_user(&db, new_user_dto()).await.unwrap();
    let result =
        roles_service::assign_role_to_user(&db, user.user.id, &unique("NoSuchRole")).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_concurrent_signups_share_one_default_role() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let (a, b) = tokio::join!(
        UserService::create_user(&db, new_user_dto()),
        UserService::create_user(&db, new_user_dto()),
    );
    let a = a.unwrap();
    let b = b.unwrap();

    // Exactly one shared role document
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM roles WHERE name = $1")
        .bind(DEFAULT_ROLE)
        .fetch_one(&db)
        .await
        .unwrap();
    assert_eq!(count, 1);

    // Both users reference it, and it carries the full baseline
    for user in [&a, &b] {
        let roles = roles_service::get_user_roles(&db, user.user.id).await.unwrap();
        let default = roles
            .iter()
            .find(|r| r.role.name == DEFAULT_ROLE)
            .expect("signup must attach the default role");

        for baseline in BASELINE_PERMISSIONS {
            assert!(
                default.permissions.iter().any(|p| p.name == baseline),
                "baseline permission {} missing",
                baseline
            );
        }
    }
}

#[tokio::test]
async fn test_duplicate_signup_is_rejected() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let dto = new_user_dto();
    let clash = CreateUserDto {
        username: dto.username.clone(),
        email: dto.email.clone(),
        password: dto.password.clone(),
        is_admin: false,
    };

    UserService::create_user(&db, dto).await.unwrap();
    assert!(UserService::create_user(&db, clash).await.is_err());
}
