//! End-to-end credential scenarios against a real database. Each test skips
//! itself when `DATABASE_URL` is not set.

mod common;

use lectern::modules::auth::service::AuthService;
use lectern::modules::users::model::CreateUserDto;
use lectern::modules::users::service::UserService;

fn new_user_dto(password: &str) -> CreateUserDto {
    CreateUserDto {
        username: common::generate_unique_username(),
        email: common::generate_unique_email(),
        password: password.to_string(),
        is_admin: false,
    }
}

#[tokio::test]
async fn test_login_with_wrong_password_yields_nothing() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let jwt_config = common::test_jwt_config();

    let dto = new_user_dto("correct-horse-battery");
    let email = dto.email.clone();
    UserService::create_user(&db, dto).await.unwrap();

    let wrong = AuthService::login(&db, &email, "wrong-password", &jwt_config)
        .await
        .unwrap();
    assert!(wrong.is_none());

    let unknown = AuthService::login(&db, "nobody@test.com", "whatever", &jwt_config)
        .await
        .unwrap();
    assert!(unknown.is_none());
}

#[tokio::test]
async fn test_login_returns_distinct_token_pair() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let jwt_config = common::test_jwt_config();

    let dto = new_user_dto("correct-horse-battery");
    let email = dto.email.clone();
    UserService::create_user(&db, dto).await.unwrap();

    let tokens = AuthService::login(&db, &email, "correct-horse-battery", &jwt_config)
        .await
        .unwrap()
        .expect("valid credentials must yield tokens");

    assert!(!tokens.access_token.is_empty());
    assert!(!tokens.refresh_token.is_empty());
    assert_ne!(tokens.access_token, tokens.refresh_token);
}

#[tokio::test]
async fn test_blacklisted_token_is_revoked_before_natural_expiry() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };
    let jwt_config = common::test_jwt_config();

    let dto = new_user_dto("correct-horse-battery");
    let email = dto.email.clone();
    UserService::create_user(&db, dto).await.unwrap();

    let tokens = AuthService::login(&db, &email, "correct-horse-battery", &jwt_config)
        .await
        .unwrap()
        .unwrap();

    // Freshly issued: accepted
    AuthService::ensure_not_blacklisted(&db, &tokens.access_token)
        .await
        .unwrap();

    AuthService::logout(
        &db,
        &tokens.access_token,
        Some(tokens.refresh_token.as_str()),
    )
    .await
    .unwrap();

    // The exact token strings are now revoked, embedded expiry notwithstanding
    assert!(
        AuthService::ensure_not_blacklisted(&db, &tokens.access_token)
            .await
            .is_err()
    );
    assert!(
        AuthService::ensure_not_blacklisted(&db, &tokens.refresh_token)
            .await
            .is_err()
    );

    // Other tokens are unaffected
    AuthService::ensure_not_blacklisted(&db, "some-other-token")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_update_user_is_partial() {
    let Some(db) = common::try_db_pool().await else {
        eprintln!("DATABASE_URL not set; skipping");
        return;
    };

    let dto = new_user_dto("correct-horse-battery");
    let created = UserService::create_user(&db, dto).await.unwrap();

    let update = lectern::modules::users::model::UpdateUserDto {
        username: None,
        email: None,
        password: None,
        active: None,
        profile_picture: None,
        bio: Some("Rustacean".to_string()),
        location: None,
        website: None,
        phone_number: None,
        is_teacher: None,
        is_student: None,
    };

    let updated = UserService::update_user_by_id(&db, created.user.id, update)
        .await
        .unwrap();

    assert_eq!(updated.bio, "Rustacean");
    assert_eq!(updated.username, created.user.username);
    assert_eq!(updated.email, created.user.email);
    assert!(updated.active);
}
