mod common;

use uuid::Uuid;

use lectern::utils::jwt::{
    create_access_token, create_refresh_token, verify_access_token, verify_refresh_token,
};

#[test]
fn test_create_access_token_success() {
    let jwt_config = common::test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_access_token(user_id, &jwt_config).unwrap();
    assert!(!token.is_empty());
}

#[test]
fn test_verify_access_token_roundtrip() {
    let jwt_config = common::test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_access_token(user_id, &jwt_config).unwrap();
    let claims = verify_access_token(&token, &jwt_config).unwrap();

    assert_eq!(claims.sub, user_id.to_string());
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_access_token_expiry_matches_config() {
    let jwt_config = common::test_jwt_config();
    let token = create_access_token(Uuid::new_v4(), &jwt_config).unwrap();
    let claims = verify_access_token(&token, &jwt_config).unwrap();

    assert_eq!(
        claims.exp - claims.iat,
        (jwt_config.access_expire_minutes * 60) as usize
    );
}

#[test]
fn test_refresh_token_uses_distinct_secret() {
    let jwt_config = common::test_jwt_config();
    let user_id = Uuid::new_v4();

    let refresh = create_refresh_token(user_id, &jwt_config).unwrap();

    // A refresh token must not pass as an access token, and vice versa
    assert!(verify_access_token(&refresh, &jwt_config).is_err());
    assert!(verify_refresh_token(&refresh, &jwt_config).is_ok());

    let access = create_access_token(user_id, &jwt_config).unwrap();
    assert!(verify_refresh_token(&access, &jwt_config).is_err());
}

#[test]
fn test_token_pair_is_distinct() {
    let jwt_config = common::test_jwt_config();
    let user_id = Uuid::new_v4();

    let access = create_access_token(user_id, &jwt_config).unwrap();
    let refresh = create_refresh_token(user_id, &jwt_config).unwrap();

    assert_ne!(access, refresh);
}

#[test]
fn test_verify_token_wrong_secret() {
    let jwt_config = common::test_jwt_config();
    let token = create_access_token(Uuid::new_v4(), &jwt_config).unwrap();

    let mut wrong_config = common::test_jwt_config();
    wrong_config.access_secret = "different_secret_key".to_string();

    assert!(verify_access_token(&token, &wrong_config).is_err());
}

#[test]
fn test_verify_token_malformed() {
    let jwt_config = common::test_jwt_config();
    let malformed_tokens = vec![
        "",
        "invalid.token.here",
        "not.enough.parts",
        "too.many.parts.here.extra",
        "!!!.invalid.chars",
        "header.payload.",
        ".payload.signature",
    ];

    for token in malformed_tokens {
        assert!(
            verify_access_token(token, &jwt_config).is_err(),
            "token {:?} should not verify",
            token
        );
    }
}

#[test]
fn test_create_token_different_users_different_tokens() {
    let jwt_config = common::test_jwt_config();
    let user_id1 = Uuid::new_v4();
    let user_id2 = Uuid::new_v4();

    let token1 = create_access_token(user_id1, &jwt_config).unwrap();
    let token2 = create_access_token(user_id2, &jwt_config).unwrap();

    assert_ne!(token1, token2);

    let claims1 = verify_access_token(&token1, &jwt_config).unwrap();
    let claims2 = verify_access_token(&token2, &jwt_config).unwrap();

    assert_eq!(claims1.sub, user_id1.to_string());
    assert_eq!(claims2.sub, user_id2.to_string());
}
