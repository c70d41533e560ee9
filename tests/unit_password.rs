use lectern::utils::password::{hash_password, is_bcrypt_hash, verify_password};

#[test]
fn test_hash_password_success() {
    let password = "testpassword123";
    let result = hash_password(password);

    assert!(result.is_ok());
    let hash = result.unwrap();
    assert!(!hash.is_empty());
    assert_ne!(hash, password);
}

#[test]
fn test_hash_output_is_bcrypt_shaped() {
    let hash = hash_password("somepassword").unwrap();
    assert!(is_bcrypt_hash(&hash));
}

#[test]
fn test_verify_password_correct() {
    let password = "correctpassword";
    let hash = hash_password(password).unwrap();

    assert!(verify_password(password, &hash));
}

#[test]
fn test_verify_password_incorrect() {
    let password = "correctpassword";
    let hash = hash_password(password).unwrap();

    assert!(!verify_password("wrongpassword", &hash));
}

#[test]
fn test_verify_password_malformed_hash_never_panics() {
    // A broken stored hash must read as a mismatch, not an error
    assert!(!verify_password("testpassword", "not_a_valid_bcrypt_hash"));
    assert!(!verify_password("testpassword", ""));
    assert!(!verify_password("testpassword", "$2z$12$garbage"));
}

#[test]
fn test_hash_generates_unique_hashes() {
    let password = "samepassword";
    let hash1 = hash_password(password).unwrap();
    let hash2 = hash_password(password).unwrap();

    // Different salts, both verify
    assert_ne!(hash1, hash2);
    assert!(verify_password(password, &hash1));
    assert!(verify_password(password, &hash2));
}

#[test]
fn test_is_bcrypt_hash_rejects_foreign_formats() {
    assert!(is_bcrypt_hash("$2b$12$abcdefghijklmnopqrstuv"));
    assert!(is_bcrypt_hash("$2a$10$abcdefghijklmnopqrstuv"));
    assert!(!is_bcrypt_hash("plaintext"));
    assert!(!is_bcrypt_hash("$argon2id$v=19$m=65536"));
    assert!(!is_bcrypt_hash(""));
}
