use super::*;
use crate::state::test_helpers::MemoryStore;

#[test]
fn normalize_email_lowercases_and_trims() {
    assert_eq!(normalize_email("  Ada@Example.COM "), Some("ada@example.com".to_string()));
}

#[test]
fn normalize_email_rejects_malformed() {
    for bad in ["", "ada", "@example.com", "ada@", "a@b@c", "a da@example.com"] {
        assert_eq!(normalize_email(bad), None, "{bad}");
    }
}

#[test]
fn hash_password_is_bcrypt_and_verifies() {
    let stored = hash_password("hunter22").unwrap();
    assert!(stored.starts_with(&format!("$2b${BCRYPT_COST}$")), "{stored}");
    assert_eq!(stored.len(), 60);
    assert!(verify_password("hunter22", &stored));
    assert!(!verify_password("hunter23", &stored));
}

#[test]
fn hash_password_salts_differ() {
    assert_ne!(hash_password("same-password").unwrap(), hash_password("same-password").unwrap());
}

#[test]
fn verify_password_rejects_malformed_hashes() {
    for bad in ["", "hunter22", "$2b$10$short", "sha256$10000$00$00", "$9z$10$abcdefghijklmnopqrstuuABCDEFGHIJKLMNOPQRSTUVWXYZ01234"] {
        assert!(!verify_password("hunter22", bad), "{bad}");
    }
}

#[tokio::test]
async fn registered_account_stores_bcrypt_hash_not_password() {
    let store = MemoryStore::new();
    register(&store, "Ada", "ada@example.com", "secret1", 7).await.unwrap();
    let record = store.find_user_by_email("ada@example.com").await.unwrap().unwrap();
    assert!(record.password_hash.starts_with("$2b$"));
    assert!(!record.password_hash.contains("secret1"));
    assert!(verify_password("secret1", &record.password_hash));
}

#[tokio::test]
async fn register_collects_every_validation_error() {
    let store = MemoryStore::new();
    let err = register(&store, " ", "nope", "123", 7).await.unwrap_err();
    let AccountError::Validation(errors) = &err else {
        panic!("expected validation error, got {err:?}");
    };
    assert_eq!(errors.len(), 3);
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    assert_eq!(err.error_code(), "E_VALIDATION");
}

#[tokio::test]
async fn register_then_login() {
    let store = MemoryStore::new();
    let registered = register(&store, "Ada", "Ada@Example.com", "secret1", 7).await.unwrap();
    assert_eq!(registered.user.email, "ada@example.com");
    assert_eq!(registered.token.len(), 64);

    let logged_in = login(&store, "ada@example.com", "secret1", 7).await.unwrap();
    assert_eq!(logged_in.user.id, registered.user.id);
    assert_ne!(logged_in.token, registered.token);
    assert_eq!(store.session_count(), 2);
}

#[tokio::test]
async fn register_duplicate_email_is_rejected() {
    let store = MemoryStore::new();
    register(&store, "Ada", "ada@example.com", "secret1", 7).await.unwrap();
    let err = register(&store, "Other", "ADA@example.com", "secret2", 7).await.unwrap_err();
    assert!(matches!(err, AccountError::DuplicateEmail));
    assert_eq!(err.to_string(), "User already exists with this email");
}

#[tokio::test]
async fn login_wrong_password_and_unknown_email_look_the_same() {
    let store = MemoryStore::new();
    register(&store, "Ada", "ada@example.com", "secret1", 7).await.unwrap();

    let wrong = login(&store, "ada@example.com", "secret2", 7).await.unwrap_err();
    let unknown = login(&store, "bob@example.com", "secret1", 7).await.unwrap_err();
    assert_eq!(wrong.to_string(), "Invalid email or password");
    assert_eq!(unknown.to_string(), wrong.to_string());
}

#[tokio::test]
async fn store_failure_maps_to_internal_error() {
    let store = MemoryStore::new();
    store.fail_writes();
    let err = register(&store, "Ada", "ada@example.com", "secret1", 7).await.unwrap_err();
    assert!(matches!(err, AccountError::Store(_)));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}
