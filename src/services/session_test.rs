use super::*;
use crate::state::test_helpers::MemoryStore;

// =============================================================================
// bytes_to_hex
// =============================================================================

#[test]
fn bytes_to_hex_leading_zero() {
    assert_eq!(bytes_to_hex(&[0x0a]), "0a");
}

#[test]
fn bytes_to_hex_multi_byte() {
    assert_eq!(bytes_to_hex(&[0xde, 0xad, 0xbe, 0xef]), "deadbeef");
}

// =============================================================================
// generate_token
// =============================================================================

#[test]
fn generate_token_is_64_hex_chars() {
    let token = generate_token();
    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn generate_token_two_calls_differ() {
    assert_ne!(generate_token(), generate_token());
}

// =============================================================================
// bearer_token
// =============================================================================

#[test]
fn bearer_token_parses_scheme_case_insensitively() {
    assert_eq!(bearer_token("Bearer abc"), Some("abc"));
    assert_eq!(bearer_token("bearer  abc "), Some("abc"));
}

#[test]
fn bearer_token_rejects_other_schemes_and_blank() {
    assert_eq!(bearer_token("Basic abc"), None);
    assert_eq!(bearer_token("Bearer "), None);
    assert_eq!(bearer_token("abc"), None);
}

// =============================================================================
// lifecycle
// =============================================================================

#[tokio::test]
async fn create_validate_delete_round() {
    let store = MemoryStore::new();
    let (user, _) = store.seed_user("Ada", "ada@example.com");

    let token = create_session(&store, user.id, DEFAULT_SESSION_TTL_DAYS).await.unwrap();
    let found = validate_session(&store, &token).await.unwrap().unwrap();
    assert_eq!(found.id, user.id);

    delete_session(&store, &token).await.unwrap();
    assert!(validate_session(&store, &token).await.unwrap().is_none());
}

#[tokio::test]
async fn expired_session_does_not_validate() {
    let store = MemoryStore::new();
    let (user, _) = store.seed_user("Ada", "ada@example.com");
    let token = create_session(&store, user.id, 0).await.unwrap();
    assert!(validate_session(&store, &token).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_token_does_not_validate() {
    let store = MemoryStore::new();
    assert!(validate_session(&store, "nope").await.unwrap().is_none());
}
