use super::*;

#[test]
fn gemini_wins_when_everything_is_configured() {
    let creds = CredentialSet::new()
        .with(ProviderName::OpenAi, "sk-o")
        .with(ProviderName::Anthropic, "sk-a")
        .with(ProviderName::Gemini, "g");
    assert_eq!(resolve_provider(&creds).unwrap(), (ProviderName::Gemini, "g".to_string()));
}

#[test]
fn empty_gemini_falls_through_to_anthropic() {
    let creds = CredentialSet::from_json_str(r#"{"gemini":"","anthropic":"key1","openai":"key2"}"#).unwrap();
    assert_eq!(resolve_provider(&creds).unwrap(), (ProviderName::Anthropic, "key1".to_string()));
}

#[test]
fn openai_selected_when_it_is_the_only_key() {
    let creds = CredentialSet::new().with(ProviderName::OpenAi, "sk-o");
    assert_eq!(resolve_provider(&creds).unwrap().0, ProviderName::OpenAi);
}

#[test]
fn other_is_never_selected() {
    let creds = CredentialSet::new().with(ProviderName::Other, "x");
    assert!(matches!(resolve_provider(&creds), Err(SelectError::NoCredentialsConfigured)));
}

#[test]
fn all_blank_is_no_credentials() {
    let creds = CredentialSet::from_json_str(r#"{"gemini":"  ","anthropic":"","openai":null}"#).unwrap();
    let err = resolve_provider(&creds).unwrap_err();
    assert_eq!(err.error_code(), "E_NO_CREDENTIALS");
    assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
}

#[test]
fn selection_ignores_json_key_order() {
    let a = CredentialSet::from_json_str(r#"{"openai":"o","anthropic":"a"}"#).unwrap();
    let b = CredentialSet::from_json_str(r#"{"anthropic":"a","openai":"o"}"#).unwrap();
    assert_eq!(resolve_provider(&a).unwrap(), resolve_provider(&b).unwrap());
}

#[test]
fn supplied_key_overrides_stored() {
    let stored = CredentialSet::new().with(ProviderName::Gemini, "old");
    let supplied = CredentialSet::new().with(ProviderName::Gemini, "new");
    assert_eq!(merge_credentials(&stored, &supplied).get(ProviderName::Gemini), Some("new"));
}

#[test]
fn blank_supplied_key_keeps_stored() {
    let stored = CredentialSet::new().with(ProviderName::Anthropic, "stored");
    let supplied = CredentialSet::from_json_str(r#"{"anthropic":""}"#).unwrap();
    assert_eq!(merge_credentials(&stored, &supplied).get(ProviderName::Anthropic), Some("stored"));
}

#[test]
fn merge_unions_both_sources() {
    let stored = CredentialSet::new().with(ProviderName::OpenAi, "o");
    let supplied = CredentialSet::new().with(ProviderName::Anthropic, "a");
    let merged = merge_credentials(&stored, &supplied);
    assert_eq!(merged.len(), 2);
    assert_eq!(resolve_provider(&merged).unwrap().0, ProviderName::Anthropic);
}
