use super::*;
use crate::error::ErrorCode;

// =============================================================================
// ProviderName
// =============================================================================

#[test]
fn provider_name_round_trips_wire_names() {
    for provider in ProviderName::ALL {
        assert_eq!(ProviderName::parse(provider.as_str()), Some(provider));
    }
}

#[test]
fn provider_name_parse_is_case_insensitive() {
    assert_eq!(ProviderName::parse("  Gemini "), Some(ProviderName::Gemini));
    assert_eq!(ProviderName::parse("OPENAI"), Some(ProviderName::OpenAi));
}

#[test]
fn provider_name_parse_unknown_is_none() {
    assert_eq!(ProviderName::parse("mistral"), None);
    assert_eq!(ProviderName::parse(""), None);
}

#[test]
fn provider_name_serializes_lowercase() {
    let json = serde_json::to_string(&ProviderName::OpenAi).unwrap();
    assert_eq!(json, "\"openai\"");
}

#[test]
fn selection_order_excludes_other() {
    assert!(!ProviderName::SELECTION_ORDER.contains(&ProviderName::Other));
    assert_eq!(ProviderName::SELECTION_ORDER[0], ProviderName::Gemini);
}

// =============================================================================
// CredentialSet
// =============================================================================

#[test]
fn credential_insert_trims_and_skips_blank() {
    let mut set = CredentialSet::new();
    set.insert(ProviderName::Gemini, "  g-key  ");
    set.insert(ProviderName::Anthropic, "   ");
    assert_eq!(set.get(ProviderName::Gemini), Some("g-key"));
    assert_eq!(set.get(ProviderName::Anthropic), None);
    assert_eq!(set.len(), 1);
}

#[test]
fn credential_blank_insert_keeps_existing() {
    let mut set = CredentialSet::new().with(ProviderName::OpenAi, "sk-1");
    set.insert(ProviderName::OpenAi, "");
    assert_eq!(set.get(ProviderName::OpenAi), Some("sk-1"));
}

#[test]
fn credential_from_json_ignores_unknown_and_non_strings() {
    let raw = r#"{"gemini":"g","anthropic":"","openai":null,"mistral":"m","other":"o"}"#;
    let set = CredentialSet::from_json_str(raw).unwrap();
    assert_eq!(set.get(ProviderName::Gemini), Some("g"));
    assert_eq!(set.get(ProviderName::Anthropic), None);
    assert_eq!(set.get(ProviderName::OpenAi), None);
    assert_eq!(set.get(ProviderName::Other), Some("o"));
    assert_eq!(set.len(), 2);
}

#[test]
fn credential_from_json_rejects_non_object() {
    assert!(CredentialSet::from_json_str("not json").is_err());
    assert!(CredentialSet::from_json_str("[1,2]").is_err());
}

#[test]
fn credential_serializes_as_plain_map() {
    let set = CredentialSet::new()
        .with(ProviderName::OpenAi, "sk")
        .with(ProviderName::Gemini, "g");
    let json = serde_json::to_value(&set).unwrap();
    assert_eq!(json, serde_json::json!({ "gemini": "g", "openai": "sk" }));
}

// =============================================================================
// ImageInput
// =============================================================================

#[test]
fn image_base64_encodes_bytes() {
    let image = ImageInput::new(b"hello".to_vec(), "image/png");
    assert_eq!(image.base64(), "aGVsbG8=");
}

#[test]
fn image_data_url_carries_media_type() {
    let image = ImageInput::new(vec![0xff, 0xd8], "image/jpeg");
    assert_eq!(image.data_url(), "data:image/jpeg;base64,/9g=");
}

// =============================================================================
// LlmError
// =============================================================================

#[test]
fn llm_error_codes_are_distinct() {
    let errors = [
        LlmError::ConfigParse("x".into()),
        LlmError::ProviderUnavailable(ProviderName::Gemini),
        LlmError::ApiRequest("x".into()),
        LlmError::ApiResponse { status: 500, body: String::new() },
        LlmError::ApiParse("x".into()),
        LlmError::Timeout { secs: 1 },
        LlmError::HttpClientBuild("x".into()),
    ];
    let mut codes: Vec<&str> = errors.iter().map(|e| e.error_code()).collect();
    codes.sort_unstable();
    codes.dedup();
    assert_eq!(codes.len(), errors.len());
}

#[test]
fn llm_error_display_includes_status() {
    let err = LlmError::ApiResponse { status: 429, body: "slow down".into() };
    assert!(err.to_string().contains("429"));
}
