use tempfile::TempDir;

use super::*;

fn entry(n: i64) -> HistoryEntry {
    HistoryEntry {
        filename: format!("q{n}.png"),
        subject: "math".into(),
        provider: "gemini".into(),
        answer: Some(n.to_string()),
        solution: "<div></div>".into(),
        time_ms: n,
    }
}

#[test]
fn history_keeps_newest_twenty() {
    let mut state = LocalState::default();
    for n in 0..25 {
        state.push_history(entry(n));
    }
    assert_eq!(state.history.len(), HISTORY_CAPACITY);
    assert_eq!(state.history[0].time_ms, 24);
    assert_eq!(state.history[19].time_ms, 5);
}

#[test]
fn set_keys_trims_and_blank_clears() {
    let mut state = LocalState::default();
    state.set_keys([("gemini", " g "), ("openai", "o")]);
    state.set_keys([("openai", "  ")]);
    assert_eq!(state.api_keys.get("gemini").map(String::as_str), Some("g"));
    assert!(!state.api_keys.contains_key("openai"));
    assert_eq!(state.api_keys_json(), r#"{"gemini":"g"}"#);
}

#[test]
fn missing_file_loads_empty() {
    let dir = TempDir::new().unwrap();
    let state = LocalState::load(&dir.path().join("local.json")).unwrap();
    assert_eq!(state, LocalState::default());
}

#[test]
fn save_then_load_creates_parent_dirs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("doubt-solver").join("local.json");

    let mut state = LocalState::default();
    state.set_keys([("anthropic", "a")]);
    state.remember_session("tok", serde_json::json!({ "name": "Ada" }));
    state.push_history(entry(1));
    state.save(&path).unwrap();

    let loaded = LocalState::load(&path).unwrap();
    assert_eq!(loaded, state);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"apiKeys\""));
}

#[test]
fn corrupt_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("local.json");
    std::fs::write(&path, "{ nope").unwrap();
    assert!(matches!(LocalState::load(&path), Err(LocalError::Corrupt { .. })));
}

#[test]
fn forget_session_keeps_keys() {
    let mut state = LocalState::default();
    state.set_keys([("gemini", "g")]);
    state.remember_session("tok", serde_json::Value::Null);
    state.forget_session();
    assert!(state.token.is_none());
    assert_eq!(state.api_keys.len(), 1);
}
