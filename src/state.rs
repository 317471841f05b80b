//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds the persistence seam, the provider registry and the small amount
//! of runtime configuration handlers need. Nothing in it is mutated after
//! startup.

use std::sync::Arc;
use std::time::Duration;

use crate::llm::ProviderRegistry;
use crate::llm::config::env_parse;
use crate::services::session::DEFAULT_SESSION_TTL_DAYS;
use crate::services::store::DoubtStore;

pub const DEFAULT_HISTORY_RECORD_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// =============================================================================
// CONFIG
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    pub session_ttl_days: i32,
    pub history_timeout: Duration,
    /// Request body cap for uploads.
    pub max_upload_bytes: usize,
}

impl AppConfig {
    /// - `SESSION_TTL_DAYS`: default 7
    /// - `HISTORY_RECORD_TIMEOUT_MS`: default 2000
    /// - `MAX_UPLOAD_BYTES`: default 10 MiB
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            session_ttl_days: env_parse("SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS),
            history_timeout: Duration::from_millis(env_parse(
                "HISTORY_RECORD_TIMEOUT_MS",
                DEFAULT_HISTORY_RECORD_TIMEOUT_MS,
            )),
            max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: DEFAULT_SESSION_TTL_DAYS,
            history_timeout: Duration::from_millis(DEFAULT_HISTORY_RECORD_TIMEOUT_MS),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Clone is required by Axum; all inner fields are Arc-wrapped or Copy.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DoubtStore>,
    pub providers: Arc<ProviderRegistry>,
    pub config: AppConfig,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn DoubtStore>, providers: Arc<ProviderRegistry>, config: AppConfig) -> Self {
        Self { store, providers, config }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use uuid::Uuid;

    use super::*;
    use crate::llm::{CredentialSet, ProviderAdapter, ProviderName};
    use crate::services::store::{DoubtRecord, NewDoubt, StoreError, UserProfile, UserRecord};

    #[derive(Default)]
    struct Inner {
        users: Vec<UserRecord>,
        /// token -> (user, still valid)
        sessions: HashMap<String, (Uuid, bool)>,
        api_keys: HashMap<Uuid, CredentialSet>,
        doubts: Vec<(Uuid, NewDoubt)>,
    }

    /// In-memory [`DoubtStore`]. Sessions created with a TTL of zero days or
    /// less are stored already expired.
    #[derive(Default)]
    pub struct MemoryStore {
        inner: Mutex<Inner>,
        fail_writes: AtomicBool,
        insert_delay: Mutex<Option<Duration>>,
    }

    impl MemoryStore {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Make every write fail with a database error.
        pub fn fail_writes(&self) {
            self.fail_writes.store(true, Ordering::SeqCst);
        }

        /// Delay `insert_doubt` to exercise the history timeout.
        pub fn delay_inserts(&self, delay: Duration) {
            *self.insert_delay.lock().unwrap() = Some(delay);
        }

        #[must_use]
        pub fn doubts(&self) -> Vec<NewDoubt> {
            self.inner
                .lock()
                .unwrap()
                .doubts
                .iter()
                .map(|(_, d)| d.clone())
                .collect()
        }

        #[must_use]
        pub fn session_count(&self) -> usize {
            self.inner.lock().unwrap().sessions.len()
        }

        /// Seed an account and a valid session, returning both.
        pub fn seed_user(&self, name: &str, email: &str) -> (UserProfile, String) {
            let profile = UserProfile { id: Uuid::new_v4(), name: name.into(), email: email.into() };
            let token = crate::services::session::generate_token();
            let mut inner = self.inner.lock().unwrap();
            inner.users.push(UserRecord { profile: profile.clone(), password_hash: String::new() });
            inner.sessions.insert(token.clone(), (profile.id, true));
            (profile, token)
        }

        pub fn seed_api_keys(&self, user_id: Uuid, keys: CredentialSet) {
            self.inner.lock().unwrap().api_keys.insert(user_id, keys);
        }

        fn check_writable(&self) -> Result<(), StoreError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StoreError::Db(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait::async_trait]
    impl DoubtStore for MemoryStore {
        async fn create_user(&self, name: &str, email: &str, password_hash: &str) -> Result<UserProfile, StoreError> {
            self.check_writable()?;
            let mut inner = self.inner.lock().unwrap();
            if inner.users.iter().any(|u| u.profile.email == email) {
                return Err(StoreError::DuplicateEmail);
            }
            let profile = UserProfile { id: Uuid::new_v4(), name: name.into(), email: email.into() };
            inner.users.push(UserRecord { profile: profile.clone(), password_hash: password_hash.into() });
            Ok(profile)
        }

        async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
            let inner = self.inner.lock().unwrap();
            Ok(inner.users.iter().find(|u| u.profile.email == email).cloned())
        }

        async fn touch_last_login(&self, _user_id: Uuid) -> Result<(), StoreError> {
            self.check_writable()
        }

        async fn create_session(&self, user_id: Uuid, token: &str, ttl_days: i32) -> Result<(), StoreError> {
            self.check_writable()?;
            self.inner
                .lock()
                .unwrap()
                .sessions
                .insert(token.into(), (user_id, ttl_days > 0));
            Ok(())
        }

        async fn session_user(&self, token: &str) -> Result<Option<UserProfile>, StoreError> {
            let inner = self.inner.lock().unwrap();
            let Some((user_id, true)) = inner.sessions.get(token).copied() else {
                return Ok(None);
            };
            Ok(inner
                .users
                .iter()
                .find(|u| u.profile.id == user_id)
                .map(|u| u.profile.clone()))
        }

        async fn delete_session(&self, token: &str) -> Result<(), StoreError> {
            self.check_writable()?;
            self.inner.lock().unwrap().sessions.remove(token);
            Ok(())
        }

        async fn api_keys(&self, user_id: Uuid) -> Result<CredentialSet, StoreError> {
            Ok(self
                .inner
                .lock()
                .unwrap()
                .api_keys
                .get(&user_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn upsert_api_keys(&self, user_id: Uuid, keys: &CredentialSet) -> Result<(), StoreError> {
            self.check_writable()?;
            let mut inner = self.inner.lock().unwrap();
            let stored = inner.api_keys.entry(user_id).or_default();
            for (provider, key) in keys.iter() {
                stored.insert(provider, key);
            }
            Ok(())
        }

        async fn insert_doubt(&self, doubt: &NewDoubt) -> Result<(), StoreError> {
            let delay = *self.insert_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.check_writable()?;
            self.inner
                .lock()
                .unwrap()
                .doubts
                .push((Uuid::new_v4(), doubt.clone()));
            Ok(())
        }

        async fn recent_doubts(&self, user_id: Uuid, limit: i64) -> Result<Vec<DoubtRecord>, StoreError> {
            let inner = self.inner.lock().unwrap();
            let limit = usize::try_from(limit).unwrap_or(0);
            Ok(inner
                .doubts
                .iter()
                .enumerate()
                .rev()
                .filter(|(_, (_, d))| d.user_id == user_id)
                .take(limit)
                .map(|(seq, (id, d))| DoubtRecord {
                    id: *id,
                    filename: d.filename.clone(),
                    subject: d.subject.clone(),
                    question_text: d.question_text.clone(),
                    solution: d.solution.clone(),
                    provider_used: d.provider.as_str().to_owned(),
                    created_at: format!("2026-01-01T00:00:{:02}Z", seq % 60),
                })
                .collect())
        }
    }

    /// Adapter that returns fixed text and counts calls.
    pub struct MockAdapter {
        pub reply: Result<String, String>,
        pub calls: Mutex<Vec<(String, String)>>,
    }

    impl MockAdapter {
        #[must_use]
        pub fn ok(text: &str) -> Arc<Self> {
            Arc::new(Self { reply: Ok(text.into()), calls: Mutex::new(Vec::new()) })
        }

        #[must_use]
        pub fn failing(reason: &str) -> Arc<Self> {
            Arc::new(Self { reply: Err(reason.into()), calls: Mutex::new(Vec::new()) })
        }

        #[must_use]
        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl ProviderAdapter for MockAdapter {
        async fn invoke(
            &self,
            credential: &str,
            _image: &crate::llm::ImageInput,
            prompt: &str,
        ) -> Result<String, crate::llm::LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((credential.to_owned(), prompt.to_owned()));
            self.reply
                .clone()
                .map_err(crate::llm::LlmError::ApiRequest)
        }
    }

    /// Registry with one mock bound to each selectable provider.
    #[must_use]
    pub fn mock_registry(
        gemini: Arc<MockAdapter>,
        anthropic: Arc<MockAdapter>,
        openai: Arc<MockAdapter>,
    ) -> ProviderRegistry {
        ProviderRegistry::new(Duration::from_secs(5))
            .with_binding(ProviderName::Gemini, gemini)
            .with_binding(ProviderName::Anthropic, anthropic)
            .with_binding(ProviderName::OpenAi, openai)
    }

    /// `AppState` over an in-memory store and the given registry.
    #[must_use]
    pub fn test_app_state(store: Arc<MemoryStore>, providers: ProviderRegistry) -> AppState {
        AppState::new(store, Arc::new(providers), AppConfig::default())
    }
}
