//! Doubt history: best-effort recording after a solve, and listing.
//!
//! Recording is a side effect of a successful solve. It never fails the
//! request: store errors and timeouts are logged and dropped.

use std::time::Duration;

use uuid::Uuid;

use super::store::{DoubtRecord, DoubtStore, NewDoubt, StoreError};
use crate::llm::ProviderName;
use crate::llm::types::NO_SOLUTION_TEXT;

/// Question descriptor stored with every record.
pub const QUESTION_DESCRIPTOR: &str = "Image uploaded";

/// Number of records returned by a listing.
pub const HISTORY_LIST_LIMIT: i64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Recorded,
    Skipped,
    Failed,
    TimedOut,
}

/// Persist one solved doubt for `user_id`, bounded by `timeout`.
pub async fn record(
    store: &dyn DoubtStore,
    user_id: Uuid,
    filename: Option<&str>,
    subject: &str,
    solution: &str,
    provider: ProviderName,
    timeout: Duration,
) -> RecordOutcome {
    if solution.trim() == NO_SOLUTION_TEXT {
        return RecordOutcome::Skipped;
    }

    let doubt = NewDoubt {
        user_id,
        filename: filename.map(str::to_owned),
        subject: subject.to_owned(),
        question_text: QUESTION_DESCRIPTOR.to_owned(),
        solution: solution.to_owned(),
        provider,
    };

    match tokio::time::timeout(timeout, store.insert_doubt(&doubt)).await {
        Ok(Ok(())) => {
            tracing::debug!(%user_id, %provider, "doubt recorded");
            RecordOutcome::Recorded
        }
        Ok(Err(e)) => {
            tracing::warn!(error = %e, %user_id, "could not save doubt to history");
            RecordOutcome::Failed
        }
        Err(_) => {
            tracing::warn!(%user_id, timeout_ms = timeout.as_millis(), "history write timed out");
            RecordOutcome::TimedOut
        }
    }
}

/// Most recent records for `user_id`, newest first.
pub async fn list(store: &dyn DoubtStore, user_id: Uuid) -> Result<Vec<DoubtRecord>, StoreError> {
    store.recent_doubts(user_id, HISTORY_LIST_LIMIT).await
}
