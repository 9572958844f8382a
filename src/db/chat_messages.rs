use crate::models::ChatMessage;
use crate::store::{Filter, RecordStore, StoreResult};

pub async fn create(store: &dyn RecordStore, message: &ChatMessage) -> StoreResult<String> {
    super::insert(store, message).await
}

/// History of one session, oldest first.
pub async fn list_by_session(
    store: &dyn RecordStore,
    session_id: &str,
) -> StoreResult<Vec<ChatMessage>> {
    let mut messages: Vec<ChatMessage> =
        super::find_all(store, &Filter::new().with("session_id", session_id)).await?;
    messages.sort_by_key(|m| m.timestamp);
    Ok(messages)
}
