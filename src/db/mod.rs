pub mod chat_messages;
pub mod password_reset_tokens;
pub mod status_checks;
pub mod users;
pub mod workouts;

use crate::models::Model;
use crate::store::{Filter, RecordStore, StoreResult};

pub async fn insert<M: Model>(store: &dyn RecordStore, model: &M) -> StoreResult<String> {
    store.create(M::TABLE, model.to_fields()).await
}

pub async fn find_one<M: Model>(store: &dyn RecordStore, filter: &Filter) -> StoreResult<Option<M>> {
    store
        .find_one(M::TABLE, filter)
        .await?
        .as_ref()
        .map(M::from_record)
        .transpose()
}

pub async fn find_all<M: Model>(store: &dyn RecordStore, filter: &Filter) -> StoreResult<Vec<M>> {
    store
        .find_all(M::TABLE, filter)
        .await?
        .iter()
        .map(M::from_record)
        .collect()
}
