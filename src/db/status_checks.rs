use crate::models::StatusCheck;
use crate::store::{Filter, RecordStore, StoreResult};

pub async fn create(store: &dyn RecordStore, check: &StatusCheck) -> StoreResult<String> {
    super::insert(store, check).await
}

pub async fn list_all(store: &dyn RecordStore) -> StoreResult<Vec<StatusCheck>> {
    super::find_all(store, &Filter::new()).await
}
