use crate::models::User;
use crate::store::{Fields, Filter, RecordStore, StoreResult, tables};

pub async fn create(store: &dyn RecordStore, user: &User) -> StoreResult<String> {
    super::insert(store, user).await
}

pub async fn find_by_email(store: &dyn RecordStore, email: &str) -> StoreResult<Option<User>> {
    super::find_one(store, &Filter::new().with("email", email)).await
}

pub async fn find_by_id(store: &dyn RecordStore, id: &str) -> StoreResult<Option<User>> {
    super::find_one(store, &Filter::new().with("id", id)).await
}

/// Partial profile update. Returns the number of rows changed.
pub async fn update(store: &dyn RecordStore, id: &str, changes: Fields) -> StoreResult<u64> {
    store.update(tables::USERS, id, changes).await
}

pub async fn delete(store: &dyn RecordStore, id: &str) -> StoreResult<u64> {
    store.delete(tables::USERS, id).await
}
