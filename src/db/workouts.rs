use crate::models::WorkoutPlan;
use crate::store::{Filter, RecordStore, StoreResult};

pub async fn create(store: &dyn RecordStore, workout: &WorkoutPlan) -> StoreResult<String> {
    super::insert(store, workout).await
}

pub async fn list_by_user(store: &dyn RecordStore, user_id: &str) -> StoreResult<Vec<WorkoutPlan>> {
    let mut workouts: Vec<WorkoutPlan> =
        super::find_all(store, &Filter::new().with("user_id", user_id)).await?;
    workouts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(workouts)
}
