use std::sync::Arc;

use crate::auth::reset::ResetTokenManager;
use crate::clock::Clock;
use crate::config::Config;
use crate::store::RecordStore;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub resets: ResetTokenManager,
}
