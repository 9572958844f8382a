pub mod chat_message;
pub mod password_reset_token;
pub mod status_check;
pub mod user;
pub mod workout;

pub use chat_message::ChatMessage;
pub use password_reset_token::PasswordResetToken;
pub use status_check::StatusCheck;
pub use user::User;
pub use workout::WorkoutPlan;

use crate::store::{Fields, Record, StoreResult};

/// A typed row of one table, mapped to and from the store's field bag.
pub trait Model: Sized {
    const TABLE: &'static str;

    fn to_fields(&self) -> Fields;

    fn from_record(record: &Record) -> StoreResult<Self>;
}
