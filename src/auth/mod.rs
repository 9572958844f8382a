pub mod password;
pub mod reset;
