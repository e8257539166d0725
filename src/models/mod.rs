pub mod chat;
pub mod intent;
