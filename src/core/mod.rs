
pub mod chat;
pub mod language;
pub mod pipeline;
pub mod score;
pub mod session;
pub mod wizard;
