//! Cross-cutting utilities shared by the Rakugaki crates.

pub mod logger;
pub mod time;
