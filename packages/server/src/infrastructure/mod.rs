//! Infrastructure layer: storage and transport adapters for the domain traits.

pub mod dto;
pub mod message_pusher;
pub mod repository;
