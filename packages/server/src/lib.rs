//! Room and matchmaking server for Rakugaki, a two-player drawing duel.
//!
//! Participants connect over WebSocket, are paired in shared rooms (or play
//! alone in private rooms), agree on a topic, draw, and have their
//! classifier predictions judged by the server.

pub mod config;

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
