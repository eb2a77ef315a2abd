//! relay-bot - relays chat messages to an AI service and keeps a message log

pub mod domain;
pub mod application;
pub mod infrastructure;
