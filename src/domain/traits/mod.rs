//! Domain traits - Abstractions for infrastructure implementations

pub mod ai;
pub mod bot;
pub mod store;

pub use ai::AiService;
pub use bot::{Bot, BotInfo, InboundSource};
pub use store::MessageStore;
