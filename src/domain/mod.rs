//! Domain layer - Core business logic with no external dependencies
//! 
//! This layer contains:
//! - Entities: Core business objects (InboundMessage, StoredMessage, Command)
//! - Traits: Abstractions for infrastructure (Bot, InboundSource, MessageStore, AiService)

pub mod entities;
pub mod traits;
