//! Domain entities - Core business objects with no external dependencies

pub mod message;
pub mod command;

pub use message::{InboundMessage, NewMessage, StoredMessage, UNKNOWN_USER};
pub use command::{Command, CommandKind, CommandSpec, COMMANDS, COMMAND_PREFIX};
