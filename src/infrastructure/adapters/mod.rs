//! Platform adapters

pub mod console;
pub mod telegram;

pub use console::{ConsoleAdapter, ConsoleSource};
pub use telegram::{TelegramAdapter, TelegramSource};
