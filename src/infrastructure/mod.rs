//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Message persistence (SQLite, Supabase)
//! - AI: HTTP client for the inference service
//! - Adapters: Platform integrations (Telegram, console)

pub mod config;
pub mod storage;
pub mod ai;
pub mod adapters;

#[cfg(test)]
pub(crate) mod test_support;
