//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Services: The command router
//! - Errors: Domain-specific errors
//! - Messaging: Dispatching inbound events to the router

pub mod errors;
pub mod services;
pub mod messaging;
