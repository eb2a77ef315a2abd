//! Application services - Business logic orchestration

pub mod router;

pub use router::{Router, ERROR_REPLY};
