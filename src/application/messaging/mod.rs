//! Message handling - Event-driven message processing

pub mod dispatcher;

pub use dispatcher::Dispatcher;
