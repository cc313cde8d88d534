pub mod broker;
pub mod engine;
pub mod error;
pub mod host;
pub mod loader;
pub mod report;
