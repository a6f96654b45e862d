// Infrastructure module - External dependencies and adapters
pub mod config;
pub mod firmware;
pub mod logging;
pub mod serial;
