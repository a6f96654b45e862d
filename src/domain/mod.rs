// Domain module - Shared types, configuration, errors
pub mod config;
pub mod error;
