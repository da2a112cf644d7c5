//! # murmur-core
//!
//! Core types, traits, configuration, and error handling for the murmur agent.

pub mod config;
pub mod error;
pub mod memory;
pub mod post;
pub mod prompt;
pub mod sanitize;
pub mod traits;
