//! # murmur-providers
//!
//! Generation providers for murmur.

pub mod openai;
pub mod parse;

pub use openai::OpenAiGenerator;
