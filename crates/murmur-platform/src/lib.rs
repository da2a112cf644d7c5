//! # murmur-platform
//!
//! Social platform integrations for murmur.

pub mod split;
pub mod x;

pub use split::split_post;
pub use x::XClient;
