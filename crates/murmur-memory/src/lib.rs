//! # murmur-memory
//!
//! Persistent watermark, conversation memory, and audit log (SQLite-backed).

pub mod audit;
pub mod store;

pub use audit::AuditLogger;
pub use store::Store;
