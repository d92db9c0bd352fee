//! # Repository Module
//!
//! ```text
//! Store writer ──► db.kv().set(key, value) ──► KvRepository ──► kv_store table
//! ```
//!
//! - [`kv::KvRepository`] - key-value get / set / remove

pub mod kv;
