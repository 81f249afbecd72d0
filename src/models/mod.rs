//! Data models for the document registry.
//!
//! Field names serialise in camelCase to match the JSON collection file and
//! the HTTP contract.

mod document;

pub use document::*;
