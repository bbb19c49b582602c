//! Canonical domain records shared by all storage backends.
//!
//! # Responsibility
//! - Define the Task and KnowledgeEntry value types and their wire shape.
//! - Keep one record definition per entity; backends only encode/decode.
//!
//! # Invariants
//! - Ids are assigned by stores, never by callers constructing drafts.
//! - Patch types enumerate mutable fields only; `id` and `created_at` are
//!   not representable in a patch.

pub mod knowledge;
pub mod task;
