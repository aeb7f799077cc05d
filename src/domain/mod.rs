//! Domain types and DTOs
//!
//! Request bodies accepted by the endpoints and the typed shapes built from
//! decoded model payloads.

pub mod analysis;
