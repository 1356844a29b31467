//! Domain types: notes, chunks and caller identity.

pub mod chunk;
pub mod identity;
pub mod note;
