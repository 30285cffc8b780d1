//! Persona
//!
//! Turns archetypes into per-call persona contexts.

pub mod context_builder;
pub mod memory_selection;

pub use context_builder::{build_context, resolve_archetype, ContextRequest};
pub use memory_selection::select_memories;
