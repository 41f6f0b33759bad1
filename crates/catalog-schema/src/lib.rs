//! Catalog Schema: builds canonical product records and checks their invariants.

pub mod assemble;
pub mod validate;

pub use assemble::{assemble, dedupe_lists, AssemblyContext, AssemblyInput};
pub use validate::{validate, CanonicalProduct};
