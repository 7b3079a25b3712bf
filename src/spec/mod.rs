//! Service description input.
//!
//! `types` holds the serde shape of the YAML/JSON document, `build` resolves it
//! into a [`SourceGraph`] of arena-indexed entities and `load` reads files.

mod build;
mod load;
mod types;

pub use build::*;
pub use load::*;
pub use types::*;
