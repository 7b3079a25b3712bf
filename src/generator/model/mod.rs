//! Code model of the generated crate.

pub mod client;
pub mod module_tree;
pub mod types;

pub use client::*;
pub use module_tree::*;
pub use types::*;
