//! # Generator Module
//!
//! Turns a resolved service description ([`crate::spec::SourceGraph`]) into
//! the source tree of a typed Rust client crate.
//!
//! ## Architecture
//!
//! ```text
//! SourceGraph → Adapter → Crate → sort → SortedCrate → emitters → files
//! ```
//!
//! 1. **Naming** ([`naming`]) - tokenizes source names into Rust identifiers
//! 2. **Symbols** ([`symbols`]) - per-scope tables that detect collisions and
//!    hand out ranked names
//! 3. **Adapter** ([`adapter`]) - builds the [`model::TypeGraph`] and module
//!    tree, boxing recursive fields and collecting diagnostics
//! 4. **Imports** ([`imports`]) - computes the `use` block of every file
//! 5. **Emitters** - askama templates for models, clients, module indexes and
//!    the manifest
//!
//! ## Generated Structure
//!
//! ```text
//! my-client/
//! ├── Cargo.toml
//! └── src/
//!     ├── lib.rs
//!     ├── generated/
//!     │   ├── mod.rs
//!     │   ├── error.rs
//!     │   ├── models/{mod,enums,models,unions}.rs
//!     │   └── clients/{mod,<client>}.rs
//!     └── <sub_module>/
//!         ├── mod.rs
//!         └── generated/...
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sdkgen::generator::{generate_project, GeneratorOptions, ProjectPaths};
//!
//! let report = generate_project(
//!     &ProjectPaths {
//!         description: "widgets.yaml".into(),
//!         output: "widgets-client".into(),
//!         dependencies_config: None,
//!     },
//!     &GeneratorOptions::default(),
//!     false,
//! )?;
//! println!("{} files written", report.written.len());
//! ```

pub mod adapter;
mod clients;
pub mod dependencies_config;
pub mod diagnostics;
mod emit;
pub mod error;
pub mod imports;
mod manifest;
pub mod model;
mod models;
mod modules;
pub mod naming;
mod options;
mod project;
pub mod symbols;
mod templates;

pub use adapter::{adapt, Adapted};
pub use dependencies_config::{DependenciesConfig, DependencySpec};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use emit::{generate, GeneratedFile, Generation};
pub use error::GenerateError;
pub use manifest::{dependency_lines, merge_manifest, DEFAULT_VERSIONS};
pub use options::{GeneratorOptions, DEFAULT_CRATE_VERSION, DEFAULT_EDITION};
pub use project::{format_project, generate_project, GenerateReport, ProjectPaths};
pub use templates::{RUST_HEADER, TOML_HEADER};
