//! # sdkgen
//!
//! **sdkgen** generates typed Rust client libraries from a language-neutral
//! service description: enums, records, discriminated unions and HTTP
//! clients with paging support, laid out as a ready-to-build crate.
//!
//! ## Architecture
//!
//! - **[`spec`]** - Service description types, loading and reference resolution
//! - **[`generator`]** - Name normalization, symbol tables, the type graph
//!   adapter, import resolution and the askama emitters
//! - **[`cli`]** - The `sdkgen` command line
//! - **[`logging`]** - `tracing` subscriber setup
//! - **[`ids`]** - Typed arena indices shared by the source graph and the code model
//!
//! ### Code Generation Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant User
//!     participant CLI as CLI<br/>(sdkgen)
//!     participant Spec as spec::load_source_graph
//!     participant Adapter as generator::adapt
//!     participant Emit as generator::generate
//!     participant FS as File System
//!
//!     User->>CLI: sdkgen generate --description widgets.yaml
//!     CLI->>Spec: load + resolve references
//!     Spec-->>CLI: SourceGraph
//!     CLI->>Adapter: names, modules, type graph
//!     Adapter-->>Emit: Crate + Diagnostics
//!     Emit->>Emit: sort, render templates
//!     Emit-->>CLI: Vec<GeneratedFile>
//!     CLI->>FS: clear generated/ dirs, write files
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sdkgen::generator::{generate, GeneratorOptions};
//! use sdkgen::spec::load_source_graph;
//!
//! let source = load_source_graph("widgets.yaml".as_ref())?;
//! let generation = generate(&source, &GeneratorOptions::default(), None, None)?;
//! for file in &generation.files {
//!     println!("{}", file.path.display());
//! }
//! ```

pub mod cli;
pub mod generator;
pub mod ids;
pub mod logging;
pub mod spec;

pub use generator::{generate, GenerateError, GeneratedFile, Generation, GeneratorOptions};
pub use spec::{load_source_graph, ServiceDescription, SourceGraph};
