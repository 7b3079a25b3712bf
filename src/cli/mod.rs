//! # CLI Module
//!
//! Command-line interface of the `sdkgen` binary.
//!
//! ## Commands
//!
//! ### `generate`
//!
//! Generate a client crate from a service description:
//!
//! ```bash
//! sdkgen generate --description widgets.yaml --output widgets-client
//! ```
//!
//! Options:
//! - `--crate-name <NAME>` / `--crate-version <VERSION>` - override the package metadata
//! - `--overwrite-cargo-toml` - replace an existing Cargo.toml instead of merging it
//! - `--overwrite-lib-rs` - replace an existing `src/lib.rs`
//! - `--workspace-dependencies` - inherit dependencies, version and edition from the workspace
//! - `--omit-header` - leave the "generated" header off every file
//! - `--dependencies-config <FILE>` - dependency overrides (auto-detected next to the description)
//! - `--dry-run` - print the files that would be written
//! - `--format` - run `cargo fmt` on the result
//!
//! ### `check`
//!
//! Resolve and adapt a description and print its diagnostics:
//!
//! ```bash
//! sdkgen check --description widgets.yaml --deny-warnings
//! ```
//!
//! ## Usage from Code
//!
//! ```rust,ignore
//! use clap::Parser;
//! use sdkgen::cli::{run_cli, Cli};
//!
//! run_cli(Cli::parse())?;
//! ```

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands};
