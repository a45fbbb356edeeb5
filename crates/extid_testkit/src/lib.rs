//! # extid testkit
//!
//! Test utilities for the extid identifier index.
//!
//! This crate provides:
//! - Temporary Odoo-style projects with modules, manifests and data files
//! - A small markup parser for `<record>`, `<template>` and friends
//! - Property-based test generators using proptest
//! - Golden vectors for the stored value layout
//!
//! ## Usage
//!
//! ```rust,ignore
//! use extid_testkit::prelude::*;
//!
//! #[test]
//! fn finds_action() {
//!     let project = TestProject::new();
//!     project.add_module("sale", &["base"]);
//!     let index = project.open_in_memory();
//!     // ... index files and query
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod parser;
pub mod vectors;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::init_tracing;
    pub use crate::parser::*;
    pub use crate::vectors::*;
}

pub use fixtures::*;
pub use generators::*;
pub use parser::*;
pub use vectors::*;

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber honouring `RUST_LOG`.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
