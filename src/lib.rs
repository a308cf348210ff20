//! Compile-time validation schemas from static type shapes.
//!
//! A host type checker exports resolved types as a [`descriptor`] table; the
//! [`walker`] turns one type into a schema [`fragment`], and the [`locator`]
//! replaces calls of the designated `schema<T>()` function in a compiled
//! [`syntax`] unit with that literal.
pub mod annotation;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod fragment;
pub mod jq_exec;
pub mod locator;
pub mod oracle;
pub mod path_de;
pub mod syntax;
pub mod walker;

pub use config::{Config, Mode};
pub use descriptor::{DescriptorTable, TypeId};
pub use error::{Error, Result};
pub use fragment::Fragment;
pub use locator::Locator;
pub use oracle::{TypeOracle, TypeShape};
pub use walker::Walker;
