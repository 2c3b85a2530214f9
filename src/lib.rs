//! Notate - `@Annotation(...)` directives in TypeScript doc comments
//!
//! Notate loads TypeScript sources into a declaration/symbol model, finds
//! annotation calls in the doc comments attached to declarations, resolves
//! the dotted references among their arguments, and indexes the result. A
//! pipeline of user steps runs on top, and a dispatcher hands each
//! annotation to a typed handler registered for its name.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface (`check`, `list`, `init`)
//! - `config`: Configuration file loading and parsing
//! - `core`: Source model, scanner, resolver, catalog, pipeline and dispatch
//! - `diagnostics`: Non-fatal findings and their locations
//! - `utils`: Shared utility functions

pub mod cli;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod utils;
