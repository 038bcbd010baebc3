//! proctree-core: process tree library behind the `proctree` binary.
//!
//! Provides:
//! - `collector`: `/proc` scanner, filesystem abstraction, mock scenarios
//! - `model`: process records
//! - `table`: pid-indexed process table snapshot
//! - `tree`: forest builder and ancestor queries
//! - `render`: expanded and compact text renderers
//! - `provider`: live and recorded table sources
//!
//! Data flows one way: table → forest → renderer. The table is built once
//! per run and never re-read while rendering.

pub mod collector;
pub mod model;
pub mod provider;
pub mod render;
pub mod table;
pub mod tree;
