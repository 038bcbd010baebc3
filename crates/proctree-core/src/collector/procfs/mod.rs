//! Readers for the Linux `/proc` filesystem.
//!
//! This module provides parsers for per-process files and the scanner that
//! turns `/proc/[pid]/` directories into a process table.

pub mod parser;
pub mod process;

pub use parser::UserResolver;
pub use process::{CollectError, MAX_PROCESSES, ProcessScanner, ScanOptions};
