//! Mock filesystem and pre-built `/proc` scenarios.
//!
//! Lets the scanner run without a Linux `/proc` filesystem.

mod filesystem;
mod scenarios;

pub use filesystem::MockFs;
