//! Process table collector for Linux.
//!
//! Reads the process table from the `/proc` filesystem, with a mock
//! filesystem for tests and non-Linux hosts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              ProcessScanner              │
//! │  - /proc/[pid]/stat     (pid, ppid, ...) │
//! │  - /proc/[pid]/status   (uid)            │
//! │  - /proc/[pid]/cmdline  (arguments)      │
//! │  - /proc/[pid]/task/    (thread count)   │
//! └─────────────────────┬────────────────────┘
//!                       │
//!                ┌──────▼──────┐
//!                │  FileSystem │ (trait)
//!                └──────┬──────┘
//!              ┌────────┴────────┐
//!       ┌──────▼──────┐   ┌──────▼──────┐
//!       │   RealFs    │   │   MockFs    │
//!       │  (Linux)    │   │ (Scenarios) │
//!       └─────────────┘   └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```
//! use proctree_core::collector::{MockFs, ProcessScanner, ScanOptions};
//!
//! let scanner = ProcessScanner::new(MockFs::typical_system(), "/proc");
//! let table = scanner.scan(ScanOptions::default()).unwrap();
//! assert!(table.contains(1));
//! ```

pub mod mock;
pub mod procfs;
pub mod traits;

pub use mock::MockFs;
pub use procfs::{CollectError, ProcessScanner, ScanOptions, UserResolver};
pub use traits::{FileSystem, RealFs};
