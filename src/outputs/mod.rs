//! Output generation.
//!
//! # Submodules
//!
//! - [`json`]: Writes the [`StatusRecord`](crate::models::StatusRecord) to the status file
//!
//! # Output Structure
//!
//! ```text
//! <executable dir>/
//! └── status.json   # overwritten on every run
//! ```

pub mod json;
