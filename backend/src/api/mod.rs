//! HTTP API module.
//!
//! Boundary layer for interactive front ends: uploads in, summary counts
//! and workbook bytes out, plus the pipeline log stream.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::{router, start_server};
pub use types::*;
