//! Library crate for usuarios-admin.
//!
//! This crate exposes the building blocks of the TUI:
//! - Usuario records and the form draft (`model`)
//! - Client-side form validation (`validate`)
//! - HTTP client and request/completion messages (`api`)
//! - Error and result types (`error`)
//! - Application state, transitions and event loop (`app`)
//! - In-memory search and sort (`search`)
//! - UI rendering (`ui`)
//! - Command-line configuration (`config`)
//!
//! It is used by the `usuarios-admin` binary and by tests.
#![deny(rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod model;
pub mod search;
pub mod ui;
pub mod validate;

pub use error::{ApiError, Result};
