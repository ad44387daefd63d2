//! Question answering over uploaded log files.
//!
//! Lines are embedded into an exact in-memory [`index::VectorIndex`]; queries go
//! through a [`router::QueryRouter`] that either ranks lines by frequency
//! ("top N issues") or retrieves the nearest lines as context for a chat model.

pub mod chat;
pub mod config;
pub mod embedding;
pub mod error;
pub mod index;
pub mod openai;
pub mod router;
pub mod session;
pub mod upload;
pub mod vector_entry;
pub mod vector_ops;

pub use error::{LogsaiError, Result};
