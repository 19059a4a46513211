//! Save-document bridge for scripted front ends.
//!
//! This crate lets a scripted caller save bytes to a location the user picks in the platform's
//! "save file" dialog:
//! - Accepts a base64 payload with a suggested filename and MIME type
//! - Admits at most one save at a time, rejecting the rest as busy
//! - Launches the picker surface and waits for its completion signal
//! - Decodes the payload and writes it to the chosen destination
//! - Resolves or rejects the caller exactly once
//!
//! # Example
//! ```ignore
//! use savedoc::{SaveDocumentBridge, SaveOptions, DirectoryPicker, FsContentStore};
//!
//! let (picker, outcomes) = DirectoryPicker::new("/tmp/exports");
//! let bridge = Arc::new(SaveDocumentBridge::new(Arc::new(picker), Arc::new(FsContentStore::new())));
//! let _listener = bridge.clone().listen(outcomes);
//!
//! let saved = bridge.submit_save(SaveOptions::new("team.csv", data))?.wait().await?;
//! ```

pub mod bridge;
pub mod client;
pub mod config;
pub mod error;
pub mod picker;
pub mod request;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types
pub use bridge::{SaveDocumentBridge, SaveHandle};
pub use client::save_document_with_dialog;
pub use config::{Args, Config};
pub use error::{Rejection, Result, SaveError};
pub use picker::{DirectoryPicker, DocumentPicker, MockDocumentPicker, UnavailablePicker};
pub use request::*;
pub use storage::fs::FsContentStore;
pub use storage::in_memory::InMemoryContentStore;
pub use storage::{ByteSink, ContentStore};
