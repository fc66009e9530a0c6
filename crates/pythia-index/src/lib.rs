//! Pythia Index - Chunking and Retrieval
//!
//! This crate provides the ingestion-time chunker and the retrieval index
//! contract for the Pythia document assistant:
//! - Chunk: boundary-preferring overlapping text segmentation
//! - Client: the `IndexClient` trait a retrieval backend must satisfy
//! - Memory: an in-process index for tests and local corpora

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chunk;
pub mod client;
pub mod error;
pub mod memory;

pub use chunk::{split, Chunk, ChunkerConfig};
pub use client::{DocumentEntry, IndexClient, SearchHit};
pub use error::{Error, Result};
pub use memory::MemoryIndex;
