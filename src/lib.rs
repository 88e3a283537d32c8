//! Reading-state core for an AI-augmented ebook reader.
//!
//! The [`progress::ProgressStore`] owns which book is open, where the reader
//! is, display preferences and the per-book cache of AI artifacts, writing
//! every change through to durable storage. The [`pagination::Paginator`]
//! splits the current chapter into pages that fit the visible container.
//! [`session::ReaderSession`] ties the two together behind a command surface.

pub mod ai;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod pagination;
pub mod progress;
pub mod remote;
pub mod session;
pub mod storage;
