//! One-off ingestion of the legal corpus into the knowledge store.
//!
//! Runs from the `ingest` subcommand or in the background on `serve` when
//! `INGEST_ON_STARTUP` is set. Never part of the request path.

pub mod services;

pub use services::IngestionService;
