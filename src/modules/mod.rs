//! Modules layer - Clients for the external collaborators
//!
//! The legal agent (model provider) and the knowledge store (document
//! ingestion and passage search) live behind traits so the request
//! lifecycle can be exercised without either service.

pub mod agent;
pub mod knowledge;
