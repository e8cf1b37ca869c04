//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed transport to the stocks backend.
//!
//! Adapters translate between domain request types and the wire; they contain
//! no caching or error-classification logic.

pub mod http;
