//! Shared surface of the document store backing every collection.
//!
//! The program runs against a managed document database: single-document
//! atomic writes, server-generated ids, equality and order-by queries, and
//! nothing resembling a cross-document transaction. Each collection exposes
//! its own repository trait (see the `program` modules); this module carries
//! the error vocabulary they all share.

/// Error enumeration for document store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("document not found")]
    NotFound,
    #[error("document already exists")]
    Conflict,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
