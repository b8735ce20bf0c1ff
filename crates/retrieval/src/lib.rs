//! Client for the external retrieval-generation service
//!
//! The document store, embeddings and language model all live behind a
//! single HTTP endpoint: POST a query, receive an answer. Failures are
//! classified into the tagged `UpstreamError` taxonomy at this boundary
//! so no caller ever matches on error message text.

pub mod backend;

pub use backend::{HttpRetrievalBackend, RetrievalClientError};
