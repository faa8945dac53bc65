//! HTTP implementation of [`kgsync_core::GraphBackend`]
//!
//! Talks JSON to the knowledge graph backend:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | availability | `GET /` |
//! | send envelope | `POST /data` |
//! | sync status | `GET /sync/status` |
//! | mark full sync | `POST /sync/update` |

mod client;
mod error;

pub use client::HttpBackendClient;
pub use error::{ClientError, ClientResult};
