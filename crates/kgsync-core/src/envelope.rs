//! `POST /data` envelope
//!
//! The backend receives every record, batch and diagnostic wrapped in the same
//! envelope; `payload` is itself a JSON document encoded as a string.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of the envelope's `type_` field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadType {
    Diagnostic,
    Block,
    Page,
    BlockBatch,
    PageBatch,
    TestReferences,
}

impl PayloadType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Diagnostic => "diagnostic",
            Self::Block => "block",
            Self::Page => "page",
            Self::BlockBatch => "block_batch",
            Self::PageBatch => "page_batch",
            Self::TestReferences => "test_references",
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request body of `POST /data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub source: String,

    /// ISO-8601 send time
    pub timestamp: String,

    #[serde(rename = "graphName")]
    pub graph_name: String,

    #[serde(rename = "type_")]
    pub payload_type: PayloadType,

    /// JSON-encoded record, batch or diagnostic object
    pub payload: String,
}

impl Envelope {
    /// Encode `payload` and stamp the envelope with the current time
    pub fn new<T: Serialize + ?Sized>(
        source: impl Into<String>,
        graph_name: impl Into<String>,
        payload_type: PayloadType,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            source: source.into(),
            timestamp: Utc::now().to_rfc3339(),
            graph_name: graph_name.into(),
            payload_type,
            payload: serde_json::to_string(payload)?,
        })
    }

    /// Decode the string payload
    pub fn decode_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.payload)
    }
}
