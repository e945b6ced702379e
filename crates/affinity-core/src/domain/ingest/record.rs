//! Ingestion records
//!
//! A firehose record carries a base64 payload that decodes to a JSON link
//! request. Payload fields are camelCase and all optional at the wire level;
//! missing required fields are reported when the request is built.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::domain::edge::{Direction, FieldCheck};
use crate::domain::graph::LinkRequest;
use crate::error::{Error, Result};

/// One record of an ingestion batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FirehoseRecord {
    pub record_id: String,
    /// Base64-encoded JSON payload
    pub data: String,
}

impl FirehoseRecord {
    pub fn new(record_id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            data: data.into(),
        }
    }

    /// Encode a JSON payload into a record
    pub fn encode(record_id: impl Into<String>, payload: &serde_json::Value) -> Result<Self> {
        let json = serde_json::to_vec(payload)?;
        Ok(Self::new(record_id, STANDARD.encode(json)))
    }

    pub fn decode(&self) -> Result<RawLinkRequest> {
        let bytes = STANDARD
            .decode(self.data.trim())
            .map_err(|e| Error::Decode(format!("record {}: invalid base64: {}", self.record_id, e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::Decode(format!("record {}: invalid JSON payload: {}", self.record_id, e)))
    }
}

/// Decoded payload before validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLinkRequest {
    pub namespace: Option<String>,
    pub entity: Option<String>,
    pub from_node: Option<String>,
    pub to_node: Option<String>,
    pub direction: Option<String>,
    /// Reinforcement weight
    pub distance: Option<f64>,
    pub absolute_distance: Option<f64>,
}

impl RawLinkRequest {
    /// Build a validated link request
    pub fn into_link(self) -> Result<LinkRequest> {
        let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
        FieldCheck::new()
            .check("entity", present(&self.entity))
            .check("from_node", present(&self.from_node))
            .check("to_node", present(&self.to_node))
            .finish("ingestion record is missing required fields")?;

        let direction = Direction::parse_field("direction", self.direction.as_deref())?;
        let request = LinkRequest {
            namespace: self.namespace.filter(|ns| !ns.trim().is_empty()),
            entity: self.entity.unwrap_or_default(),
            from_node: self.from_node.unwrap_or_default(),
            to_node: self.to_node.unwrap_or_default(),
            direction,
            weight: self.distance.unwrap_or(1.0),
            absolute_distance: self.absolute_distance,
        };
        request.validate()?;
        Ok(request)
    }
}
