//! Inbound frame classification.
//!
//! Order of checks per frame:
//! 1. `error` present → [`Frame::Error`]
//! 2. `success` set → [`Frame::Ack`]
//! 3. `table` present → [`Frame::Data`]
//! 4. `info` present → [`Frame::Info`] (server welcome banner)
//!
//! Anything else is a [`FrameError`]. Callers log and drop; nothing here is
//! fatal to the connection.

use serde_json::Value;
use thiserror::Error;

use crate::ws::{DataFrame, Envelope, Topic};

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Error(String),
    Ack(Value),
    Info(String),
    Data(DataFrame),
}

#[derive(Error, Debug)]
pub enum FrameError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unclassified frame")]
    Unclassified,
}

/// Classify one raw frame.
pub fn classify(raw: &[u8]) -> Result<Frame, FrameError> {
    let env: Envelope = serde_json::from_slice(raw)?;

    if let Some(error) = env.error.filter(|e| !e.is_empty()) {
        return Ok(Frame::Error(error));
    }
    if env.success == Some(true) {
        return Ok(Frame::Ack(env.subscribe.unwrap_or(Value::Null)));
    }
    if let Some(table) = env.table {
        return Ok(Frame::Data(DataFrame {
            topic: Topic::from(table.as_str()),
            action: env.action.unwrap_or_default(),
            data: env.data.unwrap_or(Value::Null),
        }));
    }
    if let Some(info) = env.info {
        return Ok(Frame::Info(info));
    }
    Err(FrameError::Unclassified)
}
