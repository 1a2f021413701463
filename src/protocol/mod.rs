// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The message envelope exchanged with the presentation layer.
//!
//! One JSON object per user action in, one response object out. Structural
//! validation ([`Message::from_value`]) is a pure function: it either yields
//! a typed message or a [`ProtocolError`] naming what is wrong, and never
//! touches any handler.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Marker appended to an action name to form the response action.
pub const RESPONSE_SUFFIX: &str = "_response";

/// Response action used when the inbound message was too malformed to name
/// an action at all.
pub const ERROR_RESPONSE_ACTION: &str = "error_response";

/// Where a message originated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Frontend,
    Backend,
    /// Internal origin used by the test suite and failure injection.
    Test,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frontend => "frontend",
            Self::Backend => "backend",
            Self::Test => "test",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "frontend" => Some(Self::Frontend),
            "backend" => Some(Self::Backend),
            "test" => Some(Self::Test),
            _ => None,
        }
    }
}

/// The closed action vocabulary.
///
/// Legacy aliases (`delete`, `create_node`) normalize to their modern
/// variants both in [`Action::parse`] and through serde.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    CanvasClick,
    CanvasDblclick,
    CanvasContextmenu,
    #[serde(alias = "create_node")]
    NewNode,
    EditNode,
    #[serde(alias = "delete")]
    DeleteNode,
    Pos,
    Reparent,
    CenterNode,
    SelectNode,
    Undo,
    Redo,
}

impl Action {
    pub const ALL: [Action; 12] = [
        Action::CanvasClick,
        Action::CanvasDblclick,
        Action::CanvasContextmenu,
        Action::NewNode,
        Action::EditNode,
        Action::DeleteNode,
        Action::Pos,
        Action::Reparent,
        Action::CenterNode,
        Action::SelectNode,
        Action::Undo,
        Action::Redo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::CanvasClick => "canvas_click",
            Self::CanvasDblclick => "canvas_dblclick",
            Self::CanvasContextmenu => "canvas_contextmenu",
            Self::NewNode => "new_node",
            Self::EditNode => "edit_node",
            Self::DeleteNode => "delete_node",
            Self::Pos => "pos",
            Self::Reparent => "reparent",
            Self::CenterNode => "center_node",
            Self::SelectNode => "select_node",
            Self::Undo => "undo",
            Self::Redo => "redo",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        // Legacy aliases first, then the canonical names.
        match raw {
            "delete" => return Some(Self::DeleteNode),
            "create_node" => return Some(Self::NewNode),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == raw)
    }

    /// Response action name; total over the enum by construction.
    pub fn response_name(self) -> String {
        format!("{}{RESPONSE_SUFFIX}", self.as_str())
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing state of a message.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// An inbound request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Message {
    pub message_id: String,
    pub source: Source,
    pub action: Action,
    pub payload: Map<String, Value>,
    /// Unix milliseconds.
    pub timestamp: f64,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub error: Option<String>,
}

impl Message {
    pub fn new(source: Source, action: Action, payload: Map<String, Value>) -> Self {
        Self {
            message_id: next_message_id(),
            source,
            action,
            payload,
            timestamp: unix_millis(),
            status: Status::Pending,
            error: None,
        }
    }

    /// A fresh message carrying the same logical content: new id, new
    /// timestamp, pending status. Used by the queue's retry path.
    pub fn retry(&self) -> Self {
        Self {
            message_id: next_message_id(),
            source: self.source,
            action: self.action,
            payload: self.payload.clone(),
            timestamp: unix_millis(),
            status: Status::Pending,
            error: None,
        }
    }

    /// Structural validation of an untrusted JSON value.
    ///
    /// Checks field presence and types one by one so the error can name the
    /// offending field; deterministic and side-effect free.
    pub fn from_value(value: &Value) -> Result<Self, ProtocolError> {
        let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;

        let message_id = require_str(object, "message_id")?.to_owned();

        let source_raw = require_str(object, "source")?;
        let source = Source::parse(source_raw).ok_or_else(|| ProtocolError::UnknownSource {
            source: source_raw.to_owned(),
        })?;

        let action_raw = require_str(object, "action")?;
        let action = Action::parse(action_raw).ok_or_else(|| ProtocolError::UnknownAction {
            action: action_raw.to_owned(),
        })?;

        let payload = match object.get("payload") {
            None => return Err(ProtocolError::MissingField { field: "payload" }),
            Some(Value::Object(payload)) => payload.clone(),
            Some(_) => {
                return Err(ProtocolError::WrongType {
                    field: "payload",
                    expected: "object",
                })
            }
        };

        let timestamp = match object.get("timestamp") {
            None => return Err(ProtocolError::MissingField { field: "timestamp" }),
            Some(Value::Number(number)) => number.as_f64().unwrap_or(0.0),
            Some(_) => {
                return Err(ProtocolError::WrongType {
                    field: "timestamp",
                    expected: "number",
                })
            }
        };

        Ok(Self {
            message_id,
            source,
            action,
            payload,
            timestamp,
            status: Status::Pending,
            error: None,
        })
    }

    /// Parse one line of transport input.
    pub fn from_json_str(raw: &str) -> Result<Self, ProtocolError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|err| ProtocolError::InvalidJson {
                detail: err.to_string(),
            })?;
        Self::from_value(&value)
    }
}

/// An outbound response envelope. `source` is always the backend; `action`
/// is the originating action suffixed [`RESPONSE_SUFFIX`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Response {
    pub message_id: String,
    pub source: Source,
    pub action: String,
    pub payload: Map<String, Value>,
    pub timestamp: f64,
    pub status: Status,
    #[serde(default)]
    pub error: Option<String>,
}

impl Response {
    pub fn completed(action: Action, payload: Map<String, Value>) -> Self {
        Self {
            message_id: next_message_id(),
            source: Source::Backend,
            action: action.response_name(),
            payload,
            timestamp: unix_millis(),
            status: Status::Completed,
            error: None,
        }
    }

    pub fn failed(action: Action, error: impl Into<String>) -> Self {
        Self::failed_raw(action.as_str(), error)
    }

    /// Failure path for raw action names; the one place responses are built
    /// from a string, reserved for externally-originated unknown actions and
    /// malformed envelopes.
    ///
    /// The error string lands both in the `error` field and under the
    /// payload `error` key so either convention is inspectable.
    pub fn failed_raw(action: &str, error: impl Into<String>) -> Self {
        let error = error.into();
        let mut payload = Map::new();
        payload.insert("error".to_owned(), Value::String(error.clone()));
        Self {
            message_id: next_message_id(),
            source: Source::Backend,
            action: format!("{action}{RESPONSE_SUFFIX}"),
            payload,
            timestamp: unix_millis(),
            status: Status::Failed,
            error: Some(error),
        }
    }

    /// Failure response for input that never yielded a valid envelope.
    pub fn invalid(error: impl Into<String>) -> Self {
        let mut response = Self::failed_raw("", error);
        response.action = ERROR_RESPONSE_ACTION.to_owned();
        response
    }

    /// The one mapping from validation failures to responses, shared by
    /// every transport. An unknown action answers under its own name so the
    /// caller can correlate; everything else answers as an error response.
    pub fn from_protocol_error(err: ProtocolError) -> Self {
        match err {
            ProtocolError::UnknownAction { action } => {
                let detail = format!("unknown action '{action}'");
                Self::failed_raw(&action, detail)
            }
            err => Self::invalid(err.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    NotAnObject,
    MissingField { field: &'static str },
    WrongType { field: &'static str, expected: &'static str },
    UnknownSource { source: String },
    UnknownAction { action: String },
    InvalidJson { detail: String },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => f.write_str("invalid message format: not a JSON object"),
            Self::MissingField { field } => {
                write!(f, "invalid message format: missing field '{field}'")
            }
            Self::WrongType { field, expected } => {
                write!(f, "invalid message format: field '{field}' must be a {expected}")
            }
            Self::UnknownSource { source } => {
                write!(f, "invalid message format: unknown source '{source}'")
            }
            Self::UnknownAction { action } => write!(f, "unknown action '{action}'"),
            Self::InvalidJson { detail } => write!(f, "invalid message format: {detail}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

fn require_str<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ProtocolError> {
    match object.get(field) {
        None => Err(ProtocolError::MissingField { field }),
        Some(Value::String(value)) => Ok(value),
        Some(_) => Err(ProtocolError::WrongType {
            field,
            expected: "string",
        }),
    }
}

static MESSAGE_SEQ: AtomicU64 = AtomicU64::new(0);

fn next_message_id() -> String {
    let seq = MESSAGE_SEQ.fetch_add(1, Ordering::Relaxed);
    format!("m-{}-{seq}", unix_millis() as u64)
}

pub fn unix_millis() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as f64)
        .unwrap_or(0.0)
}
