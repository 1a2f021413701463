// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Routes validated messages to graph operations.
//!
//! Every [`Action`] has exactly one handler; the match in
//! [`Dispatcher::dispatch`] is total, so adding an action without a handler
//! fails to compile. Handlers parse their payload into a typed parameter
//! struct, run the operation, and commit the pre-mutation snapshot to history
//! only when the operation succeeded.

use std::fmt;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::model::{EdgeType, Graph, Node, NodeId, Urgency};
use crate::ops::{
    self, LabelPolicy, NewNode, NodePatch, OpError, PositionUpdate,
};
use crate::protocol::{Action, Message, Response};
use crate::session::Session;
use crate::store::GraphFolder;

#[derive(Debug)]
pub enum DispatchError {
    /// The payload did not parse into the handler's parameter struct.
    Payload(String),
    Op(OpError),
    Serialize(serde_json::Error),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Payload(detail) => write!(f, "invalid payload: {detail}"),
            Self::Op(err) => err.fmt(f),
            Self::Serialize(err) => write!(f, "cannot serialize response payload: {err}"),
        }
    }
}

impl std::error::Error for DispatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Payload(_) => None,
            Self::Op(err) => Some(err),
            Self::Serialize(err) => Some(err),
        }
    }
}

impl From<OpError> for DispatchError {
    fn from(err: OpError) -> Self {
        Self::Op(err)
    }
}

/// Stateless message router; the graph folder, when present, is written
/// after every successful mutation.
#[derive(Debug, Default)]
pub struct Dispatcher {
    folder: Option<GraphFolder>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(folder: GraphFolder) -> Self {
        Self {
            folder: Some(folder),
        }
    }

    /// Validate raw JSON and dispatch it. Validation failures never reach a
    /// handler; an unknown action answers under its own name so the caller
    /// can correlate, everything else answers as an error response.
    pub fn dispatch_value(&self, session: &mut Session, value: &Value) -> Response {
        match Message::from_value(value) {
            Ok(message) => self.dispatch(session, &message),
            Err(err) => Response::from_protocol_error(err),
        }
    }

    pub fn dispatch(&self, session: &mut Session, message: &Message) -> Response {
        let result = match message.action {
            Action::NewNode => self.handle_new_node(session, message),
            Action::CanvasDblclick => self.handle_canvas_dblclick(session, message),
            Action::CanvasClick => self.handle_select(session, message),
            Action::CanvasContextmenu => self.handle_context_menu(session, message),
            Action::EditNode => self.handle_edit_node(session, message),
            Action::DeleteNode => self.handle_delete_node(session, message),
            Action::Pos => self.handle_pos(session, message),
            Action::Reparent => self.handle_reparent(session, message),
            Action::CenterNode => self.handle_center_node(session, message),
            Action::SelectNode => self.handle_select(session, message),
            Action::Undo => self.handle_undo(session),
            Action::Redo => self.handle_redo(session),
        };

        match result {
            Ok(payload) => Response::completed(message.action, payload),
            Err(err) => Response::failed(message.action, err.to_string()),
        }
    }

    fn persist(&self, graph: &Graph) {
        if let Some(folder) = &self.folder {
            if let Err(err) = folder.save_graph(graph) {
                log::warn!("cannot persist graph to {:?}: {err}", folder.root());
            }
        }
    }

    fn create_node(
        &self,
        session: &mut Session,
        params: NewNodeParams,
    ) -> Result<Map<String, Value>, DispatchError> {
        let new_node = NewNode {
            label: params.label.unwrap_or_default(),
            description: params.description.unwrap_or_default(),
            urgency: params.urgency.unwrap_or_default(),
            tag: params.tag.unwrap_or_default(),
            parent: params.parent,
            edge_type: params.edge_type.unwrap_or_default(),
            x: params.x,
            y: params.y,
        };

        let (graph, history) = session.parts_mut();
        let before = graph.snapshot();
        let was_empty = graph.is_empty();
        let id = ops::insert_node(graph, new_node, LabelPolicy::Placeholder)?;
        // The first node becomes the focus automatically.
        if was_empty {
            graph.set_central(Some(id));
        }
        history.record_snapshot(before);
        self.persist(session.graph());

        let node = session.graph().node(id);
        let mut payload = Map::new();
        payload.insert("node".to_owned(), node_value(node)?);
        payload.insert(
            "central".to_owned(),
            central_value(session.graph().central()),
        );
        Ok(payload)
    }

    fn handle_new_node(
        &self,
        session: &mut Session,
        message: &Message,
    ) -> Result<Map<String, Value>, DispatchError> {
        let params: NewNodeParams = parse_payload(message)?;
        self.create_node(session, params)
    }

    /// Double-click on empty canvas creates a placeholder node at the click
    /// position.
    fn handle_canvas_dblclick(
        &self,
        session: &mut Session,
        message: &Message,
    ) -> Result<Map<String, Value>, DispatchError> {
        let params: CanvasDblclickParams = parse_payload(message)?;
        self.create_node(
            session,
            NewNodeParams {
                label: params.label,
                x: Some(params.x),
                y: Some(params.y),
                ..NewNodeParams::default()
            },
        )
    }

    fn handle_edit_node(
        &self,
        session: &mut Session,
        message: &Message,
    ) -> Result<Map<String, Value>, DispatchError> {
        let params: EditNodeParams = parse_payload(message)?;
        let patch = NodePatch {
            label: params.label,
            description: params.description,
            urgency: params.urgency,
            tag: params.tag,
            edge_type: params.edge_type,
        };

        let (graph, history) = session.parts_mut();
        let before = graph.snapshot();
        ops::edit_node(graph, params.id, patch)?;
        history.record_snapshot(before);
        self.persist(session.graph());

        let mut payload = Map::new();
        payload.insert("node".to_owned(), node_value(session.graph().node(params.id))?);
        Ok(payload)
    }

    fn handle_delete_node(
        &self,
        session: &mut Session,
        message: &Message,
    ) -> Result<Map<String, Value>, DispatchError> {
        let params: NodeRefParams = parse_payload(message)?;

        let (graph, history) = session.parts_mut();
        let before = graph.snapshot();
        let outcome = ops::delete_subtree(graph, params.id)?;
        // A deleted focus falls back to the lowest surviving id.
        if outcome.central_removed {
            let replacement = graph.first_node_id();
            graph.set_central(replacement);
        }
        history.record_snapshot(before);
        self.persist(session.graph());

        let mut payload = Map::new();
        payload.insert(
            "removed".to_owned(),
            Value::Array(outcome.removed.iter().map(|id| Value::from(*id)).collect()),
        );
        payload.insert(
            "central".to_owned(),
            central_value(session.graph().central()),
        );
        Ok(payload)
    }

    fn handle_reparent(
        &self,
        session: &mut Session,
        message: &Message,
    ) -> Result<Map<String, Value>, DispatchError> {
        let params: ReparentParams = parse_payload(message)?;

        let (graph, history) = session.parts_mut();
        let before = graph.snapshot();
        ops::reparent(graph, params.child, params.parent)?;
        history.record_snapshot(before);
        self.persist(session.graph());

        let mut payload = Map::new();
        payload.insert("child".to_owned(), Value::from(params.child));
        payload.insert("parent".to_owned(), Value::from(params.parent));
        Ok(payload)
    }

    /// `pos` carries either a single `{id, x, y}` or a bulk
    /// `{"positions": {"<id>": {x, y}}}` layout sweep. The bulk form applies
    /// every valid entry and completes with a per-entry report; the single
    /// form fails outright on an invalid coordinate.
    fn handle_pos(
        &self,
        session: &mut Session,
        message: &Message,
    ) -> Result<Map<String, Value>, DispatchError> {
        if message.payload.contains_key("positions") {
            let params: BulkPosParams = parse_payload(message)?;
            return self.handle_bulk_pos(session, params);
        }

        let params: PosParams = parse_payload(message)?;
        let (graph, history) = session.parts_mut();
        let before = graph.snapshot();
        ops::set_position(graph, params.id, params.x, params.y)?;
        history.record_snapshot(before);
        self.persist(session.graph());

        let mut payload = Map::new();
        payload.insert("id".to_owned(), Value::from(params.id));
        payload.insert("x".to_owned(), Value::from(params.x));
        payload.insert("y".to_owned(), Value::from(params.y));
        Ok(payload)
    }

    fn handle_bulk_pos(
        &self,
        session: &mut Session,
        params: BulkPosParams,
    ) -> Result<Map<String, Value>, DispatchError> {
        let mut updates = Vec::new();
        let mut rejected = Vec::new();

        for (raw_id, raw_coords) in &params.positions {
            let id = match raw_id.trim().parse::<NodeId>() {
                Ok(id) => id,
                Err(_) => {
                    rejected.push(rejection_value(
                        Value::String(raw_id.clone()),
                        format!("invalid node id '{raw_id}'"),
                    ));
                    continue;
                }
            };
            match serde_json::from_value::<Coords>(raw_coords.clone()) {
                Ok(coords) => updates.push(PositionUpdate {
                    id,
                    x: coords.x,
                    y: coords.y,
                }),
                Err(err) => rejected.push(rejection_value(
                    Value::from(id),
                    format!("invalid coordinates: {err}"),
                )),
            }
        }

        let (graph, history) = session.parts_mut();
        let before = graph.snapshot();
        let report = ops::apply_positions(graph, &updates);
        let applied = report.applied.clone();
        for (id, err) in report.rejected {
            rejected.push(rejection_value(Value::from(id), err.to_string()));
        }

        // Nothing applied means nothing to undo or persist.
        if !applied.is_empty() {
            history.record_snapshot(before);
            self.persist(session.graph());
        }

        let mut payload = Map::new();
        payload.insert(
            "applied".to_owned(),
            Value::Array(applied.into_iter().map(Value::from).collect()),
        );
        payload.insert("rejected".to_owned(), Value::Array(rejected));
        Ok(payload)
    }

    fn handle_center_node(
        &self,
        session: &mut Session,
        message: &Message,
    ) -> Result<Map<String, Value>, DispatchError> {
        let params: CenterNodeParams = parse_payload(message)?;

        if !session.graph().contains(params.id) {
            return Err(OpError::NotFound {
                kind: ops::RefKind::Node,
                id: params.id,
            }
            .into());
        }
        session.graph_mut().set_central(Some(params.id));
        self.persist(session.graph());

        let mut payload = Map::new();
        payload.insert("central".to_owned(), Value::from(params.id));
        if let Some(x) = params.x {
            payload.insert("x".to_owned(), Value::from(x));
        }
        if let Some(y) = params.y {
            payload.insert("y".to_owned(), Value::from(y));
        }
        Ok(payload)
    }

    /// Selection is a focus change, not an edit: it does not enter the undo
    /// history. A missing or null id clears the selection.
    fn handle_select(
        &self,
        session: &mut Session,
        message: &Message,
    ) -> Result<Map<String, Value>, DispatchError> {
        let params: SelectParams = parse_payload(message)?;

        match params.id {
            Some(id) => {
                if !session.graph_mut().set_central(Some(id)) {
                    return Err(OpError::NotFound {
                        kind: ops::RefKind::Node,
                        id,
                    }
                    .into());
                }
            }
            None => {
                session.graph_mut().set_central(None);
            }
        }
        self.persist(session.graph());

        let mut payload = Map::new();
        payload.insert(
            "selected".to_owned(),
            central_value(session.graph().central()),
        );
        Ok(payload)
    }

    /// Context menu needs the node's current state, nothing changes.
    fn handle_context_menu(
        &self,
        session: &mut Session,
        message: &Message,
    ) -> Result<Map<String, Value>, DispatchError> {
        let params: NodeRefParams = parse_payload(message)?;
        let node = session.graph().node(params.id);
        if node.is_none() {
            return Err(OpError::NotFound {
                kind: ops::RefKind::Node,
                id: params.id,
            }
            .into());
        }

        let mut payload = Map::new();
        payload.insert("node".to_owned(), node_value(node)?);
        Ok(payload)
    }

    fn handle_undo(&self, session: &mut Session) -> Result<Map<String, Value>, DispatchError> {
        let (graph, history) = session.parts_mut();
        let applied = history.undo(graph);
        if applied {
            self.persist(session.graph());
        }

        let mut payload = Map::new();
        payload.insert("applied".to_owned(), Value::Bool(applied));
        Ok(payload)
    }

    fn handle_redo(&self, session: &mut Session) -> Result<Map<String, Value>, DispatchError> {
        let (graph, history) = session.parts_mut();
        let applied = history.redo(graph);
        if applied {
            self.persist(session.graph());
        }

        let mut payload = Map::new();
        payload.insert("applied".to_owned(), Value::Bool(applied));
        Ok(payload)
    }
}

fn parse_payload<T: serde::de::DeserializeOwned>(message: &Message) -> Result<T, DispatchError> {
    serde_json::from_value(Value::Object(message.payload.clone()))
        .map_err(|err| DispatchError::Payload(err.to_string()))
}

fn node_value(node: Option<&Node>) -> Result<Value, DispatchError> {
    match node {
        Some(node) => serde_json::to_value(node).map_err(DispatchError::Serialize),
        None => Ok(Value::Null),
    }
}

fn central_value(central: Option<NodeId>) -> Value {
    central.map(Value::from).unwrap_or(Value::Null)
}

fn rejection_value(id: Value, reason: String) -> Value {
    let mut entry = Map::new();
    entry.insert("id".to_owned(), id);
    entry.insert("reason".to_owned(), Value::String(reason));
    Value::Object(entry)
}

// Frontends are loose about numeric types, so ids and coordinates accept
// both JSON numbers and numeric strings.

fn de_node_id<'de, D>(deserializer: D) -> Result<NodeId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(NodeId),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(id) => Ok(id),
        Raw::Str(raw) => raw
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid node id '{raw}'"))),
    }
}

fn de_opt_node_id<'de, D>(deserializer: D) -> Result<Option<NodeId>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "de_node_id")] NodeId);

    let wrapper: Option<Wrapper> = Option::deserialize(deserializer)?;
    Ok(wrapper.map(|Wrapper(id)| id))
}

/// Numeric strings parse through `f64::from_str`, so `"NaN"` becomes a NaN
/// value here and is rejected by coordinate validation, not by parsing.
fn de_coord<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(f64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Num(value) => Ok(value),
        Raw::Str(raw) => raw
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid coordinate '{raw}'"))),
    }
}

fn de_opt_coord<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrapper(#[serde(deserialize_with = "de_coord")] f64);

    let wrapper: Option<Wrapper> = Option::deserialize(deserializer)?;
    Ok(wrapper.map(|Wrapper(value)| value))
}

#[derive(Debug, Default, Deserialize)]
struct NewNodeParams {
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    urgency: Option<Urgency>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default, alias = "parent_id", deserialize_with = "de_opt_node_id")]
    parent: Option<NodeId>,
    #[serde(default)]
    edge_type: Option<EdgeType>,
    #[serde(default, deserialize_with = "de_opt_coord")]
    x: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_coord")]
    y: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct CanvasDblclickParams {
    #[serde(deserialize_with = "de_coord")]
    x: f64,
    #[serde(deserialize_with = "de_coord")]
    y: f64,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EditNodeParams {
    #[serde(deserialize_with = "de_node_id")]
    id: NodeId,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    urgency: Option<Urgency>,
    #[serde(default)]
    tag: Option<String>,
    #[serde(default)]
    edge_type: Option<EdgeType>,
}

#[derive(Debug, Deserialize)]
struct NodeRefParams {
    #[serde(deserialize_with = "de_node_id")]
    id: NodeId,
}

#[derive(Debug, Deserialize)]
struct ReparentParams {
    #[serde(alias = "child_id", deserialize_with = "de_node_id")]
    child: NodeId,
    #[serde(alias = "parent_id", deserialize_with = "de_node_id")]
    parent: NodeId,
}

#[derive(Debug, Deserialize)]
struct PosParams {
    #[serde(deserialize_with = "de_node_id")]
    id: NodeId,
    #[serde(deserialize_with = "de_coord")]
    x: f64,
    #[serde(deserialize_with = "de_coord")]
    y: f64,
}

#[derive(Debug, Deserialize)]
struct BulkPosParams {
    positions: serde_json::Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Coords {
    #[serde(deserialize_with = "de_coord")]
    x: f64,
    #[serde(deserialize_with = "de_coord")]
    y: f64,
}

#[derive(Debug, Deserialize)]
struct CenterNodeParams {
    #[serde(deserialize_with = "de_node_id")]
    id: NodeId,
    #[serde(default, deserialize_with = "de_opt_coord")]
    x: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_coord")]
    y: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SelectParams {
    #[serde(default, deserialize_with = "de_opt_node_id")]
    id: Option<NodeId>,
}

#[cfg(test)]
mod tests;
