// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Naiad-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Naiad and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde_json::{json, Value};

use crate::model::{EdgeType, Graph, NodeId, PLACEHOLDER_LABEL};
use crate::ops::{insert_node, LabelPolicy, NewNode};
use crate::protocol::{Action, Message, Response, Source, Status, ERROR_RESPONSE_ACTION};
use crate::session::Session;

use super::Dispatcher;

fn message(action: Action, payload: Value) -> Message {
    Message::new(
        Source::Test,
        action,
        payload.as_object().expect("payload object").clone(),
    )
}

fn add_node(graph: &mut Graph, label: &str, parent: Option<NodeId>) -> NodeId {
    insert_node(
        graph,
        NewNode {
            label: label.to_owned(),
            parent,
            ..NewNode::default()
        },
        LabelPolicy::Reject,
    )
    .expect("insert")
}

/// Root (central) with two children.
fn seeded_session() -> (Session, NodeId, NodeId, NodeId) {
    let mut graph = Graph::new();
    let root = add_node(&mut graph, "Root", None);
    let left = add_node(&mut graph, "Left", Some(root));
    let right = add_node(&mut graph, "Right", Some(root));
    graph.set_central(Some(root));
    (Session::new(graph), root, left, right)
}

fn assert_completed(response: &Response, action: Action) {
    assert_eq!(response.status, Status::Completed, "{response:?}");
    assert_eq!(response.action, action.response_name());
    assert_eq!(response.source, Source::Backend);
    assert_eq!(response.error, None);
}

fn assert_failed(response: &Response, action: Action) {
    assert_eq!(response.status, Status::Failed, "{response:?}");
    assert_eq!(response.action, action.response_name());
    assert!(response.error.is_some());
    assert!(response.payload.contains_key("error"));
}

#[test]
fn new_node_into_empty_graph_becomes_central() {
    let dispatcher = Dispatcher::new();
    let mut session = Session::new(Graph::new());

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::NewNode, json!({"label": "First"})),
    );

    assert_completed(&response, Action::NewNode);
    assert_eq!(response.payload["node"]["label"], json!("First"));
    assert_eq!(session.graph().len(), 1);
    assert_eq!(session.graph().central(), session.graph().first_node_id());
    assert_eq!(response.payload["central"], json!(1));
}

#[test]
fn new_node_accepts_string_parent_id_and_empty_label() {
    let dispatcher = Dispatcher::new();
    let (mut session, root, ..) = seeded_session();

    let response = dispatcher.dispatch(
        &mut session,
        &message(
            Action::NewNode,
            json!({"label": "  ", "parent_id": root.to_string(), "urgency": "high"}),
        ),
    );

    assert_completed(&response, Action::NewNode);
    assert_eq!(response.payload["node"]["label"], json!(PLACEHOLDER_LABEL));
    assert_eq!(response.payload["node"]["parent"], json!(root));
    assert_eq!(response.payload["node"]["urgency"], json!("high"));
}

#[test]
fn edge_type_flows_through_create_and_edit() {
    let dispatcher = Dispatcher::new();
    let (mut session, root, ..) = seeded_session();

    let response = dispatcher.dispatch(
        &mut session,
        &message(
            Action::NewNode,
            json!({"label": "Contra", "parent": root, "edge_type": "contradicts"}),
        ),
    );
    assert_completed(&response, Action::NewNode);
    assert_eq!(response.payload["node"]["edge_type"], json!("contradicts"));
    let id = response.payload["node"]["id"].as_u64().expect("id");
    assert_eq!(
        session.graph().node(id).expect("node").edge_type,
        EdgeType::Contradicts
    );

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::EditNode, json!({"id": id, "edge_type": "supports"})),
    );
    assert_completed(&response, Action::EditNode);
    assert_eq!(response.payload["node"]["edge_type"], json!("supports"));
    assert_eq!(
        session.graph().node(id).expect("node").edge_type,
        EdgeType::Supports
    );
}

#[test]
fn canvas_dblclick_creates_a_placed_placeholder() {
    let dispatcher = Dispatcher::new();
    let mut session = Session::new(Graph::new());

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::CanvasDblclick, json!({"x": 120.5, "y": "-40"})),
    );

    assert_completed(&response, Action::CanvasDblclick);
    assert_eq!(response.payload["node"]["label"], json!(PLACEHOLDER_LABEL));
    assert_eq!(response.payload["node"]["x"], json!(120.5));
    assert_eq!(response.payload["node"]["y"], json!(-40.0));
}

#[test]
fn edit_node_unknown_id_fails() {
    let dispatcher = Dispatcher::new();
    let (mut session, ..) = seeded_session();

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::EditNode, json!({"id": 999, "label": "Nope"})),
    );

    assert_failed(&response, Action::EditNode);
    assert!(response.error.as_deref().unwrap().contains("not found"));
}

#[test]
fn failed_edit_leaves_no_undo_entry() {
    let dispatcher = Dispatcher::new();
    let (mut session, ..) = seeded_session();

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::EditNode, json!({"id": 999, "label": "Nope"})),
    );
    assert_failed(&response, Action::EditNode);

    let undo = dispatcher.dispatch(&mut session, &message(Action::Undo, json!({})));
    assert_completed(&undo, Action::Undo);
    assert_eq!(undo.payload["applied"], json!(false));
}

#[test]
fn delete_central_falls_back_to_lowest_surviving_id() {
    let dispatcher = Dispatcher::new();
    let (mut session, root, left, right) = seeded_session();

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::DeleteNode, json!({"id": left})),
    );
    assert_completed(&response, Action::DeleteNode);
    assert_eq!(response.payload["removed"], json!([left]));
    // Central survived, nothing changes.
    assert_eq!(session.graph().central(), Some(root));

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::DeleteNode, json!({"id": root})),
    );
    assert_completed(&response, Action::DeleteNode);
    assert_eq!(response.payload["removed"], json!([root, right]));
    assert_eq!(response.payload["central"], json!(null));
    assert!(session.graph().is_empty());
}

#[test]
fn reparent_cycle_fails_and_preserves_graph() {
    let dispatcher = Dispatcher::new();
    let (mut session, root, left, _) = seeded_session();
    let before = session.graph().clone();

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::Reparent, json!({"child": root, "parent": left})),
    );

    assert_failed(&response, Action::Reparent);
    assert!(response.error.as_deref().unwrap().contains("cycle"));
    assert_eq!(session.graph(), &before);
}

#[test]
fn reparent_accepts_legacy_field_names() {
    let dispatcher = Dispatcher::new();
    let (mut session, _, left, right) = seeded_session();

    let response = dispatcher.dispatch(
        &mut session,
        &message(
            Action::Reparent,
            json!({"child_id": left.to_string(), "parent_id": right}),
        ),
    );

    assert_completed(&response, Action::Reparent);
    assert_eq!(session.graph().node(left).expect("left").parent, Some(right));
}

#[test]
fn pos_with_nan_string_fails_and_leaves_node_unplaced() {
    let dispatcher = Dispatcher::new();
    let (mut session, root, ..) = seeded_session();

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::Pos, json!({"id": root, "x": "NaN", "y": 5})),
    );

    assert_failed(&response, Action::Pos);
    assert!(response.error.as_deref().unwrap().contains("invalid x"));
    assert_eq!(session.graph().node(root).expect("root").x, None);
}

#[test]
fn pos_single_update_applies_and_echoes() {
    let dispatcher = Dispatcher::new();
    let (mut session, root, ..) = seeded_session();

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::Pos, json!({"id": root.to_string(), "x": 3.5, "y": "-2"})),
    );

    assert_completed(&response, Action::Pos);
    assert_eq!(response.payload["x"], json!(3.5));
    let node = session.graph().node(root).expect("root");
    assert_eq!(node.x, Some(3.5));
    assert_eq!(node.y, Some(-2.0));
}

#[test]
fn bulk_pos_applies_valid_entries_and_reports_the_rest() {
    let dispatcher = Dispatcher::new();
    let (mut session, root, left, _) = seeded_session();

    let mut positions = serde_json::Map::new();
    positions.insert(root.to_string(), json!({"x": 1.0, "y": 2.0}));
    positions.insert(left.to_string(), json!({"x": "NaN", "y": 0.0}));
    positions.insert("oops".to_owned(), json!({"x": 0.0, "y": 0.0}));
    positions.insert("999".to_owned(), json!({"x": 9.0, "y": 9.0}));

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::Pos, json!({"positions": positions})),
    );

    assert_completed(&response, Action::Pos);
    assert_eq!(response.payload["applied"], json!([root]));
    let rejected = response.payload["rejected"].as_array().expect("rejected");
    assert_eq!(rejected.len(), 3);
    assert_eq!(session.graph().node(root).expect("root").x, Some(1.0));
    assert_eq!(session.graph().node(left).expect("left").x, None);
}

#[test]
fn select_node_moves_focus_without_recording_history() {
    let dispatcher = Dispatcher::new();
    let (mut session, root, left, _) = seeded_session();

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::SelectNode, json!({"id": left})),
    );
    assert_completed(&response, Action::SelectNode);
    assert_eq!(session.graph().central(), Some(left));

    // Undo has nothing recorded; focus stays where it is.
    let undo = dispatcher.dispatch(&mut session, &message(Action::Undo, json!({})));
    assert_eq!(undo.payload["applied"], json!(false));
    assert_eq!(session.graph().central(), Some(left));

    let response = dispatcher.dispatch(&mut session, &message(Action::SelectNode, json!({})));
    assert_completed(&response, Action::SelectNode);
    assert_eq!(response.payload["selected"], json!(null));
    assert_eq!(session.graph().central(), None);

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::CanvasClick, json!({"id": root})),
    );
    assert_completed(&response, Action::CanvasClick);
    assert_eq!(session.graph().central(), Some(root));
}

#[test]
fn center_node_rejects_unknown_ids() {
    let dispatcher = Dispatcher::new();
    let (mut session, root, ..) = seeded_session();

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::CenterNode, json!({"id": 404})),
    );
    assert_failed(&response, Action::CenterNode);
    assert_eq!(session.graph().central(), Some(root));
}

#[test]
fn context_menu_returns_node_state_unchanged() {
    let dispatcher = Dispatcher::new();
    let (mut session, root, ..) = seeded_session();
    let before = session.graph().clone();

    let response = dispatcher.dispatch(
        &mut session,
        &message(Action::CanvasContextmenu, json!({"id": root})),
    );

    assert_completed(&response, Action::CanvasContextmenu);
    assert_eq!(response.payload["node"]["label"], json!("Root"));
    assert_eq!(session.graph(), &before);
}

#[test]
fn undo_redo_round_trip_through_dispatch() {
    let dispatcher = Dispatcher::new();
    let mut session = Session::new(Graph::new());

    for label in ["A", "B"] {
        let response = dispatcher.dispatch(
            &mut session,
            &message(Action::NewNode, json!({"label": label})),
        );
        assert_completed(&response, Action::NewNode);
    }
    assert_eq!(session.graph().len(), 2);

    let undo = dispatcher.dispatch(&mut session, &message(Action::Undo, json!({})));
    assert_eq!(undo.payload["applied"], json!(true));
    assert_eq!(session.graph().len(), 1);

    let redo = dispatcher.dispatch(&mut session, &message(Action::Redo, json!({})));
    assert_eq!(redo.payload["applied"], json!(true));
    assert_eq!(session.graph().len(), 2);

    let redo = dispatcher.dispatch(&mut session, &message(Action::Redo, json!({})));
    assert_eq!(redo.payload["applied"], json!(false));
}

#[test]
fn dispatch_value_reports_unknown_actions_under_their_own_name() {
    let dispatcher = Dispatcher::new();
    let mut session = Session::new(Graph::new());

    let response = dispatcher.dispatch_value(
        &mut session,
        &json!({
            "message_id": "m-x",
            "source": "frontend",
            "action": "explode",
            "payload": {},
            "timestamp": 0,
        }),
    );

    assert_eq!(response.action, "explode_response");
    assert_eq!(response.status, Status::Failed);
    assert!(response.error.as_deref().unwrap().contains("explode"));
}

#[test]
fn dispatch_value_names_missing_fields() {
    let dispatcher = Dispatcher::new();
    let mut session = Session::new(Graph::new());

    let response = dispatcher.dispatch_value(
        &mut session,
        &json!({
            "message_id": "m-x",
            "source": "frontend",
            "action": "undo",
            "timestamp": 0,
        }),
    );

    assert_eq!(response.action, ERROR_RESPONSE_ACTION);
    assert_eq!(response.status, Status::Failed);
    assert!(response.error.as_deref().unwrap().contains("payload"));
}

#[test]
fn dispatch_value_accepts_legacy_delete_alias() {
    let dispatcher = Dispatcher::new();
    let (mut session, _, left, _) = seeded_session();

    let response = dispatcher.dispatch_value(
        &mut session,
        &json!({
            "message_id": "m-x",
            "source": "frontend",
            "action": "delete",
            "payload": {"id": left},
            "timestamp": 0,
        }),
    );

    assert_eq!(response.action, "delete_node_response");
    assert_eq!(response.status, Status::Completed);
    assert!(!session.graph().contains(left));
}
