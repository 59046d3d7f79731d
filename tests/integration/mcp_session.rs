/// A client session over the JSON-RPC surface
use dhikr_tracker_mcp::mcp::protocol::error_codes;
use dhikr_tracker_mcp::mcp::McpServer;
use dhikr_tracker_mcp::*;
use serde_json::{json, Value};

fn server() -> McpServer {
    McpServer::new(DhikrTrackerServer::with_storage(SqliteStorage::in_memory().unwrap()))
}

fn send(server: &mut McpServer, request: Value) -> Value {
    let response = server
        .process_line(&request.to_string())
        .expect("request should get a response");
    serde_json::to_value(response).unwrap()
}

fn call(server: &mut McpServer, id: u64, name: &str, arguments: Value) -> Value {
    send(
        server,
        json!({"jsonrpc": "2.0", "id": id, "method": "tools/call", "params": {"name": name, "arguments": arguments}}),
    )
}

/// The JSON document carried in a successful tool result
fn payload(response: &Value) -> Value {
    assert_eq!(response["result"]["isError"], false, "{}", response);
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[test]
fn test_handshake_and_tool_listing() {
    let mut server = server();

    let init = send(&mut server, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}}));
    assert_eq!(init["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(init["result"]["serverInfo"]["name"], "Dhikr Tracker MCP");

    assert!(server
        .process_line(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .is_none());
    assert!(server.is_initialized());

    let listing = send(&mut server, json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}));
    let tools = listing["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 21);
    let complete = tools.iter().find(|t| t["name"] == "dhikr_complete").unwrap();
    assert!(complete["inputSchema"]["properties"]["dhikr_id"].is_object());
}

#[test]
fn test_create_and_complete_through_tools() {
    let mut server = server();

    let created = call(
        &mut server,
        1,
        "dhikr_create",
        json!({"arabic_text": "سُبْحَانَ اللَّهِ وَبِحَمْدِهِ", "category": "tasbih", "repetitions": 100}),
    );
    let dhikr_id = payload(&created)["dhikr"]["id"].as_str().unwrap().to_string();

    call(
        &mut server,
        2,
        "goal_create",
        json!({"title": "Hundred", "goal_type": "total_count", "target_value": 100, "date": "2024-02-01"}),
    );

    let completed = call(
        &mut server,
        3,
        "dhikr_complete",
        json!({"dhikr_id": dhikr_id, "count": 100, "date": "2024-02-01"}),
    );
    let report = payload(&completed);
    assert_eq!(report["completed"], true);
    assert_eq!(report["log"]["completion_percentage"], 100.0);
    assert_eq!(report["completed_goals"][0]["title"], "Hundred");

    let board = payload(&call(&mut server, 4, "goal_list", json!({})));
    assert_eq!(board["completed"].as_array().unwrap().len(), 1);
    assert_eq!(board["completed"][0]["progress_percentage"], 100.0);

    let today = payload(&call(&mut server, 5, "dhikr_today", json!({})));
    assert_eq!(today["dhikr"][0]["id"], dhikr_id.as_str());
}

#[test]
fn test_errors_are_reported_not_fatal() {
    let mut server = server();

    let missing = call(&mut server, 1, "dhikr_complete", json!({"dhikr_id": DhikrId::new().to_string(), "count": 3}));
    assert_eq!(missing["result"]["isError"], true);

    let bad_goal = call(
        &mut server,
        2,
        "goal_create",
        json!({"title": "Pair", "goal_type": "combination", "target_value": 10}),
    );
    assert_eq!(bad_goal["result"]["isError"], true);

    let unknown = call(&mut server, 3, "prayer_times", json!({}));
    assert_eq!(unknown["error"]["code"], error_codes::METHOD_NOT_FOUND);

    let garbage = server.process_line("{not json").unwrap();
    assert_eq!(garbage.error.unwrap().code, error_codes::PARSE_ERROR);

    // Still serving
    let settings = payload(&call(&mut server, 4, "settings_get", json!({})));
    assert_eq!(settings["notification_enabled"], true);
}
