/// MCP server implementation that handles JSON-RPC communication
///
/// Reads one JSON-RPC request per line from stdin, runs the named tool
/// against the tracker's storage and writes one response per line to stdout.

use chrono::Utc;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::mcp::protocol::*;
use crate::storage::SqliteStorage;
use crate::tools::{self, ToolError};
use crate::{DhikrTrackerServer, ServerError};

/// Arguments of tools that take none
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoParams {}

fn definition<P: JsonSchema>(name: &str, description: &str) -> ToolDefinition {
    let input_schema = serde_json::to_value(schemars::schema_for!(P)).unwrap_or_else(|e| {
        warn!("Could not render the argument schema of {}: {}", name, e);
        json!({"type": "object"})
    });
    ToolDefinition {
        name: name.to_string(),
        description: description.to_string(),
        input_schema,
    }
}

/// Every tool the server offers, with its argument schema
pub fn tool_definitions() -> Vec<ToolDefinition> {
    vec![
        definition::<tools::CreateDhikrParams>(
            "dhikr_create",
            "Add a dhikr to the library, optionally with a reminder schedule",
        ),
        definition::<tools::ListDhikrParams>(
            "dhikr_list",
            "Browse the dhikr library with search, category and favourite filters",
        ),
        definition::<tools::UpdateDhikrParams>("dhikr_update", "Edit a dhikr or toggle it as a favourite"),
        definition::<tools::DeleteParams>("dhikr_delete", "Delete a dhikr; its history is kept"),
        definition::<NoParams>("dhikr_today", "The dhikr to show on today's screen"),
        definition::<tools::CounterDraftParams>(
            "counter_draft",
            "Save the live counter value, or restore it when no count is given",
        ),
        definition::<tools::SessionParams>(
            "dhikr_complete",
            "Finish a counting session: writes today's log, the streak and goal progress",
        ),
        definition::<tools::SessionParams>(
            "dhikr_save_progress",
            "Save an unfinished counting session without touching streaks or goals",
        ),
        definition::<tools::ActivitySummaryParams>(
            "activity_summary",
            "Day streak, today's total and the last seven days of activity",
        ),
        definition::<tools::CreateGoalParams>("goal_create", "Create a streak, count or monthly goal"),
        definition::<NoParams>("goal_list", "All goals split into active and completed"),
        definition::<tools::EditGoalParams>("goal_edit", "Change a goal's definition; progress is kept"),
        definition::<tools::ResetGoalParams>("goal_reset", "Start a goal over from zero"),
        definition::<tools::DeleteParams>("goal_delete", "Delete a goal"),
        definition::<NoParams>("settings_get", "Location, calendar and notification settings"),
        definition::<tools::UpdateSettingsParams>("settings_update", "Change settings"),
        definition::<tools::RemindersParams>("reminders_due", "Reminders that should fire at the given minute"),
        definition::<tools::ContentListParams>("content_list", "Hadith, tafsir and other content cards"),
        definition::<tools::CrescentRecordParams>("crescent_record", "Record a crescent sighting"),
        definition::<NoParams>("crescent_list", "Recorded crescent sightings, latest first"),
        definition::<tools::DeleteParams>("crescent_delete", "Delete a crescent sighting"),
    ]
}

/// Decode the arguments, run the tool and render its response as JSON text
fn run_tool<P, R, F>(name: &str, arguments: Value, tool: F) -> ToolCallResult
where
    P: DeserializeOwned,
    R: Serialize,
    F: FnOnce(P) -> Result<R, ToolError>,
{
    let params: P = match serde_json::from_value(arguments) {
        Ok(params) => params,
        Err(e) => return ToolCallResult::error(format!("Invalid arguments for {}: {}", name, e)),
    };

    match tool(params) {
        Ok(response) => match serde_json::to_string_pretty(&response) {
            Ok(text) => ToolCallResult::success(text),
            Err(e) => {
                error!("Failed to encode the response of {}: {}", name, e);
                ToolCallResult::error(format!("Failed to encode response: {}", e))
            }
        },
        Err(e) => {
            warn!("Tool {} failed (code {}): {}", name, tool_error_code(&e), e);
            ToolCallResult::error(e.to_string())
        }
    }
}

/// MCP server that handles communication with the client
pub struct McpServer {
    tracker: DhikrTrackerServer,
    initialized: bool,
}

impl McpServer {
    pub fn new(tracker: DhikrTrackerServer) -> Self {
        Self {
            tracker,
            initialized: false,
        }
    }

    /// Whether the client has confirmed initialization
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Run the MCP server, handling JSON-RPC over stdin/stdout
    pub async fn run(&mut self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");

        let stdin = tokio::io::stdin();
        let mut reader = BufReader::new(stdin);
        let mut stdout = tokio::io::stdout();

        let mut line = String::new();

        loop {
            line.clear();

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => {
                    if let Some(response) = self.process_line(&line) {
                        let response_str = serde_json::to_string(&response)?;

                        stdout.write_all(response_str.as_bytes()).await?;
                        stdout.write_all(b"\n").await?;
                        stdout.flush().await?;

                        debug!("Sent response: {}", response_str);
                    }
                }
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle one line of input; notifications and blank lines get no response
    pub fn process_line(&mut self, line: &str) -> Option<JsonRpcResponse> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        debug!("Processing request: {}", line);

        let request: JsonRpcRequest = match serde_json::from_str(line) {
            Ok(req) => req,
            Err(e) => {
                error!("Failed to parse JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Invalid JSON: {}", e),
                    None,
                ));
            }
        };

        self.handle_request(request)
    }

    fn handle_request(&mut self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            self.handle_notification(&request.method);
            return None;
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id),
            "initialized" => {
                self.initialized = true;
                JsonRpcResponse::success(id, Value::Null)
            }
            "tools/list" => JsonRpcResponse::success(id, json!({ "tools": tool_definitions() })),
            "tools/call" => self.handle_tools_call(id, request.params),
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        };
        Some(response)
    }

    fn handle_notification(&mut self, method: &str) {
        match method {
            "initialized" | "notifications/initialized" => {
                self.initialized = true;
                info!("MCP client initialized");
            }
            other => debug!("Ignoring notification {}", other),
        }
    }

    fn handle_initialize(&mut self, id: Value) -> JsonRpcResponse {
        info!("MCP client connected");

        let result = InitializeResult {
            protocol_version: MCP_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability { list_changed: false }),
            },
            server_info: ServerInfo {
                name: "Dhikr Tracker MCP".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        to_response(id, result)
    }

    fn handle_tools_call(&mut self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let call: ToolCallParams = match params.map(serde_json::from_value) {
            Some(Ok(call)) => call,
            Some(Err(e)) => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    format!("Invalid parameters: {}", e),
                    None,
                );
            }
            None => {
                return JsonRpcResponse::error(id, error_codes::INVALID_PARAMS, "Missing parameters".to_string(), None);
            }
        };

        debug!("Calling tool {}", call.name);
        match self.call_tool(&call.name, call.arguments) {
            Some(result) => to_response(id, result),
            None => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Unknown tool: {}", call.name),
                None,
            ),
        }
    }

    /// Run the named tool; `None` when no tool has that name
    pub fn call_tool(&self, name: &str, args: Value) -> Option<ToolCallResult> {
        let storage: &SqliteStorage = self.tracker.storage();

        let result = match name {
            "dhikr_create" => run_tool(name, args, |p| tools::create_dhikr(storage, p)),
            "dhikr_list" => run_tool(name, args, |p| tools::list_dhikr(storage, p)),
            "dhikr_update" => run_tool(name, args, |p| tools::update_dhikr(storage, p)),
            "dhikr_delete" => run_tool(name, args, |p| tools::delete_dhikr(storage, p)),
            "dhikr_today" => run_tool(name, args, |_: NoParams| tools::today_selection(storage)),
            "counter_draft" => run_tool(name, args, |p| tools::counter_draft(storage, p, Utc::now())),
            "dhikr_complete" => run_tool(name, args, |p| tools::record_completion(storage, p)),
            "dhikr_save_progress" => run_tool(name, args, |p| tools::record_progress(storage, p)),
            "activity_summary" => run_tool(name, args, |p| tools::activity_summary(storage, p)),
            "goal_create" => run_tool(name, args, |p| tools::create_goal(storage, p)),
            "goal_list" => run_tool(name, args, |_: NoParams| tools::goal_board(storage)),
            "goal_edit" => run_tool(name, args, |p| tools::edit_goal(storage, p)),
            "goal_reset" => run_tool(name, args, |p| tools::reset_goal(storage, p)),
            "goal_delete" => run_tool(name, args, |p| tools::delete_goal(storage, p)),
            "settings_get" => run_tool(name, args, |_: NoParams| tools::get_settings(storage)),
            "settings_update" => run_tool(name, args, |p| tools::update_settings(storage, p)),
            "reminders_due" => run_tool(name, args, |p| tools::reminders_due(storage, p)),
            "content_list" => run_tool(name, args, |p| tools::content_list(storage, p)),
            "crescent_record" => run_tool(name, args, |p| tools::crescent_record(storage, p)),
            "crescent_list" => run_tool(name, args, |_: NoParams| tools::crescent_list(storage)),
            "crescent_delete" => run_tool(name, args, |p| tools::crescent_delete(storage, p)),
            _ => return None,
        };
        Some(result)
    }
}

fn to_response<T: Serialize>(id: Value, result: T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, format!("Failed to encode result: {}", e), None),
    }
}
