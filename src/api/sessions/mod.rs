//! Sessions API endpoints
//!
//! POST   /api/v1/sessions                           - Create a session (bound to x-agent-id if sent)
//! GET    /api/v1/sessions/:id                       - Get a session
//! DELETE /api/v1/sessions/:id                       - Delete a session
//! GET    /api/v1/sessions/:id/scratchpad            - Read the scratchpad
//! PUT    /api/v1/sessions/:id/scratchpad            - Replace the scratchpad
//! POST   /api/v1/sessions/:id/scratchpad/append     - Append to the scratchpad
//! GET    /api/v1/sessions/:id/todos                 - List todos (?status=&tag=)
//! POST   /api/v1/sessions/:id/todos                 - Add a todo
//! PATCH  /api/v1/sessions/:id/todos/:todo_id        - Set a todo's status
//! DELETE /api/v1/sessions/:id/todos/:todo_id        - Delete a todo
//!
//! Every read endpoint accepts `?format=compact` for the tabular text form.

use agentpad_core::{NewTodo, OutputFormat, Session, TodoFilter, TodoStatus, Workspace};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::Deserialize;

use super::response::{respond, ApiError, ApiResponse};
use crate::middleware::CallerId;

/// `?format=` query parameter
#[derive(Debug, Default, Deserialize)]
pub struct FormatQuery {
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

impl FormatQuery {
    fn format(&self) -> OutputFormat {
        self.format.unwrap_or_default()
    }
}

/// Query for listing todos
#[derive(Debug, Default, Deserialize)]
pub struct ListTodosQuery {
    #[serde(default)]
    pub status: Option<TodoStatus>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

/// Body for replacing or appending to the scratchpad
#[derive(Debug, Deserialize)]
pub struct ScratchpadRequest {
    pub content: String,
}

/// Body for changing a todo's status
#[derive(Debug, Deserialize)]
pub struct UpdateTodoRequest {
    pub status: TodoStatus,
}

/// Create a new session owned by the caller (if any).
async fn create_session(
    caller: CallerId,
    State(ws): State<Workspace>,
) -> Result<(StatusCode, Json<ApiResponse<Session>>), ApiError> {
    let session = ws.store().create_session(caller.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(session))))
}

async fn get_session(
    caller: CallerId,
    State(ws): State<Workspace>,
    Path(id): Path<String>,
    Query(query): Query<FormatQuery>,
) -> Result<Response, ApiError> {
    let session = ws.store().require_session(&id, caller.as_deref()).await?;
    respond(session, query.format())
}

async fn delete_session(
    caller: CallerId,
    State(ws): State<Workspace>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    ws.store().delete_session(&id, caller.as_deref()).await?;
    Ok(Json(ApiResponse::done()))
}

async fn read_scratchpad(
    caller: CallerId,
    State(ws): State<Workspace>,
    Path(id): Path<String>,
    Query(query): Query<FormatQuery>,
) -> Result<Response, ApiError> {
    let content = ws.read_scratchpad(&id, caller.as_deref()).await?;
    respond(content, query.format())
}

async fn write_scratchpad(
    caller: CallerId,
    State(ws): State<Workspace>,
    Path(id): Path<String>,
    Json(request): Json<ScratchpadRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    ws.write_scratchpad(&id, request.content, caller.as_deref())
        .await?;
    Ok(Json(ApiResponse::done()))
}

async fn append_scratchpad(
    caller: CallerId,
    State(ws): State<Workspace>,
    Path(id): Path<String>,
    Json(request): Json<ScratchpadRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let content = ws
        .append_scratchpad(&id, &request.content, caller.as_deref())
        .await?;
    Ok(Json(ApiResponse::success(content)))
}

async fn list_todos(
    caller: CallerId,
    State(ws): State<Workspace>,
    Path(id): Path<String>,
    Query(query): Query<ListTodosQuery>,
) -> Result<Response, ApiError> {
    let filter = TodoFilter {
        status: query.status,
        tag: query.tag,
    };
    let todos = ws.list_todos(&id, &filter, caller.as_deref()).await?;
    respond(todos, query.format.unwrap_or_default())
}

async fn add_todo(
    caller: CallerId,
    State(ws): State<Workspace>,
    Path(id): Path<String>,
    Json(request): Json<NewTodo>,
) -> Result<Response, ApiError> {
    let todo = ws.add_todo(&id, request, caller.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(todo))).into_response())
}

async fn update_todo(
    caller: CallerId,
    State(ws): State<Workspace>,
    Path((id, todo_id)): Path<(String, String)>,
    Query(query): Query<FormatQuery>,
    Json(request): Json<UpdateTodoRequest>,
) -> Result<Response, ApiError> {
    let todo = ws
        .update_todo_status(&id, &todo_id, request.status, caller.as_deref())
        .await?;
    respond(todo, query.format())
}

async fn delete_todo(
    caller: CallerId,
    State(ws): State<Workspace>,
    Path((id, todo_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    ws.delete_todo(&id, &todo_id, caller.as_deref()).await?;
    Ok(Json(ApiResponse::done()))
}

/// Create sessions routes
pub fn sessions_routes(workspace: Workspace) -> Router {
    Router::new()
        .route("/api/v1/sessions", post(create_session))
        .route(
            "/api/v1/sessions/:id",
            get(get_session).delete(delete_session),
        )
        .route(
            "/api/v1/sessions/:id/scratchpad",
            get(read_scratchpad).put(write_scratchpad),
        )
        .route(
            "/api/v1/sessions/:id/scratchpad/append",
            post(append_scratchpad),
        )
        .route(
            "/api/v1/sessions/:id/todos",
            get(list_todos).post(add_todo),
        )
        .route(
            "/api/v1/sessions/:id/todos/:todo_id",
            patch(update_todo).delete(delete_todo),
        )
        .with_state(workspace)
}
