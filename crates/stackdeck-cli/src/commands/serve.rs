use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use stackdeck_core::config;
use stackdeck_core::settings::Settings;
use stackdeck_remote::StatusFeed;
use stackdeck_wizard::{
    Catalog, FileSink, SelectMode, SkippedToken, StackRecord, SubmissionPayload, SubmissionSink,
    WizardAction, WizardError, WizardSession, WizardView,
};
use std::collections::HashMap;
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

// ── Shared state ────────────────────────────────────────────────────────────

/// Sessions untouched for this long are dropped on the next creation.
const SESSION_IDLE_LIMIT: Duration = Duration::from_secs(30 * 60);

struct SessionEntry {
    session: WizardSession,
    touched: Instant,
}

impl SessionEntry {
    fn new(session: WizardSession) -> Self {
        Self {
            session,
            touched: Instant::now(),
        }
    }

    fn touch(&mut self) -> &mut WizardSession {
        self.touched = Instant::now();
        &mut self.session
    }
}

type Sessions = Arc<RwLock<HashMap<String, SessionEntry>>>;

fn sweep_idle(sessions: &mut HashMap<String, SessionEntry>, now: Instant) {
    let before = sessions.len();
    sessions.retain(|_, entry| now.saturating_duration_since(entry.touched) < SESSION_IDLE_LIMIT);
    let dropped = before - sessions.len();
    if dropped > 0 {
        tracing::info!(dropped, "idle wizard sessions dropped");
    }
}

#[derive(Clone)]
pub struct AppState {
    sessions: Sessions,
    catalog: Arc<Catalog>,
    feed: Arc<dyn StatusFeed>,
    sink: Arc<dyn SubmissionSink>,
    settings_path: PathBuf,
    stack_path: PathBuf,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        feed: Arc<dyn StatusFeed>,
        settings_path: PathBuf,
        stack_path: PathBuf,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            catalog: Arc::new(catalog),
            feed,
            sink: Arc::new(FileSink::new(stack_path.clone())),
            settings_path,
            stack_path,
        }
    }
}

// ── Request / Response types ────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct CreateSessionRequest {
    #[serde(default)]
    mode: SelectMode,
    community: Option<String>,
    #[serde(default)]
    selections: Vec<String>,
    /// Hydrate from the stored stack record instead.
    #[serde(default)]
    from_stack: bool,
}

#[derive(Serialize)]
struct SessionResponse {
    id: String,
    view: WizardView,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    skipped: Vec<SkippedToken>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ActionBody {
    One(WizardAction),
    Many(Vec<WizardAction>),
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub async fn run(
    port: u16,
    feed: Arc<dyn StatusFeed>,
    catalog: Catalog,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    config::ensure_dirs()?;
    let mode = feed.mode();
    let state = AppState::new(catalog, feed, config::settings_path()?, config::stack_path()?);
    let app = router(state, static_dir);

    let addr = format!("0.0.0.0:{port}");
    println!("StackDeck dashboard running at http://localhost:{port}");
    println!("Mode: {mode}");
    println!("Press Ctrl+C to stop.\n");
    tracing::info!(%addr, mode, "server starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn router(state: AppState, static_dir: Option<PathBuf>) -> Router {
    let app = Router::new()
        .route("/api/config/status", get(config_status_handler))
        .route("/api/config", get(get_config_handler).post(save_config_handler))
        .route("/api/containers", get(containers_handler))
        .route("/api/catalog", get(catalog_handler))
        .route("/api/stack", get(stack_handler))
        .route("/api/wizard", post(create_session_handler))
        .route(
            "/api/wizard/{id}",
            get(get_session_handler).delete(delete_session_handler),
        )
        .route("/api/wizard/{id}/actions", post(apply_actions_handler))
        .route("/api/wizard/{id}/submit", post(submit_session_handler))
        .route("/soumettre", post(submit_form_handler))
        .with_state(state);

    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app.route("/", get(index_handler)),
    };
    app.layer(CorsLayer::permissive())
}

fn error_response(status: StatusCode, error: &str, details: impl Display) -> Response {
    (
        status,
        Json(json!({ "error": error, "details": details.to_string() })),
    )
        .into_response()
}

fn not_found(id: &str) -> Response {
    error_response(StatusCode::NOT_FOUND, "Unknown wizard session", id)
}

fn wizard_status(error: &WizardError) -> StatusCode {
    match error {
        WizardError::SubmissionInProgress | WizardError::AlreadySubmitted => StatusCode::CONFLICT,
        _ => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

// ── Route handlers ──────────────────────────────────────────────────────────

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn config_status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "configured": Settings::is_configured(&state.settings_path) }))
}

async fn get_config_handler(State(state): State<AppState>) -> Response {
    if !Settings::is_configured(&state.settings_path) {
        return Json(json!({})).into_response();
    }
    match Settings::load(&state.settings_path) {
        Ok(settings) => Json(settings).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "reading configuration failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read configuration", e)
        }
    }
}

async fn save_config_handler(
    State(state): State<AppState>,
    Json(settings): Json<Settings>,
) -> Response {
    match settings.save(&state.settings_path) {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "writing configuration failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to write configuration", e)
        }
    }
}

async fn containers_handler(State(state): State<AppState>) -> Response {
    match state.feed.containers().await {
        Ok(containers) => Json(containers).into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to execute ansible command",
            e,
        ),
    }
}

async fn catalog_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.catalog.to_json())
}

async fn stack_handler(State(state): State<AppState>) -> Response {
    match StackRecord::load(&state.stack_path) {
        Ok(Some(record)) => {
            let selections = record.selections();
            Json(json!({ "record": record, "selections": selections })).into_response()
        }
        Ok(None) => Json(json!({ "record": null, "selections": [] })).into_response(),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read stack", e),
    }
}

async fn create_session_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let req: CreateSessionRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CreateSessionRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(req) => req,
            Err(e) => return error_response(StatusCode::BAD_REQUEST, "Invalid request body", e),
        }
    };

    let (community, selections) = if req.from_stack {
        match StackRecord::load(&state.stack_path) {
            Ok(Some(record)) => {
                let selections = record.selections();
                (Some(record.community), selections)
            }
            Ok(None) => (None, Vec::new()),
            Err(e) => {
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read stack", e)
            }
        }
    } else {
        (req.community, req.selections)
    };

    let catalog = Arc::clone(&state.catalog);
    let (session, skipped) = if community.is_some() || !selections.is_empty() {
        WizardSession::hydrate(catalog, req.mode, community.as_deref(), selections.as_slice())
    } else {
        (WizardSession::new(catalog, req.mode), Vec::new())
    };

    let id = uuid::Uuid::new_v4().to_string();
    let view = session.view();
    {
        let mut sessions = state.sessions.write().await;
        sweep_idle(&mut sessions, Instant::now());
        sessions.insert(id.clone(), SessionEntry::new(session));
    }
    tracing::debug!(%id, skipped = skipped.len(), "wizard session created");

    (StatusCode::CREATED, Json(SessionResponse { id, view, skipped })).into_response()
}

async fn get_session_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut sessions = state.sessions.write().await;
    match sessions.get_mut(&id).map(SessionEntry::touch) {
        Some(session) => Json(SessionResponse {
            view: session.view(),
            id,
            skipped: Vec::new(),
        })
        .into_response(),
        None => not_found(&id),
    }
}

async fn delete_session_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.sessions.write().await.remove(&id) {
        Some(_) => StatusCode::NO_CONTENT.into_response(),
        None => not_found(&id),
    }
}

/// Actions are applied in order; the first failure stops the batch and
/// the ones before it stay applied.
async fn apply_actions_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ActionBody>,
) -> Response {
    let actions = match body {
        ActionBody::One(action) => vec![action],
        ActionBody::Many(actions) => actions,
    };

    let mut sessions = state.sessions.write().await;
    let Some(session) = sessions.get_mut(&id).map(SessionEntry::touch) else {
        return not_found(&id);
    };
    for action in actions {
        if let Err(e) = session.apply(action) {
            return (
                wizard_status(&e),
                Json(json!({ "error": e.to_string(), "view": session.view() })),
            )
                .into_response();
        }
    }
    Json(session.view()).into_response()
}

async fn submit_session_handler(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    // The session stays locked in the submitting phase while the sink runs.
    let payload = {
        let mut sessions = state.sessions.write().await;
        let Some(session) = sessions.get_mut(&id).map(SessionEntry::touch) else {
            return not_found(&id);
        };
        match session.begin_submit() {
            Ok(payload) => payload,
            Err(e) => {
                return (
                    wizard_status(&e),
                    Json(json!({ "error": e.to_string(), "view": session.view() })),
                )
                    .into_response()
            }
        }
    };

    let result = state.sink.submit(&payload).await;

    // Submitted sessions leave the map.
    let mut sessions = state.sessions.write().await;
    let view = match &result {
        Ok(()) => sessions.remove(&id).map(|mut entry| {
            entry.session.finish_submit(true);
            entry.session.view()
        }),
        Err(_) => sessions.get_mut(&id).map(|entry| {
            let session = entry.touch();
            session.finish_submit(false);
            session.view()
        }),
    };
    drop(sessions);
    match result {
        Ok(()) => {
            tracing::info!(%id, "wizard session submitted and closed");
            Json(json!({ "success": true, "view": view })).into_response()
        }
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "success": false, "error": e.to_string(), "view": view })),
        )
            .into_response(),
    }
}

/// Urlencoded form post from the dashboard's submit button.
async fn submit_form_handler(
    State(state): State<AppState>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let payload = match SubmissionPayload::from_form_fields(&fields) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "success": false, "error": e.to_string() })),
            )
                .into_response()
        }
    };
    tracing::info!(community = %payload.community, apps = payload.selections.len(), "form submission received");

    match state.sink.submit(&payload).await {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Configuration received successfully",
            "receivedData": payload,
        }))
        .into_response(),
        Err(e) => error_response(StatusCode::BAD_GATEWAY, "Failed to store configuration", e),
    }
}

// ── Embedded page ───────────────────────────────────────────────────────────

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>StackDeck</title>
<style>
  body { font-family: system-ui, sans-serif; margin: 2rem; background: #0f172a; color: #e2e8f0; }
  table { border-collapse: collapse; width: 100%; }
  th, td { text-align: left; padding: .4rem .8rem; border-bottom: 1px solid #334155; }
  .up { color: #4ade80; } .down { color: #f87171; }
  code { color: #38bdf8; }
</style>
</head>
<body>
<h1>StackDeck</h1>
<table>
  <thead><tr><th>Name</th><th>Command</th><th>State</th><th>Status</th><th>Ports</th></tr></thead>
  <tbody id="rows"><tr><td colspan="5">Loading...</td></tr></tbody>
</table>
<p>Wizard API: <code>POST /api/wizard</code>, <code>POST /api/wizard/{id}/actions</code>,
<code>POST /api/wizard/{id}/submit</code>. Catalog: <code>GET /api/catalog</code>.</p>
<script>
async function refresh() {
  const body = document.getElementById('rows');
  try {
    const res = await fetch('/api/containers');
    const data = await res.json();
    if (!res.ok) throw new Error(data.details || data.error);
    body.innerHTML = '';
    for (const c of data) {
      const tr = document.createElement('tr');
      for (const v of [c.name, c.command, c.state, c.status, c.ports]) {
        const td = document.createElement('td');
        td.textContent = v;
        tr.appendChild(td);
      }
      tr.children[2].className = /up/i.test(c.state) ? 'up' : 'down';
      body.appendChild(tr);
    }
  } catch (e) {
    body.innerHTML = '';
    const tr = document.createElement('tr');
    const td = document.createElement('td');
    td.colSpan = 5;
    td.textContent = 'Error: ' + e.message;
    tr.appendChild(td);
    body.appendChild(tr);
  }
}
refresh();
setInterval(refresh, 30000);
</script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::Value;
    use stackdeck_core::container::ContainerInfo;
    use stackdeck_core::AppError;
    use stackdeck_remote::DemoFeed;
    use tower::ServiceExt;

    struct FailingFeed;

    #[async_trait]
    impl StatusFeed for FailingFeed {
        async fn containers(&self) -> Result<Vec<ContainerInfo>, AppError> {
            Err(AppError::Remote("ansible: command not found".into()))
        }

        fn mode(&self) -> &'static str {
            "LIVE"
        }
    }

    fn app(dir: &tempfile::TempDir, feed: Arc<dyn StatusFeed>) -> Router {
        let state = AppState::new(
            Catalog::builtin(),
            feed,
            dir.path().join("monitor.conf"),
            dir.path().join("stack.json"),
        );
        router(state, None)
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let resp = app.clone().oneshot(req).await.expect("response");
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .expect("body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).expect("request")
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    #[tokio::test]
    async fn config_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(&dir, Arc::new(DemoFeed));

        let (_, body) = send(&app, get("/api/config/status")).await;
        assert_eq!(body, json!({ "configured": false }));
        let (_, body) = send(&app, get("/api/config")).await;
        assert_eq!(body, json!({}));

        let creds = json!({
            "gitLogin": "alice", "gitPassword": "a=b",
            "harborLogin": "bob", "harborPassword": "pw"
        });
        let (status, _) = send(&app, post_json("/api/config", creds.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = send(&app, get("/api/config/status")).await;
        assert_eq!(body, json!({ "configured": true }));
        let (_, body) = send(&app, get("/api/config")).await;
        assert_eq!(body, creds);
    }

    #[tokio::test]
    async fn demo_containers_are_listed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (status, body) = send(&app(&dir, Arc::new(DemoFeed)), get("/api/containers")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().map(Vec::len), Some(5));
        assert_eq!(body[4]["name"], "zeus_worker");
    }

    #[tokio::test]
    async fn feed_failure_is_a_500_with_details() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (status, body) = send(&app(&dir, Arc::new(FailingFeed)), get("/api/containers")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to execute ansible command");
        assert!(body["details"]
            .as_str()
            .is_some_and(|d| d.contains("command not found")));
    }

    #[tokio::test]
    async fn wizard_session_through_the_api() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(&dir, Arc::new(DemoFeed));

        let (status, body) = send(&app, post_json("/api/wizard", json!({}))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["view"]["step"], "community");
        let id = body["id"].as_str().expect("id").to_string();
        let actions_uri = format!("/api/wizard/{id}/actions");

        // Skipping the version blocks on the applications step.
        let (status, body) = send(
            &app,
            post_json(
                &actions_uri,
                json!([
                    { "action": "select_community", "community": "be" },
                    { "action": "next" },
                    { "action": "toggle_app_type", "app_type": "ihm" },
                    { "action": "next" },
                    { "action": "set_app", "app_type": "ihm", "app": "plf", "checked": true },
                    { "action": "next" }
                ]),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["view"]["step"], "applications");

        let (status, body) = send(
            &app,
            post_json(
                &actions_uri,
                json!([
                    { "action": "set_version", "app_type": "ihm", "app": "plf", "version": "3.0.0" },
                    { "action": "next" }
                ]),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"], "summary");
        assert_eq!(body["summary"]["community"], "BE");
        assert_eq!(body["selections"], json!(["|ihm|plf|3.0.0:"]));

        let (status, body) = send(&app, post_json(&format!("/api/wizard/{id}/submit"), json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"]["phase"], "submitted");

        let (_, body) = send(&app, get("/api/stack")).await;
        assert_eq!(body["record"]["community"], "be");
        assert_eq!(body["selections"], json!(["|ihm|plf|3.0.0:"]));

        let (status, _) = send(&app, get(&format!("/api/wizard/{id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = send(&app, post_json(&format!("/api/wizard/{id}/submit"), json!({}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn idle_sessions_are_swept() {
        let catalog = Arc::new(Catalog::builtin());
        let mut sessions = HashMap::new();
        sessions.insert(
            "idle".to_string(),
            SessionEntry::new(WizardSession::new(Arc::clone(&catalog), SelectMode::Multi)),
        );
        let later = Instant::now() + SESSION_IDLE_LIMIT + Duration::from_secs(1);
        let mut fresh = SessionEntry::new(WizardSession::new(catalog, SelectMode::Multi));
        fresh.touched = later;
        sessions.insert("fresh".to_string(), fresh);

        sweep_idle(&mut sessions, later);
        assert_eq!(sessions.keys().collect::<Vec<_>>(), ["fresh"]);
    }

    #[tokio::test]
    async fn session_hydrates_from_stored_stack() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(&dir, Arc::new(DemoFeed));
        let (record, _) = StackRecord::from_payload(&SubmissionPayload {
            community: "fr".into(),
            selections: vec!["core|ihm|plf|1.0.0:".into(), "mars|ihm|gone|1:".into()],
            ..Default::default()
        });
        record.save(&dir.path().join("stack.json")).expect("save");

        let (status, body) = send(&app, post_json("/api/wizard", json!({ "fromStack": true }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["view"]["step"], "summary");
        assert_eq!(body["skipped"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn unknown_session_is_404() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(&dir, Arc::new(DemoFeed));
        let (status, _) = send(&app, get("/api/wizard/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let req = Request::builder()
            .method("DELETE")
            .uri("/api/wizard/nope")
            .body(Body::empty())
            .expect("request");
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn form_submission_is_stored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(&dir, Arc::new(DemoFeed));
        let form = "community=fr&platforms=acore&appTypes=flux\
                    &selections=acore%7Cflux%7Cacore%7C2.1.0%3A%2Ftmp%2Fa.tgz";
        let req = Request::builder()
            .method("POST")
            .uri("/soumettre")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from(form))
            .expect("request");
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["receivedData"]["appTypes"], json!(["flux"]));

        let stored = StackRecord::load(&dir.path().join("stack.json"))
            .expect("load")
            .expect("record");
        assert_eq!(stored.selections(), ["acore|flux|acore|2.1.0:/tmp/a.tgz"]);
    }

    #[tokio::test]
    async fn form_without_community_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = app(&dir, Arc::new(DemoFeed));
        let req = Request::builder()
            .method("POST")
            .uri("/soumettre")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(Body::from("selections=%7Cihm%7Cplf%7C1%3A"))
            .expect("request");
        let (status, _) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
