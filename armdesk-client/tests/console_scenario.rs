use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use armdesk_client::AppError;
use armdesk_client::buildings;
use armdesk_client::login;
use armdesk_client::proevents;
use armdesk_client::queries::{self, TemplateEditor};
use armdesk_client::session::{self, Session, SessionStore, api_result};
use armdesk_shared::api::rest;

const TOKEN: &str = "test-token";

#[derive(Default)]
struct MockState {
    bulk_calls: AtomicUsize,
    reeval_calls: AtomicUsize,
    reeval_fails: AtomicBool,
    time_calls: AtomicUsize,
    saves: AtomicUsize,
    queries: Mutex<HashMap<String, (String, String, Option<String>)>>,
}

struct MockServer {
    base: String,
    state: Arc<MockState>,
    handle: tokio::task::JoinHandle<()>,
}

impl MockServer {
    async fn spawn() -> Option<Self> {
        let state = Arc::new(MockState::default());
        state.queries.lock().unwrap().insert(
            "proevents".to_string(),
            (
                "SELECT * FROM ProEvent_TBL WHERE dvcDeviceType_FRK = 138".to_string(),
                "ProEvents per building".to_string(),
                None,
            ),
        );
        let app = Router::new()
            .route("/api/admin/login", post(login_route))
            .route("/api/buildings", get(buildings_route))
            .route("/api/buildings/{id}/time", post(time_route))
            .route("/api/buildings/{id}/reevaluate", post(reevaluate_route))
            .route("/api/devices", get(devices_route))
            .route("/api/proevents/ignore/bulk", post(bulk_route))
            .route(
                "/api/admin/queries",
                get(list_queries_route).post(save_query_route),
            )
            .route("/api/admin/queries/{name}", get(get_query_route))
            .with_state(state.clone());
        let listener = match tokio::net::TcpListener::bind("127.0.0.1:0").await {
            Ok(l) => l,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                eprintln!("Skipping test due to sandbox restrictions: {e}");
                return None;
            }
            Err(e) => panic!("failed to bind listener: {e}"),
        };
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Some(Self {
            base: format!("http://{addr}"),
            state,
            handle,
        })
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn authed(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TOKEN}"))
        .unwrap_or(false)
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Invalid or expired token"})),
    )
        .into_response()
}

async fn login_route(Json(body): Json<Value>) -> Response {
    if body["username"] == "admin" && body["password"] == "hunter2" {
        Json(json!({
            "access_token": TOKEN,
            "token_type": "bearer",
            "username": "admin",
            "is_admin": true,
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid credentials"})),
        )
            .into_response()
    }
}

async fn buildings_route(headers: HeaderMap) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    Json(json!([
        {"id": 1, "name": "Main Plant", "start_time": "20:00"},
    ]))
    .into_response()
}

async fn devices_route(headers: HeaderMap) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    Json(json!([
        {"id": 11, "name": "Front Door", "building_id": 1, "reactive_state": 0, "is_ignored": true},
        {"id": 12, "name": "Loading Dock", "building_id": 1, "reactive_state": 1, "is_ignored": false},
    ]))
    .into_response()
}

async fn time_route(
    State(st): State<Arc<MockState>>,
    Path(_id): Path<i64>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    st.time_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({"success": true, "message": "Schedule updated"})).into_response()
}

async fn reevaluate_route(
    State(st): State<Arc<MockState>>,
    Path(_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    st.reeval_calls.fetch_add(1, Ordering::SeqCst);
    if st.reeval_fails.load(Ordering::SeqCst) {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"detail": "panel state unavailable"})),
        )
            .into_response();
    }
    Json(json!({"success": true, "message": "Re-evaluation triggered"})).into_response()
}

async fn bulk_route(
    State(st): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(_body): Json<Value>,
) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    st.bulk_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({"success": true, "message": "Ignore flags saved"})).into_response()
}

async fn list_queries_route(State(st): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    let queries = st.queries.lock().unwrap();
    let items: Vec<Value> = queries
        .iter()
        .map(|(name, (_, description, updated_at))| {
            json!({
                "query_name": name,
                "description": description,
                "created_at": null,
                "updated_at": updated_at,
            })
        })
        .collect();
    Json(json!({"queries": items})).into_response()
}

async fn get_query_route(
    State(st): State<Arc<MockState>>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    let queries = st.queries.lock().unwrap();
    match queries.get(&name) {
        Some((sql, description, updated_at)) => Json(json!({
            "query_name": name,
            "query_sql": sql,
            "description": description,
            "created_at": null,
            "updated_at": updated_at,
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": format!("Query '{name}' not found")})),
        )
            .into_response(),
    }
}

async fn save_query_route(
    State(st): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authed(&headers) {
        return unauthorized();
    }
    let name = body["query_name"].as_str().unwrap_or_default().to_string();
    let sql = body["query_sql"].as_str().unwrap_or_default().to_string();
    let description = body["description"].as_str().unwrap_or_default().to_string();
    let n = st.saves.fetch_add(1, Ordering::SeqCst) + 1;
    st.queries.lock().unwrap().insert(
        name.clone(),
        (sql, description, Some(format!("2026-08-08 10:15:{n:02}"))),
    );
    Json(json!({"success": true, "message": format!("Query '{name}' saved successfully")}))
        .into_response()
}

fn store_in(dir: &tempfile::TempDir) -> SessionStore {
    SessionStore::new(dir.path().join("session.yaml"))
}

fn admin_session(token: &str) -> Session {
    Session {
        token: token.to_string(),
        username: "admin".to_string(),
        is_admin: true,
    }
}

#[tokio::test]
async fn login_persists_the_admin_session() {
    let Some(srv) = MockServer::spawn().await else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let sess = login::authenticate(&srv.base, "admin", "hunter2", &store)
        .await
        .unwrap();
    assert!(sess.is_admin);
    assert_eq!(sess.token, TOKEN);

    let stored = store.load().unwrap().expect("session persisted");
    assert_eq!(stored.username, "admin");
    assert!(stored.is_admin);
    assert!(session::require_admin(&stored).is_ok());
}

#[tokio::test]
async fn rejected_login_surfaces_the_server_detail() {
    let Some(srv) = MockServer::spawn().await else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let err = login::authenticate(&srv.base, "admin", "wrong", &store)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Invalid credentials"));
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn unauthorized_call_expires_the_session() {
    let Some(srv) = MockServer::spawn().await else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    store.save(&admin_session("stale-token")).unwrap();

    let err = api_result(&store, rest::list_buildings(&srv.base, "stale-token").await).unwrap_err();
    assert!(matches!(err, AppError::SessionExpired));
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn verify_drops_an_untrusted_session() {
    let Some(srv) = MockServer::spawn().await else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let good = admin_session(TOKEN);
    store.save(&good).unwrap();
    assert!(session::verify(&srv.base, &store, &good).await);
    assert!(store.load().unwrap().is_some());

    let stale = admin_session("stale-token");
    store.save(&stale).unwrap();
    assert!(!session::verify(&srv.base, &store, &stale).await);
    assert!(store.load().unwrap().is_none());
}

#[tokio::test]
async fn noop_ignore_edit_short_circuits_before_the_network() {
    let Some(srv) = MockServer::spawn().await else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let sess = admin_session(TOKEN);

    // Device 11 is already ignored; requesting it again stages nothing.
    proevents::apply_ignore(&srv.base, &store, &sess, 1, &[11], &[], true)
        .await
        .unwrap();
    assert_eq!(srv.state.bulk_calls.load(Ordering::SeqCst), 0);
    assert_eq!(srv.state.reeval_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn ignore_edit_saves_then_reevaluates() {
    let Some(srv) = MockServer::spawn().await else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let sess = admin_session(TOKEN);

    proevents::apply_ignore(&srv.base, &store, &sess, 1, &[12], &[], true)
        .await
        .unwrap();
    assert_eq!(srv.state.bulk_calls.load(Ordering::SeqCst), 1);
    assert_eq!(srv.state.reeval_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn reevaluate_failure_is_not_reported_as_a_save_failure() {
    let Some(srv) = MockServer::spawn().await else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let sess = admin_session(TOKEN);
    srv.state.reeval_fails.store(true, Ordering::SeqCst);

    let err = proevents::apply_ignore(&srv.base, &store, &sess, 1, &[], &[11], true)
        .await
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("changes saved, but re-evaluation failed"), "{msg}");
    assert!(msg.contains("panel state unavailable"), "{msg}");
    assert_eq!(srv.state.bulk_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn unknown_proevent_ids_are_rejected_before_staging() {
    let Some(srv) = MockServer::spawn().await else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let sess = admin_session(TOKEN);

    let err = proevents::apply_ignore(&srv.base, &store, &sess, 1, &[999], &[], true)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(srv.state.bulk_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn schedule_time_is_validated_before_the_network() {
    let Some(srv) = MockServer::spawn().await else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let sess = admin_session(TOKEN);

    let err = buildings::set_time(&srv.base, &store, &sess, 1, "  ")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    let err = buildings::set_time(&srv.base, &store, &sess, 1, "9pm")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(srv.state.time_calls.load(Ordering::SeqCst), 0);

    buildings::set_time(&srv.base, &store, &sess, 1, "21:30")
        .await
        .unwrap();
    assert_eq!(srv.state.time_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn saving_a_template_reloads_the_server_timestamp() {
    let Some(srv) = MockServer::spawn().await else {
        return;
    };
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let sess = admin_session(TOKEN);

    let dto = rest::get_query(&srv.base, TOKEN, "proevents").await.unwrap();
    assert!(dto.updated_at.is_none());
    let original_sql = dto.query_sql.clone();

    let mut editor = TemplateEditor::from_template(&dto);
    let saved = queries::push_template(&srv.base, &store, &sess, &mut editor, true)
        .await
        .unwrap();
    assert!(saved);
    assert!(editor.is_customized());
    assert_eq!(editor.sql(), original_sql);
    let first_stamp = editor.updated_at().map(str::to_string);

    // Saving unchanged content only moves the timestamp.
    let saved = queries::push_template(&srv.base, &store, &sess, &mut editor, true)
        .await
        .unwrap();
    assert!(saved);
    assert_eq!(editor.sql(), original_sql);
    assert_ne!(editor.updated_at().map(str::to_string), first_stamp);
}

#[test]
fn empty_listing_message_depends_on_the_search() {
    assert_eq!(proevents::empty_message(None), "No proevents found.");
    assert_eq!(proevents::empty_message(Some("")), "No proevents found.");
    assert_eq!(
        proevents::empty_message(Some("door")),
        "No proevents found matching search."
    );
}
