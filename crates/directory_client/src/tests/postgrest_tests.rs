use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Router,
};
use shared::domain::{DepartmentId, FacultyId};
use tokio::{net::TcpListener, sync::Mutex};

use super::*;

#[derive(Debug, Clone)]
struct RecordedRequest {
    table: String,
    params: HashMap<String, String>,
    apikey: Option<String>,
    authorization: Option<String>,
}

#[derive(Clone)]
struct StubState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    status: StatusCode,
    body: String,
}

async fn handle_table(
    State(state): State<StubState>,
    Path(table): Path<String>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    state.requests.lock().await.push(RecordedRequest {
        table,
        params,
        apikey: header("apikey"),
        authorization: header("authorization"),
    });
    (state.status, state.body.clone())
}

async fn spawn_store(status: StatusCode, body: &str) -> (PostgrestStore, StubState) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let state = StubState {
        requests: Arc::new(Mutex::new(Vec::new())),
        status,
        body: body.to_string(),
    };
    let app = Router::new()
        .route("/rest/v1/:table", get(handle_table))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    let endpoint = StoreEndpoint {
        base_url: Url::parse(&format!("http://{addr}/")).expect("url"),
        api_key: "anon-key".to_string(),
        request_timeout: Duration::from_secs(5),
    };
    (PostgrestStore::new(endpoint).expect("store"), state)
}

async fn only_request(state: &StubState) -> RecordedRequest {
    let requests = state.requests.lock().await;
    assert_eq!(requests.len(), 1, "expected exactly one request");
    requests[0].clone()
}

const FACULTY_ROWS: &str = r#"[
    {"faculty_id": 1, "name": "Alice", "designation": "Professor", "qualification": "PhD",
     "email": "alice@uni.edu", "phone": null, "profile_link": null, "department_id": 10,
     "department": {"department_name": "Computer Science"}},
    {"faculty_id": 2, "name": "Bob", "designation": "Lecturer", "qualification": null,
     "email": null, "phone": "555-0100", "profile_link": "https://uni.edu/bob", "department_id": 20,
     "department": {"department_name": "Math"}}
]"#;

#[tokio::test]
async fn full_listing_requests_join_and_name_order() {
    let (store, state) = spawn_store(StatusCode::OK, FACULTY_ROWS).await;

    let faculty = store
        .query_faculty(&FacultyQuery::All)
        .await
        .expect("faculty");

    assert_eq!(faculty.len(), 2);
    assert_eq!(faculty[0].faculty_id, FacultyId(1));
    assert_eq!(faculty[1].department_id, DepartmentId(20));
    assert_eq!(faculty[1].department_name(), Some("Math"));

    let request = only_request(&state).await;
    assert_eq!(request.table, "faculty");
    assert_eq!(request.params.get("select").map(String::as_str), Some(FACULTY_SELECT));
    assert_eq!(request.params.get("order").map(String::as_str), Some("name.asc"));
    assert!(!request.params.contains_key("or"));
    assert_eq!(request.apikey.as_deref(), Some("anon-key"));
    assert_eq!(request.authorization.as_deref(), Some("Bearer anon-key"));
}

#[tokio::test]
async fn search_sends_quoted_or_filter_over_three_fields() {
    let (store, state) = spawn_store(StatusCode::OK, "[]").await;

    store
        .query_faculty(&FacultyQuery::for_search("  ali, (x) "))
        .await
        .expect("search");

    let request = only_request(&state).await;
    assert_eq!(
        request.params.get("or").map(String::as_str),
        Some(
            r#"(name.ilike."*ali, (x)*",email.ilike."*ali, (x)*",designation.ilike."*ali, (x)*")"#
        )
    );
    assert_eq!(request.params.get("order").map(String::as_str), Some("name.asc"));
}

#[tokio::test]
async fn department_filter_sends_equality_on_foreign_key() {
    let (store, state) = spawn_store(StatusCode::OK, "[]").await;

    store
        .query_faculty(&FacultyQuery::Department(DepartmentId(20)))
        .await
        .expect("filter");

    let request = only_request(&state).await;
    assert_eq!(
        request.params.get("department_id").map(String::as_str),
        Some("eq.20")
    );
    assert!(!request.params.contains_key("or"));
}

#[tokio::test]
async fn departments_are_read_ordered_by_name() {
    let (store, state) = spawn_store(
        StatusCode::OK,
        r#"[{"department_id": 10, "department_name": "CS"}, {"department_id": 20, "department_name": "Math"}]"#,
    )
    .await;

    let departments = store.query_departments().await.expect("departments");
    assert_eq!(departments.len(), 2);
    assert_eq!(departments[0].department_name, "CS");

    let request = only_request(&state).await;
    assert_eq!(request.table, "department");
    assert_eq!(
        request.params.get("order").map(String::as_str),
        Some("department_name.asc")
    );
}

#[tokio::test]
async fn error_status_decodes_store_error_body() {
    let (store, _state) = spawn_store(
        StatusCode::BAD_REQUEST,
        r#"{"code":"PGRST100","message":"failed to parse logic tree","details":"unexpected ')'","hint":null}"#,
    )
    .await;

    let err = store
        .query_faculty(&FacultyQuery::All)
        .await
        .expect_err("bad request");
    match err {
        ReadFailure::Store { status, body } => {
            assert_eq!(status, Some(400));
            assert_eq!(body.code.as_deref(), Some("PGRST100"));
            assert_eq!(body.message, "failed to parse logic tree");
        }
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn error_status_with_plain_body_keeps_text() {
    let (store, _state) = spawn_store(StatusCode::UNAUTHORIZED, "Invalid API key\n").await;

    let err = store.query_departments().await.expect_err("unauthorized");
    assert_eq!(
        err,
        ReadFailure::Store {
            status: Some(401),
            body: StoreErrorBody::new("Invalid API key"),
        }
    );
}

#[tokio::test]
async fn non_json_success_body_is_malformed() {
    let (store, _state) = spawn_store(StatusCode::OK, "<html>maintenance</html>").await;

    let err = store
        .query_faculty(&FacultyQuery::All)
        .await
        .expect_err("malformed");
    assert!(matches!(err, ReadFailure::Malformed(_)));
}

#[tokio::test]
async fn null_body_is_treated_as_empty_collection() {
    let (store, _state) = spawn_store(StatusCode::OK, "null").await;
    let faculty = store
        .query_faculty(&FacultyQuery::All)
        .await
        .expect("null body");
    assert!(faculty.is_empty());
}

#[tokio::test]
async fn unreachable_store_is_a_transport_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let store = PostgrestStore::with_client(
        Client::new(),
        Url::parse(&format!("http://{addr}/")).expect("url"),
        "anon-key",
    );
    let err = store.query_departments().await.expect_err("refused");
    assert!(matches!(err, ReadFailure::Transport(_)));
}

#[test]
fn search_pattern_escapes_like_and_quote_metacharacters() {
    let params = faculty_params(&FacultyQuery::Search {
        term: r#"50%_"a"\"#.to_string(),
    });
    let or = params
        .iter()
        .find(|(key, _)| *key == "or")
        .map(|(_, value)| value.as_str())
        .expect("or filter");
    let operand = r#""*50\\%\\_\"a\"\\\\*""#;
    assert_eq!(
        or,
        format!("(name.ilike.{operand},email.ilike.{operand},designation.ilike.{operand})")
    );
}
