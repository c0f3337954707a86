use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_cell::auth_routes;
use shared_models::auth::Role;
use shared_utils::jwt::validate_token;
use shared_utils::password::hash_password;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn create_test_app(config: &TestConfig) -> Router {
    auth_routes(config.to_arc())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn login_request(email: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "email": email, "password": password }).to_string()))
        .unwrap()
}

async fn mount_account(mock_server: &MockServer, table: &str, account: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/v1/{}", table)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([account])))
        .mount(mock_server)
        .await;
}

async fn mount_empty(mock_server: &MockServer, table: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/v1/{}", table)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_physician_login_issues_token_with_specialty() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let physician_id = Uuid::new_v4().to_string();

    mount_empty(&mock_server, "patients").await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/physicians"))
        .and(query_param("email", "eq.rui@clinica.pt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": physician_id,
            "email": "rui@clinica.pt",
            "password_hash": hash_password("fisio123").unwrap(),
            "specialty": "PHYSIOTHERAPIST",
            "created_at": "2024-01-01T00:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    let response = app.oneshot(login_request("  Rui@Clinica.pt ", "fisio123")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["user"]["id"], physician_id);
    assert_eq!(body["user"]["role"], "PHYSICIAN");

    let token = body["token"].as_str().unwrap();
    let user = validate_token(token, &config.jwt_secret).unwrap();
    assert_eq!(user.role, Role::Physician);
    assert_eq!(user.id, physician_id);
}

#[tokio::test]
async fn test_patient_found_first() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let patient_id = Uuid::new_v4().to_string();

    mount_account(&mock_server, "patients", json!({
        "id": patient_id,
        "email": "ana@example.pt",
        "password_hash": hash_password("segredo").unwrap(),
        "created_at": "2024-01-01T00:00:00Z"
    })).await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/physicians"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    let response = app.oneshot(login_request("ana@example.pt", "segredo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["user"]["role"], "PATIENT");
}

#[tokio::test]
async fn test_wrong_password_and_unknown_email_look_the_same() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("email", "eq.ana@example.pt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": Uuid::new_v4().to_string(),
            "email": "ana@example.pt",
            "password_hash": hash_password("segredo").unwrap(),
            "created_at": null
        }])))
        .mount(&mock_server)
        .await;
    mount_empty(&mock_server, "patients").await;
    mount_empty(&mock_server, "physicians").await;
    mount_empty(&mock_server, "administrators").await;

    let app = create_test_app(&config);

    let wrong_password = app.clone().oneshot(login_request("ana@example.pt", "errada")).await.unwrap();
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password_body = body_json(wrong_password).await;

    let unknown = app.oneshot(login_request("ninguem@example.pt", "errada")).await.unwrap();
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    let unknown_body = body_json(unknown).await;

    assert_eq!(wrong_password_body["error"], "Invalid email or password");
    assert_eq!(wrong_password_body, unknown_body);
}

#[tokio::test]
async fn test_storage_outage_is_service_unavailable() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    let response = app.oneshot(login_request("ana@example.pt", "segredo")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_me_requires_token() {
    let config = TestConfig::default();
    let user = TestUser::patient("ana@example.pt");

    let app = create_test_app(&config);

    let anonymous = Request::builder().uri("/me").body(Body::empty()).unwrap();
    let response = app.clone().oneshot(anonymous).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let authenticated = Request::builder()
        .uri("/me")
        .header("authorization", JwtTestUtils::bearer(&user, &config))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(authenticated).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], user.id);
    assert_eq!(body["role"], "PATIENT");
}
