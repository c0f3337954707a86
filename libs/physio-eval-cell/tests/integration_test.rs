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

use physio_eval_cell::physio_eval_routes;
use shared_models::auth::Specialty;
use shared_utils::test_utils::{JwtTestUtils, MockSupabaseResponses, TestConfig, TestUser};

fn create_test_app(config: &TestConfig) -> Router {
    physio_eval_routes(config.to_arc())
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, bearer: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", bearer)
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, bearer: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", bearer)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_physiotherapist_records_evaluation() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let physician = TestUser::physician("rui@clinica.pt");
    let patient_id = Uuid::new_v4().to_string();
    let eval_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": patient_id }])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/physio_evals"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockSupabaseResponses::physio_eval_response(&eval_id, &patient_id, &physician.id)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    let response = app
        .oneshot(post_json(
            "/",
            &JwtTestUtils::bearer(&physician, &config),
            json!({ "patient_id": patient_id, "main_complaint": "Dor lombar", "pain_scale": 6 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["id"], eval_id);
    assert_eq!(body["pain_scale"], 6);
}

#[tokio::test]
async fn test_orthopedist_cannot_record_evaluation() {
    let config = TestConfig::default();
    let orthopedist = TestUser::physician_with("tiago@clinica.pt", Specialty::Orthopedist);

    let app = create_test_app(&config);
    let response = app
        .oneshot(post_json(
            "/",
            &JwtTestUtils::bearer(&orthopedist, &config),
            json!({ "patient_id": Uuid::new_v4(), "main_complaint": "Dor lombar", "pain_scale": 6 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_out_of_range_pain_scale_is_rejected() {
    let config = TestConfig::default();
    let physician = TestUser::physician_with("marta@clinica.pt", Specialty::Physiatrist);

    let app = create_test_app(&config);
    let response = app
        .oneshot(post_json(
            "/",
            &JwtTestUtils::bearer(&physician, &config),
            json!({ "patient_id": Uuid::new_v4(), "main_complaint": "Dor lombar", "pain_scale": 12 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_patient_is_not_found() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let physician = TestUser::physician("rui@clinica.pt");

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    let response = app
        .oneshot(post_json(
            "/",
            &JwtTestUtils::bearer(&physician, &config),
            json!({ "patient_id": Uuid::new_v4(), "main_complaint": "Dor lombar", "pain_scale": 3 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_patient_evaluations_newest_first() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let physician = TestUser::physician("rui@clinica.pt");
    let patient_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/physio_evals"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param("order", "created_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::physio_eval_response(&Uuid::new_v4().to_string(), &patient_id, &physician.id),
            MockSupabaseResponses::physio_eval_response(&Uuid::new_v4().to_string(), &patient_id, &physician.id)
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    let response = app
        .oneshot(get(
            &format!("/patient/{}", patient_id),
            &JwtTestUtils::bearer(&physician, &config),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn test_patient_reads_only_own_evaluation() {
    let mock_server = MockServer::start().await;
    let config = TestConfig::with_url(&mock_server.uri());
    let owner = TestUser::patient("ana@example.pt");
    let stranger = TestUser::patient("bruno@example.pt");
    let eval_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/physio_evals"))
        .and(query_param("id", format!("eq.{}", eval_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::physio_eval_response(&eval_id, &owner.id, &Uuid::new_v4().to_string())
        ])))
        .mount(&mock_server)
        .await;

    let app = create_test_app(&config);
    let uri = format!("/eval/{}", eval_id);

    let response = app
        .clone()
        .oneshot(get(&uri, &JwtTestUtils::bearer(&owner, &config)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get(&uri, &JwtTestUtils::bearer(&stranger, &config)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
