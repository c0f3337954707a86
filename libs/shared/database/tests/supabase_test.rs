use assert_matches::assert_matches;
use reqwest::Method;
use serde_json::{json, Value};
use wiremock::{MockServer, Mock, ResponseTemplate};
use wiremock::matchers::{method, path, header, query_param};

use shared_config::AppConfig;
use shared_database::supabase::{sqlstate, SupabaseClient, SupabaseError};

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_service_key: "service-key".to_string(),
        jwt_secret: "secret".to_string(),
        jwt_expiry_hours: 24,
        port: 3000,
    }
}

#[tokio::test]
async fn test_request_sends_service_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", "eq.42"))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": 42 }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let rows: Vec<Value> = client
        .request(Method::GET, "/rest/v1/patients?id=eq.42", None)
        .await
        .unwrap();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["id"], 42);
}

#[tokio::test]
async fn test_empty_body_decodes_as_unit() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/patient_physicians"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let result: Result<(), SupabaseError> = client
        .request(Method::DELETE, "/rest/v1/patient_physicians?patient_id=eq.1", None)
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_unique_violation_is_classified() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/patients"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "details": "Key (email)=(a@b.pt) already exists.",
            "hint": null,
            "message": "duplicate key value violates unique constraint \"patients_email_key\""
        })))
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let err = client
        .request_with_headers::<Vec<Value>>(
            Method::POST,
            "/rest/v1/patients",
            Some(json!({ "email": "a@b.pt" })),
            Some(SupabaseClient::representation_headers()),
        )
        .await
        .unwrap_err();

    assert!(err.is_constraint(sqlstate::UNIQUE_VIOLATION));
}

#[tokio::test]
async fn test_server_error_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let client = SupabaseClient::new(&config_for(&mock_server));
    let err = client
        .request::<Vec<Value>>(Method::GET, "/rest/v1/appointments", None)
        .await
        .unwrap_err();

    assert_matches!(err, SupabaseError::Api { status: 503, .. });
}
