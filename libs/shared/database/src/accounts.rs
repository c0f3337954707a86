use reqwest::Method;
use serde_json::Value;

use crate::supabase::{SupabaseClient, SupabaseError};

/// Every table holding login credentials. An email may appear in at most one.
pub const ACCOUNT_TABLES: [&str; 3] = ["patients", "physicians", "administrators"];

/// Name of the account table already holding `email`, if any.
pub async fn email_owner(
    supabase: &SupabaseClient,
    email: &str,
) -> Result<Option<&'static str>, SupabaseError> {
    for table in ACCOUNT_TABLES {
        let path = format!(
            "/rest/v1/{}?email=eq.{}&select=id",
            table,
            urlencoding::encode(email)
        );
        let rows: Vec<Value> = supabase.request(Method::GET, &path, None).await?;
        if !rows.is_empty() {
            return Ok(Some(table));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_config::AppConfig;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(url: &str) -> SupabaseClient {
        SupabaseClient::new(&AppConfig {
            supabase_url: url.to_string(),
            supabase_service_key: "test-service-key".to_string(),
            jwt_secret: "secret".to_string(),
            jwt_expiry_hours: 24,
            port: 3000,
        })
    }

    #[tokio::test]
    async fn test_email_owner_searches_every_account_table() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rest/v1/administrators"))
            .and(query_param("email", "eq.admin@clinica.pt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{ "id": "a-1" }])))
            .mount(&mock_server)
            .await;
        for table in ["patients", "physicians"] {
            Mock::given(method("GET"))
                .and(path(format!("/rest/v1/{}", table)))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let owner = email_owner(&client(&mock_server.uri()), "admin@clinica.pt").await.unwrap();
        assert_eq!(owner, Some("administrators"));
    }
}
