use super::{LosClient, LosUser, SignIn};
use crate::{Error, Result, config::LosConfig};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

pub struct HttpLosClient {
    http: reqwest::Client,
    config: LosConfig,
}

impl HttpLosClient {
    pub fn new(config: LosConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl LosClient for HttpLosClient {
    async fn search_by_nic(&self, nic: &str) -> Result<Value> {
        debug!(nic, "searching applications by NIC");

        let response = self
            .http
            .get(&self.config.search_url)
            .query(&[("oldNic", nic)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::upstream(format!(
                "identity search returned {}",
                response.status()
            )));
        }

        Ok(response.json().await?)
    }

    async fn application_detail(&self, application_id: &str, access_token: &str) -> Result<Value> {
        debug!(application_id, "fetching application detail");

        let response = self
            .http
            .get(&self.config.detail_url)
            .query(&[
                ("applicationId", application_id),
                ("preparationKeys", "applicantDetails"),
            ])
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::upstream(format!(
                "application detail fetch returned {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let applicant_details = body
            .get("data")
            .and_then(|data| data.get("applicantDetails"))
            .filter(|v| !v.is_null())
            .cloned()
            .ok_or_else(|| Error::upstream("no applicant details found"))?;

        Ok(applicant_details)
    }

    async fn sign_in(&self, username: &str, hashed_password: &str) -> Result<SignIn> {
        debug!(username, "signing in against the LOS identity provider");

        let response = self
            .http
            .post(&self.config.sign_in_url)
            .json(&serde_json::json!({
                "username": username,
                "password": hashed_password,
                "language": "EN",
            }))
            .send()
            .await?;

        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);

        if !status.is_success() {
            let message = body
                .get("data")
                .and_then(|d| d.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("Login failed")
                .to_string();

            if status.is_client_error() {
                return Err(Error::Unauthenticated(message));
            }
            return Err(Error::upstream(format!(
                "sign-in returned {}: {}",
                status, message
            )));
        }

        let data = body.get("data").cloned().unwrap_or(Value::Null);
        let user = data
            .get("user")
            .ok_or_else(|| Error::upstream("sign-in response is missing the user object"))?;
        let access_token = data
            .get("accessToken")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::upstream("sign-in response is missing the access token"))?
            .to_string();

        Ok(SignIn {
            user: LosUser {
                id: user.get("id").cloned().unwrap_or(Value::Null),
                name: user
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                email: user
                    .get("email")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
            },
            access_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> LosConfig {
        LosConfig {
            search_url: format!("{}/elasticsearch/customers", server.uri()),
            detail_url: format!(
                "{}/data-api/third-party-service/applications/preparation/details",
                server.uri()
            ),
            sign_in_url: format!("{}/data-api/auth/sign-in", server.uri()),
        }
    }

    #[tokio::test]
    async fn test_search_by_nic_returns_raw_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/elasticsearch/customers"))
            .and(query_param("oldNic", "853421170V"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"applicationId": "APL-1", "status": "PENDING"},
                {"applicationId": "APL-2", "status": "APPROVED"},
            ])))
            .mount(&server)
            .await;

        let client = HttpLosClient::new(config_for(&server));
        let result = client.search_by_nic("853421170V").await.unwrap();

        assert_eq!(result.as_array().unwrap().len(), 2);
        assert_eq!(result[0]["applicationId"], "APL-1");
    }

    #[tokio::test]
    async fn test_search_by_nic_zero_matches_is_empty_list() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/elasticsearch/customers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let client = HttpLosClient::new(config_for(&server));
        let result = client.search_by_nic("000000000V").await.unwrap();

        assert_eq!(result, json!([]));
    }

    #[tokio::test]
    async fn test_search_by_nic_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/elasticsearch/customers"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HttpLosClient::new(config_for(&server));
        let err = client.search_by_nic("853421170V").await.unwrap_err();

        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_application_detail_extracts_applicant_details() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/data-api/third-party-service/applications/preparation/details",
            ))
            .and(query_param("applicationId", "APL-42"))
            .and(query_param("preparationKeys", "applicantDetails"))
            .and(bearer_token("tok-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "applicantDetails": {
                        "personalData": {"primaryFirstName": "Nimal", "primaryLastName": "Perera"}
                    }
                }
            })))
            .mount(&server)
            .await;

        let client = HttpLosClient::new(config_for(&server));
        let details = client.application_detail("APL-42", "tok-123").await.unwrap();

        assert_eq!(details["personalData"]["primaryFirstName"], "Nimal");
    }

    #[tokio::test]
    async fn test_application_detail_missing_payload_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/data-api/third-party-service/applications/preparation/details",
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
            .mount(&server)
            .await;

        let client = HttpLosClient::new(config_for(&server));
        let err = client.application_detail("APL-42", "tok-123").await.unwrap_err();

        assert!(matches!(err, Error::Upstream(_)));
        assert!(err.to_string().contains("no applicant details"));
    }

    #[tokio::test]
    async fn test_application_detail_404_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/data-api/third-party-service/applications/preparation/details",
            ))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HttpLosClient::new(config_for(&server));
        let err = client.application_detail("APL-404", "tok-123").await.unwrap_err();

        assert!(matches!(err, Error::Upstream(_)));
    }

    #[tokio::test]
    async fn test_sign_in_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/data-api/auth/sign-in"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {
                    "user": {"id": 77, "name": "Nimal Perera", "email": "nimal@example.com"},
                    "accessToken": "los-token-abc",
                }
            })))
            .mount(&server)
            .await;

        let client = HttpLosClient::new(config_for(&server));
        let signed_in = client.sign_in("nimal@example.com", "deadbeef").await.unwrap();

        assert_eq!(signed_in.access_token, "los-token-abc");
        assert_eq!(signed_in.user.name, "Nimal Perera");
        // Non-string upstream id stays raw
        assert_eq!(signed_in.user.id, json!(77));
    }

    #[tokio::test]
    async fn test_sign_in_rejected_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/data-api/auth/sign-in"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "data": {"message": "Invalid credentials"}
            })))
            .mount(&server)
            .await;

        let client = HttpLosClient::new(config_for(&server));
        let err = client.sign_in("nimal@example.com", "wrong").await.unwrap_err();

        assert!(matches!(err, Error::Unauthenticated(_)));
        assert!(err.to_string().contains("Invalid credentials"));
    }

    #[tokio::test]
    async fn test_sign_in_provider_outage_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/data-api/auth/sign-in"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = HttpLosClient::new(config_for(&server));
        let err = client.sign_in("nimal@example.com", "deadbeef").await.unwrap_err();

        assert!(matches!(err, Error::Upstream(_)));
    }
}
