//! Client for the payment service entitlement listing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{endpoint, forwarded_authorization, http_client, parse_base_url, transport_error};
use crate::config::BoundaryConfig;
use crate::domain::foundation::{RequestContext, UserId};
use crate::domain::policy::{EntitlementRecord, CONTRACT_VERSION_V1};
use crate::ports::{BoundaryError, EntitlementProvider};

#[derive(Debug, Deserialize)]
struct EntitlementsEnvelope {
    /// Older payment services omit the version; anything present must be v1.
    #[serde(default)]
    contract_version: Option<String>,
    #[serde(default)]
    entitlements: Vec<EntitlementRecord>,
}

/// `EntitlementProvider` over HTTP.
pub struct PaymentEntitlementsClient {
    base_url: Url,
    http: reqwest::Client,
}

impl PaymentEntitlementsClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BoundaryError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http: http_client(timeout)?,
        })
    }

    pub fn from_config(config: &BoundaryConfig) -> Result<Self, BoundaryError> {
        Self::new(&config.payment_base_url, config.timeout())
    }
}

#[async_trait]
impl EntitlementProvider for PaymentEntitlementsClient {
    async fn fetch_entitlements(
        &self,
        ctx: &RequestContext,
        user_id: &UserId,
    ) -> Result<Vec<EntitlementRecord>, BoundaryError> {
        let authorization = forwarded_authorization(ctx)?;
        let url = endpoint(
            &self.base_url,
            &["payments", "entitlements", user_id.as_str()],
        )?;

        let response = self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .send()
            .await
            .map_err(|e| transport_error("payment service", e))?;

        if response.status() != StatusCode::OK {
            return Err(BoundaryError::UpstreamUnavailable(format!(
                "payment service returned status {}",
                response.status().as_u16()
            )));
        }

        let envelope: EntitlementsEnvelope = response
            .json()
            .await
            .map_err(|e| BoundaryError::Decode(e.to_string()))?;

        match envelope.contract_version.as_deref() {
            None | Some(CONTRACT_VERSION_V1) => Ok(envelope.entitlements),
            Some(other) => Err(BoundaryError::UnsupportedContract(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::policy::EntitlementType;

    fn client(server: &mockito::Server) -> PaymentEntitlementsClient {
        PaymentEntitlementsClient::new(&server.url(), Duration::from_secs(5)).unwrap()
    }

    fn ctx() -> RequestContext {
        RequestContext::with_authorization("Bearer token-123")
    }

    fn user() -> UserId {
        UserId::new("u1").unwrap()
    }

    #[tokio::test]
    async fn fetches_entitlements_with_forwarded_bearer() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/payments/entitlements/u1")
            .match_header("authorization", "Bearer token-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"contract_version":"v1","entitlements":[
                    {"type":"subscription","plan_id":"tier3","status":"active"},
                    {"type":"purchase","content_id":"movie-1","status":"completed","expires_at":{"$date":"2030-01-01T00:00:00Z"}}
                ]}"#,
            )
            .create_async()
            .await;

        let records = client(&server).fetch_entitlements(&ctx(), &user()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].entitlement_type, EntitlementType::Subscription);
        assert_eq!(records[1].content_id.as_deref(), Some("movie-1"));
        assert!(records[1].expires_at.is_some());
    }

    #[tokio::test]
    async fn unversioned_response_is_accepted() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/payments/entitlements/u1")
            .with_status(200)
            .with_body(r#"{"entitlements":[]}"#)
            .create_async()
            .await;

        let records = client(&server).fetch_entitlements(&ctx(), &user()).await.unwrap();

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn non_200_fails_closed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/payments/entitlements/u1")
            .with_status(503)
            .create_async()
            .await;

        let err = client(&server)
            .fetch_entitlements(&ctx(), &user())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            BoundaryError::UpstreamUnavailable("payment service returned status 503".to_string())
        );
    }

    #[tokio::test]
    async fn other_contract_version_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/payments/entitlements/u1")
            .with_status(200)
            .with_body(r#"{"contract_version":"v2","entitlements":[]}"#)
            .create_async()
            .await;

        let err = client(&server)
            .fetch_entitlements(&ctx(), &user())
            .await
            .unwrap_err();

        assert_eq!(err, BoundaryError::UnsupportedContract("v2".to_string()));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/payments/entitlements/u1")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let err = client(&server)
            .fetch_entitlements(&ctx(), &user())
            .await
            .unwrap_err();

        assert!(matches!(err, BoundaryError::Decode(_)));
    }

    #[tokio::test]
    async fn missing_bearer_never_calls_upstream() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = client(&server)
            .fetch_entitlements(&RequestContext::default(), &user())
            .await
            .unwrap_err();

        assert_eq!(err, BoundaryError::MissingAuthorization);
        mock.assert_async().await;
    }
}
