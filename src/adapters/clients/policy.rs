//! Client for the policy service evaluation endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde::Deserialize;

use super::{endpoint, forwarded_authorization, http_client, parse_base_url, transport_error};
use crate::config::BoundaryConfig;
use crate::domain::foundation::RequestContext;
use crate::domain::policy::{EvaluationRequest, PolicyDecision, CONTRACT_VERSION_V1};
use crate::ports::{BoundaryError, PolicyProvider};

#[derive(Debug, Deserialize)]
struct DecisionEnvelope {
    #[serde(default)]
    contract_version: String,
    decision: PolicyDecision,
}

/// `PolicyProvider` over HTTP; always sends a v1 request.
pub struct PolicyClient {
    base_url: Url,
    http: reqwest::Client,
}

impl PolicyClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BoundaryError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            http: http_client(timeout)?,
        })
    }

    pub fn from_config(config: &BoundaryConfig) -> Result<Self, BoundaryError> {
        Self::new(&config.policy_base_url, config.timeout())
    }
}

#[async_trait]
impl PolicyProvider for PolicyClient {
    async fn evaluate(
        &self,
        ctx: &RequestContext,
        request: &EvaluationRequest,
    ) -> Result<PolicyDecision, BoundaryError> {
        if request.content_id.trim().is_empty() {
            return Err(BoundaryError::InvalidRequest("content id is required".to_string()));
        }
        if request.user_id.trim().is_empty() {
            return Err(BoundaryError::InvalidRequest("user id is required".to_string()));
        }
        let authorization = forwarded_authorization(ctx)?;
        let url = endpoint(
            &self.base_url,
            &["policy", "v1", "entitlements", "evaluate"],
        )?;

        let body = EvaluationRequest {
            contract_version: CONTRACT_VERSION_V1.to_string(),
            ..request.clone()
        };

        let response = self
            .http
            .post(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("policy service", e))?;

        if response.status() != StatusCode::OK {
            return Err(BoundaryError::UpstreamUnavailable(format!(
                "policy service returned status {}",
                response.status().as_u16()
            )));
        }

        let envelope: DecisionEnvelope = response
            .json()
            .await
            .map_err(|e| BoundaryError::Decode(e.to_string()))?;

        if envelope.contract_version != CONTRACT_VERSION_V1 {
            return Err(BoundaryError::UnsupportedContract(envelope.contract_version));
        }

        Ok(envelope.decision)
    }
}
