use crate::api::ChatBackend;
use crate::api::models::{
    ChatMessage, Profile, SendOutcome, conversation_id_from_payload, messages_from_payload,
    profiles_from_payload,
};
use crate::config::Settings;
use crate::error::{TransportError, TransportResult};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::time::Duration;

/// HTTP client for the conversation service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
    settings: Settings,
}

impl ApiClient {
    pub fn new(settings: Settings) -> TransportResult<Self> {
        if settings.base_url.is_empty() {
            return Err(TransportError::Config("base_url is empty".into()));
        }
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self { http, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Turns a non-2xx response into `TransportError::Status`, keeping the raw body.
    async fn check(resp: reqwest::Response) -> TransportResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let text = resp.text().await.unwrap_or_default();
        let body = if text.trim().is_empty() {
            status.canonical_reason().unwrap_or("").to_string()
        } else {
            text
        };
        Err(TransportError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn json(resp: reqwest::Response) -> TransportResult<Value> {
        let resp = Self::check(resp).await?;
        resp.json::<Value>()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))
    }

    pub async fn profiles(&self) -> TransportResult<Vec<Profile>> {
        let endpoint = self.settings.endpoint(&self.settings.profiles_path);
        log::debug!("GET {}", endpoint);
        let resp = self
            .http
            .get(&endpoint)
            .header("accept", "application/json")
            .send()
            .await?;
        let json = Self::json(resp).await?;
        Ok(profiles_from_payload(&json))
    }

    pub async fn apply_profile(&self, profile_id: &str) -> TransportResult<()> {
        let endpoint = self.settings.endpoint(&self.settings.set_profile_path);
        log::debug!("POST {} profile_id={}", endpoint, profile_id);
        let body = serde_json::json!({ "profile_id": profile_id });
        let resp = self
            .http
            .post(&endpoint)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await?;
        Self::check(resp).await?;
        Ok(())
    }

    pub async fn ask(&self, conversation_id: Option<&str>, message: &str) -> TransportResult<SendOutcome> {
        let endpoint = self.settings.endpoint(&self.settings.send_path);
        log::debug!("POST {} conversation={:?}", endpoint, conversation_id);
        let body = serde_json::json!({
            "conversation_id": conversation_id,
            "message": message,
        });
        let resp = self
            .http
            .post(&endpoint)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await?;
        let json = Self::json(resp).await?;
        let conversation_id = conversation_id_from_payload(&json)
            .or_else(|| conversation_id.map(str::to_string))
            .ok_or_else(|| TransportError::Decode("no conversation_id in response".into()))?;
        Ok(SendOutcome {
            conversation_id,
            seed: messages_from_payload(&json),
        })
    }

    pub async fn history(&self, conversation_id: &str, limit: u32) -> TransportResult<Vec<ChatMessage>> {
        let endpoint = self
            .settings
            .history_endpoint(conversation_id)
            .map_err(|e| TransportError::Config(e.to_string()))?;
        log::debug!("GET {} limit={}", endpoint, limit);
        let resp = self
            .http
            .get(endpoint)
            .header("accept", "application/json")
            .query(&[("limit", limit)])
            .send()
            .await?;
        let json = Self::json(resp).await?;
        Ok(messages_from_payload(&json))
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn list_profiles(&self) -> TransportResult<Vec<Profile>> {
        self.profiles().await
    }

    async fn set_active_profile(&self, profile_id: &str) -> TransportResult<()> {
        self.apply_profile(profile_id).await
    }

    async fn send_message(
        &self,
        conversation_id: Option<&str>,
        text: &str,
    ) -> TransportResult<SendOutcome> {
        self.ask(conversation_id, text).await
    }

    async fn fetch_history(
        &self,
        conversation_id: &str,
        limit: u32,
    ) -> TransportResult<Vec<ChatMessage>> {
        self.history(conversation_id, limit).await
    }
}
