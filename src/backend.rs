use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::analysis::AnalysisReport;
use crate::assistant::AssistantReply;
use crate::document::UploadedDocument;
use crate::profile::{AuthRequest, UserProfile};
use crate::services::{
    Analyzer, Authenticator, Responder, ServiceError, Transcriber, TurnContext,
};

#[derive(Deserialize)]
struct TranscriptResponse {
    transcript: String,
}

/// JSON client for a real backend. Configured through `backend_url`; when it
/// is set, every capability the simulated services cover is served remotely:
///
///   POST /auth/sign-in   AuthRequest        -> UserProfile
///   POST /analyze        raw document bytes -> AnalysisReport
///   POST /chat           TurnContext        -> AssistantReply
///   POST /transcribe                        -> { transcript }
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn error_text(response: reqwest::Response) -> String {
        let status = response.status();
        match response.text().await {
            Ok(body) if !body.is_empty() => format!("status {}: {}", status, body),
            _ => format!("status {}", status),
        }
    }
}

#[async_trait]
impl Authenticator for BackendClient {
    async fn sign_in(&self, request: &AuthRequest) -> Result<UserProfile, ServiceError> {
        let response = self
            .client
            .post(self.url("/auth/sign-in"))
            .json(request)
            .send()
            .await
            .map_err(|e| ServiceError::Auth(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Auth(Self::error_text(response).await));
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::Auth(e.to_string()))
    }
}

#[async_trait]
impl Analyzer for BackendClient {
    async fn analyze(&self, document: &UploadedDocument) -> Result<AnalysisReport, ServiceError> {
        let response = self
            .client
            .post(self.url("/analyze"))
            .header(reqwest::header::CONTENT_TYPE, document.kind.mime_type())
            .header("x-file-name", &document.name)
            .body(document.data.clone())
            .send()
            .await
            .map_err(|e| ServiceError::Analysis(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Analysis(Self::error_text(response).await));
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::Analysis(e.to_string()))
    }
}

#[async_trait]
impl Responder for BackendClient {
    async fn respond(&self, turn: TurnContext) -> Result<AssistantReply, ServiceError> {
        let response = self
            .client
            .post(self.url("/chat"))
            .json(&turn)
            .send()
            .await
            .map_err(|e| ServiceError::Chat(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Chat(Self::error_text(response).await));
        }
        response
            .json()
            .await
            .map_err(|e| ServiceError::Chat(e.to_string()))
    }
}

#[async_trait]
impl Transcriber for BackendClient {
    async fn transcribe(&self) -> Result<String, ServiceError> {
        let response = self
            .client
            .post(self.url("/transcribe"))
            .send()
            .await
            .map_err(|e| ServiceError::Transcription(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Transcription(Self::error_text(response).await));
        }
        let parsed: TranscriptResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Transcription(e.to_string()))?;
        Ok(parsed.transcript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let client = BackendClient::new("http://localhost:8080/");
        assert_eq!(client.url("/chat"), "http://localhost:8080/chat");

        let bare = BackendClient::new("http://localhost:8080");
        assert_eq!(bare.url("/analyze"), "http://localhost:8080/analyze");
    }
}
