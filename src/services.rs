use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::analysis::{sample_report, AnalysisReport, RiskCategory};
use crate::assistant::AssistantReply;
use crate::backend::BackendClient;
use crate::document::UploadedDocument;
use crate::profile::{AuthRequest, UserProfile};

#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("document analysis failed: {0}")]
    Analysis(String),
    #[error("assistant reply failed: {0}")]
    Chat(String),
    #[error("voice transcription failed: {0}")]
    Transcription(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn sign_in(&self, request: &AuthRequest) -> Result<UserProfile, ServiceError>;
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn analyze(&self, document: &UploadedDocument) -> Result<AnalysisReport, ServiceError>;
}

/// Whether a chat turn is about a specific uploaded document or Indian law
/// in general. The two scopes answer differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatScope {
    General,
    Document,
}

#[derive(Debug, Clone, Serialize)]
pub struct TurnContext {
    pub question: String,
    pub scope: ChatScope,
}

#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, turn: TurnContext) -> Result<AssistantReply, ServiceError>;
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self) -> Result<String, ServiceError>;
}

/// The four external collaborators, bundled for the app.
#[derive(Clone)]
pub struct Services {
    pub auth: Arc<dyn Authenticator>,
    pub analyzer: Arc<dyn Analyzer>,
    pub responder: Arc<dyn Responder>,
    pub transcriber: Arc<dyn Transcriber>,
}

impl Services {
    /// Canned responses after the standard delays. The default backend.
    pub fn simulated() -> Self {
        Self::from_simulated(SimulatedServices::new())
    }

    /// Canned responses with zero latency, for tests.
    pub fn simulated_instant() -> Self {
        Self::from_simulated(SimulatedServices::instant())
    }

    /// HTTP backend; every capability talks to the same service.
    pub fn remote(base_url: &str) -> Self {
        let client = Arc::new(BackendClient::new(base_url));
        Self {
            auth: client.clone(),
            analyzer: client.clone(),
            responder: client.clone(),
            transcriber: client,
        }
    }

    fn from_simulated(sim: SimulatedServices) -> Self {
        let sim = Arc::new(sim);
        Self {
            auth: sim.clone(),
            analyzer: sim.clone(),
            responder: sim.clone(),
            transcriber: sim,
        }
    }
}

/// Fixed delays the simulated services answer after.
#[derive(Debug, Clone, Copy)]
pub struct LatencyProfile {
    pub auth: Duration,
    pub analyze: Duration,
    pub general_reply: Duration,
    pub document_reply: Duration,
    pub transcribe: Duration,
}

impl LatencyProfile {
    pub fn standard() -> Self {
        Self {
            auth: Duration::from_millis(2000),
            analyze: Duration::from_millis(3000),
            general_reply: Duration::from_millis(2000),
            document_reply: Duration::from_millis(1000),
            transcribe: Duration::from_millis(3000),
        }
    }

    pub fn instant() -> Self {
        Self {
            auth: Duration::ZERO,
            analyze: Duration::ZERO,
            general_reply: Duration::ZERO,
            document_reply: Duration::ZERO,
            transcribe: Duration::ZERO,
        }
    }
}

/// General-scope canned replies; one is picked uniformly at random per turn.
pub const CANNED_REPLIES: [(&str, RiskCategory); 4] = [
    (
        "Based on Indian law, you have several important rights in this situation. Let me \
         explain the key legal provisions that apply to your case. According to the relevant \
         acts and regulations, you should be aware of the following protections and procedures.",
        RiskCategory::Safe,
    ),
    (
        "This is an important legal matter that requires careful attention. There are specific \
         timelines and procedures you must follow under Indian law. I recommend taking action \
         within the prescribed time limits to protect your interests.",
        RiskCategory::Warning,
    ),
    (
        "This situation involves significant legal risks that need immediate attention. I \
         strongly recommend consulting with a qualified lawyer who specializes in this area of \
         law. The legal implications could be serious if not handled properly.",
        RiskCategory::Risk,
    ),
    (
        "This is a common legal question in India. The law provides specific guidelines for \
         this situation. Let me break down the key points you need to understand, including \
         the applicable legal provisions and your options moving forward.",
        RiskCategory::Neutral,
    ),
];

/// Fixed reply for questions asked about an analyzed document.
pub const DOCUMENT_REPLY: &str =
    "Based on your document analysis, I can help explain this further. This relates to the \
     clauses we've identified and the applicable Indian laws. Would you like me to elaborate \
     on any specific aspect?";

/// Fixed transcript produced by the simulated voice capture.
pub const VOICE_TRANSCRIPT: &str =
    "What are the legal requirements for starting a business in India?";

/// Default implementation of all four collaborators: hardcoded answers after
/// a fixed delay, no network, never fails.
pub struct SimulatedServices {
    latency: LatencyProfile,
}

impl SimulatedServices {
    pub fn new() -> Self {
        Self {
            latency: LatencyProfile::standard(),
        }
    }

    pub fn instant() -> Self {
        Self {
            latency: LatencyProfile::instant(),
        }
    }
}

impl Default for SimulatedServices {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for SimulatedServices {
    async fn sign_in(&self, request: &AuthRequest) -> Result<UserProfile, ServiceError> {
        tokio::time::sleep(self.latency.auth).await;
        // No real credential check; the submitted form becomes the profile
        Ok(UserProfile {
            name: request.name.clone(),
            phone: request.phone.clone(),
            email: request.email.clone(),
            preferred_language: request.preferred_language,
            state: request.state.clone(),
        })
    }
}

#[async_trait]
impl Analyzer for SimulatedServices {
    async fn analyze(&self, _document: &UploadedDocument) -> Result<AnalysisReport, ServiceError> {
        tokio::time::sleep(self.latency.analyze).await;
        Ok(sample_report())
    }
}

#[async_trait]
impl Responder for SimulatedServices {
    async fn respond(&self, turn: TurnContext) -> Result<AssistantReply, ServiceError> {
        match turn.scope {
            ChatScope::Document => {
                tokio::time::sleep(self.latency.document_reply).await;
                Ok(AssistantReply {
                    content: DOCUMENT_REPLY.to_string(),
                    category: None,
                })
            }
            ChatScope::General => {
                tokio::time::sleep(self.latency.general_reply).await;
                let idx = rand::thread_rng().gen_range(0..CANNED_REPLIES.len());
                let (content, category) = CANNED_REPLIES[idx];
                Ok(AssistantReply {
                    content: content.to_string(),
                    category: Some(category),
                })
            }
        }
    }
}

#[async_trait]
impl Transcriber for SimulatedServices {
    async fn transcribe(&self) -> Result<String, ServiceError> {
        tokio::time::sleep(self.latency.transcribe).await;
        Ok(VOICE_TRANSCRIPT.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::DocumentKind;
    use crate::profile::{AuthMode, Language};

    fn document() -> UploadedDocument {
        UploadedDocument {
            name: "lease.pdf".to_string(),
            kind: DocumentKind::Pdf,
            size_bytes: 3,
            data: b"pdf".to_vec(),
        }
    }

    #[tokio::test]
    async fn simulated_auth_echoes_the_form() {
        let services = Services::simulated_instant();
        let request = AuthRequest {
            mode: AuthMode::SignUp,
            name: Some("Priya Sharma".to_string()),
            phone: "9876543210".to_string(),
            email: Some("priya@example.com".to_string()),
            password: "secret".to_string(),
            preferred_language: Language::Ta,
            state: Some("Tamil Nadu".to_string()),
        };
        let profile = services.auth.sign_in(&request).await.unwrap();
        assert_eq!(profile.name.as_deref(), Some("Priya Sharma"));
        assert_eq!(profile.preferred_language, Language::Ta);
        assert_eq!(profile.state.as_deref(), Some("Tamil Nadu"));
    }

    #[tokio::test]
    async fn simulated_analysis_is_content_independent() {
        let services = Services::simulated_instant();
        let report = services.analyzer.analyze(&document()).await.unwrap();
        assert_eq!(report.clauses.len(), 4);
        assert!(!report.summary.is_empty());
    }

    #[tokio::test]
    async fn general_replies_come_from_the_canned_set() {
        let services = Services::simulated_instant();
        for _ in 0..16 {
            let reply = services
                .responder
                .respond(TurnContext {
                    question: "What are my rights as a tenant?".to_string(),
                    scope: ChatScope::General,
                })
                .await
                .unwrap();
            let category = reply.category.expect("general replies carry a category");
            assert!(CANNED_REPLIES
                .iter()
                .any(|(content, cat)| *content == reply.content && *cat == category));
        }
    }

    #[tokio::test]
    async fn document_replies_are_fixed() {
        let services = Services::simulated_instant();
        let reply = services
            .responder
            .respond(TurnContext {
                question: "Explain clause 3".to_string(),
                scope: ChatScope::Document,
            })
            .await
            .unwrap();
        assert_eq!(reply.content, DOCUMENT_REPLY);
        assert!(reply.category.is_none());
    }

    #[tokio::test]
    async fn transcription_is_fixed() {
        let services = Services::simulated_instant();
        let transcript = services.transcriber.transcribe().await.unwrap();
        assert_eq!(transcript, VOICE_TRANSCRIPT);
    }
}
