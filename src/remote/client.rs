//! Boundary contract between a session and the remote analysis service.
//!
//! Only abstracted text crosses this boundary. Requests carry rendered
//! documents keyed by path; responses carry edited documents, findings in
//! abstracted coordinates and an optional free-text analysis.

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::models::{AbstractedDocument, RemoteFinding, SessionId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Task name understood by the analysis service.
pub const CODE_REVIEW_TASK: &str = "code_review";

/// Request sent to the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    /// Session correlating request and response
    pub session_id: SessionId,

    /// Task to run
    pub task: String,

    /// AI provider name
    pub provider: String,

    /// Model name
    pub model: String,

    /// Name of the provider credential the service should use
    pub api_key_name: String,

    /// Abstracted file contents keyed by path
    pub files: BTreeMap<String, String>,

    /// SHA-256 over the abstracted contents
    pub tamper_evident_hash: String,

    /// Token budget hint, if the session has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_hint: Option<usize>,

    /// Ask the service to minimize its own token usage
    pub token_saver_enabled: bool,
}

impl AnalysisRequest {
    /// Build a request from the abstracted documents of a session.
    pub fn new(
        session_id: SessionId,
        provider: &ProviderConfig,
        documents: &[AbstractedDocument],
        budget_hint: Option<usize>,
    ) -> Self {
        let files: BTreeMap<String, String> = documents
            .iter()
            .map(|d| (d.path.clone(), d.render()))
            .collect();
        let tamper_evident_hash = tamper_evident_hash(files.values().map(String::as_str));

        Self {
            session_id,
            task: CODE_REVIEW_TASK.to_string(),
            provider: provider.provider.clone(),
            model: provider.model.clone(),
            api_key_name: provider.api_key_name.clone(),
            files,
            tamper_evident_hash,
            budget_hint,
            token_saver_enabled: true,
        }
    }

    /// Every piece of text sent to the service.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.files.values().map(String::as_str)
    }
}

/// Response received from the remote service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Free-text analysis, possibly referencing placeholders
    #[serde(default)]
    pub analysis: Option<String>,

    /// Edited abstracted contents keyed by path
    #[serde(default, rename = "result")]
    pub files: BTreeMap<String, String>,

    /// Findings in abstracted coordinates
    #[serde(default)]
    pub findings: Vec<RemoteFinding>,
}

impl AnalysisResponse {
    /// Every piece of text received from the service.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.analysis
            .iter()
            .map(String::as_str)
            .chain(self.files.values().map(String::as_str))
            .chain(self.findings.iter().map(|f| f.message.as_str()))
            .chain(self.findings.iter().filter_map(|f| f.anchor.as_deref()))
    }
}

/// Remote analysis capability.
///
/// Implementations only ever see [`AnalysisRequest`] values; the mapping
/// store stays with the session.
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Run one analysis round trip.
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResponse>;

    /// Short name used in logs.
    fn name(&self) -> &str {
        "remote"
    }
}

/// Hex SHA-256 over the non-empty texts, concatenated in sorted order.
pub fn tamper_evident_hash<'a>(texts: impl IntoIterator<Item = &'a str>) -> String {
    let mut sorted: Vec<&str> = texts.into_iter().filter(|t| !t.is_empty()).collect();
    sorted.sort_unstable();

    let mut hasher = Sha256::new();
    for text in sorted {
        hasher.update(text.as_bytes());
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_order_independent() {
        let a = tamper_evident_hash(["beta", "alpha", ""]);
        let b = tamper_evident_hash(["alpha", "beta"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_hash_of_nothing() {
        assert_eq!(
            tamper_evident_hash(std::iter::empty()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_request_from_documents() {
        let session = SessionId::new();
        let mut doc = AbstractedDocument::new(session, "a.py");
        doc.push_text("x = ");
        doc.push_placeholder(crate::models::Placeholder::new(
            crate::models::PlaceholderKind::Num,
            1,
        ));

        let request = AnalysisRequest::new(session, &ProviderConfig::default(), &[doc], Some(10));
        assert_eq!(request.files["a.py"], "x = ⟪NUM_1⟧");
        assert_eq!(request.task, "code_review");
        assert_eq!(request.tamper_evident_hash, tamper_evident_hash(["x = ⟪NUM_1⟧"]));
        assert!(serde_json::to_string(&request).unwrap().contains("budget_hint"));
    }

    #[test]
    fn test_response_defaults() {
        let response: AnalysisResponse = serde_json::from_str("{}").unwrap();
        assert!(response.files.is_empty());
        assert!(response.findings.is_empty());

        let response: AnalysisResponse = serde_json::from_str(
            r#"{"analysis":"ok","result":{"a.py":"x"},"findings":[{"path":"a.py","message":"m","severity":"HIGH"}]}"#,
        )
        .unwrap();
        assert_eq!(response.files["a.py"], "x");
        assert_eq!(response.findings[0].severity, crate::models::Severity::Error);
        assert_eq!(response.texts().count(), 3);
    }
}
