//! HTTP advisor
//!
//! Chat-completion client for an OpenAI-compatible advisory endpoint. The
//! model is asked for JSON; answers that fail to arrive or fail to parse
//! degrade to the conservative defaults without surfacing an error.

use super::{AdvisoryModel, PatchProposal, RiskAssessment};
use crate::config::AdvisoryConfig;
use crate::drift::{ChangeCategory, SchemaDelta};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Chat completion message
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

/// Chat completion request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

/// Chat completion response (non-streaming)
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Error types for the advisory client
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error: HTTP {status} - {body}")]
    Server { status: u16, body: String },

    #[error("Empty response")]
    EmptyResponse,

    #[error("Response was not the expected JSON: {0}")]
    MalformedResponse(String),

    #[error("Advisory endpoint is not configured")]
    MissingEndpoint,
}

/// Advisory backend speaking the chat-completion protocol
pub struct HttpAdvisor {
    client: Client,
    endpoint: String,
    model: String,
    max_tokens: u32,
}

impl HttpAdvisor {
    pub fn new(config: &AdvisoryConfig) -> Result<Self, AdvisoryError> {
        let endpoint = config
            .endpoint
            .clone()
            .ok_or(AdvisoryError::MissingEndpoint)?;
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            endpoint,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, AdvisoryError> {
        let url = format!("{}/chat/completions", self.endpoint.trim_end_matches('/'));

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            max_tokens: self.max_tokens,
            temperature: 0.0,
            stream: false,
        };

        let response = self.client.post(&url).json(&request).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisoryError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatCompletionResponse = response.json().await?;

        let content = completion
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(AdvisoryError::EmptyResponse);
        }

        Ok(content)
    }

    async fn try_assess_risk(
        &self,
        delta: &SchemaDelta,
        category: ChangeCategory,
    ) -> Result<RiskAssessment, AdvisoryError> {
        let content = self.complete(&risk_prompt(delta, category)).await?;
        let value = extract_json(&content)?;
        serde_json::from_value(value).map_err(|e| AdvisoryError::MalformedResponse(e.to_string()))
    }

    async fn try_suggest_patch(
        &self,
        script: &str,
        delta: &SchemaDelta,
        category: ChangeCategory,
    ) -> Result<PatchProposal, AdvisoryError> {
        let content = self.complete(&patch_prompt(script, delta, category)).await?;
        let value = extract_json(&content)?;
        serde_json::from_value(value).map_err(|e| AdvisoryError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl AdvisoryModel for HttpAdvisor {
    async fn assess_risk(&self, delta: &SchemaDelta, category: ChangeCategory) -> RiskAssessment {
        match self.try_assess_risk(delta, category).await {
            Ok(assessment) => assessment,
            Err(e) => {
                warn!("Advisory risk assessment failed, using conservative default: {}", e);
                RiskAssessment::conservative()
            }
        }
    }

    async fn suggest_patch(
        &self,
        script: &str,
        delta: &SchemaDelta,
        category: ChangeCategory,
    ) -> PatchProposal {
        match self.try_suggest_patch(script, delta, category).await {
            Ok(patch) => patch,
            Err(e) => {
                warn!("Advisory patch suggestion failed, falling back to manual review: {}", e);
                PatchProposal::manual_review()
            }
        }
    }
}

fn risk_prompt(delta: &SchemaDelta, category: ChangeCategory) -> String {
    let delta_json = serde_json::to_string_pretty(delta).unwrap_or_default();
    format!(
        "Analyze the impact of this event schema change.\n\n\
         Change category: {category}\n\
         Delta:\n{delta_json}\n\n\
         Respond with JSON only:\n\
         {{\"risk_level\": \"LOW|MEDIUM|HIGH\", \"impacts\": [\"...\"], \
         \"recommendations\": [\"...\"], \"safe_to_auto_approve\": true|false}}"
    )
}

fn patch_prompt(script: &str, delta: &SchemaDelta, category: ChangeCategory) -> String {
    let delta_json = serde_json::to_string_pretty(delta).unwrap_or_default();
    let script_section = if script.is_empty() {
        "(transform job script unavailable)".to_string()
    } else {
        script.to_string()
    };
    format!(
        "A transform job consumes events whose schema changed.\n\n\
         Change category: {category}\n\
         Delta:\n{delta_json}\n\n\
         Current transform job script:\n{script_section}\n\n\
         Suggest the minimal patch. Respond with JSON only:\n\
         {{\"patch_type\": \"FIELD_MAPPING|TYPE_COERCION|ERROR_HANDLING|MANUAL_REVIEW\", \
         \"code_changes\": \"...\", \"explanation\": \"...\", \
         \"risk_level\": \"LOW|MEDIUM|HIGH\", \"testing_required\": true|false}}"
    )
}

/// Pull a JSON object out of a model answer that may wrap it in prose
fn extract_json(content: &str) -> Result<serde_json::Value, AdvisoryError> {
    if let Ok(value) = serde_json::from_str(content) {
        return Ok(value);
    }

    let start = content.find('{');
    let end = content.rfind('}');
    if let (Some(start), Some(end)) = (start, end) {
        if start < end {
            if let Ok(value) = serde_json::from_str(&content[start..=end]) {
                return Ok(value);
            }
        }
    }

    Err(AdvisoryError::MalformedResponse(
        content.chars().take(120).collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisory::{PatchType, RiskLevel};
    use crate::config::AdvisoryMode;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn advisor_for(server: &MockServer) -> HttpAdvisor {
        let config = AdvisoryConfig {
            mode: AdvisoryMode::Http,
            endpoint: Some(server.uri()),
            model: "test-advisor".to_string(),
            timeout_ms: 2_000,
            max_tokens: 256,
        };
        HttpAdvisor::new(&config).unwrap()
    }

    fn chat_response(content: &str) -> serde_json::Value {
        json!({
            "id": "cmpl-1",
            "model": "test-advisor",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })
    }

    fn sample_delta() -> SchemaDelta {
        use crate::drift::FieldChange;
        use crate::inference::SchemaKind;
        SchemaDelta {
            added_fields: vec![FieldChange {
                field: "payment_method".to_string(),
                kind: SchemaKind::String,
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_assess_risk_parses_model_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
                r#"{"risk_level":"LOW","impacts":["analytics dashboards"],"recommendations":["backfill optional column"],"safe_to_auto_approve":true}"#,
            )))
            .mount(&server)
            .await;

        let assessment = advisor_for(&server)
            .assess_risk(&sample_delta(), ChangeCategory::Additive)
            .await;

        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert!(assessment.safe_to_auto_approve);
        assert_eq!(assessment.impacts, vec!["analytics dashboards"]);
    }

    #[tokio::test]
    async fn test_prose_wrapped_json_is_extracted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
                "Here is my analysis:\n{\"risk_level\":\"HIGH\",\"impacts\":[],\"recommendations\":[],\"safe_to_auto_approve\":false}\nLet me know if you need more.",
            )))
            .mount(&server)
            .await;

        let assessment = advisor_for(&server)
            .assess_risk(&sample_delta(), ChangeCategory::Breaking)
            .await;

        assert_eq!(assessment.risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_server_error_degrades_to_conservative() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let assessment = advisor_for(&server)
            .assess_risk(&sample_delta(), ChangeCategory::Additive)
            .await;

        assert_eq!(assessment, RiskAssessment::conservative());
    }

    #[tokio::test]
    async fn test_garbage_answer_degrades_to_conservative() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(chat_response("I cannot answer that question.")),
            )
            .mount(&server)
            .await;

        let assessment = advisor_for(&server)
            .assess_risk(&sample_delta(), ChangeCategory::Additive)
            .await;

        assert_eq!(assessment, RiskAssessment::conservative());
    }

    #[tokio::test]
    async fn test_suggest_patch_parses_model_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(chat_response(
                r#"{"patch_type":"FIELD_MAPPING","code_changes":"df = df.withColumn('payment_method', lit(None))","explanation":"Map the new optional field","risk_level":"LOW","testing_required":true}"#,
            )))
            .mount(&server)
            .await;

        let patch = advisor_for(&server)
            .suggest_patch("df.select('order_id')", &sample_delta(), ChangeCategory::Additive)
            .await;

        assert_eq!(patch.patch_type, PatchType::FieldMapping);
        assert_eq!(patch.risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_degrades_to_manual_review() {
        let config = AdvisoryConfig {
            mode: AdvisoryMode::Http,
            endpoint: Some("http://127.0.0.1:1".to_string()),
            model: "test-advisor".to_string(),
            timeout_ms: 200,
            max_tokens: 256,
        };
        let advisor = HttpAdvisor::new(&config).unwrap();

        let patch = advisor
            .suggest_patch("", &sample_delta(), ChangeCategory::Breaking)
            .await;
        assert_eq!(patch, PatchProposal::manual_review());
    }

    #[test]
    fn test_missing_endpoint_is_an_error() {
        let config = AdvisoryConfig::default();
        assert!(matches!(
            HttpAdvisor::new(&config),
            Err(AdvisoryError::MissingEndpoint)
        ));
    }

    #[test]
    fn test_extract_json_variants() {
        assert!(extract_json(r#"{"a":1}"#).is_ok());
        assert!(extract_json("prefix {\"a\":1} suffix").is_ok());
        assert!(extract_json("no json here").is_err());
        assert!(extract_json("{broken").is_err());
    }
}
