//! Language model abstraction and the Gemini chat client.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::ModelConfig;
use crate::error::{MnemoError, Result};
use crate::message::{Message, Role, ToolCall};
use crate::tool::ToolDescription;

/// Result of a chat completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelCompletion {
    pub content: Option<String>,
    pub tool_calls: Vec<ToolCall>,
}

impl ModelCompletion {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn tool_call(name: impl Into<String>, arguments: Value) -> Self {
        Self {
            content: None,
            tool_calls: vec![ToolCall {
                name: name.into(),
                arguments,
            }],
        }
    }
}

/// Minimal abstraction around a chat completion provider.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete_chat(
        &self,
        messages: &[Message],
        tools: &[ToolDescription],
    ) -> Result<ModelCompletion>;
}

fn coalesce_error(status: reqwest::StatusCode, body: &str, provider: &str) -> MnemoError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return MnemoError::LanguageModel(format!("{provider} rate limit exceeded: {body}"));
    }
    MnemoError::LanguageModel(format!("{provider} request failed with {status}: {body}"))
}

#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    model: String,
    api_key: String,
    endpoint: String,
    generation: GenerationConfig,
}

impl GeminiClient {
    pub fn from_config(cfg: &ModelConfig) -> Result<Self> {
        let api_key = cfg
            .api_key
            .clone()
            .ok_or_else(|| MnemoError::Credential("Gemini API key".into()))?;
        Ok(Self {
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(60))
                .build()
                .map_err(|err| MnemoError::LanguageModel(format!("http client error: {err}")))?,
            model: cfg.model.clone(),
            api_key,
            endpoint: cfg.endpoint.clone(),
            generation: GenerationConfig {
                temperature: cfg.temperature,
                top_p: cfg.top_p,
                top_k: cfg.top_k,
                max_output_tokens: cfg.max_output_tokens,
            },
        })
    }

    /// System messages travel in `systemInstruction`; everything else becomes
    /// a `contents` entry. Assistant tool calls map to `functionCall` parts
    /// and tool results to `functionResponse` parts.
    fn to_contents(&self, messages: &[Message]) -> (Option<GeminiContent>, Vec<GeminiContent>) {
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| GeminiContent {
                role: None,
                parts: vec![GeminiPart::text(&m.content)],
            });

        let contents = messages
            .iter()
            .filter_map(|message| match message.role {
                Role::System => None,
                Role::User => Some(GeminiContent {
                    role: Some("user".into()),
                    parts: vec![GeminiPart::text(&message.content)],
                }),
                Role::Assistant => {
                    let part = match &message.tool_call {
                        Some(call) => GeminiPart::function_call(call),
                        None => GeminiPart::text(&message.content),
                    };
                    Some(GeminiContent {
                        role: Some("model".into()),
                        parts: vec![part],
                    })
                }
                Role::Tool => message.tool_result.as_ref().map(|result| GeminiContent {
                    role: Some("user".into()),
                    parts: vec![GeminiPart::function_response(result.name.clone(), &result.output)],
                }),
            })
            .collect();

        (system, contents)
    }

    fn to_tools(&self, tools: &[ToolDescription]) -> Option<Vec<GeminiToolDecl>> {
        if tools.is_empty() {
            return None;
        }
        Some(vec![GeminiToolDecl {
            function_declarations: tools
                .iter()
                .map(|tool| GeminiFunctionDecl {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: tool.parameters.clone(),
                })
                .collect(),
        }])
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn complete_chat(
        &self,
        messages: &[Message],
        tools: &[ToolDescription],
    ) -> Result<ModelCompletion> {
        let (system_instruction, contents) = self.to_contents(messages);
        let payload = GeminiRequest {
            system_instruction,
            contents,
            tools: self.to_tools(tools),
            generation_config: self.generation.clone(),
        };

        let resp = self
            .http
            .post(format!(
                "{}/models/{}:generateContent?key={}",
                self.endpoint, self.model, self.api_key
            ))
            .json(&payload)
            .send()
            .await
            .map_err(|err| MnemoError::LanguageModel(format!("Gemini request error: {err}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(coalesce_error(status, &body, "gemini"));
        }

        let parsed: GeminiResponse = resp
            .json()
            .await
            .map_err(|err| MnemoError::LanguageModel(format!("Gemini response parse error: {err}")))?;

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        if let Some(candidate) = parsed.candidates.into_iter().next() {
            for part in candidate.content.parts {
                if let Some(text) = part.text {
                    content.push_str(&text);
                }
                if let Some(call) = part.function_call {
                    tool_calls.push(ToolCall {
                        name: call.name,
                        arguments: call.args.unwrap_or_else(|| json!({})),
                    });
                }
            }
        }

        Ok(ModelCompletion {
            content: if content.is_empty() {
                None
            } else {
                Some(content)
            },
            tool_calls,
        })
    }
}

/// Scripted model for tests: pops completions in the order given.
pub struct StubModel {
    completions: Mutex<VecDeque<ModelCompletion>>,
}

impl StubModel {
    pub fn new(completions: Vec<ModelCompletion>) -> Self {
        Self {
            completions: Mutex::new(completions.into()),
        }
    }
}

#[async_trait]
impl LanguageModel for StubModel {
    async fn complete_chat(
        &self,
        _messages: &[Message],
        _tools: &[ToolDescription],
    ) -> Result<ModelCompletion> {
        self.completions
            .lock()
            .expect("stub lock")
            .pop_front()
            .ok_or_else(|| MnemoError::LanguageModel("stub model exhausted".into()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Gemini wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<GeminiToolDecl>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPart {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_call: Option<GeminiFunctionCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_response: Option<GeminiFunctionResponse>,
}

impl GeminiPart {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    fn function_call(call: &ToolCall) -> Self {
        Self {
            function_call: Some(GeminiFunctionCall {
                name: call.name.clone(),
                args: Some(call.arguments.clone()),
            }),
            ..Self::default()
        }
    }

    fn function_response(name: String, output: &Value) -> Self {
        Self {
            function_response: Some(GeminiFunctionResponse {
                name,
                response: json!({ "result": output }),
            }),
            ..Self::default()
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiToolDecl {
    function_declarations: Vec<GeminiFunctionDecl>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDecl {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        let cfg = ModelConfig {
            api_key: Some("test-key".into()),
            ..ModelConfig::default()
        };
        GeminiClient::from_config(&cfg).unwrap()
    }

    #[test]
    fn requires_api_key() {
        let cfg = ModelConfig::default();
        assert!(matches!(
            GeminiClient::from_config(&cfg),
            Err(MnemoError::Credential(_))
        ));
    }

    #[test]
    fn maps_system_message_to_instruction() {
        let client = client();
        let messages = vec![Message::system("be terse"), Message::user("hi")];
        let (system, contents) = client.to_contents(&messages);

        assert_eq!(system.unwrap().parts[0].text.as_deref(), Some("be terse"));
        assert_eq!(contents.len(), 1);
        assert_eq!(contents[0].role.as_deref(), Some("user"));
    }

    #[test]
    fn maps_tool_exchange_to_function_parts() {
        let client = client();
        let call = ToolCall {
            name: "calculate".into(),
            arguments: json!({"expression": "2+2"}),
        };
        let messages = vec![
            Message::user("what is 2+2?"),
            Message::tool_call(call),
            Message::tool_result("calculate", json!({"result": "4"})),
        ];
        let (_, contents) = client.to_contents(&messages);

        assert_eq!(contents.len(), 3);
        assert!(contents[1].parts[0].function_call.is_some());
        let response = contents[2].parts[0].function_response.as_ref().unwrap();
        assert_eq!(response.name, "calculate");
    }

    #[test]
    fn parses_function_call_candidate() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "parts": [{"functionCall": {"name": "calculate", "args": {"expression": "2+2"}}}],
                    "role": "model"
                }
            }]
        });
        let parsed: GeminiResponse = serde_json::from_value(raw).unwrap();
        let part = &parsed.candidates[0].content.parts[0];
        assert_eq!(part.function_call.as_ref().unwrap().name, "calculate");
    }
}
