//! OpenAI Chat Completions transport using function calling.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::SleuthError;
use crate::types::{FinishReason, Role, ToolInvocation, Turn, Usage};

use super::http::{bearer_headers, build_client, status_to_error, transport_error};
use super::{ModelClient, ModelRequest, ModelResponse};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Raw transport: one HTTP request per [`ModelClient::send`], no retry.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SleuthError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SleuthError::Configuration(
                "OpenAI API key is empty; set OPENAI_API_KEY".into(),
            ));
        }
        Ok(Self {
            http: build_client(timeout)?,
            api_key,
            base_url: base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_request_body(&self, request: &ModelRequest) -> Value {
        let messages: Vec<Value> = request.transcript.iter().map(turn_to_openai).collect();

        let mut body = json!({
            "model": request.model,
            "messages": messages,
        });

        if let Some(obj) = body.as_object_mut() {
            let settings = &request.settings;
            if let Some(temp) = settings.temperature {
                obj.insert("temperature".into(), temp.into());
            }
            if let Some(max) = settings.max_tokens {
                obj.insert("max_tokens".into(), max.into());
            }
            if let Some(top_p) = settings.top_p {
                obj.insert("top_p".into(), top_p.into());
            }
            if let Some(seed) = settings.seed {
                obj.insert("seed".into(), seed.into());
            }
            if let Some(ref user) = settings.user {
                obj.insert("user".into(), user.clone().into());
            }

            if !request.tools.is_empty() {
                let functions: Vec<Value> = request
                    .tools
                    .iter()
                    .map(|t| {
                        json!({
                            "name": t.name,
                            "description": t.description,
                            "parameters": t.parameters,
                        })
                    })
                    .collect();
                obj.insert("functions".into(), functions.into());
            }

            if let Some(ref forced) = request.forced_tool {
                obj.insert("function_call".into(), json!({ "name": forced }));
            }
        }

        body
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    async fn send(&self, request: &ModelRequest) -> Result<ModelResponse, SleuthError> {
        let body = self.build_request_body(request);
        let url = format!("{}/chat/completions", self.base_url);

        debug!(
            model = %request.model,
            turns = request.transcript.len(),
            forced = ?request.forced_tool,
            "OpenAI chat completion"
        );

        let resp = self
            .http
            .post(&url)
            .headers(bearer_headers(&self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let text = resp
            .text()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !(200..300).contains(&status) {
            return Err(status_to_error(status, &headers, &text));
        }

        let data: OpenAiChatResponse = serde_json::from_str(&text)?;
        parse_response(data)
    }
}

fn parse_response(data: OpenAiChatResponse) -> Result<ModelResponse, SleuthError> {
    let choice = data
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| SleuthError::api(200, "No choices in OpenAI response"))?;

    let tool_call = choice
        .message
        .function_call
        .or_else(|| {
            choice
                .message
                .tool_calls
                .and_then(|calls| calls.into_iter().next())
                .map(|c| c.function)
        })
        .map(|f| ToolInvocation::new(f.name, f.arguments.unwrap_or_default()));

    let finish_reason = choice
        .finish_reason
        .as_deref()
        .map(FinishReason::from_wire)
        .unwrap_or(FinishReason::Stop);

    Ok(ModelResponse {
        text: choice.message.content,
        tool_call,
        finish_reason,
        usage: data
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default(),
    })
}

fn turn_to_openai(turn: &Turn) -> Value {
    match turn.role {
        Role::System => json!({ "role": "system", "content": turn.content }),
        Role::User => json!({ "role": "user", "content": turn.content }),
        Role::Assistant => match turn.tool_call {
            Some(ref call) => json!({
                "role": "assistant",
                "content": Value::Null,
                "function_call": { "name": call.name, "arguments": call.arguments },
            }),
            None => json!({ "role": "assistant", "content": turn.content }),
        },
        Role::ToolResult => json!({
            "role": "function",
            "name": turn.tool_name,
            "content": turn.content,
        }),
    }
}

// OpenAI API response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    function_call: Option<OpenAiFunction>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ToolDefinition;
    use crate::types::Transcript;
    use pretty_assertions::assert_eq;

    fn client() -> OpenAiClient {
        OpenAiClient::new("sk-test", None, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn empty_api_key_is_rejected() {
        let err = OpenAiClient::new("  ", None, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, SleuthError::Configuration(_)));
    }

    #[test]
    fn request_body_forces_function_and_maps_roles() {
        let mut transcript = Transcript::with_prompt("sys", "go");
        transcript
            .push(Turn::assistant_call(ToolInvocation::new("Echo", r#"{"text":"a"}"#)))
            .unwrap();
        transcript.push(Turn::tool_result("Echo", "a")).unwrap();

        let request = ModelRequest::new("gpt-4", transcript)
            .with_tools(vec![ToolDefinition {
                name: "Done".into(),
                description: "finish".into(),
                parameters: json!({"type": "object", "properties": {}}),
            }])
            .with_forced_tool(Some("Done".into()));

        let body = client().build_request_body(&request);

        assert_eq!(body["function_call"], json!({"name": "Done"}));
        assert_eq!(body["functions"][0]["name"], "Done");
        assert_eq!(body["messages"][2]["function_call"]["name"], "Echo");
        assert_eq!(body["messages"][3]["role"], "function");
        assert_eq!(body["messages"][3]["name"], "Echo");
        assert!(body.get("temperature").is_none());
    }

    #[test]
    fn unforced_request_omits_function_call() {
        let request = ModelRequest::new("gpt-4", Transcript::with_prompt("s", "u"));
        let body = client().build_request_body(&request);

        assert!(body.get("function_call").is_none());
        assert!(body.get("functions").is_none());
    }

    #[test]
    fn parses_function_call_with_raw_arguments() {
        let data: OpenAiChatResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {
                    "content": null,
                    "function_call": {"name": "Echo", "arguments": "{not json"}
                },
                "finish_reason": "function_call"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        }))
        .unwrap();

        let response = parse_response(data).unwrap();
        assert_eq!(response.finish_reason, FinishReason::ToolCalls);
        assert_eq!(
            response.tool_call,
            Some(ToolInvocation::new("Echo", "{not json"))
        );
        assert_eq!(response.usage.total_tokens, 5);
    }

    #[test]
    fn no_choices_is_an_error() {
        let data: OpenAiChatResponse =
            serde_json::from_value(json!({ "choices": [] })).unwrap();
        assert!(parse_response(data).is_err());
    }
}
