//! Streaming client for OpenAI-compatible chat completion endpoints.

use std::time::Duration;

use async_stream::try_stream;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use duplex_core::{
    LanguageModel, ModelMessage, StreamDelta, TokenStream, ToolCallFragment, ToolDefinition,
};

use crate::LlmError;

/// Chat backend for any server that speaks the OpenAI `/chat/completions`
/// streaming protocol.
pub struct OpenAiCompatBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    temperature: f32,
}

impl OpenAiCompatBackend {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        temperature: f32,
        timeout: Duration,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            temperature,
        }
    }

    fn request_body(&self, view: Vec<ModelMessage>, tools: &[ToolDefinition]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": view,
            "temperature": self.temperature,
            "stream": true,
        });
        if !tools.is_empty() {
            body["tools"] = Value::Array(tools.iter().map(ToolDefinition::to_wire).collect());
        }
        body
    }

    fn stream_request(&self, body: Value) -> TokenStream {
        let url = format!("{}/chat/completions", self.base_url);
        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        Box::pin(try_stream! {
            let response = request.send().await.map_err(LlmError::Http)?;
            let response = ensure_success(response).await?;

            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(LlmError::Http)?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(pos) = buffer.find('\n') {
                    let line = buffer[..pos].trim().to_string();
                    buffer.drain(..=pos);
                    for delta in parse_sse_line(&line)? {
                        yield delta;
                    }
                }
            }
        })
    }
}

impl LanguageModel for OpenAiCompatBackend {
    fn stream(&self, view: Vec<ModelMessage>) -> TokenStream {
        debug!(model = %self.model, messages = view.len(), "streaming completion");
        self.stream_request(self.request_body(view, &[]))
    }

    fn stream_with_tools(&self, view: Vec<ModelMessage>, tools: &[ToolDefinition]) -> TokenStream {
        debug!(
            model = %self.model,
            messages = view.len(),
            tools = tools.len(),
            "streaming completion with tools"
        );
        self.stream_request(self.request_body(view, tools))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        let body = response.text().await.unwrap_or_default();
        Err(LlmError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: Delta,
}

#[derive(Deserialize, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Deserialize)]
struct ToolCallDelta {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionDelta>,
}

#[derive(Deserialize, Default)]
struct FunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

/// Parse one SSE line into zero or more stream deltas. Empty lines,
/// comments and the `[DONE]` sentinel yield nothing.
fn parse_sse_line(line: &str) -> Result<Vec<StreamDelta>, LlmError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(Vec::new());
    };
    let data = data.trim();
    if data.is_empty() || data == "[DONE]" {
        return Ok(Vec::new());
    }

    let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
        warn!(error = %e, "unparseable stream chunk");
        LlmError::Chunk(e.to_string())
    })?;

    let mut out = Vec::new();
    for choice in chunk.choices {
        if let Some(content) = choice.delta.content {
            if !content.is_empty() {
                out.push(StreamDelta::token(content));
            }
        }
        if let Some(calls) = choice.delta.tool_calls {
            for call in calls {
                let function = call.function.unwrap_or_default();
                out.push(StreamDelta::tool_call(ToolCallFragment {
                    index: call.index,
                    id: call.id,
                    name: function.name,
                    arguments: function.arguments.unwrap_or_default(),
                }));
            }
        }
    }
    Ok(out)
}
