//! Language model trait

use crate::dialogue::ModelMessage;
use crate::llm_types::{TokenStream, ToolDefinition};

/// Streaming language model.
///
/// Both stream methods are single-pass and not restartable: the model's
/// own termination bounds the stream. Implementations own the request
/// data so the returned stream is `'static`.
///
/// Implementations:
/// - `OpenAiCompatBackend` - OpenAI-compatible chat completions over SSE
/// - test mocks
pub trait LanguageModel: Send + Sync + 'static {
    /// Stream text tokens over the dialogue view.
    fn stream(&self, view: Vec<ModelMessage>) -> TokenStream;

    /// Stream tokens interleaved with tool-call fragments, advertising
    /// the given tool schemas.
    fn stream_with_tools(&self, view: Vec<ModelMessage>, tools: &[ToolDefinition]) -> TokenStream;

    /// Model name for logging.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_types::StreamDelta;
    use futures::StreamExt;

    struct ScriptedModel {
        tokens: Vec<&'static str>,
    }

    impl LanguageModel for ScriptedModel {
        fn stream(&self, _view: Vec<ModelMessage>) -> TokenStream {
            let tokens: Vec<_> = self.tokens.iter().map(|t| t.to_string()).collect();
            Box::pin(futures::stream::iter(
                tokens.into_iter().map(|t| Ok(StreamDelta::token(t))),
            ))
        }

        fn stream_with_tools(
            &self,
            view: Vec<ModelMessage>,
            _tools: &[ToolDefinition],
        ) -> TokenStream {
            self.stream(view)
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn scripted_stream_yields_in_order() {
        let model = ScriptedModel {
            tokens: vec!["Hello", ", ", "world."],
        };
        let mut stream = model.stream(vec![]);
        let mut out = String::new();
        while let Some(delta) = stream.next().await {
            if let Some(token) = delta.unwrap().token {
                out.push_str(&token);
            }
        }
        assert_eq!(out, "Hello, world.");
    }
}
