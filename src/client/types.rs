//! Chat completion request builder and response views
//!
//! Responses are kept as raw JSON so checks can assert on fields a strict
//! schema would reject or silently default.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// A chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    /// Any other top-level field (`temperature`, `stream_options`, ...)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            tools: None,
            tool_choice: None,
            stream: None,
            extra: Map::new(),
        }
    }

    pub fn user(self, content: &str) -> Self {
        self.message(json!({"role": "user", "content": content}))
    }

    pub fn system(self, content: &str) -> Self {
        self.message(json!({"role": "system", "content": content}))
    }

    pub fn assistant(self, content: &str) -> Self {
        self.message(json!({"role": "assistant", "content": content}))
    }

    /// Append an arbitrary message object
    pub fn message(mut self, message: Value) -> Self {
        self.messages.push(message);
        self
    }

    pub fn tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = Some(tools);
        self
    }

    pub fn tool_choice(mut self, choice: impl Into<Value>) -> Self {
        self.tool_choice = Some(choice.into());
        self
    }

    pub fn stream(mut self, stream: bool) -> Self {
        self.stream = Some(stream);
        self
    }

    /// Set an extra top-level field
    pub fn param(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }
}

/// A function tool definition
pub fn tool(name: &str, description: &str, parameters: Value) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": name,
            "description": description,
            "parameters": parameters,
        }
    })
}

/// A tool definition taking no arguments
pub fn empty_tool(name: &str, description: &str) -> Value {
    tool(name, description, json!({"type": "object", "properties": {}}))
}

/// An assistant message replaying earlier tool calls
pub fn assistant_tool_calls(calls: &[Value]) -> Value {
    json!({"role": "assistant", "content": null, "tool_calls": calls})
}

/// A tool result message
pub fn tool_result(call_id: &str, content: &str) -> Value {
    json!({"role": "tool", "tool_call_id": call_id, "content": content})
}

/// A non-streaming chat completion
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Completion(pub Value);

impl Completion {
    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn id(&self) -> &Value {
        &self.0["id"]
    }

    pub fn object(&self) -> Option<&str> {
        self.0["object"].as_str()
    }

    pub fn created(&self) -> &Value {
        &self.0["created"]
    }

    pub fn model(&self) -> &Value {
        &self.0["model"]
    }

    /// `choices`, empty when missing
    pub fn choices(&self) -> &[Value] {
        self.0["choices"].as_array().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn first_choice(&self) -> &Value {
        &self.0["choices"][0]
    }

    pub fn message(&self) -> &Value {
        &self.0["choices"][0]["message"]
    }

    pub fn content(&self) -> Option<&str> {
        self.message()["content"].as_str()
    }

    /// Tool calls of the first choice, empty when missing
    pub fn tool_calls(&self) -> &[Value] {
        self.message()["tool_calls"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.first_choice()["finish_reason"].as_str()
    }

    pub fn usage(&self) -> &Value {
        &self.0["usage"]
    }
}

/// One streamed chunk
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Chunk(pub Value);

impl Chunk {
    pub fn raw(&self) -> &Value {
        &self.0
    }

    pub fn object(&self) -> Option<&str> {
        self.0["object"].as_str()
    }

    pub fn has_choices(&self) -> bool {
        self.0["choices"].as_array().is_some_and(|c| !c.is_empty())
    }

    pub fn delta(&self) -> &Value {
        &self.0["choices"][0]["delta"]
    }

    pub fn role(&self) -> Option<&str> {
        self.delta()["role"].as_str()
    }

    /// Non-empty content fragment
    pub fn content(&self) -> Option<&str> {
        self.delta()["content"].as_str().filter(|s| !s.is_empty())
    }

    pub fn tool_calls(&self) -> &[Value] {
        self.delta()["tool_calls"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn finish_reason(&self) -> Option<&str> {
        self.0["choices"][0]["finish_reason"].as_str()
    }

    pub fn usage(&self) -> &Value {
        &self.0["usage"]
    }
}

/// A tool call assembled from streamed fragments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamedToolCall {
    pub id: Option<String>,
    pub name: Option<String>,
    pub arguments: String,
}

impl StreamedToolCall {
    /// Merge every tool call fragment from `chunks`
    ///
    /// Fragments are concatenated in arrival order regardless of `index`,
    /// which is enough for single-call streams.
    pub fn accumulate<'a>(chunks: impl IntoIterator<Item = &'a Chunk>) -> Self {
        let mut call = Self::default();
        for chunk in chunks {
            for fragment in chunk.tool_calls() {
                if let Some(id) = fragment["id"].as_str().filter(|s| !s.is_empty()) {
                    call.id = Some(id.to_string());
                }
                let function = &fragment["function"];
                if let Some(name) = function["name"].as_str().filter(|s| !s.is_empty()) {
                    call.name = Some(name.to_string());
                }
                if let Some(arguments) = function["arguments"].as_str() {
                    call.arguments.push_str(arguments);
                }
            }
        }
        call
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest::new("chatgpt/gpt-5")
            .system("be brief")
            .user("Hi")
            .param("temperature", 0.5)
            .stream(true);

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "chatgpt/gpt-5",
                "messages": [
                    {"role": "system", "content": "be brief"},
                    {"role": "user", "content": "Hi"}
                ],
                "stream": true,
                "temperature": 0.5
            })
        );
    }

    #[test]
    fn test_completion_accessors() {
        let completion = Completion(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{"id": "call_1", "type": "function"}]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 3}
        }));

        assert_eq!(completion.object(), Some("chat.completion"));
        assert_eq!(completion.choices().len(), 1);
        assert_eq!(completion.content(), None);
        assert_eq!(completion.tool_calls().len(), 1);
        assert_eq!(completion.finish_reason(), Some("tool_calls"));
        assert_eq!(completion.usage()["prompt_tokens"], 3);
        assert!(completion.created().is_null());
    }

    #[test]
    fn test_chunk_accessors_on_empty_choices() {
        let chunk = Chunk(json!({"object": "chat.completion.chunk", "choices": [], "usage": {"total_tokens": 5}}));
        assert!(!chunk.has_choices());
        assert_eq!(chunk.content(), None);
        assert!(chunk.tool_calls().is_empty());
        assert_eq!(chunk.usage()["total_tokens"], 5);
    }

    #[test]
    fn test_accumulate_tool_call() {
        let chunks = vec![
            Chunk(json!({"choices": [{"delta": {"role": "assistant"}}]})),
            Chunk(json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "id": "call_9", "function": {"name": "search", "arguments": ""}}
            ]}}]})),
            Chunk(json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": "{\"query\":"}}
            ]}}]})),
            Chunk(json!({"choices": [{"delta": {"tool_calls": [
                {"index": 0, "function": {"arguments": "\"x\"}"}}
            ]}}]})),
        ];

        let call = StreamedToolCall::accumulate(&chunks);
        assert_eq!(call.id.as_deref(), Some("call_9"));
        assert_eq!(call.name.as_deref(), Some("search"));
        assert_eq!(call.arguments, "{\"query\":\"x\"}");
    }
}
