//! Adapter between sherpa-core types and genai types
//!
//! Conversion functions between our conversation model and genai's, plus
//! client construction. Auth comes only from the credential on the model
//! selection; genai's environment variable lookup is never consulted.

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatRole as GenaiRole,
    ChatStreamEvent, MessageContent as GenaiContent, Tool as GenaiTool,
    ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, AuthResolver};
use genai::{Client, ModelIden};

use crate::types::{ChatMessage, ContentPart, MessageContent, MessageRole, StreamChunk, Tool, ToolCall};

use super::error::ProviderResult;
use super::traits::StreamChatOptions;

/// Vendors reachable through genai, by provider id
///
/// Each id doubles as the genai adapter namespace.
pub const GENAI_PROVIDERS: &[&str] = &[
    "openai",
    "anthropic",
    "gemini",
    "deepseek",
    "groq",
    "xai",
    "ollama",
    "cohere",
];

// ============================================================================
// Message Conversion: sherpa -> genai
// ============================================================================

/// Convert MessageRole to genai ChatRole
pub fn to_genai_role(role: MessageRole) -> GenaiRole {
    match role {
        MessageRole::System => GenaiRole::System,
        MessageRole::User => GenaiRole::User,
        MessageRole::Assistant => GenaiRole::Assistant,
        MessageRole::Tool => GenaiRole::Tool,
    }
}

/// Convert one ChatMessage to genai messages
///
/// A tool message fans out into one genai tool response per result, since
/// genai correlates each response with its call individually.
pub fn to_genai_message(msg: ChatMessage) -> Vec<GenaiMessage> {
    match msg.role {
        MessageRole::System => vec![GenaiMessage::system(msg.joined_text())],
        MessageRole::User => vec![GenaiMessage::user(msg.joined_text())],
        MessageRole::Assistant => {
            let calls = msg.tool_calls();
            if calls.is_empty() {
                vec![GenaiMessage::assistant(msg.joined_text())]
            } else {
                let genai_calls = calls.iter().map(to_genai_tool_call).collect();
                let mut content = GenaiContent::from_tool_calls(genai_calls);
                let text = msg.joined_text();
                if !text.is_empty() {
                    content.prepend(text);
                }
                vec![GenaiMessage::assistant(content)]
            }
        }
        MessageRole::Tool => match msg.content {
            MessageContent::Text(text) => vec![GenaiMessage::user(text)],
            MessageContent::Parts(parts) => parts
                .into_iter()
                .filter_map(|p| match p {
                    ContentPart::ToolResult { id, result, .. } => {
                        Some(GenaiMessage::from(GenaiToolResponse::new(id, result)))
                    }
                    _ => None,
                })
                .collect(),
        },
    }
}

/// Convert a conversation to genai messages
pub fn to_genai_messages(messages: Vec<ChatMessage>) -> Vec<GenaiMessage> {
    messages.into_iter().flat_map(to_genai_message).collect()
}

/// Convert ToolCall to genai ToolCall
pub fn to_genai_tool_call(call: &ToolCall) -> GenaiToolCall {
    GenaiToolCall {
        call_id: call.id.clone(),
        fn_name: call.name.clone(),
        fn_arguments: call.input.clone(),
        thought_signatures: None,
    }
}

// ============================================================================
// Tool Conversion: sherpa -> genai
// ============================================================================

/// Convert Tool to genai Tool
pub fn to_genai_tool(tool: Tool) -> GenaiTool {
    let mut genai_tool = GenaiTool::new(&tool.name).with_description(&tool.description);

    if let Some(schema) = tool.input_schema {
        genai_tool = genai_tool.with_schema(schema);
    }

    genai_tool
}

/// Convert tools to genai tools
pub fn to_genai_tools(tools: Vec<Tool>) -> Vec<GenaiTool> {
    tools.into_iter().map(to_genai_tool).collect()
}

// ============================================================================
// Options Conversion: sherpa -> genai
// ============================================================================

/// Convert StreamChatOptions to genai ChatOptions
pub fn to_genai_options(options: &StreamChatOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    // Tool calls are only reported at End when captured
    genai_opts.with_capture_tool_calls(true)
}

// ============================================================================
// Response Conversion: genai -> sherpa
// ============================================================================

/// Convert genai ToolCall to ToolCall
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall::new(tc.call_id.clone(), tc.fn_name.clone(), tc.fn_arguments.clone())
}

/// Convert a genai stream event to zero or more StreamChunks
///
/// `End` yields every captured tool call, in the order the model made them.
pub fn from_genai_event(event: ChatStreamEvent) -> Vec<ProviderResult<StreamChunk>> {
    match event {
        ChatStreamEvent::Chunk(chunk) => vec![Ok(StreamChunk::text(chunk.content))],
        ChatStreamEvent::ToolCallChunk(chunk) => vec![Ok(StreamChunk::ToolCallDelta {
            id: chunk.tool_call.call_id,
            name: Some(chunk.tool_call.fn_name),
            input_delta: Some(chunk.tool_call.fn_arguments.to_string()),
        })],
        ChatStreamEvent::End(end) => end
            .captured_tool_calls()
            .map(|calls| {
                calls
                    .into_iter()
                    .map(|tc| Ok(StreamChunk::tool_call(from_genai_tool_call(tc))))
                    .collect()
            })
            .unwrap_or_default(),
        ChatStreamEvent::Start
        | ChatStreamEvent::ReasoningChunk(_)
        | ChatStreamEvent::ThoughtSignatureChunk(_) => Vec::new(),
    }
}

// ============================================================================
// Client Creation
// ============================================================================

/// Check if a provider id is served through genai
pub fn is_genai_supported(provider: &str) -> bool {
    GENAI_PROVIDERS.contains(&provider.to_lowercase().as_str())
}

/// Model name with the adapter namespace, e.g. `groq::llama-3.1-70b`
///
/// Pins the genai adapter to the selected vendor instead of letting genai
/// guess it from the model name.
pub fn namespaced_model(provider: &str, model: &str) -> String {
    format!("{}::{}", provider.to_lowercase(), model)
}

/// Create a genai Client authenticated with an explicit credential
pub fn create_client(api_key: Option<String>) -> Client {
    let auth_resolver = AuthResolver::from_resolver_fn(
        move |_model_iden: ModelIden| -> Result<Option<AuthData>, genai::resolver::Error> {
            Ok(api_key.clone().map(AuthData::from_single))
        },
    );

    Client::builder().with_auth_resolver(auth_resolver).build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_conversion() {
        assert!(matches!(to_genai_role(MessageRole::System), GenaiRole::System));
        assert!(matches!(to_genai_role(MessageRole::User), GenaiRole::User));
        assert!(matches!(to_genai_role(MessageRole::Assistant), GenaiRole::Assistant));
        assert!(matches!(to_genai_role(MessageRole::Tool), GenaiRole::Tool));
    }

    #[test]
    fn test_message_conversion() {
        let genai_msgs = to_genai_message(ChatMessage::user("Hello, world!"));
        assert_eq!(genai_msgs.len(), 1);
        assert!(matches!(genai_msgs[0].role, GenaiRole::User));
    }

    #[test]
    fn test_tool_message_fans_out() {
        let msg = ChatMessage::tool_results(vec![
            ContentPart::tool_result("a", "tree", "src"),
            ContentPart::tool_result("b", "read_files", "<x>\nL1: y\n</x>"),
        ]);

        let genai_msgs = to_genai_message(msg);
        assert_eq!(genai_msgs.len(), 2);
        assert!(genai_msgs.iter().all(|m| matches!(m.role, GenaiRole::Tool)));
    }

    #[test]
    fn test_assistant_tool_calls_conversion() {
        let msg = ChatMessage::assistant_with_tool_calls(
            "",
            vec![ToolCall::new("c1", "tree", json!({"path": "."}))],
        );

        let genai_msgs = to_genai_message(msg);
        assert_eq!(genai_msgs.len(), 1);
        assert!(matches!(genai_msgs[0].role, GenaiRole::Assistant));
        assert!(genai_msgs[0].content.first_text().is_none());
    }

    #[test]
    fn test_assistant_text_kept_before_tool_calls() {
        let msg = ChatMessage::assistant_with_tool_calls(
            "Let me look at the tree first.",
            vec![ToolCall::new("c1", "tree", json!({"path": "."}))],
        );

        let genai_msgs = to_genai_message(msg);
        assert_eq!(genai_msgs.len(), 1);
        let content = &genai_msgs[0].content;
        assert_eq!(content.first_text(), Some("Let me look at the tree first."));
        assert_eq!(content.tool_calls().len(), 1);
        assert_eq!(content.tool_calls()[0].call_id, "c1");
    }

    #[test]
    fn test_tool_conversion() {
        let tool = Tool::new("read_files", "Read files").with_schema(json!({
            "type": "object",
            "properties": { "paths": { "type": "array" } }
        }));

        let genai_tool = to_genai_tool(tool);
        assert_eq!(genai_tool.name, "read_files");
    }

    #[test]
    fn test_tool_call_round_trip_keeps_id() {
        let call = ToolCall::new("call_7", "tree", json!({"path": "src"}));
        let back = from_genai_tool_call(&to_genai_tool_call(&call));
        assert_eq!(back, call);
    }

    #[test]
    fn test_provider_detection() {
        assert!(is_genai_supported("openai"));
        assert!(is_genai_supported("Anthropic"));
        assert!(is_genai_supported("ollama"));
        assert!(!is_genai_supported("azure"));
        assert!(!is_genai_supported("mock"));
    }

    #[test]
    fn test_namespaced_model() {
        assert_eq!(namespaced_model("Groq", "llama-3.1-70b"), "groq::llama-3.1-70b");
    }
}
