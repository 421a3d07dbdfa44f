use crate::catalog::CatalogStore;
use crate::generation::TextGenerator;
use crate::mcp::contracts::CATEGORIES;
use crate::mcp::errors;
use serde_json::{Value, json};
use std::sync::Arc;

pub mod category;
pub mod normalize;
pub mod prompt;

use category::CategoryTool;
use normalize::ResponseEnvelope;
use prompt::PromptBuilder;

/// The five category tools, each built from the same injected dependencies.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: Vec<CategoryTool>,
}

impl ToolRegistry {
    pub fn new(
        store: CatalogStore,
        prompts: PromptBuilder,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let tools = CATEGORIES
            .iter()
            .map(|spec| CategoryTool::new(spec, store.clone(), prompts, generator.clone()))
            .collect();
        Self { tools }
    }

    pub fn get(&self, name: &str) -> Option<&CategoryTool> {
        self.tools.iter().find(|tool| tool.name() == name)
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tools.iter().map(CategoryTool::name).collect()
    }

    /// Resolves `tools/call` params and runs the named tool.
    pub fn call(&self, params: Option<&Value>) -> Value {
        let Some(params) = params.and_then(|value| value.as_object()) else {
            return error_result(errors::INVALID_INPUT, "params must be an object", None);
        };

        let Some(name) = params.get("name").and_then(|value| value.as_str()) else {
            return error_result(
                errors::INVALID_INPUT,
                "params.name must be a string",
                None,
            );
        };

        let Some(tool) = self.get(name) else {
            return error_result(
                errors::UNKNOWN_TOOL,
                format!("tool not registered: {name}"),
                Some(name),
            );
        };

        let user_query = params
            .get("arguments")
            .and_then(|args| args.get("user_query"))
            .and_then(|value| value.as_str());
        let Some(user_query) = user_query else {
            return error_result(
                errors::INVALID_INPUT,
                "arguments.user_query must be a string",
                Some(name),
            );
        };

        envelope_result(&tool.run(user_query))
    }
}

pub fn envelope_result(envelope: &ResponseEnvelope) -> Value {
    json!({
        "content": [{"type": "text", "text": envelope.to_text()}],
        "structuredContent": envelope.to_value(),
        "isError": false
    })
}

pub fn error_result(
    kind: &'static str,
    message: impl Into<String>,
    source: Option<&str>,
) -> Value {
    let message = message.into();
    let mut error = json!({
        "kind": kind,
        "message": message,
    });

    if let Some(source) = source
        && let Some(obj) = error.as_object_mut()
    {
        obj.insert("source".to_string(), json!(source));
    }

    json!({
        "content": [{"type": "text", "text": format!("Error: {message}")}],
        "structuredContent": {"error": error},
        "isError": true
    })
}
