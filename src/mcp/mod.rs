use serde_json::json;

pub mod contracts;
pub mod errors;

pub fn tool_definitions() -> Vec<serde_json::Value> {
    contracts::CATEGORIES
        .iter()
        .map(|spec| {
            json!({
                "name": spec.tool_name,
                "description": spec.description,
                "inputSchema": contracts::category_tool_schema()
            })
        })
        .collect()
}

pub fn tool_names() -> Vec<&'static str> {
    contracts::CATEGORIES
        .iter()
        .map(|spec| spec.tool_name)
        .collect()
}
