use crate::catalog::Catalog;
use crate::mcp::contracts::CategorySpec;
use serde_json::{Map, Value};

/// Composes the instruction sent to the model for one category query.
#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    max_sample_chars: usize,
}

impl PromptBuilder {
    pub fn new(max_sample_chars: usize) -> Self {
        Self { max_sample_chars }
    }

    pub fn build(&self, spec: &CategorySpec, user_query: &str, catalog: &Catalog) -> String {
        let sample = sample_catalog(catalog, self.max_sample_chars);
        let sample_json = serde_json::to_string_pretty(&Value::Object(sample.entries))
            .unwrap_or_else(|_| "{}".to_string());
        let heading = if sample.shown < catalog.len() {
            format!(
                "JSON data sample (first {} of {} entries):",
                sample.shown,
                catalog.len()
            )
        } else {
            "JSON data sample:".to_string()
        };

        format!(
            "You are {role}.\n{task}\n\nUser query: \"{user_query}\"\n\n{heading}\n{sample_json}\n\n\
             Respond only with JSON in exactly this shape: {example}\n",
            role = spec.role,
            task = spec.task,
            example = example_envelope(spec.examples),
        )
    }
}

struct Sample {
    entries: Map<String, Value>,
    shown: usize,
}

/// Takes entries in catalog order while the pretty-printed sample, counted
/// in chars, fits the budget. An empty sample still renders as `{}`.
fn sample_catalog(catalog: &Catalog, max_chars: usize) -> Sample {
    let mut entries = Map::new();
    // "{}" when empty; each entry adds its line plus "{\n"/"\n}" or ",\n".
    let mut used = EMPTY_OBJECT_CHARS;

    for (path, description) in catalog {
        let cost = rendered_entry_chars(path, description).saturating_add(ENTRY_SEPARATOR_CHARS);
        if used.saturating_add(cost) > max_chars {
            break;
        }
        used += cost;
        entries.insert(path.clone(), description.clone());
    }

    let shown = entries.len();
    Sample { entries, shown }
}

const EMPTY_OBJECT_CHARS: usize = 2;
const ENTRY_SEPARATOR_CHARS: usize = 2;
const INDENT: &str = "  ";

/// Chars of `  "<escaped path>": <pretty value>` as it appears one level deep.
fn rendered_entry_chars(path: &str, description: &Value) -> usize {
    let (Ok(key), Ok(value)) = (
        serde_json::to_string(path),
        serde_json::to_string_pretty(description),
    ) else {
        return usize::MAX;
    };
    let nested_lines = value.matches('\n').count();
    INDENT.len()
        + key.chars().count()
        + ": ".len()
        + value.chars().count()
        + nested_lines * INDENT.len()
}

fn example_envelope(examples: &[&str]) -> String {
    let items: Vec<String> = examples.iter().map(|item| format!("\"{item}\"")).collect();
    format!("{{ \"response\": [{}] }}", items.join(", "))
}
