use crate::catalog::CatalogStore;
use crate::generation::TextGenerator;
use crate::mcp::contracts::CategorySpec;
use crate::tools::normalize::{ResponseEnvelope, normalize};
use crate::tools::prompt::PromptBuilder;
use std::sync::Arc;
use tracing::{debug, error, info};

/// One category retrieval operation. The same type backs all five tools;
/// only the `CategorySpec` differs.
#[derive(Clone)]
pub struct CategoryTool {
    spec: &'static CategorySpec,
    store: CatalogStore,
    prompts: PromptBuilder,
    generator: Arc<dyn TextGenerator>,
}

impl CategoryTool {
    pub fn new(
        spec: &'static CategorySpec,
        store: CatalogStore,
        prompts: PromptBuilder,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        Self {
            spec,
            store,
            prompts,
            generator,
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec.tool_name
    }

    /// Catalog load, prompt, one generation call, normalize. Every failure
    /// ends in an envelope.
    pub fn run(&self, user_query: &str) -> ResponseEnvelope {
        info!(tool = self.spec.tool_name, "tool called");

        let catalog = match self.store.load(self.spec.catalog_file) {
            Ok(catalog) => catalog,
            Err(err) => {
                error!(tool = self.spec.tool_name, error = %err, "failed to load catalog");
                return ResponseEnvelope::message(format!("Error loading {} data", self.spec.label));
            }
        };

        let prompt = self.prompts.build(self.spec, user_query, &catalog);

        let raw = match self.generator.generate(None, &prompt) {
            Ok(raw) => raw,
            Err(err) => {
                error!(tool = self.spec.tool_name, error = %err, "generation failed");
                return ResponseEnvelope::message(format!(
                    "Error generating {} response",
                    self.spec.label
                ));
            }
        };
        debug!(tool = self.spec.tool_name, raw = %raw, "model raw response");

        normalize(&raw)
    }
}

impl std::fmt::Debug for CategoryTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CategoryTool")
            .field("name", &self.spec.tool_name)
            .field("store", &self.store)
            .field("prompts", &self.prompts)
            .finish_non_exhaustive()
    }
}
