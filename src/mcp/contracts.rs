use serde_json::json;

pub const TOOL_EMAILER_AND_NEWSLETTERS: &str = "emailer_and_newsletters";
pub const TOOL_ICON_REPOSITORY: &str = "icon_repository";
pub const TOOL_INTERNAL_LOGOS: &str = "internal_logos";
pub const TOOL_BRANDING_GUIDELINE: &str = "mahindra_branding_guideline";
pub const TOOL_PPT_REPOSITORY: &str = "ppt_repository";

pub const PROTOCOL_VERSION: &str = "2025-11-25";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_MAX_SAMPLE_CHARS: usize = 60_000;
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_CONCURRENT_CALLS: usize = 8;
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-10-01-preview";

/// Everything that distinguishes one category tool from another.
#[derive(Debug)]
pub struct CategorySpec {
    pub tool_name: &'static str,
    /// Human label used in error envelopes.
    pub label: &'static str,
    pub catalog_file: &'static str,
    pub role: &'static str,
    pub task: &'static str,
    /// Placeholders shown inside the example envelope of the prompt.
    pub examples: &'static [&'static str],
    /// Asset folder scanned by `describe`.
    pub source_folder: &'static str,
    pub description: &'static str,
}

pub static CATEGORIES: [CategorySpec; 5] = [
    CategorySpec {
        tool_name: TOOL_EMAILER_AND_NEWSLETTERS,
        label: "emailer/newsletter",
        catalog_file: "emailer_&_newsletter.json",
        role: "an assistant specialized in **email marketing assets**",
        task: "Find emailer or newsletter templates/campaigns relevant to the user request.",
        examples: &["<file_name1>", "<file_name2>"],
        source_folder: "Emailer & Newsletters",
        description: "Find emailer and newsletter templates or campaigns matching a request.",
    },
    CategorySpec {
        tool_name: TOOL_ICON_REPOSITORY,
        label: "icon repository",
        catalog_file: "icon_repository.json",
        role: "an **icon library curator**",
        task: "Identify icons or icon sets matching the user query.",
        examples: &["<icon_file>"],
        source_folder: "Icon repository",
        description: "Find icons or icon sets matching a request.",
    },
    CategorySpec {
        tool_name: TOOL_INTERNAL_LOGOS,
        label: "internal logos",
        catalog_file: "internal_logos.json",
        role: "a **brand logo archivist**",
        task: "Locate internal or department-specific logos that match the user query.",
        examples: &["<logo_file>"],
        source_folder: "Internal Logos",
        description: "Find internal or department-specific logos matching a request.",
    },
    CategorySpec {
        tool_name: TOOL_BRANDING_GUIDELINE,
        label: "branding guideline",
        catalog_file: "mahindra_branding.json",
        role: "a **brand guideline expert**",
        task: "Retrieve Mahindra branding rules, colors, typography, or template files.",
        examples: &["<guideline_file>"],
        source_folder: "Mahindra Branding Guideline",
        description: "Find Mahindra branding rules, colors, typography or template files.",
    },
    CategorySpec {
        tool_name: TOOL_PPT_REPOSITORY,
        label: "PPT repository",
        catalog_file: "ppt_repository.json",
        role: "a **presentation deck finder**",
        task: "Suggest PowerPoint templates or slide decks that fit the user's topic or style.",
        examples: &["<ppt_file>"],
        source_folder: "PPT Repository",
        description: "Find PowerPoint templates or slide decks fitting a topic or style.",
    },
];

pub fn category(tool_name: &str) -> Option<&'static CategorySpec> {
    CATEGORIES.iter().find(|spec| spec.tool_name == tool_name)
}

pub fn category_tool_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "user_query": {
                "type": "string",
                "description": "Free-text request from the user"
            }
        },
        "required": ["user_query"],
        "additionalProperties": false
    })
}
