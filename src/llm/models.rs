//! Known model definitions
//!
//! The configured model id must name one of these; anything else is a
//! startup configuration error.

/// Model definition with metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    /// User-facing model ID (e.g., "gpt-4.1")
    pub id: &'static str,
    /// API name sent to the provider
    pub api_name: &'static str,
    /// Context window size in tokens
    pub context_window: usize,
}

/// Get all available model definitions
pub fn all_models() -> &'static [ModelDef] {
    &[
        ModelDef {
            id: "gpt-4.1",
            api_name: "gpt-4.1",
            context_window: 1_047_576,
        },
        ModelDef {
            id: "gpt-4.1-mini",
            api_name: "gpt-4.1-mini",
            context_window: 1_047_576,
        },
        ModelDef {
            id: "gpt-4o",
            api_name: "gpt-4o",
            context_window: 128_000,
        },
        ModelDef {
            id: "gpt-4o-mini",
            api_name: "gpt-4o-mini",
            context_window: 128_000,
        },
    ]
}

/// Look up a model by id. Accepts a `openai:` prefix.
pub fn find_model(id: &str) -> Option<&'static ModelDef> {
    let id = id.strip_prefix("openai:").unwrap_or(id);
    all_models().iter().find(|m| m.id == id)
}

pub const DEFAULT_MODEL: &str = "gpt-4.1";
