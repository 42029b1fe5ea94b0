//! Prompt template records.

use serde::{Deserialize, Serialize};

/// Scope key under which cross-novel templates are stored.
pub const GLOBAL_SCOPE: &str = "global";

/// A stored pair of system and instruction prompts.
///
/// Field names on the wire follow the template table's record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// Scope the template belongs to (`"global"` or a novel name)
    #[serde(rename = "novel_name")]
    pub scope_key: String,

    /// Template type, e.g. `entity_miner_person_profiler`
    pub template_type: String,

    #[serde(rename = "system_prompt_template", default)]
    pub system_prompt: String,

    #[serde(rename = "instruction_prompt_template", default)]
    pub instruction_prompt: String,
}

impl PromptTemplate {
    /// Create a template in the given scope.
    pub fn new(
        scope_key: impl Into<String>,
        template_type: impl Into<String>,
        system_prompt: impl Into<String>,
        instruction_prompt: impl Into<String>,
    ) -> Self {
        Self {
            scope_key: scope_key.into(),
            template_type: template_type.into(),
            system_prompt: system_prompt.into(),
            instruction_prompt: instruction_prompt.into(),
        }
    }

    /// Create a template in the global scope.
    pub fn global(
        template_type: impl Into<String>,
        system_prompt: impl Into<String>,
        instruction_prompt: impl Into<String>,
    ) -> Self {
        Self::new(GLOBAL_SCOPE, template_type, system_prompt, instruction_prompt)
    }

    /// Both halves of the prompt pair are present.
    pub fn is_complete(&self) -> bool {
        !self.system_prompt.trim().is_empty() && !self.instruction_prompt.trim().is_empty()
    }
}

/// Template types used by the mining workflow.
pub mod template_types {
    pub const GENRE_DETERMINATION: &str = "entity_miner_genre_determination";
    pub const ENTITY_EXTRACTION: &str = "entity_miner_entity_extraction_and_classification";
    pub const PERSON_PROFILER: &str = "entity_miner_person_profiler";
    pub const LOCATION_PROFILER: &str = "entity_miner_location_profiler";
    pub const EVENT_PROFILER: &str = "entity_miner_event_profiler";
    pub const OBJECT_PROFILER: &str = "entity_miner_object_profiler";
    pub const ORGANIZATION_PROFILER: &str = "entity_miner_organization_profiler";
}
