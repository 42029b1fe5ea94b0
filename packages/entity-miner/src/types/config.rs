//! Configuration for the mining workflow.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::entity::Category;
use super::template::{template_types, GLOBAL_SCOPE};

/// Sampling parameters sent with every model call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub seed: u64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            top_p: 0.9,
            seed: 69420,
        }
    }
}

/// Which template profiles a category, and the label used in errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilerSpec {
    pub template_type: String,
    pub label: String,
}

impl ProfilerSpec {
    pub fn new(template_type: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            template_type: template_type.into(),
            label: label.into(),
        }
    }

    /// The built-in profiler for a category, if it has one.
    pub fn builtin(category: Category) -> Option<Self> {
        let (template_type, label) = match category {
            Category::Person => (template_types::PERSON_PROFILER, "person_profile"),
            Category::Location => (template_types::LOCATION_PROFILER, "location_profile"),
            Category::Event => (template_types::EVENT_PROFILER, "event_profile"),
            Category::Object => (template_types::OBJECT_PROFILER, "object_profile"),
            Category::Organization => {
                (template_types::ORGANIZATION_PROFILER, "organization_profile")
            }
            Category::Other => return None,
        };
        Some(Self::new(template_type, label))
    }
}

/// Configuration for [`crate::EntityMiningWorkflow`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinerConfig {
    /// Model identifier passed to the endpoint on every call.
    pub model_id: String,

    /// Sampling parameters. Default: temperature 0, top_p 0.9, seed 69420.
    #[serde(default)]
    pub sampling: SamplingParams,

    /// Upper bound on concurrent profiling calls.
    ///
    /// Matches the endpoint's concurrent request limit. Default: 10.
    pub max_concurrent_profiles: usize,

    /// Scope key templates are read from. Default: `"global"`.
    pub template_scope: String,

    /// Categories that get profiled. Entities of any other category are
    /// skipped with a warning.
    pub profilers: HashMap<Category, ProfilerSpec>,

    /// Uploads whose recorded timestamp is older than this are re-mined.
    /// Default: 600 (10 minutes).
    pub staleness_window_secs: i64,
}

impl Default for MinerConfig {
    fn default() -> Self {
        Self {
            model_id: String::new(),
            sampling: SamplingParams::default(),
            max_concurrent_profiles: 10,
            template_scope: GLOBAL_SCOPE.to_string(),
            profilers: Category::PROFILED
                .iter()
                .filter_map(|c| ProfilerSpec::builtin(*c).map(|spec| (*c, spec)))
                .collect(),
            staleness_window_secs: 600,
        }
    }
}

impl MinerConfig {
    /// Create a config for the given model with default values.
    pub fn new(model_id: impl Into<String>) -> Self {
        Self {
            model_id: model_id.into(),
            ..Default::default()
        }
    }

    /// Set sampling parameters.
    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Set the profiling concurrency bound (minimum 1).
    pub fn with_max_concurrent_profiles(mut self, max: usize) -> Self {
        self.max_concurrent_profiles = max.max(1);
        self
    }

    /// Read templates from a different scope.
    pub fn with_template_scope(mut self, scope: impl Into<String>) -> Self {
        self.template_scope = scope.into();
        self
    }

    /// Stop profiling a category.
    pub fn without_profiler(mut self, category: Category) -> Self {
        self.profilers.remove(&category);
        self
    }

    /// Profile a category with a custom template.
    pub fn with_profiler(mut self, category: Category, spec: ProfilerSpec) -> Self {
        self.profilers.insert(category, spec);
        self
    }

    /// Set the upload staleness window.
    pub fn with_staleness_window_secs(mut self, secs: i64) -> Self {
        self.staleness_window_secs = secs;
        self
    }

    pub fn staleness_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.staleness_window_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MinerConfig::new("deepseek.v3-v1:0");
        assert_eq!(config.max_concurrent_profiles, 10);
        assert_eq!(config.template_scope, "global");
        assert_eq!(config.profilers.len(), 5);
        assert!(!config.profilers.contains_key(&Category::Other));
        assert_eq!(config.sampling.seed, 69420);
        assert_eq!(config.staleness_window(), chrono::Duration::minutes(10));
    }

    #[test]
    fn test_builder() {
        let config = MinerConfig::new("m")
            .with_max_concurrent_profiles(0)
            .without_profiler(Category::Event);
        assert_eq!(config.max_concurrent_profiles, 1);
        assert!(!config.profilers.contains_key(&Category::Event));
    }

    #[test]
    fn test_round_trips_through_json() {
        let config = MinerConfig::new("m");
        let json = serde_json::to_string(&config).unwrap();
        let back: MinerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.profilers, config.profilers);
    }
}
