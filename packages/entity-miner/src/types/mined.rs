//! Aggregate output of one mining run.

use serde::Serialize;

use super::profile::EntityProfile;

/// Counters for one run. Failures are counted here rather than surfaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MiningStats {
    /// Entities returned by the extraction stage
    pub extracted: usize,

    /// Profiles that made it into the result
    pub profiled: usize,

    /// Entities whose category has no configured profiler
    pub skipped_unmapped: usize,

    /// Profiling calls that failed (transport, parse, configuration)
    pub failed: usize,
}

/// Result of [`crate::EntityMiningWorkflow::mine`].
///
/// `profiled_entities` is in completion order, which is unspecified.
#[derive(Debug, Clone, Serialize)]
pub struct MinedResult {
    pub genre: String,
    #[serde(rename = "genre_determination_reasoning")]
    pub genre_reasoning: String,
    pub profiled_entities: Vec<EntityProfile>,
    pub stats: MiningStats,
}

impl MinedResult {
    /// Look up a profile by display name.
    pub fn profile(&self, name: &str) -> Option<&EntityProfile> {
        self.profiled_entities
            .iter()
            .find(|p| p.display_name() == name)
    }
}
