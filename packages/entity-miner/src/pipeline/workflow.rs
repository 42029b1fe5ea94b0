//! The mining workflow.
//!
//! ```text
//! text ─► genre ─► extraction ─► profile × N (bounded) ─► MinedResult
//! ```
//!
//! Genre and extraction run in order on the calling task; a failure in either
//! aborts the run. Profiling fans out one call per entity and a failed profile
//! only drops that entity.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::deps::MinerDeps;
use crate::error::{MinerError, Result};
use crate::pipeline::persist::ProfileSink;
use crate::pipeline::prompts::{ExtractionPrompt, GenrePrompt, StagePrompt};
use crate::pipeline::stages::{self, ProfilerPrompts, StageContext};
use crate::pipeline::templates::fetch_template;
use crate::traits::model::ModelInvoker;
use crate::types::{
    config::MinerConfig,
    entity::{ExtractedEntity, GenreResult},
    mined::{MinedResult, MiningStats},
    profile::EntityProfile,
    template::template_types,
};

pub const GENRE_STAGE: &str = "genre_determination";
pub const EXTRACTION_STAGE: &str = "entity_extraction_and_classification";

/// A configured mining workflow.
///
/// Templates are fetched once, at construction; build a new workflow to pick
/// up edited templates.
pub struct EntityMiningWorkflow {
    model: Arc<dyn ModelInvoker>,
    sink: ProfileSink,
    config: MinerConfig,
    genre_prompt: StagePrompt<GenrePrompt>,
    extraction_prompt: StagePrompt<ExtractionPrompt>,
    profilers: ProfilerPrompts,
}

impl EntityMiningWorkflow {
    /// Fetch and bind every template the configuration names.
    ///
    /// Missing templates are tolerated until their stage runs. A template
    /// using a placeholder its stage cannot fill is a configuration error.
    pub async fn new(deps: &MinerDeps, config: MinerConfig) -> Result<Self> {
        let scope = config.template_scope.as_str();
        let store = deps.templates.as_ref();

        let genre = fetch_template(store, scope, template_types::GENRE_DETERMINATION, GENRE_STAGE).await;
        let extraction =
            fetch_template(store, scope, template_types::ENTITY_EXTRACTION, EXTRACTION_STAGE).await;

        let mut profile_templates = HashMap::new();
        for spec in config.profilers.values() {
            if let Some(template) =
                fetch_template(store, scope, &spec.template_type, &spec.label).await
            {
                profile_templates.insert(spec.template_type.clone(), template);
            }
        }

        let workflow = Self {
            model: deps.model.clone(),
            sink: ProfileSink::new(deps.vectors.clone()),
            genre_prompt: StagePrompt::prepare(GENRE_STAGE, genre.as_ref())?,
            extraction_prompt: StagePrompt::prepare(EXTRACTION_STAGE, extraction.as_ref())?,
            profilers: ProfilerPrompts::prepare(&config.profilers, &profile_templates)?,
            config,
        };

        debug!(
            scope = %workflow.config.template_scope,
            genre_ready = workflow.genre_prompt.is_ready(),
            extraction_ready = workflow.extraction_prompt.is_ready(),
            profilers = profile_templates.len(),
            "Mining workflow constructed"
        );

        Ok(workflow)
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    fn context(&self) -> StageContext<'_> {
        StageContext {
            model: self.model.as_ref(),
            model_id: &self.config.model_id,
            sampling: self.config.sampling,
        }
    }

    /// Run the genre stage on its own.
    pub async fn detect_genre(&self, text: &str) -> Result<GenreResult> {
        stages::detect_genre(&self.context(), &self.genre_prompt, text).await
    }

    /// Run the extraction stage on its own.
    pub async fn extract_entities(&self, text: &str, genre: &str) -> Result<Vec<ExtractedEntity>> {
        stages::extract_entities(&self.context(), &self.extraction_prompt, text, genre).await
    }

    /// Profile one entity. `Ok(None)` for categories without a profiler.
    pub async fn profile_entity(
        &self,
        text: &str,
        genre: &str,
        entity: &ExtractedEntity,
    ) -> Result<Option<EntityProfile>> {
        stages::profile_entity(&self.context(), &self.profilers, text, genre, entity).await
    }

    /// Mine a text end to end.
    ///
    /// Fails with [`MinerError::Workflow`] when genre detection or extraction
    /// fails. Profiling failures are logged and counted in the stats.
    pub async fn mine(&self, text: &str) -> Result<MinedResult> {
        info!(text_len = text.len(), "Mining started");

        let genre = self
            .detect_genre(text)
            .await
            .and_then(|genre| {
                if genre.genre.trim().is_empty() {
                    Err(MinerError::Parse("model returned an empty genre".into()))
                } else {
                    Ok(genre)
                }
            })
            .map_err(|e| MinerError::workflow(GENRE_STAGE, e))?;
        info!(genre = %genre.genre, "Genre detected");

        let entities = self
            .extract_entities(text, &genre.genre)
            .await
            .map_err(|e| MinerError::workflow(EXTRACTION_STAGE, e))?;

        let mut stats = MiningStats {
            extracted: entities.len(),
            ..Default::default()
        };

        let (mapped, unmapped): (Vec<_>, Vec<_>) = entities
            .iter()
            .partition(|entity| self.profilers.covers(entity.category));
        for entity in &unmapped {
            warn!(
                entity = %entity.name,
                category = %entity.category,
                "No profiler configured for category, skipping"
            );
        }
        stats.skipped_unmapped = unmapped.len();

        let max_concurrent = self.config.max_concurrent_profiles.max(1);
        info!(
            extracted = stats.extracted,
            to_profile = mapped.len(),
            max_concurrent,
            "Entities extracted, profiling"
        );

        let genre_name = genre.genre.as_str();
        let futures: Vec<_> = mapped
            .into_iter()
            .map(|entity| async move {
                let result = self.profile_entity(text, genre_name, entity).await;
                (entity, result)
            })
            .collect();

        let outcomes: Vec<_> = stream::iter(futures)
            .buffer_unordered(max_concurrent)
            .collect()
            .await;

        let mut profiled_entities = Vec::with_capacity(outcomes.len());
        for (entity, outcome) in outcomes {
            match outcome {
                Ok(Some(profile)) => profiled_entities.push(profile),
                Ok(None) => stats.skipped_unmapped += 1,
                Err(e) => {
                    warn!(
                        entity = %entity.name,
                        category = %entity.category,
                        error = %e,
                        "Profiling failed, excluding entity"
                    );
                    stats.failed += 1;
                }
            }
        }
        stats.profiled = profiled_entities.len();

        info!(
            genre = %genre.genre,
            extracted = stats.extracted,
            profiled = stats.profiled,
            skipped = stats.skipped_unmapped,
            failed = stats.failed,
            "Mining complete"
        );

        Ok(MinedResult {
            genre: genre.genre,
            genre_reasoning: genre.reasoning,
            profiled_entities,
            stats,
        })
    }

    /// Save profiles into `collection`. See [`ProfileSink::save`].
    pub async fn save(
        &self,
        collection: &str,
        profiles: &[EntityProfile],
        genre: &str,
        namespace: &str,
    ) -> bool {
        self.sink.save(collection, profiles, genre, namespace).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fixture_deps, fixture_templates, responses, MockModel};
    use crate::types::entity::{Category, Significance};

    fn text() -> &'static str {
        "Balasar crossed the jungles of Aass-Nag with Javok on his back."
    }

    #[tokio::test]
    async fn test_genre_failure_aborts_before_extraction() {
        let model = Arc::new(MockModel::new().failing_on(template_types::GENRE_DETERMINATION));
        let deps = fixture_deps(model.clone());
        let workflow = EntityMiningWorkflow::new(&deps, MinerConfig::new("m")).await.unwrap();

        let err = workflow.mine(text()).await.unwrap_err();
        assert!(matches!(err, MinerError::Workflow { stage: GENRE_STAGE, .. }));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_genre_is_workflow_error() {
        let model = Arc::new(
            MockModel::new().with_response(template_types::GENRE_DETERMINATION, responses::genre("  ")),
        );
        let deps = fixture_deps(model);
        let workflow = EntityMiningWorkflow::new(&deps, MinerConfig::new("m")).await.unwrap();

        let err = workflow.mine(text()).await.unwrap_err();
        assert!(matches!(err, MinerError::Workflow { stage: GENRE_STAGE, .. }));
    }

    #[tokio::test]
    async fn test_extraction_parse_failure_is_workflow_error() {
        let model = Arc::new(
            MockModel::new()
                .with_response(template_types::GENRE_DETERMINATION, responses::genre("Fantasy"))
                .with_response(template_types::ENTITY_EXTRACTION, "no json here {"),
        );
        let deps = fixture_deps(model);
        let workflow = EntityMiningWorkflow::new(&deps, MinerConfig::new("m")).await.unwrap();

        let err = workflow.mine(text()).await.unwrap_err();
        match err {
            MinerError::Workflow { stage, source } => {
                assert_eq!(stage, EXTRACTION_STAGE);
                assert_eq!(source.kind(), "parse_error");
            }
            other => panic!("expected workflow error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_profile_failure_is_counted_not_fatal() {
        let entities = vec![
            ExtractedEntity::new("Balasar", Category::Person, Some(Significance::Major)),
            ExtractedEntity::new("Javok", Category::Object, Some(Significance::Supporting)),
        ];
        let model = Arc::new(
            MockModel::new()
                .with_response(template_types::GENRE_DETERMINATION, responses::genre("Fantasy"))
                .with_response(template_types::ENTITY_EXTRACTION, responses::entities(&entities))
                .with_response(template_types::PERSON_PROFILER, responses::person("Balasar"))
                .failing_on(template_types::OBJECT_PROFILER),
        );
        let deps = fixture_deps(model);
        let workflow = EntityMiningWorkflow::new(&deps, MinerConfig::new("m")).await.unwrap();

        let mined = workflow.mine(text()).await.unwrap();
        assert_eq!(mined.stats.extracted, 2);
        assert_eq!(mined.stats.profiled, 1);
        assert_eq!(mined.stats.failed, 1);
        assert!(mined.profile("Balasar").is_some());
    }

    #[tokio::test]
    async fn test_missing_profiler_template_fails_only_that_entity() {
        let entities = vec![
            ExtractedEntity::new("Balasar", Category::Person, Some(Significance::Major)),
            ExtractedEntity::new("Aass-Nag", Category::Location, None),
        ];
        let model = Arc::new(
            MockModel::new()
                .with_response(template_types::GENRE_DETERMINATION, responses::genre("Fantasy"))
                .with_response(template_types::ENTITY_EXTRACTION, responses::entities(&entities))
                .with_response(template_types::LOCATION_PROFILER, responses::location("Aass-Nag")),
        );
        let templates = fixture_templates();
        templates.remove(template_types::PERSON_PROFILER);
        let deps = MinerDeps::in_memory(Arc::new(templates), model);
        let workflow = EntityMiningWorkflow::new(&deps, MinerConfig::new("m")).await.unwrap();

        let mined = workflow.mine(text()).await.unwrap();
        assert_eq!(mined.stats.failed, 1);
        assert!(mined.profile("Aass-Nag").is_some());
    }

    #[tokio::test]
    async fn test_missing_genre_template_is_configuration_error() {
        let templates = fixture_templates();
        templates.remove(template_types::GENRE_DETERMINATION);
        let deps = MinerDeps::in_memory(Arc::new(templates), Arc::new(MockModel::new()));
        let workflow = EntityMiningWorkflow::new(&deps, MinerConfig::new("m")).await.unwrap();

        let err = workflow.detect_genre(text()).await.unwrap_err();
        assert_eq!(err.kind(), "configuration_error");
        assert!(err.to_string().contains("missing prompts for genre_determination"));
    }

    #[tokio::test]
    async fn test_unknown_placeholder_fails_construction() {
        let templates = fixture_templates();
        templates.insert(crate::types::template::PromptTemplate::global(
            template_types::GENRE_DETERMINATION,
            "sys",
            "{text} {chapter}",
        ));
        let deps = MinerDeps::in_memory(Arc::new(templates), Arc::new(MockModel::new()));

        let result = EntityMiningWorkflow::new(&deps, MinerConfig::new("m")).await;
        assert!(matches!(result, Err(MinerError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_minor_person_gets_reduced_prompt() {
        let model = Arc::new(
            MockModel::new().with_response(template_types::PERSON_PROFILER, responses::person("Shalash")),
        );
        let deps = fixture_deps(model.clone());
        let workflow = EntityMiningWorkflow::new(&deps, MinerConfig::new("m")).await.unwrap();

        let minor = ExtractedEntity::new("Shalash", Category::Person, Some(Significance::Minor));
        workflow.profile_entity(text(), "Fantasy", &minor).await.unwrap();
        let major = ExtractedEntity::new("Shalash", Category::Person, Some(Significance::Major));
        workflow.profile_entity(text(), "Fantasy", &major).await.unwrap();

        let prompts = model.instruction_prompts();
        assert!(!prompts[0].contains("significance"));
        assert!(prompts[1].contains("a Major character"));
    }

    #[tokio::test]
    async fn test_minor_person_single_line_template_is_profiled() {
        let model = Arc::new(
            MockModel::new().with_response(template_types::PERSON_PROFILER, responses::person("Shalash")),
        );
        let templates = fixture_templates();
        templates.insert(crate::types::template::PromptTemplate::global(
            template_types::PERSON_PROFILER,
            format!("[{}] You are a literary analyst.", template_types::PERSON_PROFILER),
            "Profile {entity_name}, a {significance} character in this {genre} text: {text}",
        ));
        let deps = MinerDeps::in_memory(Arc::new(templates), model.clone());
        let workflow = EntityMiningWorkflow::new(&deps, MinerConfig::new("m")).await.unwrap();

        let minor = ExtractedEntity::new("Shalash", Category::Person, Some(Significance::Minor));
        let profile = workflow.profile_entity(text(), "Fantasy", &minor).await.unwrap();

        assert_eq!(profile.unwrap().display_name(), "Shalash");
        assert_eq!(model.call_count(), 1);
        assert!(model.instruction_prompts()[0].starts_with("Profile Shalash, a character in this Fantasy text"));
    }

    #[tokio::test]
    async fn test_templates_come_from_the_configured_scope() {
        let model = Arc::new(
            MockModel::new().with_response("[novel1-genre]", responses::genre("Space Opera")),
        );
        let templates = fixture_templates();
        templates.insert(crate::types::template::PromptTemplate::new(
            "novel1",
            template_types::GENRE_DETERMINATION,
            "[novel1-genre] You are a literary analyst.",
            "{text}",
        ));
        let deps = MinerDeps::in_memory(Arc::new(templates), model);
        let config = MinerConfig::new("m").with_template_scope("novel1");
        let workflow = EntityMiningWorkflow::new(&deps, config).await.unwrap();

        assert_eq!(workflow.config().template_scope, "novel1");
        let genre = workflow.detect_genre(text()).await.unwrap();
        assert_eq!(genre.genre, "Space Opera");
    }

    #[tokio::test]
    async fn test_sampling_and_model_id_are_forwarded() {
        let model = Arc::new(
            MockModel::new().with_response(template_types::GENRE_DETERMINATION, responses::genre("Noir")),
        );
        let deps = fixture_deps(model.clone());
        let workflow = EntityMiningWorkflow::new(&deps, MinerConfig::new("deepseek.v3-v1:0"))
            .await
            .unwrap();

        workflow.detect_genre(text()).await.unwrap();
        let request = &model.requests()[0];
        assert_eq!(request.model_id, "deepseek.v3-v1:0");
        assert_eq!(request.sampling.seed, 69420);
        assert_eq!(request.sampling.top_p, 0.9);
    }
}
