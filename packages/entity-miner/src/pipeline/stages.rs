//! Stage functions.
//!
//! Every stage is the same four steps: require its prompt, render the
//! instruction with typed parameters, invoke the model, parse the answer.

use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::pipeline::prompts::{
    ExtractionParams, ExtractionPrompt, GenreParams, GenrePrompt, PersonProfileParams,
    PersonProfilePrompt, ProfileParams, ProfilePrompt, PromptKind, StagePrompt,
};
use crate::pipeline::response::{parse_response, ModelOutput};
use crate::traits::model::{InvocationRequest, ModelInvoker};
use crate::types::{
    config::{ProfilerSpec, SamplingParams},
    entity::{Category, EntityExtraction, ExtractedEntity, GenreResult},
    profile::{
        EntityProfile, EventProfile, LocationProfile, ObjectProfile, OrganizationProfile,
        PersonProfile,
    },
    template::PromptTemplate,
};

/// What every stage needs to reach the model.
#[derive(Clone, Copy)]
pub struct StageContext<'a> {
    pub model: &'a dyn ModelInvoker,
    pub model_id: &'a str,
    pub sampling: SamplingParams,
}

impl StageContext<'_> {
    async fn run<K: PromptKind, T: ModelOutput>(
        &self,
        prompt: &StagePrompt<K>,
        params: &K::Params<'_>,
    ) -> Result<T> {
        let bound = prompt.require()?;
        let request = InvocationRequest::new(
            self.model_id,
            bound.system_prompt(),
            bound.render(params),
            self.sampling,
        )?;

        debug!(stage = bound.label(), model_id = self.model_id, "Invoking model");
        let response = self.model.invoke(&request).await?;
        parse_response(&response)
    }
}

/// Determine the genre of a text.
pub async fn detect_genre(
    ctx: &StageContext<'_>,
    prompt: &StagePrompt<GenrePrompt>,
    text: &str,
) -> Result<GenreResult> {
    ctx.run(prompt, &GenreParams { text }).await
}

/// Extract and classify the entities of a text.
pub async fn extract_entities(
    ctx: &StageContext<'_>,
    prompt: &StagePrompt<ExtractionPrompt>,
    text: &str,
    genre: &str,
) -> Result<Vec<ExtractedEntity>> {
    let extraction: EntityExtraction = ctx.run(prompt, &ExtractionParams { genre, text }).await?;
    Ok(extraction.entities)
}

/// Profiler prompts for every configured category.
#[derive(Debug, Clone, Default)]
pub struct ProfilerPrompts {
    person: Option<StagePrompt<PersonProfilePrompt>>,
    others: HashMap<Category, StagePrompt<ProfilePrompt>>,
}

impl ProfilerPrompts {
    /// Bind the configured profilers against fetched templates (keyed by
    /// template type). Missing templates are fine here; unknown placeholders
    /// are not.
    pub fn prepare(
        profilers: &HashMap<Category, ProfilerSpec>,
        templates: &HashMap<String, PromptTemplate>,
    ) -> Result<Self> {
        let mut prompts = Self::default();

        for (category, spec) in profilers {
            let template = templates.get(&spec.template_type);
            match category {
                Category::Person => {
                    prompts.person = Some(StagePrompt::prepare(spec.label.clone(), template)?);
                }
                Category::Other => {
                    warn!("Ignoring profiler configured for category Other");
                }
                other => {
                    prompts
                        .others
                        .insert(*other, StagePrompt::prepare(spec.label.clone(), template)?);
                }
            }
        }

        Ok(prompts)
    }

    /// Whether entities of this category get a profile.
    pub fn covers(&self, category: Category) -> bool {
        match category {
            Category::Person => self.person.is_some(),
            other => self.others.contains_key(&other),
        }
    }
}

/// Profile one entity.
///
/// `Ok(None)` when no profiler is configured for the entity's category.
pub async fn profile_entity(
    ctx: &StageContext<'_>,
    prompts: &ProfilerPrompts,
    text: &str,
    genre: &str,
    entity: &ExtractedEntity,
) -> Result<Option<EntityProfile>> {
    let entity_name = entity.name.as_str();

    if entity.category == Category::Person {
        let Some(prompt) = &prompts.person else {
            warn!(entity = entity_name, category = %entity.category, "No profiler configured for category");
            return Ok(None);
        };
        // Minor persons get the reduced prompt: no significance framing.
        let significance = if entity.is_minor() {
            None
        } else {
            Some(entity.significance.map_or("Unspecified", |s| s.as_str()))
        };
        let params = PersonProfileParams {
            entity_name,
            genre,
            text,
            significance,
        };
        let profile: PersonProfile = ctx.run(prompt, &params).await?;
        return Ok(Some(profile.into()));
    }

    let Some(prompt) = prompts.others.get(&entity.category) else {
        warn!(entity = entity_name, category = %entity.category, "No profiler configured for category");
        return Ok(None);
    };
    let params = ProfileParams {
        entity_name,
        genre,
        text,
    };

    let profile = match entity.category {
        Category::Location => ctx.run::<_, LocationProfile>(prompt, &params).await?.into(),
        Category::Event => ctx.run::<_, EventProfile>(prompt, &params).await?.into(),
        Category::Object => ctx.run::<_, ObjectProfile>(prompt, &params).await?.into(),
        Category::Organization => ctx
            .run::<_, OrganizationProfile>(prompt, &params)
            .await?
            .into(),
        Category::Person | Category::Other => return Ok(None),
    };

    Ok(Some(profile))
}
