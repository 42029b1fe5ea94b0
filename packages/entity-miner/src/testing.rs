//! Testing utilities including mock implementations.
//!
//! Useful for testing code that runs the mining workflow without a hosted
//! model or a vector database.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::deps::MinerDeps;
use crate::error::{MinerError, Result};
use crate::stores::MemoryTemplateStore;
use crate::traits::{
    embedder::Embedder,
    model::{InvocationRequest, ModelInvoker, RawResponse},
    template_store::TemplateStore,
    vector_store::{DocumentBatch, VectorHit, VectorStore},
};
use crate::types::template::{template_types, PromptTemplate};

/// A scripted model.
///
/// Responses are routed by a key matched against the request's system
/// prompt; the longest matching key wins. The [`fixture_templates`] embed
/// their template type in the system prompt, so template types work as keys.
#[derive(Default)]
pub struct MockModel {
    /// Message content by routing key
    responses: Arc<RwLock<HashMap<String, String>>>,

    /// Keys that fail with a transport error
    failures: Arc<RwLock<HashSet<String>>>,

    /// Artificial latency per call
    delay: Option<Duration>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<InvocationRequest>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests matching `key` with `content` (wrapped in a completion
    /// body).
    pub fn with_response(self, key: impl Into<String>, content: impl Into<String>) -> Self {
        self.responses
            .write()
            .unwrap()
            .insert(key.into(), content.into());
        self
    }

    /// Fail requests matching `key` with a transport error.
    pub fn failing_on(self, key: impl Into<String>) -> Self {
        self.failures.write().unwrap().insert(key.into());
        self
    }

    /// Sleep this long inside every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All requests received, in call order.
    pub fn requests(&self) -> Vec<InvocationRequest> {
        self.calls.read().unwrap().clone()
    }

    /// Instruction prompts received, in call order.
    pub fn instruction_prompts(&self) -> Vec<String> {
        self.calls
            .read()
            .unwrap()
            .iter()
            .map(|r| r.instruction_prompt.clone())
            .collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }

    /// Highest number of calls that were running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn route<'a, I: IntoIterator<Item = &'a String>>(keys: I, system_prompt: &str) -> Option<&'a String> {
        keys.into_iter()
            .filter(|k| system_prompt.contains(k.as_str()))
            .max_by_key(|k| k.len())
    }

    fn respond(&self, request: &InvocationRequest) -> Result<RawResponse> {
        let failures = self.failures.read().unwrap();
        let responses = self.responses.read().unwrap();

        let failing = Self::route(failures.iter(), &request.system_prompt);
        let answering = Self::route(responses.keys(), &request.system_prompt);

        match (failing, answering) {
            (Some(fail), Some(answer)) if answer.len() > fail.len() => {
                Ok(RawResponse::from_content(&responses[answer]))
            }
            (Some(fail), _) => Err(MinerError::Transport(Box::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("mock failure for {}", fail),
            )))),
            (None, Some(answer)) => Ok(RawResponse::from_content(&responses[answer])),
            (None, None) => Err(MinerError::Transport(Box::new(std::io::Error::new(
                std::io::ErrorKind::Other,
                "no scripted response",
            )))),
        }
    }
}

#[async_trait]
impl ModelInvoker for MockModel {
    async fn invoke(&self, request: &InvocationRequest) -> Result<RawResponse> {
        self.calls.write().unwrap().push(request.clone());

        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let result = self.respond(request);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        result
    }
}

/// Deterministic bag-of-words embedder.
///
/// Each lowercase token is hashed into one of `DIMENSIONS` buckets, so texts
/// sharing words get nearby vectors.
#[derive(Default)]
pub struct MockEmbedder {
    calls: Arc<RwLock<Vec<Vec<String>>>>,
}

impl MockEmbedder {
    pub const DIMENSIONS: usize = 16;

    pub fn new() -> Self {
        Self::default()
    }

    /// Texts of each `embed_batch` call, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.read().unwrap().clone()
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; Self::DIMENSIONS];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = token
                .to_lowercase()
                .bytes()
                .fold(0usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize));
            vector[bucket % Self::DIMENSIONS] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_batch(&[text]).await?.remove(0))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        self.calls
            .write()
            .unwrap()
            .push(texts.iter().map(|t| t.to_string()).collect());
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }
}

/// Template store whose every call fails.
pub struct FailingTemplateStore;

#[async_trait]
impl TemplateStore for FailingTemplateStore {
    async fn get(&self, _scope: &str, _template_type: &str) -> Result<Option<PromptTemplate>> {
        Err(MinerError::storage("template store unavailable"))
    }

    async fn put(&self, _template: &PromptTemplate) -> Result<()> {
        Err(MinerError::storage("template store unavailable"))
    }

    async fn list(&self, _scope: &str) -> Result<Vec<PromptTemplate>> {
        Err(MinerError::storage("template store unavailable"))
    }
}

/// Vector store whose every call fails.
pub struct FailingVectorStore;

#[async_trait]
impl VectorStore for FailingVectorStore {
    async fn add(&self, _collection: &str, _batch: DocumentBatch) -> Result<()> {
        Err(MinerError::storage("vector store unavailable"))
    }

    async fn query(&self, _collection: &str, _text: &str, _k: usize) -> Result<Vec<VectorHit>> {
        Err(MinerError::storage("vector store unavailable"))
    }
}

/// A global template for every built-in stage.
///
/// Each system prompt starts with `[template_type]` for [`MockModel`] routing.
pub fn fixture_templates() -> MemoryTemplateStore {
    let system = |template_type: &str| {
        format!("[{}] You are a literary analyst of long-form fiction.", template_type)
    };
    let profile = "Profile the {entity_name} of this {genre} text.\n\n{text}";

    MemoryTemplateStore::with_templates([
        PromptTemplate::global(
            template_types::GENRE_DETERMINATION,
            system(template_types::GENRE_DETERMINATION),
            "Determine the genre of the text below. Answer as {{\"reasoning\": ..., \"genre\": ...}}.\n\n{text}",
        ),
        PromptTemplate::global(
            template_types::ENTITY_EXTRACTION,
            system(template_types::ENTITY_EXTRACTION),
            "This is a {genre} text. List every named entity with its category and significance.\n\n{text}",
        ),
        PromptTemplate::global(
            template_types::PERSON_PROFILER,
            system(template_types::PERSON_PROFILER),
            "Profile {entity_name} from this {genre} text.\nThey are a {significance} character, so go into detail.\n\n{text}",
        ),
        PromptTemplate::global(
            template_types::LOCATION_PROFILER,
            system(template_types::LOCATION_PROFILER),
            profile,
        ),
        PromptTemplate::global(
            template_types::EVENT_PROFILER,
            system(template_types::EVENT_PROFILER),
            profile,
        ),
        PromptTemplate::global(
            template_types::OBJECT_PROFILER,
            system(template_types::OBJECT_PROFILER),
            profile,
        ),
        PromptTemplate::global(
            template_types::ORGANIZATION_PROFILER,
            system(template_types::ORGANIZATION_PROFILER),
            profile,
        ),
    ])
}

/// In-memory deps with the fixture templates and the given model.
pub fn fixture_deps(model: Arc<dyn ModelInvoker>) -> MinerDeps {
    MinerDeps::in_memory(Arc::new(fixture_templates()), model)
}

/// Model answers in the shape each stage expects, fenced like a real model's.
pub mod responses {
    use serde_json::{json, Value};

    use crate::types::entity::ExtractedEntity;

    fn fenced(value: Value) -> String {
        format!("Here is my answer.\n```json\n{}\n```", value)
    }

    pub fn genre(genre: &str) -> String {
        fenced(json!({
            "reasoning": "Swords, clans and ancestral spirits.",
            "genre": genre,
        }))
    }

    /// A bare list, as models often answer.
    pub fn entities(entities: &[ExtractedEntity]) -> String {
        fenced(json!(entities))
    }

    pub fn person(name: &str) -> String {
        fenced(json!({
            "name": name,
            "titles_and_nicknames": [],
            "role": "Protagonist",
            "personality": "Stubborn",
        }))
    }

    pub fn location(name: &str) -> String {
        fenced(json!({
            "primary_name": name,
            "description": "A treacherous jungle realm.",
            "prominent_entities_associated": ["Ssarki"],
        }))
    }

    pub fn event(name: &str) -> String {
        fenced(json!({ "primary_name": name, "description": "A battle." }))
    }

    pub fn object(name: &str) -> String {
        fenced(json!({ "name": name, "type": "Weapon", "owner": "Balasar" }))
    }

    pub fn organization(name: &str) -> String {
        fenced(json!({ "primary_name": name, "type": "Clan" }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::config::SamplingParams;

    fn request(system: &str) -> InvocationRequest {
        InvocationRequest::new("m", system, "instruction", SamplingParams::default()).unwrap()
    }

    #[tokio::test]
    async fn test_routes_by_longest_key() {
        let model = MockModel::new()
            .with_response("profiler", "short")
            .with_response("person_profiler", "long");

        let raw = model.invoke(&request("[entity_miner_person_profiler] ...")).await.unwrap();
        assert!(raw.body.contains("long"));
        assert_eq!(model.call_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_and_unscripted() {
        let model = MockModel::new().failing_on("genre");
        assert!(model.invoke(&request("[genre]")).await.is_err());
        assert!(model.invoke(&request("[other]")).await.is_err());
        assert_eq!(model.call_count(), 2);
    }

    #[tokio::test]
    async fn test_fixture_templates_are_complete() {
        let store = fixture_templates();
        let templates = store.list("global").await.unwrap();
        assert_eq!(templates.len(), 7);
        assert!(templates.iter().all(PromptTemplate::is_complete));
    }
}
