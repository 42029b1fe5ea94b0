//! Typed prompt binding.
//!
//! Each stage declares the exact placeholders it can fill as a [`PromptParams`]
//! type. Templates are checked against that set when a workflow is built, so a
//! template asking for `{chapter}` fails at construction instead of halfway
//! through a run.
//!
//! Syntax: `{name}` is a placeholder, `{{` and `}}` are literal braces, and any
//! other brace group (inline JSON examples, say) is left as written.

use lazy_static::lazy_static;
use regex::Regex;
use std::marker::PhantomData;

use crate::error::{MinerError, Result};
use crate::types::template::PromptTemplate;

lazy_static! {
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap();
}

/// A stage's parameter set.
pub trait PromptParams {
    /// Every placeholder this set can fill.
    const NAMES: &'static [&'static str];

    /// Value for a placeholder. `None` means "omit": lines that use only
    /// omitted placeholders are dropped, and elsewhere the placeholder
    /// renders as nothing.
    fn value(&self, name: &str) -> Option<&str>;
}

/// Marker for a stage's prompt, naming its parameter type.
pub trait PromptKind {
    type Params<'a>: PromptParams;

    fn names() -> &'static [&'static str] {
        <Self::Params<'static> as PromptParams>::NAMES
    }
}

/// Genre determination prompt.
#[derive(Debug, Clone, Copy)]
pub struct GenrePrompt;

impl PromptKind for GenrePrompt {
    type Params<'a> = GenreParams<'a>;
}

/// Entity extraction and classification prompt.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionPrompt;

impl PromptKind for ExtractionPrompt {
    type Params<'a> = ExtractionParams<'a>;
}

/// Location, event, object and organization profiler prompts.
#[derive(Debug, Clone, Copy)]
pub struct ProfilePrompt;

impl PromptKind for ProfilePrompt {
    type Params<'a> = ProfileParams<'a>;
}

/// Person profiler prompt.
#[derive(Debug, Clone, Copy)]
pub struct PersonProfilePrompt;

impl PromptKind for PersonProfilePrompt {
    type Params<'a> = PersonProfileParams<'a>;
}

/// Genre stage: `{text}`.
#[derive(Debug, Clone, Copy)]
pub struct GenreParams<'a> {
    pub text: &'a str,
}

impl PromptParams for GenreParams<'_> {
    const NAMES: &'static [&'static str] = &["text"];

    fn value(&self, name: &str) -> Option<&str> {
        match name {
            "text" => Some(self.text),
            _ => None,
        }
    }
}

/// Extraction stage: `{genre}`, `{text}`.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionParams<'a> {
    pub genre: &'a str,
    pub text: &'a str,
}

impl PromptParams for ExtractionParams<'_> {
    const NAMES: &'static [&'static str] = &["genre", "text"];

    fn value(&self, name: &str) -> Option<&str> {
        match name {
            "genre" => Some(self.genre),
            "text" => Some(self.text),
            _ => None,
        }
    }
}

/// Non-person profilers: `{entity_name}`, `{genre}`, `{text}`.
#[derive(Debug, Clone, Copy)]
pub struct ProfileParams<'a> {
    pub entity_name: &'a str,
    pub genre: &'a str,
    pub text: &'a str,
}

impl PromptParams for ProfileParams<'_> {
    const NAMES: &'static [&'static str] = &["entity_name", "genre", "text"];

    fn value(&self, name: &str) -> Option<&str> {
        match name {
            "entity_name" => Some(self.entity_name),
            "genre" => Some(self.genre),
            "text" => Some(self.text),
            _ => None,
        }
    }
}

/// Person profiler: the profile set plus `{significance}`.
///
/// Minor persons pass `significance: None`, which renders the reduced prompt.
#[derive(Debug, Clone, Copy)]
pub struct PersonProfileParams<'a> {
    pub entity_name: &'a str,
    pub genre: &'a str,
    pub text: &'a str,
    pub significance: Option<&'a str>,
}

impl PromptParams for PersonProfileParams<'_> {
    const NAMES: &'static [&'static str] = &["entity_name", "genre", "text", "significance"];

    fn value(&self, name: &str) -> Option<&str> {
        match name {
            "entity_name" => Some(self.entity_name),
            "genre" => Some(self.genre),
            "text" => Some(self.text),
            "significance" => self.significance,
            _ => None,
        }
    }
}

/// A template checked against a stage's parameter set.
#[derive(Debug, Clone)]
pub struct BoundPrompt<K> {
    label: String,
    system_prompt: String,
    instruction_prompt: String,
    _kind: PhantomData<K>,
}

impl<K: PromptKind> BoundPrompt<K> {
    /// Bind a complete template. Placeholders the stage cannot fill are a
    /// configuration error.
    pub fn bind(label: impl Into<String>, template: &PromptTemplate) -> Result<Self> {
        let label = label.into();

        if let Some(unknown) = placeholders(&template.instruction_prompt)
            .find(|name| !K::names().contains(name))
        {
            return Err(MinerError::Configuration(format!(
                "template for {} uses unknown placeholder {{{}}} (expected one of {:?})",
                label,
                unknown,
                K::names()
            )));
        }

        Ok(Self {
            label,
            system_prompt: template.system_prompt.clone(),
            instruction_prompt: template.instruction_prompt.clone(),
            _kind: PhantomData,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Substitute parameters into the instruction prompt.
    ///
    /// A line whose placeholders are all omitted is dropped. On a line that
    /// also carries filled placeholders, an omitted one renders as nothing
    /// and takes one adjoining space with it.
    pub fn render(&self, params: &K::Params<'_>) -> String {
        let mut rendered = String::with_capacity(self.instruction_prompt.len());

        for line in self.instruction_prompt.split_inclusive('\n') {
            let mut names = placeholders(line).peekable();
            if names.peek().is_some() && names.all(|name| params.value(name).is_none()) {
                continue;
            }
            render_line(line, params, &mut rendered);
        }

        rendered
    }
}

fn render_line<P: PromptParams>(line: &str, params: &P, out: &mut String) {
    let mut last = 0;
    for caps in PLACEHOLDER.captures_iter(line) {
        let whole = caps.get(0).map_or(0..0, |m| m.range());
        out.push_str(&line[last..whole.start]);
        last = whole.end;

        match caps.get(1) {
            Some(name) => match params.value(name.as_str()) {
                Some(value) => out.push_str(value),
                None => {
                    if out.ends_with(' ') && line[last..].starts_with(' ') {
                        out.pop();
                    }
                }
            },
            None if &caps[0] == "{{" => out.push('{'),
            None => out.push('}'),
        }
    }
    out.push_str(&line[last..]);
}

/// A stage's prompt as fetched at construction: bound, or missing.
///
/// Missing is only an error once the stage actually runs.
#[derive(Debug, Clone)]
pub struct StagePrompt<K> {
    label: String,
    bound: Option<BoundPrompt<K>>,
}

impl<K: PromptKind> StagePrompt<K> {
    /// Prepare a stage prompt from an optional template.
    ///
    /// Absent or incomplete templates are accepted here; templates with
    /// unknown placeholders are not.
    pub fn prepare(label: impl Into<String>, template: Option<&PromptTemplate>) -> Result<Self> {
        let label = label.into();
        let bound = match template {
            Some(t) if t.is_complete() => Some(BoundPrompt::bind(label.clone(), t)?),
            _ => None,
        };
        Ok(Self { label, bound })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_ready(&self) -> bool {
        self.bound.is_some()
    }

    /// The bound prompt, or the configuration error a stage reports.
    pub fn require(&self) -> Result<&BoundPrompt<K>> {
        self.bound.as_ref().ok_or_else(|| {
            MinerError::Configuration(format!(
                "missing prompts for {}: system_prompt_template or instruction_prompt_template is empty",
                self.label
            ))
        })
    }
}

fn placeholders(text: &str) -> impl Iterator<Item = &str> {
    PLACEHOLDER
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(instruction: &str) -> PromptTemplate {
        PromptTemplate::global("t", "You are a literary analyst.", instruction)
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let prompt =
            BoundPrompt::<ExtractionPrompt>::bind("extraction", &template("Genre: {genre}\n\n{text}"))
                .unwrap();
        let rendered = prompt.render(&ExtractionParams {
            genre: "High Fantasy",
            text: "Balasar rose.",
        });
        assert_eq!(rendered, "Genre: High Fantasy\n\nBalasar rose.");
    }

    #[test]
    fn test_escaped_braces_and_inline_json() {
        let prompt = BoundPrompt::<GenrePrompt>::bind(
            "genre",
            &template("Answer as {{\"genre\": ...}}\nExample: {\"genre\": \"Noir\"}\n{text}"),
        )
        .unwrap();
        let rendered = prompt.render(&GenreParams { text: "T" });
        assert_eq!(
            rendered,
            "Answer as {\"genre\": ...}\nExample: {\"genre\": \"Noir\"}\nT"
        );
    }

    #[test]
    fn test_unknown_placeholder_fails_binding() {
        let err = BoundPrompt::<GenrePrompt>::bind("genre", &template("{text} in {chapter}"))
            .unwrap_err();
        assert!(matches!(err, MinerError::Configuration(ref m) if m.contains("{chapter}")));
    }

    #[test]
    fn test_significance_only_allowed_for_persons() {
        let t = template("Profile {entity_name} ({significance})");
        assert!(BoundPrompt::<ProfilePrompt>::bind("location_profile", &t).is_err());
        assert!(BoundPrompt::<PersonProfilePrompt>::bind("person_profile", &t).is_ok());
    }

    #[test]
    fn test_missing_significance_drops_its_lines() {
        let prompt = BoundPrompt::<PersonProfilePrompt>::bind(
            "person_profile",
            &template("Profile {entity_name}.\nThey are a {significance} character.\n{text}"),
        )
        .unwrap();

        let full = prompt.render(&PersonProfileParams {
            entity_name: "Balasar",
            genre: "Fantasy",
            text: "T",
            significance: Some("Major"),
        });
        assert_eq!(full, "Profile Balasar.\nThey are a Major character.\nT");

        let reduced = prompt.render(&PersonProfileParams {
            entity_name: "Shalash",
            genre: "Fantasy",
            text: "T",
            significance: None,
        });
        assert_eq!(reduced, "Profile Shalash.\nT");
    }

    #[test]
    fn test_missing_significance_on_a_shared_line_keeps_the_line() {
        let prompt = BoundPrompt::<PersonProfilePrompt>::bind(
            "person_profile",
            &template("Profile {entity_name}, a {significance} character in this {genre} text: {text}"),
        )
        .unwrap();

        let reduced = prompt.render(&PersonProfileParams {
            entity_name: "Shalash",
            genre: "Fantasy",
            text: "T",
            significance: None,
        });
        assert_eq!(reduced, "Profile Shalash, a character in this Fantasy text: T");
    }

    #[test]
    fn test_values_are_not_reinterpreted() {
        let prompt = BoundPrompt::<GenrePrompt>::bind("genre", &template("<<{text}>>")).unwrap();
        let rendered = prompt.render(&GenreParams { text: "$1 {genre} }}" });
        assert_eq!(rendered, "<<$1 {genre} }}>>");
    }

    #[test]
    fn test_missing_template_fails_on_require() {
        let stage = StagePrompt::<GenrePrompt>::prepare("genre_determination", None).unwrap();
        assert!(!stage.is_ready());
        let err = stage.require().unwrap_err();
        assert!(matches!(err, MinerError::Configuration(ref m) if m.contains("missing prompts for genre_determination")));
    }

    #[test]
    fn test_incomplete_template_is_not_ready() {
        let t = PromptTemplate::global("t", "", "{text}");
        let stage = StagePrompt::<GenrePrompt>::prepare("genre_determination", Some(&t)).unwrap();
        assert!(stage.require().is_err());
    }
}
