//! Response parsing - turn a raw completion body into a typed stage output.
//!
//! Models are asked to answer inside a ```` ```json ```` fence but often think
//! out loud first, sometimes with fenced drafts. The LAST fenced block is the
//! answer.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{MinerError, Result};
use crate::traits::model::RawResponse;
use crate::types::{
    entity::{EntityExtraction, GenreResult},
    profile::{EventProfile, LocationProfile, ObjectProfile, OrganizationProfile, PersonProfile},
};

const JSON_FENCE: &str = "```json";
const FENCE: &str = "```";

/// A shape a stage expects back from the model.
pub trait ModelOutput: DeserializeOwned {
    /// Canonical field a bare JSON array is wrapped under before validation.
    const LIST_FIELD: Option<&'static str> = None;
}

impl ModelOutput for GenreResult {}

impl ModelOutput for EntityExtraction {
    const LIST_FIELD: Option<&'static str> = Some("entities");
}

impl ModelOutput for PersonProfile {}
impl ModelOutput for LocationProfile {}
impl ModelOutput for EventProfile {}
impl ModelOutput for ObjectProfile {}
impl ModelOutput for OrganizationProfile {}

/// Read `choices[0].message.content` from a completion body.
pub fn message_content(raw: &RawResponse) -> Result<String> {
    let body: Value = serde_json::from_str(&raw.body)
        .map_err(|e| MinerError::Parse(format!("completion body is not JSON: {}", e)))?;

    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MinerError::Parse("completion has no choices[0].message.content".into()))
}

/// The text of the last ```` ```json ```` block.
///
/// Without a marker the content up to the first bare fence is used, which is
/// the whole content when the model answered with plain JSON.
pub fn extract_fenced_json(content: &str) -> &str {
    let after_marker = match content.rfind(JSON_FENCE) {
        Some(idx) => &content[idx + JSON_FENCE.len()..],
        None => content,
    };
    after_marker
        .split(FENCE)
        .next()
        .unwrap_or(after_marker)
        .trim()
}

/// Validate an already-decoded value against the expected shape.
pub fn parse_value<T: ModelOutput>(value: Value) -> Result<T> {
    let value = match (T::LIST_FIELD, value) {
        (Some(field), Value::Array(items)) => {
            let mut wrapped = serde_json::Map::new();
            wrapped.insert(field.to_string(), Value::Array(items));
            Value::Object(wrapped)
        }
        (_, other) => other,
    };

    serde_json::from_value(value).map_err(|e| {
        MinerError::Parse(format!(
            "response does not match {}: {}",
            short_type_name::<T>(),
            e
        ))
    })
}

/// Parse message content (already extracted from the body).
pub fn parse_content<T: ModelOutput>(content: &str) -> Result<T> {
    let json = extract_fenced_json(content);
    let value: Value = serde_json::from_str(json)
        .map_err(|e| MinerError::Parse(format!("fenced block is not valid JSON: {}", e)))?;
    parse_value(value)
}

/// Parse a raw completion body into `T`.
pub fn parse_response<T: ModelOutput>(raw: &RawResponse) -> Result<T> {
    let content = message_content(raw)?;
    parse_content(&content)
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::entity::Category;
    use proptest::prelude::*;

    #[test]
    fn test_takes_last_fenced_block() {
        let content = "Let me think.\n```json\n{\"genre\": \"draft\", \"reasoning\": \"x\"}\n```\n\
                       Actually, final answer:\n```json\n{\"genre\": \"High Fantasy\", \"reasoning\": \"dragons\"}\n```";
        let genre: GenreResult = parse_content(content).unwrap();
        assert_eq!(genre.genre, "High Fantasy");
    }

    #[test]
    fn test_plain_json_without_fence() {
        let genre: GenreResult =
            parse_content(r#"{"genre": "Noir", "reasoning": "rain"}"#).unwrap();
        assert_eq!(genre.genre, "Noir");
    }

    #[test]
    fn test_unterminated_fence() {
        let genre: GenreResult =
            parse_content("```json\n{\"genre\": \"Noir\", \"reasoning\": \"rain\"}").unwrap();
        assert_eq!(genre.genre, "Noir");
    }

    #[test]
    fn test_bare_list_is_wrapped_for_extraction() {
        let list = "```json\n[{\"name\": \"Shedinn\", \"category\": \"Person\", \"significance\": \"Major\"}]\n```";
        let object = "```json\n{\"entities\": [{\"name\": \"Shedinn\", \"category\": \"Person\", \"significance\": \"Major\"}]}\n```";

        let from_list: EntityExtraction = parse_content(list).unwrap();
        let from_object: EntityExtraction = parse_content(object).unwrap();
        assert_eq!(from_list, from_object);
        assert_eq!(from_list.entities[0].category, Category::Person);
    }

    #[test]
    fn test_bare_list_is_not_wrapped_for_other_shapes() {
        let err = parse_content::<GenreResult>("[1, 2]").unwrap_err();
        assert!(matches!(err, MinerError::Parse(_)));
    }

    #[test]
    fn test_schema_mismatch_is_parse_error() {
        let err = parse_content::<GenreResult>(r#"{"genre": "Noir"}"#).unwrap_err();
        assert!(matches!(err, MinerError::Parse(ref msg) if msg.contains("GenreResult")));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = parse_content::<GenreResult>("```json\n{genre: Noir}\n```").unwrap_err();
        assert!(matches!(err, MinerError::Parse(_)));
    }

    #[test]
    fn test_reads_first_choice_from_body() {
        let raw = RawResponse::from_content("```json\n{\"genre\": \"Noir\", \"reasoning\": \"rain\"}\n```");
        let genre: GenreResult = parse_response(&raw).unwrap();
        assert_eq!(genre.reasoning, "rain");
    }

    #[test]
    fn test_body_without_choices_is_parse_error() {
        let err = parse_response::<GenreResult>(&RawResponse::new(r#"{"choices": []}"#)).unwrap_err();
        assert!(matches!(err, MinerError::Parse(_)));

        let err = parse_response::<GenreResult>(&RawResponse::new("<html>")).unwrap_err();
        assert!(matches!(err, MinerError::Parse(_)));
    }

    proptest! {
        #[test]
        fn prop_parsing_is_idempotent(
            genre in "[A-Za-z ]{1,24}",
            reasoning in "[A-Za-z0-9 .,]{0,80}",
            preamble in "[A-Za-z .]{0,40}",
        ) {
            let answer = serde_json::json!({"genre": genre, "reasoning": reasoning});
            let raw = RawResponse::from_content(&format!("{}\n```json\n{}\n```", preamble, answer));

            let first: GenreResult = parse_response(&raw).unwrap();
            let second: GenreResult = parse_response(&raw).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.genre, genre);
        }
    }
}
