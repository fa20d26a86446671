//! Pulls the story text out of a generation response.
//!
//! The provider has shipped several response layouts over time. Each known
//! layout gets its own extractor; they are tried in a fixed order and the
//! first one that recognises the body wins. When none does, the serialized
//! body itself is returned so the caller still gets something to look at.

use serde_json::Value;

/// Which layout the story was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// `candidates[0].content[0].text`
    CandidateText,
    /// `output[0].content` as a list of parts
    OutputParts,
    /// `output[0].content` as a single part
    OutputPart,
    /// None of the above; the whole body, serialized
    Raw,
}

type Extractor = fn(&Value) -> Option<String>;

const EXTRACTORS: &[(ResponseShape, Extractor)] = &[
    (ResponseShape::CandidateText, candidate_text),
    (ResponseShape::OutputParts, output_parts),
    (ResponseShape::OutputPart, output_part),
];

/// Run the extractor chain; never fails.
pub fn extract_story(raw: &Value) -> (ResponseShape, String) {
    EXTRACTORS
        .iter()
        .find_map(|(shape, extract)| extract(raw).map(|text| (*shape, text)))
        .unwrap_or_else(|| (ResponseShape::Raw, raw.to_string()))
}

fn candidate_text(raw: &Value) -> Option<String> {
    raw.pointer("/candidates/0/content/0/text")
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(str::to_owned)
}

fn output_content(raw: &Value) -> Option<&Value> {
    raw.pointer("/output/0/content").filter(|c| !c.is_null())
}

fn output_parts(raw: &Value) -> Option<String> {
    let parts = output_content(raw)?.as_array()?;
    let joined = parts
        .iter()
        .map(|part| part.get("text").and_then(Value::as_str).unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n");
    Some(joined)
}

fn output_part(raw: &Value) -> Option<String> {
    let content = output_content(raw)?;
    if content.is_array() {
        return None;
    }
    content
        .get("text")
        .and_then(Value::as_str)
        .map(str::to_owned)
}
