//! Model output parsing.
//!
//! LLMs return prose-wrapped, fence-wrapped or plain JSON; these functions
//! normalize that into typed values. Every failure is an
//! [`EngineError::Parse`] value so the engine can retry, never a panic.
//! Unknown JSON fields are ignored for forward compatibility.

use serde::de::DeserializeOwned;

use crate::error::{EngineError, Result};
use crate::types::Slide;

/// Whole-deck response payload. An echoed topic/grade is tolerated and
/// dropped; the assembler restores both from the request.
#[derive(Debug, serde::Deserialize)]
struct DeckPayload {
    slides: Vec<Slide>,
}

/// Decode a whole-deck response into its slides.
pub fn parse_deck(raw: &str) -> Result<Vec<Slide>> {
    let payload: DeckPayload = decode_json(raw, Shape::Object)?;
    for slide in &payload.slides {
        slide.check()?;
    }
    Ok(payload.slides)
}

/// Decode a single-slide response.
pub fn parse_slide(raw: &str) -> Result<Slide> {
    let slide: Slide = decode_json(raw, Shape::Object)?;
    slide.check()?;
    Ok(slide)
}

/// Decode an agenda-planning response into subtopic strings.
///
/// Blank entries are dropped; the engine pads short lists itself.
pub fn parse_subtopics(raw: &str) -> Result<Vec<String>> {
    let topics: Vec<String> = decode_json(raw, Shape::Array)?;
    Ok(topics
        .into_iter()
        .map(|topic| topic.trim().to_string())
        .filter(|topic| !topic.is_empty())
        .collect())
}

#[derive(Clone, Copy)]
enum Shape {
    Object,
    Array,
}

impl Shape {
    fn delimiters(self) -> (char, char) {
        match self {
            Self::Object => ('{', '}'),
            Self::Array => ('[', ']'),
        }
    }
}

fn decode_json<T: DeserializeOwned>(raw: &str, shape: Shape) -> Result<T> {
    let cleaned = strip_code_fences(raw);
    let json = extract_json(cleaned, shape)?;
    Ok(serde_json::from_str(json)?)
}

/// Drop a surrounding markdown code fence, tolerating a language tag on the
/// opening line.
fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = match rest.split_once('\n') {
            Some((_, body)) => body,
            None => rest,
        };
    }
    let trimmed = text.trim_end();
    if let Some(body) = trimmed.strip_suffix("```") {
        text = body;
    }
    text.trim()
}

/// Slice out the outermost JSON value, skipping any prose around it.
fn extract_json(text: &str, shape: Shape) -> Result<&str> {
    let (open, close) = shape.delimiters();
    let start = text.find(open);
    let end = text.rfind(close);
    match (start, end) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(EngineError::parse(format!(
            "no JSON value delimited by '{open}'..'{close}' in model output"
        ))),
    }
}
